//! Launchpad Facade
//!
//! Thread-safe entry point over the registries, pools and vesting ledger.
//!
//! # Concurrency
//!
//! - Registries sit behind `RwLock`s and hand out `Arc`s of immutable configs
//! - Each pool has its own `Mutex`; trades, graduation and migration against
//!   one pool serialize on it while other pools proceed in parallel
//! - Quotes copy a `CurveSnapshot` under the pool lock and compute outside it
//! - Lock order is pool, then vesting ledger, then event indexer
//!
//! Every mutating call returns the prepared `StateTransition`s for a
//! `LedgerSubmitter` to commit. Nothing here retries.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::curve::{min_output_with_slippage, TradeDirection, TradeQuote};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::{EventIndexer, InMemoryEventIndexer, LaunchpadEvent};
use crate::ledger::{AccountKey, IdentityProvider, LedgerReader, StateTransition};
use crate::migration::{ConstantProductDeposit, LiquidityDepositRule, MigrationExecutor, MigrationResult};
use crate::pool::{FeeRole, GraduationProgress, LaunchpadPool, PoolParams, PoolStatus};
use crate::primitives::{Address, ConfigId, PlatformId, PoolId, VestingId};
use crate::registry::{
    ConfigRegistry, LaunchConfig, LaunchConfigParams, PlatformConfig, PlatformParams,
    PlatformRegistry,
};
use crate::settings::LaunchpadSettings;
use crate::vesting::{VestingGrant, VestingLedger, VestingRecord};

/// Result of a mutating call plus the state transitions to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    pub output: T,
    pub prepared: Vec<StateTransition>,
}

impl<T> Transition<T> {
    /// All events carried by the prepared transitions
    pub fn events(&self) -> impl Iterator<Item = &LaunchpadEvent> {
        self.prepared.iter().flat_map(|t| t.events.iter())
    }
}

/// Buy executed atomically with pool creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialBuy {
    pub quote_in: u64,
    pub min_base_out: u64,
}

/// Fees paid out by `claim_fees`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeClaim {
    pub pool_id: PoolId,
    pub claimant: Address,
    pub protocol: u64,
    pub platform: u64,
    pub creator: u64,
}

impl FeeClaim {
    pub fn total(&self) -> u64 {
        self.protocol + self.platform + self.creator
    }
}

type PoolHandle = Arc<Mutex<LaunchpadPool>>;

/// Launchpad service
pub struct Launchpad<D = ConstantProductDeposit, I = InMemoryEventIndexer> {
    configs: RwLock<ConfigRegistry>,
    platforms: RwLock<PlatformRegistry>,
    pools: RwLock<HashMap<PoolId, PoolHandle>>,
    vesting: Mutex<VestingLedger>,
    indexer: RwLock<I>,
    executor: MigrationExecutor<D>,
    settings: LaunchpadSettings,
}

impl Launchpad {
    pub fn new() -> Self {
        Self::from_settings(LaunchpadSettings::default())
    }

    /// Launchpad using the settings' deposit rule and an in-memory indexer
    pub fn from_settings(settings: LaunchpadSettings) -> Self {
        let deposit_rule = settings.deposit_rule();
        Self::with_parts(settings, deposit_rule, InMemoryEventIndexer::new())
    }
}

impl Default for Launchpad {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: LiquidityDepositRule, I: EventIndexer> Launchpad<D, I> {
    pub fn with_parts(settings: LaunchpadSettings, deposit_rule: D, indexer: I) -> Self {
        Self {
            configs: RwLock::new(ConfigRegistry::new()),
            platforms: RwLock::new(PlatformRegistry::new()),
            pools: RwLock::new(HashMap::new()),
            vesting: Mutex::new(VestingLedger::new()),
            indexer: RwLock::new(indexer),
            executor: MigrationExecutor::new(deposit_rule),
            settings,
        }
    }

    pub fn settings(&self) -> &LaunchpadSettings {
        &self.settings
    }

    // =========================================================================
    // Registries
    // =========================================================================

    pub fn create_launch_config(
        &self,
        params: LaunchConfigParams,
        now: u64,
    ) -> LaunchpadResult<Transition<Arc<LaunchConfig>>> {
        let config = self.configs.write().create(params)?;
        let event = LaunchpadEvent::ConfigCreated {
            config_id: config.id,
            quote_mint: config.quote_mint,
            index: config.index,
            timestamp: now,
        };
        let prepared = vec![StateTransition::prepare(
            AccountKey::LaunchConfig(config.id),
            config.as_ref(),
            vec![event],
        )?];
        self.index(&prepared);

        info!("Launch config {} created for quote {}", config.id, config.quote_mint);
        Ok(Transition { output: config, prepared })
    }

    pub fn create_platform(
        &self,
        identity: &impl IdentityProvider,
        params: PlatformParams,
        now: u64,
    ) -> LaunchpadResult<Transition<Arc<PlatformConfig>>> {
        let caller = identity.identity();
        let platform = self.platforms.write().create(&caller, params)?;
        let event = LaunchpadEvent::PlatformCreated {
            platform_id: platform.id,
            admin: caller,
            timestamp: now,
        };
        let prepared = vec![StateTransition::prepare(
            AccountKey::Platform(platform.id),
            platform.as_ref(),
            vec![event],
        )?];
        self.index(&prepared);

        info!("Platform {} created by {}", platform.id, caller);
        Ok(Transition { output: platform, prepared })
    }

    pub fn launch_config(&self, id: &ConfigId) -> LaunchpadResult<Arc<LaunchConfig>> {
        self.configs.read().get(id)
    }

    pub fn platform(&self, id: &PlatformId) -> LaunchpadResult<Arc<PlatformConfig>> {
        self.platforms.read().get(id)
    }

    // =========================================================================
    // Pools
    // =========================================================================

    /// Open a pool, optionally buying in the same step
    ///
    /// If the initial buy fails the pool is not registered.
    pub fn create_pool(
        &self,
        identity: &impl IdentityProvider,
        config_id: &ConfigId,
        platform_id: &PlatformId,
        params: PoolParams,
        initial_buy: Option<InitialBuy>,
        now: u64,
    ) -> LaunchpadResult<Transition<PoolId>> {
        let creator = identity.identity();
        let config = self.launch_config(config_id)?;
        let platform = self.platform(platform_id)?;

        let mut pool = LaunchpadPool::create(&config, &platform, creator, params, now)?;
        let mut events = vec![LaunchpadEvent::PoolCreated {
            pool_id: pool.id(),
            creator,
            mint_a: pool.mint_a(),
            mint_b: pool.mint_b(),
            funding_goal: pool.funding_goal(),
            total_sell_allocation: pool.total_sell_allocation(),
            timestamp: now,
        }];
        if let Some(buy) = initial_buy {
            let quote = pool.apply_buy(buy.quote_in, buy.min_base_out, now)?;
            events.extend(trade_events(&pool, creator, &quote, PoolStatus::Active, now));
        }

        let pool_id = pool.id();
        let prepared = vec![StateTransition::prepare(AccountKey::Pool(pool_id), &pool, events)?];
        {
            let mut pools = self.pools.write();
            if pools.contains_key(&pool_id) {
                return Err(LaunchpadError::DuplicatePool(pool_id.to_string()));
            }
            pools.insert(pool_id, Arc::new(Mutex::new(pool)));
            // Indexed before any trade on the new pool can take its lock
            self.index(&prepared);
        }

        info!("Pool {} created by {} on config {}", pool_id, creator, config_id);
        Ok(Transition { output: pool_id, prepared })
    }

    /// Copy of the pool's current state
    pub fn pool(&self, pool_id: &PoolId) -> LaunchpadResult<LaunchpadPool> {
        Ok(self.pool_handle(pool_id)?.lock().clone())
    }

    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }

    pub fn graduation_progress(&self, pool_id: &PoolId) -> LaunchpadResult<GraduationProgress> {
        Ok(self.pool_handle(pool_id)?.lock().graduation_progress())
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    pub fn quote_buy(&self, pool_id: &PoolId, quote_in: u64) -> LaunchpadResult<TradeQuote> {
        let (status, snapshot) = {
            let pool = self.pool_handle(pool_id)?;
            let pool = pool.lock();
            (pool.status(), pool.snapshot())
        };
        if !status.can_trade() {
            return Err(LaunchpadError::PoolClosed(status));
        }
        snapshot.quote_buy(quote_in)
    }

    pub fn quote_sell(&self, pool_id: &PoolId, base_in: u64) -> LaunchpadResult<TradeQuote> {
        let (status, snapshot) = {
            let pool = self.pool_handle(pool_id)?;
            let pool = pool.lock();
            (pool.status(), pool.snapshot())
        };
        if !status.can_trade() {
            return Err(LaunchpadError::PoolClosed(status));
        }
        snapshot.quote_sell(base_in)
    }

    /// `min_base_out` for a buy, at the configured default slippage
    pub fn min_base_out(&self, pool_id: &PoolId, quote_in: u64) -> LaunchpadResult<u64> {
        let quote = self.quote_buy(pool_id, quote_in)?;
        min_output_with_slippage(quote.output_amount, self.settings.default_slippage_bps)
    }

    /// `min_quote_out` for a sell, at the configured default slippage
    pub fn min_quote_out(&self, pool_id: &PoolId, base_in: u64) -> LaunchpadResult<u64> {
        let quote = self.quote_sell(pool_id, base_in)?;
        min_output_with_slippage(quote.output_amount, self.settings.default_slippage_bps)
    }

    // =========================================================================
    // Trades
    // =========================================================================

    pub fn apply_buy(
        &self,
        identity: &impl IdentityProvider,
        pool_id: &PoolId,
        quote_in: u64,
        min_base_out: u64,
        now: u64,
    ) -> LaunchpadResult<Transition<TradeQuote>> {
        let buyer = identity.identity();
        let handle = self.pool_handle(pool_id)?;
        let (quote, prepared) = {
            let mut pool = handle.lock();
            let mut next = pool.clone();
            let quote = next
                .apply_buy(quote_in, min_base_out, now)
                .map_err(|e| log_rejection(pool_id, "buy", e))?;
            let events = trade_events(&next, buyer, &quote, pool.status(), now);
            let prepared = vec![StateTransition::prepare(AccountKey::Pool(*pool_id), &next, events)?];

            *pool = next;
            self.index(&prepared);
            (quote, prepared)
        };

        debug!(
            "Buy on pool {}: {} quote -> {} base (fee {})",
            pool_id, quote.input_amount, quote.output_amount, quote.fee_amount
        );
        Ok(Transition { output: quote, prepared })
    }

    pub fn apply_sell(
        &self,
        identity: &impl IdentityProvider,
        pool_id: &PoolId,
        base_in: u64,
        min_quote_out: u64,
        now: u64,
    ) -> LaunchpadResult<Transition<TradeQuote>> {
        let seller = identity.identity();
        let handle = self.pool_handle(pool_id)?;
        let (quote, prepared) = {
            let mut pool = handle.lock();
            let mut next = pool.clone();
            let quote = next
                .apply_sell(base_in, min_quote_out)
                .map_err(|e| log_rejection(pool_id, "sell", e))?;
            let events = trade_events(&next, seller, &quote, pool.status(), now);
            let prepared = vec![StateTransition::prepare(AccountKey::Pool(*pool_id), &next, events)?];

            *pool = next;
            self.index(&prepared);
            (quote, prepared)
        };

        debug!(
            "Sell on pool {}: {} base -> {} quote (fee {})",
            pool_id, quote.input_amount, quote.output_amount, quote.fee_amount
        );
        Ok(Transition { output: quote, prepared })
    }

    // =========================================================================
    // Migration
    // =========================================================================

    /// Migrate a graduated pool and register its vesting grants
    pub fn migrate(&self, pool_id: &PoolId, now: u64) -> LaunchpadResult<Transition<MigrationResult>> {
        let handle = self.pool_handle(pool_id)?;
        let platform_id = handle.lock().platform_id();
        let platform = self.platform(&platform_id)?;

        let (result, prepared) = {
            let mut pool = handle.lock();
            let mut next = pool.clone();
            let result = self.executor.migrate(&mut next, &platform, now)?;

            // Grants are registered on a staged copy so a failure leaves both
            // the pool and the ledger untouched
            let mut vesting = self.vesting.lock();
            let mut staged = vesting.clone();
            let mut vesting_transitions = Vec::with_capacity(result.vesting.len());
            for grant in &result.vesting {
                let (record, event) = register_grant(&mut staged, *pool_id, *grant, now)?;
                vesting_transitions.push(StateTransition::prepare(
                    AccountKey::Vesting(record.id),
                    &record,
                    vec![event],
                )?);
            }

            let event = LaunchpadEvent::Migrated {
                pool_id: *pool_id,
                lp_total: result.lp_total,
                platform_share: result.platform_share,
                creator_share: result.creator_share,
                burn_share: result.burn_share,
                fee_claim_right: result.fee_claim_right,
                timestamp: now,
            };
            let mut prepared =
                vec![StateTransition::prepare(AccountKey::Pool(*pool_id), &next, vec![event])?];
            prepared.extend(vesting_transitions);

            *vesting = staged;
            *pool = next;
            self.index(&prepared);
            (result, prepared)
        };

        Ok(Transition { output: result, prepared })
    }

    // =========================================================================
    // Vesting
    // =========================================================================

    /// Lock `total_amount` for `beneficiary`, starting now; pool creator only
    #[allow(clippy::too_many_arguments)]
    pub fn schedule_vesting(
        &self,
        identity: &impl IdentityProvider,
        pool_id: &PoolId,
        beneficiary: Address,
        total_amount: u64,
        cliff_period: u64,
        unlock_period: u64,
        now: u64,
    ) -> LaunchpadResult<Transition<VestingId>> {
        let caller = identity.identity();
        let creator = self.pool_handle(pool_id)?.lock().creator();
        if caller != creator {
            return Err(LaunchpadError::Unauthorized(format!(
                "only the creator of pool {} may schedule vesting",
                pool_id
            )));
        }

        let grant = VestingGrant { beneficiary, total_amount, cliff_period, unlock_period };
        let mut vesting = self.vesting.lock();
        let mut staged = vesting.clone();
        let (record, event) = register_grant(&mut staged, *pool_id, grant, now)?;
        let prepared = vec![StateTransition::prepare(
            AccountKey::Vesting(record.id),
            &record,
            vec![event],
        )?];
        *vesting = staged;
        self.index(&prepared);
        drop(vesting);

        Ok(Transition { output: record.id, prepared })
    }

    /// Release whatever has vested; beneficiary only
    pub fn release_vesting(
        &self,
        identity: &impl IdentityProvider,
        vesting_id: &VestingId,
        now: u64,
    ) -> LaunchpadResult<Transition<u64>> {
        let caller = identity.identity();
        let (amount, prepared) = {
            let mut vesting = self.vesting.lock();
            let mut staged = vesting.clone();
            let amount = staged.release(vesting_id, &caller, now)?;
            let record = staged.get(vesting_id)?;
            let event = LaunchpadEvent::VestingReleased {
                pool_id: record.pool_id,
                vesting_id: *vesting_id,
                beneficiary: caller,
                amount,
                timestamp: now,
            };
            let prepared = vec![StateTransition::prepare(
                AccountKey::Vesting(*vesting_id),
                record,
                vec![event],
            )?];

            *vesting = staged;
            self.index(&prepared);
            (amount, prepared)
        };

        debug!("Vesting {} released {} to {}", vesting_id, amount, caller);
        Ok(Transition { output: amount, prepared })
    }

    pub fn vesting(&self, vesting_id: &VestingId) -> LaunchpadResult<VestingRecord> {
        self.vesting.lock().get(vesting_id).cloned()
    }

    pub fn vesting_for_beneficiary(&self, beneficiary: &Address) -> Vec<VestingRecord> {
        self.vesting.lock().for_beneficiary(beneficiary).into_iter().cloned().collect()
    }

    // =========================================================================
    // Fees
    // =========================================================================

    /// Pay out every fee bucket `identity` is entitled to on this pool
    pub fn claim_fees(
        &self,
        identity: &impl IdentityProvider,
        pool_id: &PoolId,
        now: u64,
    ) -> LaunchpadResult<Transition<FeeClaim>> {
        let caller = identity.identity();
        let handle = self.pool_handle(pool_id)?;
        let (config_id, platform_id) = {
            let pool = handle.lock();
            (pool.config_id(), pool.platform_id())
        };
        let config = self.launch_config(&config_id)?;
        let platform = self.platform(&platform_id)?;

        let (claim, prepared) = {
            let mut pool = handle.lock();
            let mut roles = Vec::new();
            if caller == config.protocol_fee_owner {
                roles.push(FeeRole::Protocol);
            }
            if platform.may_claim_fees(&caller) {
                roles.push(FeeRole::Platform);
            }
            if caller == pool.creator() {
                roles.push(FeeRole::Creator);
            }
            if roles.is_empty() {
                return Err(LaunchpadError::Unauthorized(format!(
                    "{} holds no fee role on pool {}",
                    caller, pool_id
                )));
            }

            let accrued = pool.accrued_fees();
            let claimable: u64 = roles
                .iter()
                .map(|role| match role {
                    FeeRole::Protocol => accrued.protocol,
                    FeeRole::Platform => accrued.platform,
                    FeeRole::Creator => accrued.creator,
                })
                .sum();
            if claimable == 0 {
                return Err(LaunchpadError::NothingToRelease);
            }

            let mut next = pool.clone();
            let mut claim =
                FeeClaim { pool_id: *pool_id, claimant: caller, protocol: 0, platform: 0, creator: 0 };
            for role in roles {
                let amount = next.take_fees(role);
                match role {
                    FeeRole::Protocol => claim.protocol = amount,
                    FeeRole::Platform => claim.platform = amount,
                    FeeRole::Creator => claim.creator = amount,
                }
            }
            let event = LaunchpadEvent::FeesClaimed {
                pool_id: *pool_id,
                claimant: caller,
                amount: claim.total(),
                timestamp: now,
            };
            let prepared =
                vec![StateTransition::prepare(AccountKey::Pool(*pool_id), &next, vec![event])?];

            *pool = next;
            self.index(&prepared);
            (claim, prepared)
        };

        info!("{} claimed {} in fees from pool {}", caller, claim.total(), pool_id);
        Ok(Transition { output: claim, prepared })
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn events_for_pool(&self, pool_id: &PoolId) -> Vec<LaunchpadEvent> {
        self.indexer.read().pool_events(pool_id).into_iter().cloned().collect()
    }

    // =========================================================================
    // Ledger hydration
    // =========================================================================

    pub fn load_launch_config(
        &self,
        reader: &impl LedgerReader,
        id: &ConfigId,
    ) -> LaunchpadResult<Arc<LaunchConfig>> {
        let config: LaunchConfig = reader.load(&AccountKey::LaunchConfig(*id))?;
        if &config.id != id {
            return Err(LaunchpadError::Codec(format!("account {} holds config {}", id, config.id)));
        }
        self.configs.write().insert(config)
    }

    pub fn load_platform(
        &self,
        reader: &impl LedgerReader,
        id: &PlatformId,
    ) -> LaunchpadResult<Arc<PlatformConfig>> {
        let platform: PlatformConfig = reader.load(&AccountKey::Platform(*id))?;
        if &platform.id != id {
            return Err(LaunchpadError::Codec(format!(
                "account {} holds platform {}",
                id, platform.id
            )));
        }
        self.platforms.write().insert(platform)
    }

    /// Load a pool; its config and platform must already be loaded
    pub fn load_pool(&self, reader: &impl LedgerReader, id: &PoolId) -> LaunchpadResult<PoolId> {
        let pool: LaunchpadPool = reader.load(&AccountKey::Pool(*id))?;
        if &pool.id() != id {
            return Err(LaunchpadError::Codec(format!("account {} holds pool {}", id, pool.id())));
        }
        pool.validate()
            .map_err(|e| LaunchpadError::Codec(format!("account {} rejected: {}", id, e)))?;
        self.launch_config(&pool.config_id())?;
        self.platform(&pool.platform_id())?;

        let mut pools = self.pools.write();
        if pools.contains_key(id) {
            return Err(LaunchpadError::DuplicatePool(id.to_string()));
        }
        pools.insert(*id, Arc::new(Mutex::new(pool)));
        debug!("Pool {} loaded from ledger", id);
        Ok(*id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn pool_handle(&self, pool_id: &PoolId) -> LaunchpadResult<PoolHandle> {
        self.pools
            .read()
            .get(pool_id)
            .cloned()
            .ok_or_else(|| LaunchpadError::NotFound(format!("pool {}", pool_id)))
    }

    fn index(&self, prepared: &[StateTransition]) {
        let mut indexer = self.indexer.write();
        for transition in prepared {
            for event in &transition.events {
                indexer.index_event(event.clone());
            }
        }
    }
}

/// Register a grant and build its record and event
fn register_grant(
    ledger: &mut VestingLedger,
    pool_id: PoolId,
    grant: VestingGrant,
    now: u64,
) -> LaunchpadResult<(VestingRecord, LaunchpadEvent)> {
    let id = ledger.register(pool_id, grant, now)?;
    let record = ledger.get(&id)?.clone();
    let event = LaunchpadEvent::VestingScheduled {
        pool_id,
        vesting_id: id,
        beneficiary: grant.beneficiary,
        total_amount: grant.total_amount,
        timestamp: now,
    };
    Ok((record, event))
}

/// Events for an applied trade, including graduation if it happened
fn trade_events(
    pool: &LaunchpadPool,
    trader: Address,
    quote: &TradeQuote,
    status_before: PoolStatus,
    now: u64,
) -> Vec<LaunchpadEvent> {
    let mut events = vec![match quote.direction {
        TradeDirection::Buy => LaunchpadEvent::TokensPurchased {
            pool_id: pool.id(),
            buyer: trader,
            quote_in: quote.input_amount,
            base_out: quote.output_amount,
            fee: quote.fee_amount,
            raised_quote: pool.raised_quote(),
            timestamp: now,
        },
        TradeDirection::Sell => LaunchpadEvent::TokensSold {
            pool_id: pool.id(),
            seller: trader,
            base_in: quote.input_amount,
            quote_out: quote.output_amount,
            fee: quote.fee_amount,
            raised_quote: pool.raised_quote(),
            timestamp: now,
        },
    }];
    if status_before == PoolStatus::Active && pool.status() == PoolStatus::Graduated {
        info!(
            "Pool {} graduated: raised {} of goal {}",
            pool.id(),
            pool.raised_quote(),
            pool.funding_goal()
        );
        events.push(LaunchpadEvent::Graduated {
            pool_id: pool.id(),
            raised_quote: pool.raised_quote(),
            sold_base: pool.sold_base(),
            timestamp: now,
        });
    }
    events
}

fn log_rejection(pool_id: &PoolId, side: &str, error: LaunchpadError) -> LaunchpadError {
    if let LaunchpadError::SlippageExceeded { bound, quoted } = &error {
        warn!("Rejected {} on pool {}: bound {}, quoted {}", side, pool_id, bound, quoted);
    }
    error
}
