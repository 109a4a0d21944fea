//! Pool Lifecycle
//!
//! State machine for a single launchpad sale:
//!
//! ```text
//!   ┌────────┐   raised == goal    ┌───────────┐   migrate()    ┌──────────┐
//!   │ Active │ ──────────────────▶ │ Graduated │ ─────────────▶ │ Migrated │
//!   └────────┘  (same buy call)    └───────────┘  (exactly once) └──────────┘
//! ```
//!
//! # Invariants
//! - `raised_quote <= funding_goal` and `sold_base <= total_sell_allocation`, always
//! - Status only moves forward
//! - Every mutation validates first and commits last; a failed call leaves the
//!   pool untouched

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::curve::{CurveParams, CurveSnapshot, FeeBreakdown, FeeSchedule, TradeQuote};
use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::migration::MigrationResult;
use crate::primitives::{Address, ConfigId, PlatformId, PoolId, BPS_DENOMINATOR, SCALE_DENOMINATOR};
use crate::registry::{LaunchConfig, PlatformConfig};

/// Pool lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Curve trading open
    Active,
    /// Goal reached, curve frozen, awaiting migration
    Graduated,
    /// Reserves moved into the constant-product pool
    Migrated,
}

impl PoolStatus {
    pub fn can_trade(&self) -> bool {
        matches!(self, PoolStatus::Active)
    }

    pub fn is_graduated(&self) -> bool {
        matches!(self, PoolStatus::Graduated | PoolStatus::Migrated)
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolStatus::Active => write!(f, "active"),
            PoolStatus::Graduated => write!(f, "graduated"),
            PoolStatus::Migrated => write!(f, "migrated"),
        }
    }
}

/// Which side of post-migration trading the creator earns fees on
///
/// `None` also disables the creator fee on curve trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatorFeeMode {
    None,
    #[default]
    OnQuoteOnly,
    OnBoth,
}

/// Vesting terms for the pre-sale locked allocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingTerms {
    pub locked_amount: u64,
    pub cliff_period: u64,
    pub unlock_period: u64,
}

/// Creator-supplied sale parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    /// Sale token
    pub mint_a: Address,
    /// Quote asset; must match the launch config
    pub mint_b: Address,
    pub base_decimals: u8,
    pub total_supply: u64,
    pub total_sell_allocation: u64,
    pub funding_goal: u64,
    pub vesting: VestingTerms,
    pub creator_fee_mode: CreatorFeeMode,
}

/// Fees accrued on curve trades, not yet claimed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccruedFees {
    pub protocol: u64,
    pub platform: u64,
    pub creator: u64,
}

impl AccruedFees {
    /// Accrued fees after adding `fees`
    fn with(&self, fees: &FeeBreakdown) -> LaunchpadResult<Self> {
        Ok(Self {
            protocol: self.protocol.checked_add(fees.protocol).ok_or(LaunchpadError::Overflow)?,
            platform: self.platform.checked_add(fees.platform).ok_or(LaunchpadError::Overflow)?,
            creator: self.creator.checked_add(fees.creator).ok_or(LaunchpadError::Overflow)?,
        })
    }

    pub fn total(&self) -> u64 {
        self.protocol.saturating_add(self.platform).saturating_add(self.creator)
    }
}

/// Fee recipient role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeRole {
    Protocol,
    Platform,
    Creator,
}

/// Snapshot of how far a pool is from its funding goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationProgress {
    pub goal: u64,
    pub raised: u64,
    pub remaining: u64,
    /// Raised / goal in basis points, capped at 10_000
    pub progress_bps: u32,
    pub status: PoolStatus,
}

/// One token sale
///
/// Sale parameters are fixed at `create` and only readable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadPool {
    // === Identity ===
    id: PoolId,
    mint_a: Address,
    mint_b: Address,
    creator: Address,
    config_id: ConfigId,
    platform_id: PlatformId,
    base_decimals: u8,

    // === Sale parameters ===
    total_supply: u64,
    total_sell_allocation: u64,
    funding_goal: u64,
    vesting: VestingTerms,
    creator_fee_mode: CreatorFeeMode,
    /// Quote withheld from the migration deposit
    migrate_fee: u64,
    curve: CurveParams,
    fees: FeeSchedule,

    // === Mutable state ===
    raised_quote: u64,
    sold_base: u64,
    status: PoolStatus,
    accrued_fees: AccruedFees,
    migration: Option<MigrationResult>,

    // === Timestamps ===
    created_at: u64,
    graduated_at: Option<u64>,
    migrated_at: Option<u64>,
}

impl LaunchpadPool {
    /// Validate sale parameters against the config and platform and open the pool
    pub fn create(
        config: &LaunchConfig,
        platform: &PlatformConfig,
        creator: Address,
        params: PoolParams,
        created_at: u64,
    ) -> LaunchpadResult<Self> {
        if params.mint_a.is_zero() || creator.is_zero() {
            return Err(LaunchpadError::Validation("mint and creator cannot be zero".into()));
        }
        if params.mint_a == params.mint_b {
            return Err(LaunchpadError::Validation("base and quote mints must differ".into()));
        }
        if params.mint_b != config.quote_mint {
            return Err(LaunchpadError::Validation(format!(
                "quote mint {} does not match launch config quote {}",
                params.mint_b, config.quote_mint
            )));
        }
        if params.funding_goal < config.min_funding_goal {
            return Err(LaunchpadError::Validation(format!(
                "funding goal {} below minimum {}",
                params.funding_goal, config.min_funding_goal
            )));
        }
        if params.funding_goal <= config.migrate_fee {
            return Err(LaunchpadError::Validation(format!(
                "funding goal {} does not cover migrate fee {}",
                params.funding_goal, config.migrate_fee
            )));
        }
        if params.total_sell_allocation > params.total_supply {
            return Err(LaunchpadError::Validation(format!(
                "sell allocation {} exceeds total supply {}",
                params.total_sell_allocation, params.total_supply
            )));
        }
        if params.total_supply < config.min_supply {
            return Err(LaunchpadError::Validation(format!(
                "total supply {} below minimum {}",
                params.total_supply, config.min_supply
            )));
        }

        let curve = CurveParams::derive(
            params.total_supply,
            params.total_sell_allocation,
            params.vesting.locked_amount,
            params.funding_goal,
        )?;

        let supply = params.total_supply;
        if exceeds_rate(params.vesting.locked_amount, supply, config.max_lock_rate) {
            return Err(LaunchpadError::Validation("locked amount exceeds max lock rate".into()));
        }
        if below_rate(params.total_sell_allocation, supply, config.min_sell_rate) {
            return Err(LaunchpadError::Validation("sell allocation below min sell rate".into()));
        }
        if below_rate(curve.migrate_allotment, supply, config.min_migrate_rate) {
            return Err(LaunchpadError::Validation(
                "migration allotment below min migrate rate".into(),
            ));
        }

        let creator_bps = match params.creator_fee_mode {
            CreatorFeeMode::None => 0,
            _ => platform.creator_fee_rate_bps,
        };
        let fees =
            FeeSchedule::new(config.trade_fee_rate_bps, platform.platform_fee_rate_bps, creator_bps)?;

        Ok(Self {
            id: PoolId::derive(&params.mint_a, &params.mint_b),
            mint_a: params.mint_a,
            mint_b: params.mint_b,
            creator,
            config_id: config.id,
            platform_id: platform.id,
            base_decimals: params.base_decimals,
            total_supply: params.total_supply,
            total_sell_allocation: params.total_sell_allocation,
            funding_goal: params.funding_goal,
            vesting: params.vesting,
            creator_fee_mode: params.creator_fee_mode,
            migrate_fee: config.migrate_fee,
            curve,
            fees,
            raised_quote: 0,
            sold_base: 0,
            status: PoolStatus::Active,
            accrued_fees: AccruedFees::default(),
            migration: None,
            created_at,
            graduated_at: None,
            migrated_at: None,
        })
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Copy of the curve state for pure quoting
    pub fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot {
            params: self.curve,
            fees: self.fees,
            raised_quote: self.raised_quote,
            sold_base: self.sold_base,
        }
    }

    pub fn quote_buy(&self, quote_in: u64) -> LaunchpadResult<TradeQuote> {
        self.require_active()?;
        self.snapshot().quote_buy(quote_in)
    }

    pub fn quote_sell(&self, base_in: u64) -> LaunchpadResult<TradeQuote> {
        self.require_active()?;
        self.snapshot().quote_sell(base_in)
    }

    // =========================================================================
    // Trades
    // =========================================================================

    /// Buy base with `quote_in`, requiring at least `min_base_out`
    ///
    /// Graduates the pool in the same step when the raise reaches the goal.
    pub fn apply_buy(
        &mut self,
        quote_in: u64,
        min_base_out: u64,
        now: u64,
    ) -> LaunchpadResult<TradeQuote> {
        let quote = self.quote_buy(quote_in)?;
        if quote.output_amount < min_base_out {
            return Err(LaunchpadError::SlippageExceeded {
                bound: min_base_out,
                quoted: quote.output_amount,
            });
        }
        let accrued_fees = self.accrued_fees.with(&quote.fees)?;

        self.raised_quote = quote.new_raised_quote;
        self.sold_base = quote.new_sold_base;
        self.accrued_fees = accrued_fees;
        if self.raised_quote == self.funding_goal {
            self.status = PoolStatus::Graduated;
            self.graduated_at = Some(now);
        }

        Ok(quote)
    }

    /// Sell `base_in` back to the curve, requiring at least `min_quote_out`
    pub fn apply_sell(
        &mut self,
        base_in: u64,
        min_quote_out: u64,
    ) -> LaunchpadResult<TradeQuote> {
        let quote = self.quote_sell(base_in)?;
        if quote.output_amount < min_quote_out {
            return Err(LaunchpadError::SlippageExceeded {
                bound: min_quote_out,
                quoted: quote.output_amount,
            });
        }
        let accrued_fees = self.accrued_fees.with(&quote.fees)?;

        self.raised_quote = quote.new_raised_quote;
        self.sold_base = quote.new_sold_base;
        self.accrued_fees = accrued_fees;

        Ok(quote)
    }

    // =========================================================================
    // Graduation / migration
    // =========================================================================

    /// Graduation predicate: the raise has reached the goal
    pub fn is_graduated(&self) -> bool {
        self.raised_quote >= self.funding_goal
    }

    pub fn graduation_progress(&self) -> GraduationProgress {
        let progress_bps = (self.raised_quote as u128 * BPS_DENOMINATOR as u128)
            .checked_div(self.funding_goal as u128)
            .map_or(BPS_DENOMINATOR as u128, |bps| bps.min(BPS_DENOMINATOR as u128))
            as u32;
        GraduationProgress {
            goal: self.funding_goal,
            raised: self.raised_quote,
            remaining: self.funding_goal.saturating_sub(self.raised_quote),
            progress_bps,
            status: self.status,
        }
    }

    /// `(base, quote)` deposited into the constant-product pool at migration
    ///
    /// Base is everything neither sold nor locked. Quote is the raise minus
    /// the config's migrate fee.
    pub fn migration_reserves(&self) -> LaunchpadResult<(u64, u64)> {
        let base = self
            .total_supply
            .checked_sub(self.sold_base)
            .and_then(|rest| rest.checked_sub(self.vesting.locked_amount))
            .ok_or(LaunchpadError::Overflow)?;
        let quote = self.raised_quote.checked_sub(self.migrate_fee).ok_or(LaunchpadError::Overflow)?;
        Ok((base, quote))
    }

    pub(crate) fn record_migration(&mut self, result: MigrationResult, now: u64) {
        self.status = PoolStatus::Migrated;
        self.migration = Some(result);
        self.migrated_at = Some(now);
    }

    // =========================================================================
    // Fees
    // =========================================================================

    /// Remove and return the fees accrued for `role`
    pub fn take_fees(&mut self, role: FeeRole) -> u64 {
        let slot = match role {
            FeeRole::Protocol => &mut self.accrued_fees.protocol,
            FeeRole::Platform => &mut self.accrued_fees.platform,
            FeeRole::Creator => &mut self.accrued_fees.creator,
        };
        std::mem::take(slot)
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Re-check every invariant `create` and the trade paths maintain
    ///
    /// Used on pools decoded from ledger bytes, which are not trusted.
    pub fn validate(&self) -> LaunchpadResult<()> {
        if self.id != PoolId::derive(&self.mint_a, &self.mint_b) {
            return Err(LaunchpadError::Validation(format!(
                "pool id {} does not match its mints",
                self.id
            )));
        }
        if self.funding_goal == 0 || self.funding_goal <= self.migrate_fee {
            return Err(LaunchpadError::Validation(format!(
                "funding goal {} must be non-zero and above migrate fee {}",
                self.funding_goal, self.migrate_fee
            )));
        }
        let curve = CurveParams::derive(
            self.total_supply,
            self.total_sell_allocation,
            self.vesting.locked_amount,
            self.funding_goal,
        )?;
        if curve != self.curve {
            return Err(LaunchpadError::Validation(
                "curve parameters do not match the sale parameters".into(),
            ));
        }
        FeeSchedule::new(self.fees.protocol_bps, self.fees.platform_bps, self.fees.creator_bps)?;
        if self.raised_quote > self.funding_goal || self.sold_base > self.total_sell_allocation {
            return Err(LaunchpadError::Validation(format!(
                "pool state out of bounds: raised {} of {}, sold {} of {}",
                self.raised_quote, self.funding_goal, self.sold_base, self.total_sell_allocation
            )));
        }

        let consistent = match self.status {
            PoolStatus::Active => self.raised_quote < self.funding_goal && self.migration.is_none(),
            PoolStatus::Graduated => {
                self.raised_quote == self.funding_goal && self.migration.is_none()
            }
            PoolStatus::Migrated => {
                self.raised_quote == self.funding_goal && self.migration.is_some()
            }
        };
        if !consistent {
            return Err(LaunchpadError::Validation(format!(
                "status {} inconsistent with raised {} of {}",
                self.status, self.raised_quote, self.funding_goal
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn mint_a(&self) -> Address {
        self.mint_a
    }

    pub fn mint_b(&self) -> Address {
        self.mint_b
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    pub fn platform_id(&self) -> PlatformId {
        self.platform_id
    }

    pub fn base_decimals(&self) -> u8 {
        self.base_decimals
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn total_sell_allocation(&self) -> u64 {
        self.total_sell_allocation
    }

    pub fn funding_goal(&self) -> u64 {
        self.funding_goal
    }

    pub fn vesting(&self) -> VestingTerms {
        self.vesting
    }

    pub fn creator_fee_mode(&self) -> CreatorFeeMode {
        self.creator_fee_mode
    }

    pub fn migrate_fee(&self) -> u64 {
        self.migrate_fee
    }

    pub fn curve(&self) -> CurveParams {
        self.curve
    }

    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn raised_quote(&self) -> u64 {
        self.raised_quote
    }

    pub fn sold_base(&self) -> u64 {
        self.sold_base
    }

    pub fn status(&self) -> PoolStatus {
        self.status
    }

    pub fn accrued_fees(&self) -> AccruedFees {
        self.accrued_fees
    }

    pub fn migration(&self) -> Option<&MigrationResult> {
        self.migration.as_ref()
    }

    pub fn graduated_at(&self) -> Option<u64> {
        self.graduated_at
    }

    pub fn migrated_at(&self) -> Option<u64> {
        self.migrated_at
    }

    fn require_active(&self) -> LaunchpadResult<()> {
        if self.status.can_trade() {
            Ok(())
        } else {
            Err(LaunchpadError::PoolClosed(self.status))
        }
    }
}

/// `amount / supply > rate / 1_000_000`
fn exceeds_rate(amount: u64, supply: u64, rate: u32) -> bool {
    amount as u128 * SCALE_DENOMINATOR as u128 > supply as u128 * rate as u128
}

/// `amount / supply < rate / 1_000_000`
fn below_rate(amount: u64, supply: u64, rate: u32) -> bool {
    (amount as u128 * SCALE_DENOMINATOR as u128) < supply as u128 * rate as u128
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::launchpad::Launchpad;
    use crate::ledger::{AccountKey, InMemoryLedger, LedgerSubmitter, StateTransition, StaticIdentity};
    use crate::registry::{
        FeeRecipients, LaunchConfigParams, MigrationScale, PlatformMetadata, PlatformParams,
    };

    pub(crate) const SUPPLY: u64 = 1_000_000_000_000_000;
    pub(crate) const SELL: u64 = 793_100_000_000_000;
    pub(crate) const GOAL: u64 = 5_000_000_000;

    pub(crate) fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    pub(crate) fn quote_mint() -> Address {
        addr(0xB0)
    }

    pub(crate) fn test_config(fee_bps: u32) -> LaunchConfig {
        LaunchConfig::new(LaunchConfigParams::new(quote_mint(), 0, 9, 1_000_000_000, fee_bps, addr(0xF0)))
            .unwrap()
    }

    fn test_platform_params(platform_bps: u32, creator_bps: u32) -> PlatformParams {
        PlatformParams {
            fee_recipients: FeeRecipients {
                admin: addr(0xA0),
                claim_fee_wallet: addr(0xA1),
                lock_nft_wallet: addr(0xA2),
            },
            platform_fee_rate_bps: platform_bps,
            creator_fee_rate_bps: creator_bps,
            migration_scale: MigrationScale::new(800_000, 150_000, 50_000),
            metadata: PlatformMetadata::default(),
        }
    }

    pub(crate) fn test_platform(platform_bps: u32, creator_bps: u32) -> PlatformConfig {
        PlatformConfig::new(test_platform_params(platform_bps, creator_bps)).unwrap()
    }

    pub(crate) fn test_params() -> PoolParams {
        PoolParams {
            mint_a: addr(0x11),
            mint_b: quote_mint(),
            base_decimals: 6,
            total_supply: SUPPLY,
            total_sell_allocation: SELL,
            funding_goal: GOAL,
            vesting: VestingTerms::default(),
            creator_fee_mode: CreatorFeeMode::OnQuoteOnly,
        }
    }

    pub(crate) fn free_pool() -> LaunchpadPool {
        LaunchpadPool::create(&test_config(0), &test_platform(0, 0), addr(0xC0), test_params(), 0)
            .unwrap()
    }

    #[test]
    fn test_create_pool() {
        let pool = free_pool();
        assert_eq!(pool.status(), PoolStatus::Active);
        assert_eq!(pool.raised_quote(), 0);
        assert_eq!(pool.sold_base(), 0);
        assert_eq!(pool.id, PoolId::derive(&addr(0x11), &quote_mint()));
    }

    #[test]
    fn test_create_rejects_low_goal() {
        let mut params = test_params();
        params.funding_goal = 999_999_999;
        let result = LaunchpadPool::create(&test_config(0), &test_platform(0, 0), addr(0xC0), params, 0);
        assert!(matches!(result, Err(LaunchpadError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_sell_above_supply() {
        let mut params = test_params();
        params.total_sell_allocation = SUPPLY + 1;
        let result = LaunchpadPool::create(&test_config(0), &test_platform(0, 0), addr(0xC0), params, 0);
        assert!(matches!(result, Err(LaunchpadError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_wrong_quote_mint() {
        let mut params = test_params();
        params.mint_b = addr(0x22);
        let result = LaunchpadPool::create(&test_config(0), &test_platform(0, 0), addr(0xC0), params, 0);
        assert!(matches!(result, Err(LaunchpadError::Validation(_))));
    }

    #[test]
    fn test_create_enforces_lock_rate() {
        let mut config_params =
            LaunchConfigParams::new(quote_mint(), 0, 9, 1_000_000_000, 0, addr(0xF0));
        config_params.max_lock_rate = 100_000;
        let config = LaunchConfig::new(config_params).unwrap();

        let mut params = test_params();
        params.vesting.locked_amount = SUPPLY / 10 + 1;
        let result = LaunchpadPool::create(&config, &test_platform(0, 0), addr(0xC0), params, 0);
        assert!(matches!(result, Err(LaunchpadError::Validation(_))));

        let mut params = test_params();
        params.vesting.locked_amount = SUPPLY / 10;
        assert!(LaunchpadPool::create(&config, &test_platform(0, 0), addr(0xC0), params, 0).is_ok());
    }

    #[test]
    fn test_creator_fee_mode_none_disables_creator_fee() {
        let mut params = test_params();
        params.creator_fee_mode = CreatorFeeMode::None;
        let pool =
            LaunchpadPool::create(&test_config(25), &test_platform(100, 50), addr(0xC0), params, 0)
                .unwrap();
        assert_eq!(pool.fees.creator_bps, 0);
        assert_eq!(pool.fees.total_bps(), 125);
    }

    #[test]
    fn test_apply_buy_updates_state() {
        let mut pool = free_pool();
        let quote = pool.apply_buy(1_000_000_000, 0, 10).unwrap();

        assert_eq!(pool.raised_quote(), 1_000_000_000);
        assert_eq!(pool.sold_base(), quote.output_amount);
        assert_eq!(pool.status(), PoolStatus::Active);
        assert_eq!(pool.graduation_progress().progress_bps, 2_000);
    }

    #[test]
    fn test_apply_buy_slippage_leaves_state_unchanged() {
        let mut pool = free_pool();
        let quote = pool.quote_buy(1_000_000_000).unwrap();
        let before = pool.clone();

        let result = pool.apply_buy(1_000_000_000, quote.output_amount + 1, 10);
        assert_eq!(
            result,
            Err(LaunchpadError::SlippageExceeded {
                bound: quote.output_amount + 1,
                quoted: quote.output_amount
            })
        );
        assert_eq!(pool, before);
    }

    #[test]
    fn test_exact_fill_graduates_in_same_call() {
        let mut pool = free_pool();
        pool.apply_buy(GOAL - 1_000, 0, 1).unwrap();
        assert_eq!(pool.status(), PoolStatus::Active);

        pool.apply_buy(1_000, 0, 2).unwrap();
        assert_eq!(pool.status(), PoolStatus::Graduated);
        assert_eq!(pool.graduated_at(), Some(2));
        assert!(pool.is_graduated());
        assert!(pool.sold_base() <= SELL);
    }

    #[test]
    fn test_overshoot_is_rejected() {
        let mut pool = free_pool();
        pool.apply_buy(GOAL - 1_000, 0, 1).unwrap();

        let result = pool.apply_buy(1_001, 0, 2);
        assert_eq!(
            result,
            Err(LaunchpadError::CurveExhausted { requested: 1_001, remaining: 1_000 })
        );
        assert_eq!(pool.raised_quote(), GOAL - 1_000);
    }

    #[test]
    fn test_trading_closed_after_graduation() {
        let mut pool = free_pool();
        pool.apply_buy(GOAL, 0, 1).unwrap();

        assert_eq!(
            pool.apply_buy(1, 0, 2),
            Err(LaunchpadError::PoolClosed(PoolStatus::Graduated))
        );
        assert_eq!(
            pool.apply_sell(1, 0),
            Err(LaunchpadError::PoolClosed(PoolStatus::Graduated))
        );
    }

    #[test]
    fn test_apply_sell_returns_quote() {
        let mut pool = LaunchpadPool::create(
            &test_config(100),
            &test_platform(0, 0),
            addr(0xC0),
            test_params(),
            0,
        )
        .unwrap();
        let buy = pool.apply_buy(1_000_000_000, 0, 1).unwrap();
        let sell = pool.apply_sell(buy.output_amount, 0).unwrap();

        assert_eq!(pool.sold_base(), 0);
        assert!(sell.output_amount < buy.input_amount);
        assert!(pool.raised_quote() < 1_000);
        assert_eq!(pool.accrued_fees().protocol, buy.fee_amount + sell.fee_amount);
    }

    #[test]
    fn test_fees_accrue_and_are_taken_once() {
        let mut pool = LaunchpadPool::create(
            &test_config(25),
            &test_platform(100, 50),
            addr(0xC0),
            test_params(),
            0,
        )
        .unwrap();
        let quote = pool.apply_buy(1_000_000_000, 0, 1).unwrap();

        let accrued = pool.accrued_fees();
        assert_eq!(accrued.total(), quote.fee_amount);
        assert_eq!(pool.take_fees(FeeRole::Platform), accrued.platform);
        assert_eq!(pool.take_fees(FeeRole::Platform), 0);
        assert_eq!(pool.accrued_fees().creator, accrued.creator);
    }

    #[test]
    fn test_migration_reserves() {
        let mut pool = free_pool();
        pool.apply_buy(GOAL, 0, 1).unwrap();

        let (base, quote) = pool.migration_reserves().unwrap();
        assert_eq!(base, SUPPLY - pool.sold_base());
        assert_eq!(quote, GOAL);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PoolStatus::Active.to_string(), "active");
        assert!(PoolStatus::Migrated.is_graduated());
        assert!(!PoolStatus::Graduated.can_trade());
    }

    #[test]
    fn test_validate_accepts_honest_pools() {
        let mut pool = free_pool();
        pool.validate().unwrap();

        pool.apply_buy(1_000_000_000, 0, 1).unwrap();
        pool.validate().unwrap();

        pool.apply_buy(GOAL - 1_000_000_000, 0, 2).unwrap();
        assert_eq!(pool.status(), PoolStatus::Graduated);
        pool.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_corrupted_state() {
        let mut traded = free_pool();
        traded.apply_buy(1_000_000_000, 0, 1).unwrap();

        let corruptions: Vec<fn(&mut LaunchpadPool)> = vec![
            |pool: &mut LaunchpadPool| pool.funding_goal = 0,
            |pool: &mut LaunchpadPool| pool.raised_quote = GOAL + 1,
            |pool: &mut LaunchpadPool| pool.sold_base = SELL + 1,
            |pool: &mut LaunchpadPool| pool.fees.protocol_bps = 10_000,
            |pool: &mut LaunchpadPool| pool.curve.virtual_base += 1,
            |pool: &mut LaunchpadPool| pool.status = PoolStatus::Graduated,
            |pool: &mut LaunchpadPool| pool.status = PoolStatus::Migrated,
            |pool: &mut LaunchpadPool| pool.mint_a = addr(0x12),
        ];
        for (index, corrupt) in corruptions.into_iter().enumerate() {
            let mut pool = traded.clone();
            corrupt(&mut pool);
            assert!(
                matches!(pool.validate(), Err(LaunchpadError::Validation(_))),
                "corruption {} was accepted",
                index
            );
        }
    }

    #[test]
    fn test_progress_of_zero_goal_does_not_panic() {
        let mut pool = free_pool();
        pool.funding_goal = 0;
        let progress = pool.graduation_progress();
        assert_eq!(progress.progress_bps, BPS_DENOMINATOR as u32);
        assert_eq!(progress.remaining, 0);
    }

    #[test]
    fn test_load_rejects_corrupted_pool_account() {
        let launchpad = Launchpad::new();
        let config = launchpad
            .create_launch_config(
                LaunchConfigParams::new(quote_mint(), 0, 9, 1_000_000_000, 0, addr(0xF0)),
                0,
            )
            .unwrap()
            .output;
        let platform = launchpad
            .create_platform(&StaticIdentity(addr(0xA0)), test_platform_params(0, 0), 0)
            .unwrap()
            .output;

        let ledger = InMemoryLedger::new();
        let mut pool = LaunchpadPool::create(&config, &platform, addr(0xC0), test_params(), 0).unwrap();
        pool.sold_base = SELL + 1;
        let transition = StateTransition::prepare(AccountKey::Pool(pool.id), &pool, Vec::new()).unwrap();
        ledger.submit(&transition).unwrap();

        let result = launchpad.load_pool(&ledger, &pool.id);
        assert!(matches!(result, Err(LaunchpadError::Codec(_))));
        assert_eq!(launchpad.pool_count(), 0);

        pool.sold_base = 0;
        let transition = StateTransition::prepare(AccountKey::Pool(pool.id), &pool, Vec::new()).unwrap();
        ledger.submit(&transition).unwrap();
        assert_eq!(launchpad.load_pool(&ledger, &pool.id).unwrap(), pool.id);
    }
}
