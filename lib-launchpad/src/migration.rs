//! Migration Executor
//!
//! One-time conversion of a graduated pool's reserves into constant-product
//! liquidity, followed by a three-way split of the LP units.
//!
//! # Split rule
//!
//! Platform and creator shares are floored; the burn share absorbs the
//! rounding remainder. The three shares always sum to `lp_total` exactly.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::math::{integer_sqrt, mul_div_floor, to_u64};
use crate::pool::{CreatorFeeMode, LaunchpadPool, PoolStatus};
use crate::primitives::{Address, PoolId, SCALE_DENOMINATOR};
use crate::registry::{MigrationScale, PlatformConfig};
use crate::vesting::VestingGrant;

/// Liquidity units locked forever by the default deposit rule
pub const DEFAULT_LOCKED_LIQUIDITY: u64 = 100;

/// Deposit rule of the destination constant-product pool
///
/// The AMM is external; this is the only thing the core needs to know about it.
pub trait LiquidityDepositRule: Send + Sync {
    /// Liquidity units minted for depositing `base` and `quote`
    fn liquidity_for(&self, base: u64, quote: u64) -> LaunchpadResult<u64>;
}

/// Initial deposit into an empty constant-product pool:
/// `sqrt(base * quote) - locked_liquidity`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductDeposit {
    pub locked_liquidity: u64,
}

impl Default for ConstantProductDeposit {
    fn default() -> Self {
        Self { locked_liquidity: DEFAULT_LOCKED_LIQUIDITY }
    }
}

impl LiquidityDepositRule for ConstantProductDeposit {
    fn liquidity_for(&self, base: u64, quote: u64) -> LaunchpadResult<u64> {
        let root = to_u64(integer_sqrt(base as u128 * quote as u128))?;
        match root.checked_sub(self.locked_liquidity) {
            Some(lp) if lp > 0 => Ok(lp),
            _ => Err(LaunchpadError::Validation(format!(
                "deposit of {} base / {} quote is below the locked liquidity {}",
                base, quote, self.locked_liquidity
            ))),
        }
    }
}

/// LP units split three ways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpSplit {
    pub platform: u64,
    pub creator: u64,
    pub burn: u64,
}

impl LpSplit {
    pub fn total(&self) -> u64 {
        self.platform + self.creator + self.burn
    }
}

/// Split `lp_total` by a parts-per-million scale; burn takes the remainder
pub fn split_liquidity(lp_total: u64, scale: &MigrationScale) -> LaunchpadResult<LpSplit> {
    scale.validate()?;
    let denominator = SCALE_DENOMINATOR as u128;
    let platform = to_u64(mul_div_floor(lp_total as u128, scale.platform as u128, denominator)?)?;
    let creator = to_u64(mul_div_floor(lp_total as u128, scale.creator as u128, denominator)?)?;
    let burn = lp_total - platform - creator;
    Ok(LpSplit { platform, creator, burn })
}

/// Outcome of migrating one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub pool_id: PoolId,
    /// Base deposited into the constant-product pool
    pub base_deposit: u64,
    /// Quote deposited into the constant-product pool
    pub quote_deposit: u64,
    pub lp_total: u64,
    pub platform_share: u64,
    pub creator_share: u64,
    pub burn_share: u64,
    /// Receives the platform's locked LP share
    pub platform_recipient: Address,
    /// Receives the creator's locked LP share
    pub creator_recipient: Address,
    /// Creator holds a perpetual claim on post-migration trading fees
    pub fee_claim_right: bool,
    pub creator_fee_mode: CreatorFeeMode,
    /// Vesting grants to register, one per locked allocation
    pub vesting: Vec<VestingGrant>,
    pub migrated_at: u64,
}

impl MigrationResult {
    pub fn split(&self) -> LpSplit {
        LpSplit {
            platform: self.platform_share,
            creator: self.creator_share,
            burn: self.burn_share,
        }
    }
}

/// Executes migration against a pluggable deposit rule
#[derive(Debug, Clone, Default)]
pub struct MigrationExecutor<D = ConstantProductDeposit> {
    deposit_rule: D,
}

impl<D: LiquidityDepositRule> MigrationExecutor<D> {
    pub fn new(deposit_rule: D) -> Self {
        Self { deposit_rule }
    }

    pub fn deposit_rule(&self) -> &D {
        &self.deposit_rule
    }

    /// Migrate a graduated pool
    ///
    /// # Errors
    /// - `AlreadyMigrated`: the pool was migrated before; nothing changes
    /// - `NotGraduated`: the pool is still trading
    /// - `Validation`: `platform` is not the pool's platform, or the deposit
    ///   rule cannot mint any liquidity
    pub fn migrate(
        &self,
        pool: &mut LaunchpadPool,
        platform: &PlatformConfig,
        now: u64,
    ) -> LaunchpadResult<MigrationResult> {
        match pool.status() {
            PoolStatus::Migrated => return Err(LaunchpadError::AlreadyMigrated),
            PoolStatus::Active => return Err(LaunchpadError::NotGraduated),
            PoolStatus::Graduated => {}
        }
        if !pool.is_graduated() {
            return Err(LaunchpadError::NotGraduated);
        }
        if platform.id != pool.platform_id() {
            return Err(LaunchpadError::Validation(format!(
                "platform {} does not own pool {}",
                platform.id, pool.id()
            )));
        }

        let (base_deposit, quote_deposit) = pool.migration_reserves()?;
        let lp_total = self.deposit_rule.liquidity_for(base_deposit, quote_deposit)?;
        let split = split_liquidity(lp_total, &platform.migration_scale)?;

        let vesting = if pool.vesting().locked_amount > 0 {
            vec![VestingGrant {
                beneficiary: pool.creator(),
                total_amount: pool.vesting().locked_amount,
                cliff_period: pool.vesting().cliff_period,
                unlock_period: pool.vesting().unlock_period,
            }]
        } else {
            Vec::new()
        };

        let result = MigrationResult {
            pool_id: pool.id(),
            base_deposit,
            quote_deposit,
            lp_total,
            platform_share: split.platform,
            creator_share: split.creator,
            burn_share: split.burn,
            platform_recipient: platform.fee_recipients.lock_nft_wallet,
            creator_recipient: pool.creator(),
            fee_claim_right: pool.creator_fee_mode() != CreatorFeeMode::None,
            creator_fee_mode: pool.creator_fee_mode(),
            vesting,
            migrated_at: now,
        };

        pool.record_migration(result.clone(), now);

        info!(
            "Pool {} migrated: {} base / {} quote -> {} LP (platform {}, creator {}, burn {})",
            pool.id(), base_deposit, quote_deposit, lp_total, split.platform, split.creator, split.burn
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::tests::{addr, free_pool, test_config, test_params, test_platform, GOAL};
    use crate::pool::VestingTerms;

    fn scale() -> MigrationScale {
        MigrationScale::new(800_000, 150_000, 50_000)
    }

    fn graduated_pool() -> LaunchpadPool {
        let mut pool = free_pool();
        pool.apply_buy(GOAL, 0, 5).unwrap();
        pool
    }

    #[test]
    fn test_split_remainder_goes_to_burn() {
        let split = split_liquidity(1_000_007, &scale()).unwrap();
        assert_eq!(split.platform, 800_005);
        assert_eq!(split.creator, 150_001);
        assert_eq!(split.burn, 50_001);
        assert_eq!(split.total(), 1_000_007);
    }

    #[test]
    fn test_split_edge_totals() {
        assert_eq!(split_liquidity(0, &scale()).unwrap().total(), 0);
        let split = split_liquidity(1, &scale()).unwrap();
        assert_eq!((split.platform, split.creator, split.burn), (0, 0, 1));
        assert_eq!(split_liquidity(u64::MAX, &scale()).unwrap().total(), u64::MAX);
    }

    #[test]
    fn test_split_rejects_invalid_scale() {
        let result = split_liquidity(100, &MigrationScale::new(1, 1, 1));
        assert!(matches!(result, Err(LaunchpadError::Validation(_))));
    }

    #[test]
    fn test_constant_product_deposit() {
        let rule = ConstantProductDeposit::default();
        assert_eq!(rule.liquidity_for(1_000_000, 1_000_000).unwrap(), 1_000_000 - 100);
        assert!(rule.liquidity_for(100, 100).is_err());
        assert!(rule.liquidity_for(0, 1_000_000).is_err());
    }

    #[test]
    fn test_migrate_graduated_pool() {
        let mut pool = graduated_pool();
        let executor = MigrationExecutor::<ConstantProductDeposit>::default();
        let result = executor.migrate(&mut pool, &test_platform(0, 0), 10).unwrap();

        assert_eq!(pool.status(), PoolStatus::Migrated);
        assert_eq!(pool.migrated_at(), Some(10));
        assert_eq!(pool.migration(), Some(&result));
        pool.validate().unwrap();
        assert_eq!(result.quote_deposit, GOAL);
        assert_eq!(result.split().total(), result.lp_total);
        assert!(result.fee_claim_right);
        assert!(result.vesting.is_empty());
    }

    #[test]
    fn test_migrate_active_pool_fails() {
        let mut pool = free_pool();
        let executor = MigrationExecutor::<ConstantProductDeposit>::default();
        assert_eq!(
            executor.migrate(&mut pool, &test_platform(0, 0), 10),
            Err(LaunchpadError::NotGraduated)
        );
    }

    #[test]
    fn test_migrate_twice_fails_without_change() {
        let mut pool = graduated_pool();
        let executor = MigrationExecutor::<ConstantProductDeposit>::default();
        executor.migrate(&mut pool, &test_platform(0, 0), 10).unwrap();
        let after_first = pool.clone();

        assert_eq!(
            executor.migrate(&mut pool, &test_platform(0, 0), 20),
            Err(LaunchpadError::AlreadyMigrated)
        );
        assert_eq!(pool, after_first);
    }

    #[test]
    fn test_locked_allocation_becomes_vesting_grant() {
        let mut params = test_params();
        params.vesting = VestingTerms { locked_amount: 50_000_000_000_000, cliff_period: 100, unlock_period: 200 };
        params.creator_fee_mode = CreatorFeeMode::None;
        let mut pool =
            LaunchpadPool::create(&test_config(0), &test_platform(0, 0), addr(0xC0), params, 0).unwrap();
        pool.apply_buy(GOAL, 0, 5).unwrap();

        let executor = MigrationExecutor::<ConstantProductDeposit>::default();
        let result = executor.migrate(&mut pool, &test_platform(0, 0), 10).unwrap();

        assert!(!result.fee_claim_right);
        assert_eq!(
            result.vesting,
            vec![VestingGrant {
                beneficiary: addr(0xC0),
                total_amount: 50_000_000_000_000,
                cliff_period: 100,
                unlock_period: 200,
            }]
        );
        assert_eq!(result.base_deposit, pool.total_supply() - pool.sold_base() - 50_000_000_000_000);
    }
}
