//! Launchpad Settings
//!
//! Operator defaults loaded from TOML. Every field is optional.
//!
//! ```toml
//! default_slippage_bps = 100
//! locked_liquidity = 100
//!
//! [pool_defaults]
//! total_supply = 1000000000000000
//! total_sell_allocation = 793100000000000
//! funding_goal = 85000000000
//! base_decimals = 6
//! ```

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::migration::{ConstantProductDeposit, DEFAULT_LOCKED_LIQUIDITY};
use crate::pool::{CreatorFeeMode, PoolParams, VestingTerms};
use crate::primitives::{Address, Bps, BPS_DENOMINATOR};

/// Default sale shape for new pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDefaults {
    #[serde(default = "default_total_supply")]
    pub total_supply: u64,
    #[serde(default = "default_total_sell_allocation")]
    pub total_sell_allocation: u64,
    #[serde(default = "default_funding_goal")]
    pub funding_goal: u64,
    #[serde(default = "default_base_decimals")]
    pub base_decimals: u8,
    #[serde(default)]
    pub locked_amount: u64,
    #[serde(default)]
    pub cliff_period: u64,
    #[serde(default)]
    pub unlock_period: u64,
    #[serde(default)]
    pub creator_fee_mode: CreatorFeeMode,
}

impl Default for PoolDefaults {
    fn default() -> Self {
        Self {
            total_supply: default_total_supply(),
            total_sell_allocation: default_total_sell_allocation(),
            funding_goal: default_funding_goal(),
            base_decimals: default_base_decimals(),
            locked_amount: 0,
            cliff_period: 0,
            unlock_period: 0,
            creator_fee_mode: CreatorFeeMode::default(),
        }
    }
}

impl PoolDefaults {
    /// Pool parameters for a new sale of `mint_a` against `mint_b`
    pub fn to_params(&self, mint_a: Address, mint_b: Address) -> PoolParams {
        PoolParams {
            mint_a,
            mint_b,
            base_decimals: self.base_decimals,
            total_supply: self.total_supply,
            total_sell_allocation: self.total_sell_allocation,
            funding_goal: self.funding_goal,
            vesting: VestingTerms {
                locked_amount: self.locked_amount,
                cliff_period: self.cliff_period,
                unlock_period: self.unlock_period,
            },
            creator_fee_mode: self.creator_fee_mode,
        }
    }
}

fn default_total_supply() -> u64 {
    1_000_000_000_000_000
}

fn default_total_sell_allocation() -> u64 {
    793_100_000_000_000
}

fn default_funding_goal() -> u64 {
    85_000_000_000
}

fn default_base_decimals() -> u8 {
    6
}

fn default_slippage_bps() -> Bps {
    100
}

fn default_locked_liquidity() -> u64 {
    DEFAULT_LOCKED_LIQUIDITY
}

/// Top-level launchpad settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadSettings {
    #[serde(default)]
    pub pool_defaults: PoolDefaults,
    /// Slippage tolerance used to derive trade bounds (100 = 1%)
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: Bps,
    /// Liquidity units the deposit rule locks on migration
    #[serde(default = "default_locked_liquidity")]
    pub locked_liquidity: u64,
}

impl Default for LaunchpadSettings {
    fn default() -> Self {
        Self {
            pool_defaults: PoolDefaults::default(),
            default_slippage_bps: default_slippage_bps(),
            locked_liquidity: default_locked_liquidity(),
        }
    }
}

impl LaunchpadSettings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("Failed to parse launchpad settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let defaults = &self.pool_defaults;
        ensure!(
            self.default_slippage_bps as u64 <= BPS_DENOMINATOR,
            "default_slippage_bps {} exceeds {}",
            self.default_slippage_bps,
            BPS_DENOMINATOR
        );
        ensure!(defaults.funding_goal > 0, "pool_defaults.funding_goal must be non-zero");
        ensure!(
            defaults.total_sell_allocation <= defaults.total_supply,
            "pool_defaults.total_sell_allocation exceeds total_supply"
        );
        ensure!(
            defaults.total_sell_allocation.saturating_add(defaults.locked_amount)
                < defaults.total_supply,
            "pool_defaults leave nothing for the migration pool"
        );
        Ok(())
    }

    /// Deposit rule configured by these settings
    pub fn deposit_rule(&self) -> ConstantProductDeposit {
        ConstantProductDeposit { locked_liquidity: self.locked_liquidity }
    }
}
