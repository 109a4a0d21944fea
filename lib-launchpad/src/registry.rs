//! Config and Platform Registries
//!
//! Sale configuration (`LaunchConfig`) is keyed by quote asset and curve index.
//! Platform configuration (`PlatformConfig`) is keyed by its admin identity.
//! Both are validated once, stored behind `Arc`, and never mutated afterwards:
//! pools and quotes read them freely.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::primitives::{Address, Bps, ConfigId, PlatformId, BPS_DENOMINATOR, SCALE_DENOMINATOR};

// =============================================================================
// LAUNCH CONFIG
// =============================================================================

/// Parameters for creating a `LaunchConfig`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfigParams {
    /// Quote asset raised against (mint B)
    pub quote_mint: Address,
    /// Curve family tag; only the constant-product curve (0) exists
    pub curve_type: u8,
    /// Index distinguishing configs for the same quote asset
    pub index: u16,
    pub quote_decimals: u8,
    /// Lowest funding goal a pool may set
    pub min_funding_goal: u64,
    /// Protocol trade fee
    pub trade_fee_rate_bps: Bps,
    /// Quote withheld from the migration deposit
    pub migrate_fee: u64,
    /// Lowest total supply a pool may mint
    pub min_supply: u64,
    /// Upper bound on locked supply, ppm of total supply
    pub max_lock_rate: u32,
    /// Lower bound on sell allocation, ppm of total supply
    pub min_sell_rate: u32,
    /// Lower bound on migration allotment, ppm of total supply
    pub min_migrate_rate: u32,
    /// Receives accrued protocol fees
    pub protocol_fee_owner: Address,
}

impl LaunchConfigParams {
    /// Params with no supply-rate constraints
    pub fn new(
        quote_mint: Address,
        index: u16,
        quote_decimals: u8,
        min_funding_goal: u64,
        trade_fee_rate_bps: Bps,
        protocol_fee_owner: Address,
    ) -> Self {
        Self {
            quote_mint,
            curve_type: CONSTANT_PRODUCT_CURVE,
            index,
            quote_decimals,
            min_funding_goal,
            trade_fee_rate_bps,
            migrate_fee: 0,
            min_supply: 0,
            max_lock_rate: SCALE_DENOMINATOR as u32,
            min_sell_rate: 0,
            min_migrate_rate: 0,
            protocol_fee_owner,
        }
    }
}

/// Curve type tag for the constant-product curve
pub const CONSTANT_PRODUCT_CURVE: u8 = 0;

/// Immutable quote-asset sale configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub id: ConfigId,
    pub quote_mint: Address,
    pub curve_type: u8,
    pub index: u16,
    pub quote_decimals: u8,
    pub min_funding_goal: u64,
    pub trade_fee_rate_bps: Bps,
    pub migrate_fee: u64,
    pub min_supply: u64,
    pub max_lock_rate: u32,
    pub min_sell_rate: u32,
    pub min_migrate_rate: u32,
    pub protocol_fee_owner: Address,
}

impl LaunchConfig {
    /// Validate params and build the config
    pub fn new(params: LaunchConfigParams) -> LaunchpadResult<Self> {
        if params.quote_mint.is_zero() {
            return Err(LaunchpadError::Validation("quote mint cannot be zero".into()));
        }
        if params.curve_type != CONSTANT_PRODUCT_CURVE {
            return Err(LaunchpadError::Validation(format!(
                "unsupported curve type {}",
                params.curve_type
            )));
        }
        if params.min_funding_goal == 0 {
            return Err(LaunchpadError::Validation("minimum funding goal must be non-zero".into()));
        }
        check_fee_rate("trade fee", params.trade_fee_rate_bps)?;
        check_scale_rate("max lock rate", params.max_lock_rate)?;
        check_scale_rate("min sell rate", params.min_sell_rate)?;
        check_scale_rate("min migrate rate", params.min_migrate_rate)?;
        if params.migrate_fee >= params.min_funding_goal {
            return Err(LaunchpadError::Validation(
                "migrate fee must be below the minimum funding goal".into(),
            ));
        }

        Ok(Self {
            id: ConfigId::derive(&params.quote_mint, params.curve_type, params.index),
            quote_mint: params.quote_mint,
            curve_type: params.curve_type,
            index: params.index,
            quote_decimals: params.quote_decimals,
            min_funding_goal: params.min_funding_goal,
            trade_fee_rate_bps: params.trade_fee_rate_bps,
            migrate_fee: params.migrate_fee,
            min_supply: params.min_supply,
            max_lock_rate: params.max_lock_rate,
            min_sell_rate: params.min_sell_rate,
            min_migrate_rate: params.min_migrate_rate,
            protocol_fee_owner: params.protocol_fee_owner,
        })
    }
}

/// Registry of launch configs
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    configs: HashMap<ConfigId, Arc<LaunchConfig>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a new config
    pub fn create(&mut self, params: LaunchConfigParams) -> LaunchpadResult<Arc<LaunchConfig>> {
        let config = LaunchConfig::new(params)?;
        self.insert(config)
    }

    /// Store an already-built config (e.g. decoded from the ledger)
    pub fn insert(&mut self, config: LaunchConfig) -> LaunchpadResult<Arc<LaunchConfig>> {
        if self.configs.contains_key(&config.id) {
            return Err(LaunchpadError::DuplicateConfig(format!(
                "launch config {} (index {})",
                config.id, config.index
            )));
        }
        let config = Arc::new(config);
        self.configs.insert(config.id, Arc::clone(&config));
        Ok(config)
    }

    pub fn get(&self, id: &ConfigId) -> LaunchpadResult<Arc<LaunchConfig>> {
        self.configs
            .get(id)
            .cloned()
            .ok_or_else(|| LaunchpadError::NotFound(format!("launch config {}", id)))
    }

    pub fn contains(&self, id: &ConfigId) -> bool {
        self.configs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

// =============================================================================
// PLATFORM CONFIG
// =============================================================================

/// Wallets that receive platform proceeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecipients {
    /// Platform owner; the only identity allowed to create the platform
    pub admin: Address,
    /// Receives accrued platform trade fees
    pub claim_fee_wallet: Address,
    /// Receives the platform's locked LP share at migration
    pub lock_nft_wallet: Address,
}

/// Three-way split of migration LP, in parts-per-million
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationScale {
    pub platform: u32,
    pub creator: u32,
    pub burn: u32,
}

impl MigrationScale {
    pub const fn new(platform: u32, creator: u32, burn: u32) -> Self {
        Self { platform, creator, burn }
    }

    /// Scales must sum to exactly 1_000_000
    pub fn validate(&self) -> LaunchpadResult<()> {
        let total = self.platform as u64 + self.creator as u64 + self.burn as u64;
        if total != SCALE_DENOMINATOR {
            return Err(LaunchpadError::Validation(format!(
                "migration scale must sum to {}, got {}",
                SCALE_DENOMINATOR, total
            )));
        }
        Ok(())
    }
}

/// Descriptive platform metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMetadata {
    pub name: String,
    pub web: String,
    pub img: String,
}

/// Parameters for creating a `PlatformConfig`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformParams {
    pub fee_recipients: FeeRecipients,
    /// Platform trade fee
    pub platform_fee_rate_bps: Bps,
    /// Creator trade fee
    pub creator_fee_rate_bps: Bps,
    pub migration_scale: MigrationScale,
    pub metadata: PlatformMetadata,
}

/// Immutable per-platform configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: PlatformId,
    pub fee_recipients: FeeRecipients,
    pub platform_fee_rate_bps: Bps,
    pub creator_fee_rate_bps: Bps,
    pub migration_scale: MigrationScale,
    pub metadata: PlatformMetadata,
}

impl PlatformConfig {
    /// Validate params and build the config
    pub fn new(params: PlatformParams) -> LaunchpadResult<Self> {
        if params.fee_recipients.admin.is_zero() {
            return Err(LaunchpadError::Validation("platform admin cannot be zero".into()));
        }
        check_fee_rate("platform fee", params.platform_fee_rate_bps)?;
        check_fee_rate("creator fee", params.creator_fee_rate_bps)?;
        params.migration_scale.validate()?;

        Ok(Self {
            id: PlatformId::derive(&params.fee_recipients.admin),
            fee_recipients: params.fee_recipients,
            platform_fee_rate_bps: params.platform_fee_rate_bps,
            creator_fee_rate_bps: params.creator_fee_rate_bps,
            migration_scale: params.migration_scale,
            metadata: params.metadata,
        })
    }

    pub fn admin(&self) -> &Address {
        &self.fee_recipients.admin
    }

    /// Admin and claim wallet may both collect platform fees
    pub fn may_claim_fees(&self, caller: &Address) -> bool {
        caller == &self.fee_recipients.admin || caller == &self.fee_recipients.claim_fee_wallet
    }
}

/// Registry of platform configs, at most one per admin identity
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<PlatformId, Arc<PlatformConfig>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a platform created by `caller`
    ///
    /// Only the identity named as `admin` may create its platform.
    pub fn create(
        &mut self,
        caller: &Address,
        params: PlatformParams,
    ) -> LaunchpadResult<Arc<PlatformConfig>> {
        if caller != &params.fee_recipients.admin {
            return Err(LaunchpadError::Unauthorized(
                "only the platform admin may create a platform config".into(),
            ));
        }
        let platform = PlatformConfig::new(params)?;
        self.insert(platform)
    }

    /// Store an already-built platform (e.g. decoded from the ledger)
    pub fn insert(&mut self, platform: PlatformConfig) -> LaunchpadResult<Arc<PlatformConfig>> {
        if self.platforms.contains_key(&platform.id) {
            return Err(LaunchpadError::DuplicateConfig(format!(
                "platform for admin {}",
                platform.fee_recipients.admin
            )));
        }
        let platform = Arc::new(platform);
        self.platforms.insert(platform.id, Arc::clone(&platform));
        Ok(platform)
    }

    pub fn get(&self, id: &PlatformId) -> LaunchpadResult<Arc<PlatformConfig>> {
        self.platforms
            .get(id)
            .cloned()
            .ok_or_else(|| LaunchpadError::NotFound(format!("platform {}", id)))
    }

    /// Look up the platform owned by `admin`
    pub fn get_by_admin(&self, admin: &Address) -> LaunchpadResult<Arc<PlatformConfig>> {
        self.get(&PlatformId::derive(admin))
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

fn check_fee_rate(name: &str, rate: Bps) -> LaunchpadResult<()> {
    if rate as u64 > BPS_DENOMINATOR {
        return Err(LaunchpadError::Validation(format!(
            "{} rate {} exceeds {} bps",
            name, rate, BPS_DENOMINATOR
        )));
    }
    Ok(())
}

fn check_scale_rate(name: &str, rate: u32) -> LaunchpadResult<()> {
    if rate as u64 > SCALE_DENOMINATOR {
        return Err(LaunchpadError::Validation(format!(
            "{} {} exceeds {} ppm",
            name, rate, SCALE_DENOMINATOR
        )));
    }
    Ok(())
}
