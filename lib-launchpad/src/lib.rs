//! Bonding-Curve Token Launchpad
//!
//! Pure accounting and state-transition core for token sales: a fixed-supply
//! token is sold along a constant-product bonding curve until a funding goal is
//! raised, after which the reserves migrate into a constant-product pool and
//! the resulting liquidity is split between platform, creator and a burn sink.
//!
//! # State Machine
//! ```text
//!   ┌────────┐     raised == goal     ┌───────────┐     migrate()     ┌──────────┐
//!   │ Active │ ─────────────────────▶ │ Graduated │ ────────────────▶ │ Migrated │
//!   └────────┘     (irreversible)     └───────────┘   (exactly once)  └──────────┘
//! ```
//!
//! # Architecture
//! - `registry`: launch configs and platform configs, immutable once created
//! - `curve`: pure quoting against a `CurveSnapshot`
//! - `pool`: the per-sale state machine
//! - `migration`: reserve migration and the LP split
//! - `vesting`: cliff + linear release of locked allocations
//! - `launchpad`: thread-safe facade with per-pool locking
//! - `ledger`: collaborator traits (reader, submitter, identity) and account codec
//!
//! # Usage
//!
//! ```ignore
//! use lib_launchpad::{Launchpad, StaticIdentity};
//!
//! let launchpad = Launchpad::new();
//! let config = launchpad.create_launch_config(config_params, now)?.output;
//! let platform = launchpad.create_platform(&admin, platform_params, now)?.output;
//! let pool_id = launchpad
//!     .create_pool(&creator, &config.id, &platform.id, pool_params, None, now)?
//!     .output;
//!
//! let min_out = launchpad.min_base_out(&pool_id, 1_000_000_000)?;
//! let trade = launchpad.apply_buy(&buyer, &pool_id, 1_000_000_000, min_out, now)?;
//! for transition in &trade.prepared {
//!     submitter.submit(transition)?;
//! }
//! ```

pub mod curve;
pub mod errors;
pub mod events;
pub mod launchpad;
pub mod ledger;
pub mod math;
pub mod migration;
pub mod pool;
pub mod primitives;
pub mod registry;
pub mod settings;
pub mod vesting;

#[cfg(test)]
mod golden_vectors;

pub use curve::{
    max_input_with_slippage, min_output_with_slippage, CurveParams, CurveSnapshot, FeeBreakdown,
    FeeSchedule, TradeDirection, TradeQuote,
};
pub use errors::{ErrorKind, LaunchpadError, LaunchpadResult};
pub use events::{EventIndexer, InMemoryEventIndexer, LaunchpadEvent};
pub use launchpad::{FeeClaim, InitialBuy, Launchpad, Transition};
pub use ledger::{
    decode_account, encode_account, AccountKey, Confirmation, IdentityProvider, InMemoryLedger,
    LedgerAccount, LedgerReader, LedgerSubmitter, StateTransition, StaticIdentity,
};
pub use migration::{
    split_liquidity, ConstantProductDeposit, LiquidityDepositRule, LpSplit, MigrationExecutor,
    MigrationResult,
};
pub use pool::{
    AccruedFees, CreatorFeeMode, FeeRole, GraduationProgress, LaunchpadPool, PoolParams,
    PoolStatus, VestingTerms,
};
pub use primitives::{
    Address, Bps, ConfigId, PlatformId, PoolId, VestingId, BPS_DENOMINATOR, SCALE_DENOMINATOR,
};
pub use registry::{
    ConfigRegistry, FeeRecipients, LaunchConfig, LaunchConfigParams, MigrationScale,
    PlatformConfig, PlatformMetadata, PlatformParams, PlatformRegistry,
};
pub use settings::{LaunchpadSettings, PoolDefaults};
pub use vesting::{VestingEntry, VestingGrant, VestingLedger, VestingRecord};
