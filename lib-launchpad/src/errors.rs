//! Launchpad Errors

use thiserror::Error;

use crate::pool::PoolStatus;

/// Error during launchpad operations
///
/// No operation mutates state before returning one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchpadError {
    #[error("Invalid parameters: {0}")]
    Validation(String),

    #[error("Config already exists: {0}")]
    DuplicateConfig(String),

    #[error("Pool already exists: {0}")]
    DuplicatePool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Slippage exceeded: bound {bound}, quoted {quoted}")]
    SlippageExceeded { bound: u64, quoted: u64 },

    #[error("Pool is closed to trading (status: {0})")]
    PoolClosed(PoolStatus),

    #[error("Pool has not graduated")]
    NotGraduated,

    #[error("Pool has already migrated")]
    AlreadyMigrated,

    #[error("Curve exhausted: requested {requested}, remaining capacity {remaining}")]
    CurveExhausted { requested: u64, remaining: u64 },

    #[error("Insufficient reserve: requested {requested}, available {available}")]
    InsufficientReserve { requested: u64, available: u64 },

    #[error("Nothing to release")]
    NothingToRelease,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Account codec error: {0}")]
    Codec(String),

    #[error("Ledger submission failed: {0}")]
    Submission(String),
}

/// Coarse failure classes, used by callers to pick a recovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction parameters; never retried
    Validation,
    /// Price moved past the caller's bound; re-quote and retry
    Slippage,
    /// Operation not valid in the current pool/vesting state
    StatePrecondition,
    /// Amount exceeds remaining curve or reserve capacity; clamp and retry
    Boundary,
    /// Missing config, platform, pool or vesting record
    NotFound,
    /// Caller identity does not own the resource
    Authorization,
    /// Checked arithmetic failed
    Arithmetic,
    /// Ledger codec or transport failure
    External,
}

impl LaunchpadError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LaunchpadError::Validation(_)
            | LaunchpadError::DuplicateConfig(_)
            | LaunchpadError::DuplicatePool(_)
            | LaunchpadError::ZeroAmount => ErrorKind::Validation,
            LaunchpadError::SlippageExceeded { .. } => ErrorKind::Slippage,
            LaunchpadError::PoolClosed(_)
            | LaunchpadError::NotGraduated
            | LaunchpadError::AlreadyMigrated
            | LaunchpadError::NothingToRelease => ErrorKind::StatePrecondition,
            LaunchpadError::CurveExhausted { .. } | LaunchpadError::InsufficientReserve { .. } => {
                ErrorKind::Boundary
            }
            LaunchpadError::NotFound(_) => ErrorKind::NotFound,
            LaunchpadError::Unauthorized(_) => ErrorKind::Authorization,
            LaunchpadError::Overflow => ErrorKind::Arithmetic,
            LaunchpadError::Codec(_) | LaunchpadError::Submission(_) => ErrorKind::External,
        }
    }

    /// Whether a caller may retry after adjusting its request
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Slippage | ErrorKind::Boundary)
    }
}

/// Result type for launchpad operations
pub type LaunchpadResult<T> = Result<T, LaunchpadError>;
