//! Launchpad Primitive Types
//!
//! Fixed-size identifiers and numeric conventions shared by every module.
//!
//! - Identities are 32-byte values, printed as hex
//! - Derived identifiers are Blake3 hashes under a per-kind domain separator
//! - Fee rates are basis points (10_000 = 100%)
//! - Split scales and supply rates are parts-per-million (1_000_000 = 100%)

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// NUMERIC CONVENTIONS
// ============================================================================

/// Basis points for fee rates (10_000 = 100%)
pub type Bps = u32;

/// Denominator for basis-point rates
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Denominator for parts-per-million scales (migration split, supply rates)
pub const SCALE_DENOMINATOR: u64 = 1_000_000;

// ============================================================================
// DOMAIN SEPARATORS
// ============================================================================

const POOL_ID_DOMAIN: &[u8] = b"LAUNCHPAD_POOL_V1";
const CONFIG_ID_DOMAIN: &[u8] = b"LAUNCHPAD_CONFIG_V1";
const PLATFORM_ID_DOMAIN: &[u8] = b"LAUNCHPAD_PLATFORM_V1";
const VESTING_ID_DOMAIN: &[u8] = b"LAUNCHPAD_VESTING_V1";

fn derive_id(domain: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw bytes
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the underlying bytes
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Check if this is the all-zero value
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..8]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

id_type!(
    /// Public identity of a wallet, mint or program account
    Address
);

id_type!(
    /// Launchpad pool identifier, derived from `(mint_a, mint_b)`
    PoolId
);

id_type!(
    /// Launch config identifier, derived from `(quote_mint, curve_type, index)`
    ConfigId
);

id_type!(
    /// Platform config identifier, derived from the platform admin
    PlatformId
);

id_type!(
    /// Vesting record identifier
    VestingId
);

impl PoolId {
    /// Pool ID = Blake3(POOL_ID_DOMAIN || mint_a || mint_b)
    pub fn derive(mint_a: &Address, mint_b: &Address) -> Self {
        Self(derive_id(POOL_ID_DOMAIN, &[mint_a.as_ref(), mint_b.as_ref()]))
    }
}

impl ConfigId {
    /// Config ID = Blake3(CONFIG_ID_DOMAIN || quote_mint || curve_type || index_le)
    pub fn derive(quote_mint: &Address, curve_type: u8, index: u16) -> Self {
        Self(derive_id(
            CONFIG_ID_DOMAIN,
            &[quote_mint.as_ref(), &[curve_type], &index.to_le_bytes()],
        ))
    }
}

impl PlatformId {
    /// Platform ID = Blake3(PLATFORM_ID_DOMAIN || admin)
    ///
    /// One platform per admin identity follows directly from this derivation.
    pub fn derive(admin: &Address) -> Self {
        Self(derive_id(PLATFORM_ID_DOMAIN, &[admin.as_ref()]))
    }
}

impl VestingId {
    /// Vesting ID = Blake3(VESTING_ID_DOMAIN || pool_id || beneficiary || sequence_le)
    pub fn derive(pool_id: &PoolId, beneficiary: &Address, sequence: u64) -> Self {
        Self(derive_id(
            VESTING_ID_DOMAIN,
            &[pool_id.as_ref(), beneficiary.as_ref(), &sequence.to_le_bytes()],
        ))
    }
}
