//! Ledger Interfaces
//!
//! The core never talks to a ledger directly. It reads raw account bytes
//! through `LedgerReader`, and every mutation yields a `StateTransition` that
//! a `LedgerSubmitter` commits. Signing, fees and retries belong to the
//! submitter.
//!
//! # Account encoding
//!
//! `TAG (8 bytes) || bincode(account)`

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::events::LaunchpadEvent;
use crate::pool::LaunchpadPool;
use crate::primitives::{Address, ConfigId, PlatformId, PoolId, VestingId};
use crate::registry::{LaunchConfig, PlatformConfig};
use crate::vesting::VestingRecord;

const TRANSITION_ID_DOMAIN: &[u8] = b"LAUNCHPAD_TRANSITION_V1";

/// Identity of a ledger account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKey {
    LaunchConfig(ConfigId),
    Platform(PlatformId),
    Pool(PoolId),
    Vesting(VestingId),
}

impl AccountKey {
    /// Kind byte followed by the 32-byte identifier
    pub fn to_bytes(&self) -> [u8; 33] {
        let (kind, id) = match self {
            AccountKey::LaunchConfig(id) => (0u8, id.as_bytes()),
            AccountKey::Platform(id) => (1u8, id.as_bytes()),
            AccountKey::Pool(id) => (2u8, id.as_bytes()),
            AccountKey::Vesting(id) => (3u8, id.as_bytes()),
        };
        let mut bytes = [0u8; 33];
        bytes[0] = kind;
        bytes[1..].copy_from_slice(id);
        bytes
    }
}

/// A type stored as a tagged ledger account
pub trait LedgerAccount: Serialize + DeserializeOwned {
    const TAG: [u8; 8];
}

impl LedgerAccount for LaunchConfig {
    const TAG: [u8; 8] = *b"LPCONFIG";
}

impl LedgerAccount for PlatformConfig {
    const TAG: [u8; 8] = *b"LPPLATFM";
}

impl LedgerAccount for LaunchpadPool {
    const TAG: [u8; 8] = *b"LPPOOL\0\0";
}

impl LedgerAccount for VestingRecord {
    const TAG: [u8; 8] = *b"LPVESTNG";
}

pub fn encode_account<T: LedgerAccount>(account: &T) -> LaunchpadResult<Vec<u8>> {
    let payload = bincode::serialize(account).map_err(|e| LaunchpadError::Codec(e.to_string()))?;
    let mut bytes = Vec::with_capacity(T::TAG.len() + payload.len());
    bytes.extend_from_slice(&T::TAG);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn decode_account<T: LedgerAccount>(bytes: &[u8]) -> LaunchpadResult<T> {
    if bytes.len() < T::TAG.len() || bytes[..T::TAG.len()] != T::TAG {
        return Err(LaunchpadError::Codec(format!(
            "expected account tag {}",
            String::from_utf8_lossy(&T::TAG)
        )));
    }
    bincode::deserialize(&bytes[T::TAG.len()..]).map_err(|e| LaunchpadError::Codec(e.to_string()))
}

/// Read-only ledger access
pub trait LedgerReader {
    /// Raw account bytes, or `None` if the account does not exist
    fn account(&self, key: &AccountKey) -> LaunchpadResult<Option<Vec<u8>>>;

    fn load<T: LedgerAccount>(&self, key: &AccountKey) -> LaunchpadResult<T>
    where
        Self: Sized,
    {
        let bytes = self
            .account(key)?
            .ok_or_else(|| LaunchpadError::NotFound(format!("account {:?}", key)))?;
        decode_account(&bytes)
    }
}

/// Commits prepared transitions
pub trait LedgerSubmitter {
    fn submit(&self, transition: &StateTransition) -> LaunchpadResult<Confirmation>;
}

/// Supplies the caller's identity for ownership checks
pub trait IdentityProvider {
    fn identity(&self) -> Address;
}

/// Fixed identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticIdentity(pub Address);

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Address {
        self.0
    }
}

/// Post-state of one account plus the events that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub key: AccountKey,
    pub account_data: Vec<u8>,
    pub events: Vec<LaunchpadEvent>,
}

impl StateTransition {
    pub fn prepare<T: LedgerAccount>(
        key: AccountKey,
        account: &T,
        events: Vec<LaunchpadEvent>,
    ) -> LaunchpadResult<Self> {
        Ok(Self { key, account_data: encode_account(account)?, events })
    }

    /// Transition ID = Blake3(TRANSITION_ID_DOMAIN || key || account_data)
    pub fn id(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TRANSITION_ID_DOMAIN);
        hasher.update(&self.key.to_bytes());
        hasher.update(&self.account_data);
        *hasher.finalize().as_bytes()
    }
}

/// Submitter acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub transition_id: [u8; 32],
    pub sequence: u64,
}

/// In-memory ledger for tests and local simulation
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountKey, Vec<u8>>>,
    sequence: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes directly, bypassing submission
    pub fn insert_raw(&self, key: AccountKey, bytes: Vec<u8>) {
        self.accounts.write().insert(key, bytes);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }
}

impl LedgerReader for InMemoryLedger {
    fn account(&self, key: &AccountKey) -> LaunchpadResult<Option<Vec<u8>>> {
        Ok(self.accounts.read().get(key).cloned())
    }
}

impl LedgerSubmitter for InMemoryLedger {
    fn submit(&self, transition: &StateTransition) -> LaunchpadResult<Confirmation> {
        self.accounts.write().insert(transition.key, transition.account_data.clone());
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        Ok(Confirmation { transition_id: transition.id(), sequence })
    }
}
