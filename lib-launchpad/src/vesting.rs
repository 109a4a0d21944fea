//! Vesting Ledger
//!
//! Linear release of locked allocations with a cliff:
//!
//! ```text
//! vested(t) = 0                                          if t < cliff
//!           = total                                      if unlock == 0
//!           = min(total, total * (t - cliff) / unlock)   otherwise
//! ```
//!
//! `t` is time elapsed since the record's start. Records are kept in a
//! `BTreeMap` for deterministic iteration, with an append-only beneficiary index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::math::{mul_div_floor, to_u64};
use crate::primitives::{Address, PoolId, VestingId};

/// Linear vesting schedule with a cliff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEntry {
    pub total_amount: u64,
    pub cliff_period: u64,
    pub unlock_period: u64,
    released_amount: u64,
}

impl VestingEntry {
    pub fn schedule(total_amount: u64, cliff_period: u64, unlock_period: u64) -> LaunchpadResult<Self> {
        if total_amount == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        Ok(Self { total_amount, cliff_period, unlock_period, released_amount: 0 })
    }

    /// Amount vested after `elapsed` time units, released or not
    pub fn releasable(&self, elapsed: u64) -> u64 {
        if elapsed < self.cliff_period {
            return 0;
        }
        if self.unlock_period == 0 {
            return self.total_amount;
        }
        let since_cliff = (elapsed - self.cliff_period) as u128;
        mul_div_floor(self.total_amount as u128, since_cliff, self.unlock_period as u128)
            .ok()
            .and_then(|vested| to_u64(vested).ok())
            .map_or(self.total_amount, |vested| vested.min(self.total_amount))
    }

    /// Vested but not yet released
    pub fn available(&self, elapsed: u64) -> u64 {
        self.releasable(elapsed).saturating_sub(self.released_amount)
    }

    /// Advance `released_amount` to the vested amount and return the delta
    pub fn release(&mut self, elapsed: u64) -> LaunchpadResult<u64> {
        let delta = self.available(elapsed);
        if delta == 0 {
            return Err(LaunchpadError::NothingToRelease);
        }
        self.released_amount += delta;
        Ok(delta)
    }

    pub fn released_amount(&self) -> u64 {
        self.released_amount
    }

    pub fn remaining_locked(&self) -> u64 {
        self.total_amount - self.released_amount
    }

    pub fn is_fully_released(&self) -> bool {
        self.released_amount == self.total_amount
    }
}

/// Request to lock an allocation for a beneficiary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingGrant {
    pub beneficiary: Address,
    pub total_amount: u64,
    pub cliff_period: u64,
    pub unlock_period: u64,
}

/// Registered vesting schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingRecord {
    pub id: VestingId,
    pub pool_id: PoolId,
    pub beneficiary: Address,
    /// Elapsed time is measured from here
    pub start_time: u64,
    pub entry: VestingEntry,
}

impl VestingRecord {
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.start_time)
    }
}

/// All vesting records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VestingLedger {
    records: BTreeMap<VestingId, VestingRecord>,
    /// Append-only; includes fully released records
    by_beneficiary: BTreeMap<Address, Vec<VestingId>>,
    next_sequence: u64,
    total_locked: u64,
}

impl VestingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a grant starting at `start_time`
    pub fn register(
        &mut self,
        pool_id: PoolId,
        grant: VestingGrant,
        start_time: u64,
    ) -> LaunchpadResult<VestingId> {
        let entry = VestingEntry::schedule(grant.total_amount, grant.cliff_period, grant.unlock_period)?;
        let total_locked = self
            .total_locked
            .checked_add(grant.total_amount)
            .ok_or(LaunchpadError::Overflow)?;

        let id = VestingId::derive(&pool_id, &grant.beneficiary, self.next_sequence);
        self.next_sequence += 1;
        self.total_locked = total_locked;
        self.records.insert(
            id,
            VestingRecord { id, pool_id, beneficiary: grant.beneficiary, start_time, entry },
        );
        self.by_beneficiary.entry(grant.beneficiary).or_default().push(id);

        Ok(id)
    }

    pub fn get(&self, id: &VestingId) -> LaunchpadResult<&VestingRecord> {
        self.records
            .get(id)
            .ok_or_else(|| LaunchpadError::NotFound(format!("vesting {}", id)))
    }

    /// Release whatever has vested for `caller` as of `now`
    pub fn release(&mut self, id: &VestingId, caller: &Address, now: u64) -> LaunchpadResult<u64> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| LaunchpadError::NotFound(format!("vesting {}", id)))?;
        if &record.beneficiary != caller {
            return Err(LaunchpadError::Unauthorized(format!(
                "{} is not the beneficiary of vesting {}",
                caller, id
            )));
        }
        let elapsed = record.elapsed(now);
        let released = record.entry.release(elapsed)?;
        self.total_locked = self.total_locked.saturating_sub(released);
        Ok(released)
    }

    pub fn for_beneficiary(&self, beneficiary: &Address) -> Vec<&VestingRecord> {
        self.by_beneficiary
            .get(beneficiary)
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn for_pool(&self, pool_id: &PoolId) -> Vec<&VestingRecord> {
        self.records.values().filter(|record| &record.pool_id == pool_id).collect()
    }

    /// Sum of amounts still locked across all records
    pub fn total_locked(&self) -> u64 {
        self.total_locked
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    fn grant(total: u64) -> VestingGrant {
        VestingGrant { beneficiary: addr(1), total_amount: total, cliff_period: 100, unlock_period: 200 }
    }

    #[test]
    fn test_releasable_schedule() {
        let entry = VestingEntry::schedule(1000, 100, 200).unwrap();
        assert_eq!(entry.releasable(50), 0);
        assert_eq!(entry.releasable(99), 0);
        assert_eq!(entry.releasable(100), 0);
        assert_eq!(entry.releasable(200), 500);
        assert_eq!(entry.releasable(300), 1000);
        assert_eq!(entry.releasable(u64::MAX), 1000);
    }

    #[test]
    fn test_zero_unlock_releases_at_cliff() {
        let entry = VestingEntry::schedule(1000, 100, 0).unwrap();
        assert_eq!(entry.releasable(99), 0);
        assert_eq!(entry.releasable(100), 1000);
    }

    #[test]
    fn test_schedule_rejects_zero_total() {
        assert_eq!(VestingEntry::schedule(0, 1, 1), Err(LaunchpadError::ZeroAmount));
    }

    #[test]
    fn test_release_returns_delta() {
        let mut entry = VestingEntry::schedule(1000, 100, 200).unwrap();
        assert_eq!(entry.release(50), Err(LaunchpadError::NothingToRelease));
        assert_eq!(entry.release(200).unwrap(), 500);
        assert_eq!(entry.release(200), Err(LaunchpadError::NothingToRelease));
        assert_eq!(entry.release(250).unwrap(), 250);
        assert_eq!(entry.release(1_000).unwrap(), 250);
        assert!(entry.is_fully_released());
        assert_eq!(entry.remaining_locked(), 0);
    }

    #[test]
    fn test_ledger_register_and_release() {
        let mut ledger = VestingLedger::new();
        let pool = PoolId::new([7; 32]);
        let id = ledger.register(pool, grant(1000), 1_000).unwrap();

        assert_eq!(ledger.total_locked(), 1000);
        assert_eq!(ledger.release(&id, &addr(1), 1_050), Err(LaunchpadError::NothingToRelease));
        assert_eq!(ledger.release(&id, &addr(1), 1_200).unwrap(), 500);
        assert_eq!(ledger.total_locked(), 500);
        assert_eq!(ledger.get(&id).unwrap().entry.released_amount(), 500);
    }

    #[test]
    fn test_ledger_release_requires_beneficiary() {
        let mut ledger = VestingLedger::new();
        let id = ledger.register(PoolId::new([7; 32]), grant(1000), 0).unwrap();
        let result = ledger.release(&id, &addr(2), 500);
        assert!(matches!(result, Err(LaunchpadError::Unauthorized(_))));
        assert_eq!(ledger.total_locked(), 1000);
    }

    #[test]
    fn test_ledger_unknown_id() {
        let mut ledger = VestingLedger::new();
        let id = VestingId::new([9; 32]);
        assert!(matches!(ledger.get(&id), Err(LaunchpadError::NotFound(_))));
        assert!(matches!(ledger.release(&id, &addr(1), 0), Err(LaunchpadError::NotFound(_))));
    }

    #[test]
    fn test_ledger_indexes() {
        let mut ledger = VestingLedger::new();
        let pool_a = PoolId::new([7; 32]);
        let pool_b = PoolId::new([8; 32]);
        let first = ledger.register(pool_a, grant(10), 0).unwrap();
        let second = ledger.register(pool_b, grant(20), 0).unwrap();

        assert_ne!(first, second);
        assert_eq!(ledger.for_beneficiary(&addr(1)).len(), 2);
        assert!(ledger.for_beneficiary(&addr(2)).is_empty());
        assert_eq!(ledger.for_pool(&pool_b)[0].id, second);
        assert_eq!(ledger.total_locked(), 30);
    }
}
