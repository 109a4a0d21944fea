//! Launchpad Events
//!
//! Every state change produces an event. Events travel with the prepared
//! state transition and are indexed for queries.

use serde::{Deserialize, Serialize};

use crate::primitives::{Address, ConfigId, PlatformId, PoolId, VestingId};

/// Launchpad events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LaunchpadEvent {
    /// Launch config registered
    ConfigCreated {
        config_id: ConfigId,
        quote_mint: Address,
        index: u16,
        timestamp: u64,
    },

    /// Platform registered by its admin
    PlatformCreated {
        platform_id: PlatformId,
        admin: Address,
        timestamp: u64,
    },

    /// Pool opened for trading
    PoolCreated {
        pool_id: PoolId,
        creator: Address,
        mint_a: Address,
        mint_b: Address,
        funding_goal: u64,
        total_sell_allocation: u64,
        timestamp: u64,
    },

    /// Base bought from the curve
    TokensPurchased {
        pool_id: PoolId,
        buyer: Address,
        quote_in: u64,
        base_out: u64,
        fee: u64,
        raised_quote: u64,
        timestamp: u64,
    },

    /// Base sold back to the curve
    TokensSold {
        pool_id: PoolId,
        seller: Address,
        base_in: u64,
        quote_out: u64,
        fee: u64,
        raised_quote: u64,
        timestamp: u64,
    },

    /// Funding goal reached; trading closed
    Graduated {
        pool_id: PoolId,
        raised_quote: u64,
        sold_base: u64,
        timestamp: u64,
    },

    /// Reserves moved into the constant-product pool
    Migrated {
        pool_id: PoolId,
        lp_total: u64,
        platform_share: u64,
        creator_share: u64,
        burn_share: u64,
        fee_claim_right: bool,
        timestamp: u64,
    },

    /// Vesting record registered
    VestingScheduled {
        pool_id: PoolId,
        vesting_id: VestingId,
        beneficiary: Address,
        total_amount: u64,
        timestamp: u64,
    },

    /// Vested amount released
    VestingReleased {
        pool_id: PoolId,
        vesting_id: VestingId,
        beneficiary: Address,
        amount: u64,
        timestamp: u64,
    },

    /// Accrued trade fees paid out
    FeesClaimed {
        pool_id: PoolId,
        claimant: Address,
        amount: u64,
        timestamp: u64,
    },
}

impl LaunchpadEvent {
    /// Pool the event belongs to, if any
    pub fn pool_id(&self) -> Option<&PoolId> {
        match self {
            LaunchpadEvent::ConfigCreated { .. } | LaunchpadEvent::PlatformCreated { .. } => None,
            LaunchpadEvent::PoolCreated { pool_id, .. }
            | LaunchpadEvent::TokensPurchased { pool_id, .. }
            | LaunchpadEvent::TokensSold { pool_id, .. }
            | LaunchpadEvent::Graduated { pool_id, .. }
            | LaunchpadEvent::Migrated { pool_id, .. }
            | LaunchpadEvent::VestingScheduled { pool_id, .. }
            | LaunchpadEvent::VestingReleased { pool_id, .. }
            | LaunchpadEvent::FeesClaimed { pool_id, .. } => Some(pool_id),
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            LaunchpadEvent::ConfigCreated { timestamp, .. }
            | LaunchpadEvent::PlatformCreated { timestamp, .. }
            | LaunchpadEvent::PoolCreated { timestamp, .. }
            | LaunchpadEvent::TokensPurchased { timestamp, .. }
            | LaunchpadEvent::TokensSold { timestamp, .. }
            | LaunchpadEvent::Graduated { timestamp, .. }
            | LaunchpadEvent::Migrated { timestamp, .. }
            | LaunchpadEvent::VestingScheduled { timestamp, .. }
            | LaunchpadEvent::VestingReleased { timestamp, .. }
            | LaunchpadEvent::FeesClaimed { timestamp, .. } => *timestamp,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            LaunchpadEvent::ConfigCreated { .. } => "config_created",
            LaunchpadEvent::PlatformCreated { .. } => "platform_created",
            LaunchpadEvent::PoolCreated { .. } => "pool_created",
            LaunchpadEvent::TokensPurchased { .. } => "tokens_purchased",
            LaunchpadEvent::TokensSold { .. } => "tokens_sold",
            LaunchpadEvent::Graduated { .. } => "graduated",
            LaunchpadEvent::Migrated { .. } => "migrated",
            LaunchpadEvent::VestingScheduled { .. } => "vesting_scheduled",
            LaunchpadEvent::VestingReleased { .. } => "vesting_released",
            LaunchpadEvent::FeesClaimed { .. } => "fees_claimed",
        }
    }
}

/// Event indexer interface
pub trait EventIndexer: Send + Sync {
    fn index_event(&mut self, event: LaunchpadEvent);

    /// All events for a pool, in indexing order
    fn pool_events(&self, pool_id: &PoolId) -> Vec<&LaunchpadEvent>;

    /// Events with `start <= timestamp <= end`
    fn events_in_range(&self, start: u64, end: u64) -> Vec<&LaunchpadEvent>;

    /// Most recently indexed event for a pool
    fn latest_event(&self, pool_id: &PoolId) -> Option<&LaunchpadEvent>;
}

/// In-memory event indexer
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventIndexer {
    events: Vec<LaunchpadEvent>,
}

impl InMemoryEventIndexer {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventIndexer for InMemoryEventIndexer {
    fn index_event(&mut self, event: LaunchpadEvent) {
        self.events.push(event);
    }

    fn pool_events(&self, pool_id: &PoolId) -> Vec<&LaunchpadEvent> {
        self.events.iter().filter(|e| e.pool_id() == Some(pool_id)).collect()
    }

    fn events_in_range(&self, start: u64, end: u64) -> Vec<&LaunchpadEvent> {
        self.events
            .iter()
            .filter(|e| {
                let ts = e.timestamp();
                ts >= start && ts <= end
            })
            .collect()
    }

    fn latest_event(&self, pool_id: &PoolId) -> Option<&LaunchpadEvent> {
        self.events.iter().rev().find(|e| e.pool_id() == Some(pool_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase(pool: PoolId, timestamp: u64) -> LaunchpadEvent {
        LaunchpadEvent::TokensPurchased {
            pool_id: pool,
            buyer: Address::new([3u8; 32]),
            quote_in: 100,
            base_out: 1000,
            fee: 1,
            raised_quote: 99,
            timestamp,
        }
    }

    #[test]
    fn test_event_accessors() {
        let pool = PoolId::new([1u8; 32]);
        let event = purchase(pool, 7);
        assert_eq!(event.pool_id(), Some(&pool));
        assert_eq!(event.timestamp(), 7);
        assert_eq!(event.event_type(), "tokens_purchased");

        let platform = LaunchpadEvent::PlatformCreated {
            platform_id: PlatformId::new([2u8; 32]),
            admin: Address::new([2u8; 32]),
            timestamp: 1,
        };
        assert_eq!(platform.pool_id(), None);
    }

    #[test]
    fn test_event_indexer() {
        let mut indexer = InMemoryEventIndexer::new();
        let pool1 = PoolId::new([1u8; 32]);
        let pool2 = PoolId::new([2u8; 32]);

        indexer.index_event(purchase(pool1, 100));
        indexer.index_event(purchase(pool1, 101));
        indexer.index_event(LaunchpadEvent::Graduated {
            pool_id: pool2,
            raised_quote: 1000,
            sold_base: 10_000,
            timestamp: 150,
        });

        assert_eq!(indexer.event_count(), 3);
        assert_eq!(indexer.pool_events(&pool1).len(), 2);
        assert_eq!(indexer.pool_events(&pool2).len(), 1);
        assert_eq!(indexer.events_in_range(100, 120).len(), 2);
        assert_eq!(indexer.latest_event(&pool1).map(|e| e.timestamp()), Some(101));
        assert_eq!(indexer.latest_event(&pool2).map(|e| e.event_type()), Some("graduated"));

        indexer.clear();
        assert_eq!(indexer.event_count(), 0);
    }
}
