//! Caller-supplied options for calls, transactions, queries, and watches.

use alloy_primitives::{Address, U256};

/// Options for read-only calls. Cancellation/timeouts are the caller's:
/// drop the future or wrap it in `tokio::time::timeout`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOpts {
    /// Sender to simulate as, if the node should not pick one.
    pub from: Option<Address>,
    /// Block to execute against; `None` = latest.
    pub block: Option<u64>,
}

/// Options for state-changing transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactOpts {
    pub from: Address,
    /// Native currency attached to the transaction (payable methods).
    pub value: U256,
    /// Gas limit; `None` lets the backend estimate.
    pub gas_limit: Option<u64>,
    /// Gas price in wei; `None` lets the backend price it.
    pub gas_price: Option<u128>,
    /// Account nonce; `None` lets the backend assign it.
    pub nonce: Option<u64>,
}

/// Block range for historical event queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOpts {
    pub from_block: u64,
    /// Inclusive upper bound; `None` = latest.
    pub to_block: Option<u64>,
}

/// Options for live event watches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOpts {
    /// Start streaming from this block; `None` = next block.
    pub from_block: Option<u64>,
}
