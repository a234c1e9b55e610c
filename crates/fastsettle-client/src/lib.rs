//! # fastsettle-client
//!
//! Contract proxy for FastSettlement V3. Typed call dispatch, historical
//! event iteration, and live event subscriptions, all delegating network
//! work to a pluggable [`ChainBackend`].
//!
//! # Quick start
//!
//! ```no_run
//! # async fn example(backend: impl fastsettle_client::ChainBackend) -> Result<(), fastsettle_client::ClientError> {
//! use fastsettle_client::{FastSettlement, FilterOpts, IntentExecutedFilter};
//!
//! let contract = FastSettlement::new("0xc0ffee254729296a45a3885639AC7E10F9d54979".parse().unwrap(), backend)?;
//!
//! let selection = IntentExecutedFilter {
//!     user: vec!["0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap()],
//!     ..Default::default()
//! };
//! let mut executed = contract
//!     .filter_events(&selection, &FilterOpts { from_block: 19_000_000, to_block: None })
//!     .await?;
//! while let Some(record) = executed.next().await {
//!     println!("settled: received={} surplus={}", record.event.received, record.event.surplus);
//! }
//! # Ok(()) }
//! ```

pub mod backend;
pub mod contract;
pub mod error;
pub mod filter;
pub mod iter;
pub mod opts;
pub mod watch;

#[cfg(test)]
pub(crate) mod testutil;

pub use backend::{
    BackendError, CallRequest, ChainBackend, LogFilter, LogSubscription, TransactionRequest,
    TxHash, Unsubscriber,
};
pub use contract::FastSettlement;
pub use error::ClientError;
pub use filter::{
    EventSelection, ExecutorUpdatedFilter, IntentExecutedFilter, SwapTargetsUpdatedFilter,
    TreasuryUpdatedFilter,
};
pub use iter::EventIterator;
pub use opts::{CallOpts, FilterOpts, TransactOpts, WatchOpts};
pub use watch::EventWatcher;
