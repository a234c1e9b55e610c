//! The chain backend seam.
//!
//! The proxy performs no RPC, signing, or transport work itself: everything
//! network-facing goes through [`ChainBackend`]. Implementations wrap a
//! JSON-RPC node, a provider pool, or an in-process test double; the proxy
//! only requires the four primitives below.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use fastsettle_core::RawLog;

/// Hash of a submitted transaction — the proxy's only handle to it.
pub type TxHash = B256;

/// Errors surfaced by a chain backend. Propagated to callers verbatim;
/// the proxy never retries.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Connection, timeout, or other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node rejected the call/transaction with revert data.
    #[error("execution reverted ({} bytes of revert data)", .data.len())]
    Reverted { data: Vec<u8> },

    /// The backend dropped the subscription.
    #[error("subscription closed")]
    SubscriptionClosed,

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

/// A read-only `eth_call`-style query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub from: Option<Address>,
    /// Native currency attached to the simulated call.
    pub value: U256,
    pub data: Bytes,
    /// Block to execute against; `None` = latest.
    pub block: Option<u64>,
}

/// A state-changing transaction submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub from: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
    pub nonce: Option<u64>,
}

/// Server-side log selection.
///
/// `topics[i]` constrains the log's topic at position `i`: `None` matches
/// any value, `Some(set)` matches logs whose topic is a member of the set.
/// Position 0 is the event signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<Vec<B256>>>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl LogFilter {
    /// Membership test a backend applies per log.
    pub fn matches(&self, log: &RawLog) -> bool {
        if log.address != self.address {
            return false;
        }
        for (i, constraint) in self.topics.iter().enumerate() {
            match constraint {
                None => continue,
                Some(set) => match log.topics.get(i) {
                    Some(topic) if set.contains(topic) => continue,
                    _ => return false,
                },
            }
        }
        true
    }
}

/// Releases a backend subscription exactly once.
///
/// Calling [`unsubscribe`](Self::unsubscribe) repeatedly is safe, and the
/// drop guard releases the subscription on any exit path that forgot to.
pub struct Unsubscriber(Option<Box<dyn FnOnce() + Send>>);

impl Unsubscriber {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    /// For subscriptions with nothing to release (e.g. a pre-buffered
    /// historical query).
    pub fn noop() -> Self {
        Self(None)
    }

    /// Release the upstream subscription. Idempotent, never reports errors.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

impl Drop for Unsubscriber {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Unsubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Unsubscriber")
            .field(&self.0.as_ref().map(|_| "armed").unwrap_or("released"))
            .finish()
    }
}

/// A live log subscription handed out by a backend.
///
/// The backend closes `logs` when the subscription ends; a terminal fault
/// arrives on `errors` first. The consumer owns the subscription
/// exclusively and releases it through `unsubscriber`.
#[derive(Debug)]
pub struct LogSubscription {
    pub logs: mpsc::UnboundedReceiver<RawLog>,
    pub errors: mpsc::Receiver<BackendError>,
    pub unsubscriber: Unsubscriber,
}

impl LogSubscription {
    /// A subscription pre-loaded with an already-fetched log set.
    /// Used for historical queries; there is nothing upstream to release.
    pub fn from_logs(logs: Vec<RawLog>) -> Self {
        let (log_tx, log_rx) = mpsc::unbounded_channel();
        let (_err_tx, err_rx) = mpsc::channel(1);
        for log in logs {
            // receiver is held right here, the channel cannot be closed
            let _ = log_tx.send(log);
        }
        Self {
            logs: log_rx,
            errors: err_rx,
            unsubscriber: Unsubscriber::noop(),
        }
    }
}

/// The capabilities the proxy needs from a chain client.
///
/// # Thread safety
/// Implementations must be `Send + Sync`; the proxy shares one backend
/// across concurrent calls and subscription tasks.
#[async_trait]
pub trait ChainBackend: Send + Sync + 'static {
    /// Execute a read-only call and return the raw return data.
    async fn call(&self, req: CallRequest) -> Result<Bytes, BackendError>;

    /// Submit a state-changing transaction. Irreversible once accepted;
    /// the proxy does not track it afterwards.
    async fn send_transaction(&self, req: TransactionRequest) -> Result<TxHash, BackendError>;

    /// Fetch the bounded historical set of logs matching `filter`,
    /// in chain order (ascending block number, then log index).
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, BackendError>;

    /// Open a live stream of future logs matching `filter`.
    async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogSubscription, BackendError>;
}

#[async_trait]
impl<B: ChainBackend + ?Sized> ChainBackend for std::sync::Arc<B> {
    async fn call(&self, req: CallRequest) -> Result<Bytes, BackendError> {
        (**self).call(req).await
    }

    async fn send_transaction(&self, req: TransactionRequest) -> Result<TxHash, BackendError> {
        (**self).send_transaction(req).await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, BackendError> {
        (**self).get_logs(filter).await
    }

    async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogSubscription, BackendError> {
        (**self).subscribe_logs(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn log_with(address: Address, topics: Vec<B256>) -> RawLog {
        RawLog {
            address,
            topics,
            ..Default::default()
        }
    }

    #[test]
    fn empty_criteria_match_everything() {
        let addr = Address::repeat_byte(0x01);
        let filter = LogFilter {
            address: addr,
            topics: vec![None, None],
            ..Default::default()
        };
        let log = log_with(addr, vec![B256::repeat_byte(0xaa), B256::repeat_byte(0xbb)]);
        assert!(filter.matches(&log));
    }

    #[test]
    fn membership_criteria() {
        let addr = Address::repeat_byte(0x01);
        let wanted = B256::repeat_byte(0xaa);
        let filter = LogFilter {
            address: addr,
            topics: vec![Some(vec![wanted]), None],
            ..Default::default()
        };
        assert!(filter.matches(&log_with(addr, vec![wanted])));
        assert!(!filter.matches(&log_with(addr, vec![B256::repeat_byte(0xcc)])));
        // log missing the constrained topic entirely
        assert!(!filter.matches(&log_with(addr, vec![])));
    }

    #[test]
    fn wrong_address_never_matches() {
        let filter = LogFilter {
            address: Address::repeat_byte(0x01),
            ..Default::default()
        };
        assert!(!filter.matches(&log_with(Address::repeat_byte(0x02), vec![])));
    }

    #[test]
    fn unsubscriber_fires_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut u = Unsubscriber::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        u.unsubscribe();
        u.unsubscribe();
        drop(u);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscriber_fires_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        drop(Unsubscriber::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn preloaded_subscription_drains_in_order() {
        let logs: Vec<RawLog> = (0..3)
            .map(|i| RawLog {
                log_index: i,
                ..Default::default()
            })
            .collect();
        let mut sub = LogSubscription::from_logs(logs);
        for i in 0..3 {
            assert_eq!(sub.logs.recv().await.unwrap().log_index, i);
        }
        assert!(sub.logs.recv().await.is_none());
    }
}
