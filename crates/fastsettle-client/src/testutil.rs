//! Shared test doubles: a scriptable in-memory chain backend and log
//! builders.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use tokio::sync::mpsc;

use fastsettle_core::{EventDecoder, IntentExecuted, RawLog, SettlementAbi};

use crate::backend::{
    BackendError, CallRequest, ChainBackend, LogFilter, LogSubscription, TransactionRequest,
    TxHash, Unsubscriber,
};

fn word(n: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&n.to_be_bytes());
    w
}

/// A well-formed `IntentExecuted` log with pinned token addresses.
pub(crate) fn intent_log(user: Address, log_index: u64, received: u64) -> RawLog {
    intent_log_full(
        user,
        Address::repeat_byte(0x01),
        Address::repeat_byte(0x02),
        log_index,
        received,
        2,
    )
}

/// A well-formed `IntentExecuted` log, fully parameterized.
pub(crate) fn intent_log_full(
    user: Address,
    input_token: Address,
    output_token: Address,
    log_index: u64,
    received: u64,
    surplus: u64,
) -> RawLog {
    let decoder =
        EventDecoder::for_event::<IntentExecuted>(&SettlementAbi::parse().unwrap()).unwrap();
    let mut data = Vec::with_capacity(128);
    for n in [10u64, 9, received, surplus] {
        data.extend_from_slice(&word(n));
    }
    RawLog {
        address: Address::repeat_byte(0xc0),
        topics: vec![
            decoder.signature(),
            user.into_word(),
            input_token.into_word(),
            output_token.into_word(),
        ],
        data: Bytes::from(data),
        block_number: 19_000_000 + log_index,
        log_index,
        ..Default::default()
    }
}

/// Sender halves of a subscription handed out by [`MockBackend`].
pub(crate) struct SubscriptionFeed {
    pub logs: mpsc::UnboundedSender<RawLog>,
    pub errors: mpsc::Sender<BackendError>,
}

/// Scriptable backend: records every request, replays queued responses,
/// serves `get_logs` from an in-memory store, and counts unsubscribes.
#[derive(Default)]
pub(crate) struct MockBackend {
    pub calls: Mutex<Vec<CallRequest>>,
    pub call_results: Mutex<VecDeque<Result<Bytes, BackendError>>>,
    pub transactions: Mutex<Vec<TransactionRequest>>,
    pub transact_results: Mutex<VecDeque<Result<TxHash, BackendError>>>,
    pub log_store: Mutex<Vec<RawLog>>,
    pub subscribe_filters: Mutex<Vec<LogFilter>>,
    pub feeds: Mutex<Vec<SubscriptionFeed>>,
    pub released: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_call_result(&self, result: Result<Bytes, BackendError>) {
        self.call_results.lock().unwrap().push_back(result);
    }

    pub fn queue_transact_result(&self, result: Result<TxHash, BackendError>) {
        self.transact_results.lock().unwrap().push_back(result);
    }

    pub fn store_logs(&self, logs: impl IntoIterator<Item = RawLog>) {
        self.log_store.lock().unwrap().extend(logs);
    }
}

#[async_trait]
impl ChainBackend for MockBackend {
    async fn call(&self, req: CallRequest) -> Result<Bytes, BackendError> {
        self.calls.lock().unwrap().push(req);
        self.call_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Other("no call result queued".into())))
    }

    async fn send_transaction(&self, req: TransactionRequest) -> Result<TxHash, BackendError> {
        self.transactions.lock().unwrap().push(req);
        self.transact_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(B256::repeat_byte(0x77)))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, BackendError> {
        Ok(self
            .log_store
            .lock()
            .unwrap()
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }

    async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogSubscription, BackendError> {
        self.subscribe_filters.lock().unwrap().push(filter.clone());
        let (log_tx, logs) = mpsc::unbounded_channel();
        let (err_tx, errors) = mpsc::channel(1);
        self.feeds.lock().unwrap().push(SubscriptionFeed {
            logs: log_tx,
            errors: err_tx,
        });
        let released = Arc::clone(&self.released);
        Ok(LogSubscription {
            logs,
            errors,
            unsubscriber: Unsubscriber::new(move || {
                released.fetch_add(1, Ordering::SeqCst);
            }),
        })
    }
}
