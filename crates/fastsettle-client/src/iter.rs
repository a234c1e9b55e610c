//! Pull-based cursor over logs of one event shape.
//!
//! State machine:
//!
//! ```text
//! Active ──upstream error──▶ Draining ──buffer empty──▶ Exhausted
//!   │  ╲──logs closed──────────────────────────────────▶ Exhausted
//!   │
//!   └──decode failure (from any delivering state)──────▶ Failed
//! ```
//!
//! An upstream error does not end iteration immediately: logs the backend
//! already delivered are still handed out, and the error becomes visible
//! through [`EventIterator::error`] once `next()` reports the end. A decode
//! failure stops delivery at once — a malformed log never yields a record,
//! and nothing after it is delivered.

use std::marker::PhantomData;

use tokio::sync::mpsc::error::TryRecvError;

use fastsettle_core::{ContractEvent, Decoded, EventDecoder, RawLog};

use crate::backend::LogSubscription;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    /// The upstream subscription is live.
    Active,
    /// Upstream ended with an error; deliver what is already buffered.
    Draining,
    /// Nothing buffered remains.
    Exhausted,
    /// A log failed to decode; no further events are reported.
    Failed,
}

/// Cursor over decoded `E` records, in backend emission order.
#[derive(Debug)]
pub struct EventIterator<E: ContractEvent> {
    decoder: EventDecoder,
    sub: LogSubscription,
    state: IterState,
    failure: Option<ClientError>,
    errors_done: bool,
    _event: PhantomData<E>,
}

impl<E: ContractEvent> EventIterator<E> {
    pub(crate) fn new(decoder: EventDecoder, sub: LogSubscription) -> Self {
        Self {
            decoder,
            sub,
            state: IterState::Active,
            failure: None,
            errors_done: false,
            _event: PhantomData,
        }
    }

    /// Advance to the next decoded record.
    ///
    /// Returns `None` once the subscription is exhausted or iteration has
    /// failed; check [`error`](Self::error) to tell the two apart.
    pub async fn next(&mut self) -> Option<Decoded<E>> {
        loop {
            match self.state {
                IterState::Exhausted | IterState::Failed => return None,
                IterState::Draining => match self.sub.logs.try_recv() {
                    Ok(log) => return self.deliver(log),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                        self.state = IterState::Exhausted;
                        return None;
                    }
                },
                IterState::Active => {
                    tokio::select! {
                        upstream = self.sub.errors.recv(), if !self.errors_done => {
                            match upstream {
                                Some(err) => {
                                    self.failure = Some(ClientError::Backend(err));
                                    self.state = IterState::Draining;
                                }
                                // error channel closed without a fault; the
                                // log channel decides when iteration ends
                                None => self.errors_done = true,
                            }
                        }
                        log = self.sub.logs.recv() => {
                            match log {
                                Some(log) => return self.deliver(log),
                                None => {
                                    self.state = IterState::Exhausted;
                                    return None;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn deliver(&mut self, log: RawLog) -> Option<Decoded<E>> {
        match self.decoder.decode_as::<E>(log) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(
                    event = E::NAME,
                    error = %err,
                    "log decode failed, iteration terminated"
                );
                self.failure = Some(ClientError::Decode(err));
                self.state = IterState::Failed;
                None
            }
        }
    }

    /// The failure that stopped iteration, if any. Distinct from the
    /// advance result: `next()` only says whether a record is available.
    pub fn error(&self) -> Option<&ClientError> {
        self.failure.as_ref()
    }

    /// Release the upstream subscription. Safe to call multiple times;
    /// never reports errors. Records the backend already delivered remain
    /// available through `next()`.
    pub fn close(&mut self) {
        self.sub.unsubscriber.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, Unsubscriber};
    use crate::testutil::intent_log;
    use alloy_primitives::{Address, Bytes};
    use fastsettle_core::{IntentExecuted, SettlementAbi};
    use tokio::sync::mpsc;

    fn decoder() -> EventDecoder {
        EventDecoder::for_event::<IntentExecuted>(&SettlementAbi::parse().unwrap()).unwrap()
    }

    /// A live subscription the test feeds by hand.
    fn live_sub() -> (
        mpsc::UnboundedSender<RawLog>,
        mpsc::Sender<BackendError>,
        LogSubscription,
    ) {
        let (log_tx, logs) = mpsc::unbounded_channel();
        let (err_tx, errors) = mpsc::channel(1);
        (
            log_tx,
            err_tx,
            LogSubscription {
                logs,
                errors,
                unsubscriber: Unsubscriber::noop(),
            },
        )
    }

    #[tokio::test]
    async fn delivers_in_order_exactly_once() {
        let user = Address::repeat_byte(0xaa);
        let logs: Vec<RawLog> = (0..5).map(|i| intent_log(user, i, 100 + i)).collect();
        let mut it = EventIterator::<IntentExecuted>::new(
            decoder(),
            LogSubscription::from_logs(logs),
        );

        for i in 0..5 {
            let rec = it.next().await.expect("record available");
            assert_eq!(rec.log.log_index, i);
        }
        assert!(it.next().await.is_none());
        // repeated advances keep reporting the end, without an error
        assert!(it.next().await.is_none());
        assert!(it.error().is_none());
    }

    #[tokio::test]
    async fn upstream_error_drains_buffered_then_fails() {
        let user = Address::repeat_byte(0xaa);
        let (log_tx, err_tx, sub) = live_sub();
        let mut it = EventIterator::<IntentExecuted>::new(decoder(), sub);

        log_tx.send(intent_log(user, 0, 10)).unwrap();
        log_tx.send(intent_log(user, 1, 11)).unwrap();
        err_tx.send(BackendError::SubscriptionClosed).await.unwrap();
        // the error is now queued; buffered logs must still come out
        drop(err_tx);

        let mut seen = 0;
        while let Some(rec) = it.next().await {
            assert_eq!(rec.log.log_index, seen);
            seen += 1;
        }
        assert_eq!(seen, 2);
        assert!(matches!(
            it.error(),
            Some(ClientError::Backend(BackendError::SubscriptionClosed))
        ));
    }

    #[tokio::test]
    async fn decode_failure_terminates_without_partial_records() {
        let user = Address::repeat_byte(0xaa);
        let mut bad = intent_log(user, 1, 10);
        bad.data = Bytes::from(vec![0u8; 7]); // right signature, malformed data

        let logs = vec![intent_log(user, 0, 10), bad, intent_log(user, 2, 10)];
        let mut it = EventIterator::<IntentExecuted>::new(
            decoder(),
            LogSubscription::from_logs(logs),
        );

        assert!(it.next().await.is_some());
        // the malformed log produces no record and ends iteration
        assert!(it.next().await.is_none());
        assert!(matches!(it.error(), Some(ClientError::Decode(_))));
        // the log after the malformed one is never delivered
        assert!(it.next().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_keeps_buffered_logs() {
        let user = Address::repeat_byte(0xaa);
        let (log_tx, _err_tx, sub) = live_sub();
        let mut it = EventIterator::<IntentExecuted>::new(decoder(), sub);

        log_tx.send(intent_log(user, 0, 10)).unwrap();
        drop(log_tx);

        it.close();
        it.close();

        assert!(it.next().await.is_some());
        assert!(it.next().await.is_none());
        assert!(it.error().is_none());
    }
}
