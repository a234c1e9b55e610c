//! Push-based event subscription.
//!
//! One independent task per watch. The task loops on three wait
//! conditions — next raw log, upstream subscription error, cancellation —
//! decodes each log, and forwards the record to the consumer's channel.
//! Delivery itself races cancellation and upstream failure, so a slow or
//! absent consumer can never pin the task. Every exit path releases the
//! backend subscription exactly once.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use fastsettle_core::{ContractEvent, Decoded, EventDecoder};

use crate::backend::LogSubscription;
use crate::error::ClientError;

/// Handle to a running watch.
///
/// Dropping the handle cancels the watch; [`unsubscribe`](Self::unsubscribe)
/// does so explicitly. The terminal failure, if any, arrives on
/// [`err`](Self::err).
#[derive(Debug)]
pub struct EventWatcher {
    cancel: Option<oneshot::Sender<()>>,
    errors: mpsc::Receiver<ClientError>,
    task: JoinHandle<()>,
}

impl EventWatcher {
    /// Cancel the watch. Idempotent; the upstream subscription is released
    /// exactly once no matter how often this is called or how the task
    /// exits.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Wait for the watch to terminate and return its failure, if any.
    /// `None` means a clean shutdown (cancellation, consumer gone, or the
    /// backend closing the stream without a fault).
    pub async fn err(&mut self) -> Option<ClientError> {
        let err = self.errors.recv().await;
        // let the task finish releasing the subscription
        let _ = (&mut self.task).await;
        err
    }

    /// Whether the watch task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the decode-and-deliver task for one event shape.
///
/// Delivery is at-most-once per log: a record handed to `sink` is never
/// re-sent, and nothing is delivered after a decode failure or upstream
/// error terminates the watch.
pub(crate) fn spawn<E: ContractEvent>(
    decoder: EventDecoder,
    mut sub: LogSubscription,
    sink: mpsc::Sender<Decoded<E>>,
) -> EventWatcher {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let (err_tx, err_rx) = mpsc::channel::<ClientError>(1);

    let task = tokio::spawn(async move {
        tracing::debug!(event = E::NAME, "event watch started");
        let mut errors_done = false;

        'watch: loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    tracing::debug!(event = E::NAME, "event watch cancelled");
                    break 'watch;
                }
                upstream = sub.errors.recv(), if !errors_done => {
                    match upstream {
                        Some(err) => {
                            tracing::warn!(
                                event = E::NAME,
                                error = %err,
                                "upstream subscription failed"
                            );
                            let _ = err_tx.try_send(ClientError::Backend(err));
                            break 'watch;
                        }
                        // closed without a fault; the log channel decides
                        // when the watch ends
                        None => errors_done = true,
                    }
                }
                log = sub.logs.recv() => {
                    let Some(log) = log else {
                        tracing::debug!(event = E::NAME, "upstream log stream closed");
                        break 'watch;
                    };
                    let record = match decoder.decode_as::<E>(log) {
                        Ok(record) => record,
                        Err(err) => {
                            tracing::warn!(
                                event = E::NAME,
                                error = %err,
                                "log decode failed, watch terminated"
                            );
                            let _ = err_tx.try_send(ClientError::Decode(err));
                            break 'watch;
                        }
                    };

                    let mut pending = Some(record);
                    while let Some(record) = pending.take() {
                        tokio::select! {
                            _ = &mut cancel_rx => break 'watch,
                            upstream = sub.errors.recv(), if !errors_done => {
                                match upstream {
                                    Some(err) => {
                                        let _ = err_tx.try_send(ClientError::Backend(err));
                                        break 'watch;
                                    }
                                    None => {
                                        errors_done = true;
                                        pending = Some(record);
                                    }
                                }
                            }
                            slot = sink.reserve() => {
                                match slot {
                                    Ok(slot) => slot.send(record),
                                    // consumer dropped its receiver
                                    Err(_) => break 'watch,
                                }
                            }
                        }
                    }
                }
            }
        }

        sub.unsubscriber.unsubscribe();
    });

    EventWatcher {
        cancel: Some(cancel_tx),
        errors: err_rx,
        task,
    }
}
