//! Notification Outbox
//!
//! Makes the post-persist hand-off explicit: the generator enqueues the
//! alert after the store write commits, a dedicated worker thread drains
//! the queue and runs the fan-out. Enqueue never blocks and never fails
//! the caller; a dead worker just drops the job with an error log.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::Notifier;
use crate::logic::alert::Alert;

enum Job {
    Notify(Box<Alert>),
    Stop,
}

/// Cloneable enqueue side of the outbox
#[derive(Clone)]
pub struct OutboxHandle {
    tx: Sender<Job>,
}

impl OutboxHandle {
    pub fn enqueue(&self, alert: Alert) {
        let code = alert.alert_code.clone();
        if self.tx.send(Job::Notify(Box::new(alert))).is_err() {
            log::error!("Outbox worker is gone, notification for {} dropped", code);
        }
    }
}

/// Owns the worker thread. `shutdown` processes everything already queued,
/// then stops the worker.
pub struct Outbox {
    handle: OutboxHandle,
    worker: Option<JoinHandle<()>>,
}

impl Outbox {
    /// Spawn the worker thread draining notification jobs.
    pub fn spawn(notifier: Arc<Notifier>) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();

        let worker = std::thread::spawn(move || {
            log::info!("Notification outbox worker started");
            while let Ok(job) = rx.recv() {
                match job {
                    Job::Notify(alert) => {
                        let report = notifier.notify_alert(&alert);
                        log::info!(
                            "Outbox dispatched {}: {} privileged, {} subscriber recipients",
                            alert.alert_code,
                            report.privileged.len(),
                            report.subscribers.len()
                        );
                    }
                    Job::Stop => break,
                }
            }
            log::info!("Notification outbox worker stopped");
        });

        Self { handle: OutboxHandle { tx }, worker: Some(worker) }
    }

    pub fn handle(&self) -> OutboxHandle {
        self.handle.clone()
    }

    /// Drain the queue, then stop and join the worker.
    pub fn shutdown(mut self) {
        let _ = self.handle.tx.send(Job::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Outbox worker panicked during shutdown");
            }
        }
    }
}
