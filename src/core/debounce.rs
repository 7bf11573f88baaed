//! Trailing-edge debounced task.
//!
//! A [`Debouncer`] owns a background tokio task that runs an async action once
//! the debounce window has passed without a new [`Debouncer::arm`] call. Every
//! `arm` pushes the deadline out again, so a burst of triggers collapses into a
//! single run. A pending run can be cancelled, or flushed on shutdown.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum Command {
    Arm,
    Cancel,
    Shutdown {
        flush: bool,
        done: oneshot::Sender<bool>,
    },
}

pub struct Debouncer {
    tx: mpsc::UnboundedSender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(delay, action, rx));

        Self {
            tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Starts (or restarts) the debounce window.
    pub fn arm(&self) {
        if self.tx.send(Command::Arm).is_err() {
            tracing::debug!("Debouncer already stopped; ignoring arm");
        }
    }

    /// Drops a pending run without executing it.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }

    /// Stops the worker, optionally running a pending action first.
    pub async fn shutdown(&self, flush: bool) -> bool {
        let (done, wait) = oneshot::channel();
        let ran = if self.tx.send(Command::Shutdown { flush, done }).is_ok() {
            wait.await.unwrap_or(false)
        } else {
            false
        };

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
        ran
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(worker) = worker.take() {
                worker.abort();
            }
        }
    }
}

async fn run_worker<F, Fut>(delay: Duration, action: F, mut rx: mpsc::UnboundedReceiver<Command>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        action().await;
                        continue;
                    }
                    command = rx.recv() => command,
                }
            }
            None => rx.recv().await,
        };

        match command {
            Some(Command::Arm) => deadline = Some(Instant::now() + delay),
            Some(Command::Cancel) => deadline = None,
            Some(Command::Shutdown { flush, done }) => {
                let pending = flush && deadline.take().is_some();
                if pending {
                    action().await;
                }
                let _ = done.send(pending);
                break;
            }
            // 所有 sender 都已經被 drop
            None => break,
        }
    }
}
