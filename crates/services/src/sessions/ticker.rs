use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};

/// Cancelable periodic tick source driving a session countdown.
///
/// Receives one tick per `period`. Once stopped (through any [`TickerHandle`]) or
/// dropped, no further ticks are delivered.
pub struct Ticker {
    rx: mpsc::Receiver<()>,
    stopped: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Cloneable stop switch for a running [`Ticker`].
#[derive(Clone, Debug)]
pub struct TickerHandle {
    stopped: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl Ticker {
    /// Spawn the interval task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(period: Duration) -> (Self, TickerHandle) {
        let (tx, rx) = mpsc::channel(1);
        let stopped = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        let handle = TickerHandle {
            stopped: Arc::clone(&stopped),
            abort: task.abort_handle(),
        };
        (Self { rx, stopped, task }, handle)
    }

    /// Wait for the next tick. Returns `None` once stopped.
    pub async fn tick(&mut self) -> Option<()> {
        if self.is_stopped() {
            return None;
        }
        let tick = self.rx.recv().await;
        if self.is_stopped() {
            return None;
        }
        tick
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        self.task.abort();
    }
}

impl TickerHandle {
    /// Stop ticking. Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.abort.abort();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
