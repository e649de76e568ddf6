//! Background expiration sweeper.
//!
//! A [`Janitor`] calls [`Store::delete_expired`] once per interval until it
//! is stopped or dropped. The sweep loop always runs on a dedicated thread
//! driving its own single-threaded runtime, so it lives exactly as long as
//! its handle and is unaffected by whatever runtime (if any) created it.
//!
//! Stopping is signalled over a `watch` channel. The sweep loop holds only
//! the store, never the [`Cache`](crate::Cache) handle that owns the janitor,
//! so dropping the last handle always reaches the stop signal.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lapse_core::constants::JANITOR_THREAD_NAME;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::store::Store;

/// Handle to a running sweep loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct Janitor {
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl Janitor {
    /// Start sweeping `store` every `interval`.
    ///
    /// Returns `None` for a zero interval, or if no background worker could
    /// be started.
    pub fn start<T>(store: Arc<Store<T>>, interval: Duration) -> Option<Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return None;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let spawned = std::thread::Builder::new()
            .name(JANITOR_THREAD_NAME.to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to build janitor runtime");
                        return;
                    }
                };
                runtime.block_on(sweep_loop(store, interval, shutdown_rx));
            });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to spawn janitor thread");
            return None;
        }

        Some(Self {
            interval,
            shutdown_tx,
        })
    }

    /// Signal the sweep loop to exit. Safe to call more than once.
    pub fn stop(&self) {
        // Err only means the loop already exited.
        let _ = self.shutdown_tx.send(true);
    }

    /// Whether the sweep loop is still alive.
    pub fn is_running(&self) -> bool {
        !self.shutdown_tx.is_closed()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep_loop<T>(
    store: Arc<Store<T>>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    T: Clone + Send + Sync + 'static,
{
    // First sweep one full period after start.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_ms = period.as_millis() as u64,
        "Cache janitor started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A closed channel means the owning handle is gone.
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                sweep(&store);
            }
        }
    }

    tracing::info!("Cache janitor stopped");
}

fn sweep<T>(store: &Store<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let removed = store.delete_expired();
    store.observer().janitor_swept(Utc::now(), removed);

    if removed > 0 {
        tracing::debug!(removed, remaining = store.item_count(), "Janitor sweep removed expired entries");
    } else {
        tracing::trace!("Janitor sweep found no expired entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapse_core::{Entry, Expiration};
    use std::collections::HashMap;

    fn store_with_expired(n: usize) -> Arc<Store<u32>> {
        let expired_at = Utc::now() - chrono::Duration::seconds(1);
        let items: HashMap<_, _> = (0..n)
            .map(|i| (format!("k{i}"), Entry::new(i as u32, Some(expired_at))))
            .collect();
        Arc::new(Store::from_items(Expiration::Default, items))
    }

    #[test]
    fn test_zero_interval_disables_janitor() {
        let store = store_with_expired(1);
        assert!(Janitor::start(store, Duration::ZERO).is_none());
    }

    #[tokio::test]
    async fn test_janitor_sweeps_inside_runtime() {
        let store = store_with_expired(3);
        let janitor = Janitor::start(Arc::clone(&store), Duration::from_millis(10)).unwrap();
        assert_eq!(janitor.interval(), Duration::from_millis(10));

        for _ in 0..100 {
            if store.item_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.item_count(), 0);
        assert!(janitor.is_running());
    }

    #[tokio::test]
    async fn test_stop_ends_loop() {
        let store = store_with_expired(0);
        let janitor = Janitor::start(Arc::clone(&store), Duration::from_millis(10)).unwrap();
        janitor.stop();
        janitor.stop();

        for _ in 0..100 {
            if !janitor.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!janitor.is_running());
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[test]
    fn test_janitor_without_runtime() {
        let store = store_with_expired(2);
        let janitor = Janitor::start(Arc::clone(&store), Duration::from_millis(10)).unwrap();

        for _ in 0..200 {
            if store.item_count() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(store.item_count(), 0);

        drop(janitor);
        for _ in 0..200 {
            if Arc::strong_count(&store) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
