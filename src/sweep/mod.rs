//! Periodic sweeper for expired cache entries.
//!
//! Purely additive to lazy expiration: correctness never depends on the
//! sweeper, it only bounds memory held by entries that are never re-read.

use crate::cache::CacheHandle;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Background task purging expired entries on a fixed interval.
///
/// Holds an explicit cancellation handle so shutdown is deterministic:
/// [`Sweeper::shutdown`] resolves only after the loop has exited.
pub struct Sweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    /// Spawn the sweep loop against `cache`.
    pub fn spawn(cache: CacheHandle, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "sweeper started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; the first sweep should not.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            info!(removed, "sweeper purged expired entries");
                        } else {
                            debug!("sweeper found no expired entries");
                        }
                    }
                }
            }
            debug!("sweeper stopped");
        });

        Self { cancel, handle }
    }

    /// Spawn with the default 60 s interval.
    pub fn spawn_default(cache: CacheHandle) -> Self {
        Self::spawn(cache, Self::DEFAULT_INTERVAL)
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
