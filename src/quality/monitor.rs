//! Quality monitor: sample ingestion and profile broadcast.

use super::profile::{ConnectionProfile, NetworkSample, QualityTier};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::info;

struct MonitorState {
    current: QualityTier,
    /// Divergent tier seen on the previous sample, awaiting confirmation.
    candidate: Option<QualityTier>,
}

/// Observes network samples and broadcasts [`ConnectionProfile`] changes.
///
/// The monitor owns no cached data; it only publishes facts. A tier must be
/// seen on two consecutive samples before the profile switches, so one
/// noisy reading does not flap every polling caller.
pub struct QualityMonitor {
    state: Mutex<MonitorState>,
    tx: watch::Sender<ConnectionProfile>,
}

impl QualityMonitor {
    /// Starts on the high-quality profile.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionProfile::high());
        Self {
            state: Mutex::new(MonitorState {
                current: QualityTier::High,
                candidate: None,
            }),
            tx,
        }
    }

    /// The profile currently in effect.
    pub fn profile(&self) -> ConnectionProfile {
        self.tx.borrow().clone()
    }

    /// Subscribe to profile changes. Receivers see only transitions, plus
    /// the value current at subscription time.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionProfile> {
        self.tx.subscribe()
    }

    /// Feed one observation; returns the tier in effect afterwards.
    pub fn observe(&self, sample: NetworkSample) -> QualityTier {
        let tier = sample.tier();
        let mut state = self.state.lock().unwrap();

        if tier == state.current {
            state.candidate = None;
            return state.current;
        }

        if state.candidate == Some(tier) {
            state.current = tier;
            state.candidate = None;
            let profile = ConnectionProfile::for_tier(tier);
            info!(
                tier = ?tier,
                poll_interval_ms = profile.poll_interval.as_millis() as u64,
                "connection quality changed"
            );
            self.tx.send_replace(profile);
        } else {
            state.candidate = Some(tier);
        }
        state.current
    }
}

impl Default for QualityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::PayloadFidelity;
    use std::time::Duration;

    fn slow() -> NetworkSample {
        NetworkSample::new().with_effective_type("2g")
    }
    fn fast() -> NetworkSample {
        NetworkSample::new().with_effective_type("4g")
    }

    #[test]
    fn test_single_bad_sample_does_not_switch() {
        let monitor = QualityMonitor::new();
        assert_eq!(monitor.observe(slow()), QualityTier::High);
        assert_eq!(monitor.profile().tier, QualityTier::High);
    }

    #[test]
    fn test_two_consecutive_bad_samples_switch() {
        let monitor = QualityMonitor::new();
        monitor.observe(slow());
        assert_eq!(monitor.observe(slow()), QualityTier::Low);

        let profile = monitor.profile();
        assert_eq!(profile.poll_interval, Duration::from_secs(30));
        assert_eq!(profile.payload, PayloadFidelity::Reduced);
    }

    #[test]
    fn test_interleaved_samples_reset_the_candidate() {
        let monitor = QualityMonitor::new();
        monitor.observe(slow());
        monitor.observe(fast());
        // The streak restarted; one more slow sample is not enough.
        assert_eq!(monitor.observe(slow()), QualityTier::High);
        assert_eq!(monitor.observe(slow()), QualityTier::Low);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let monitor = QualityMonitor::new();
        let mut rx = monitor.subscribe();
        assert_eq!(rx.borrow().tier, QualityTier::High);

        monitor.observe(slow());
        monitor.observe(slow());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().tier, QualityTier::Low);

        monitor.observe(fast());
        monitor.observe(fast());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().tier, QualityTier::High);
    }
}
