//! Connection profiles and network samples.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coarse link classification driving the active profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    High,
    Low,
}

/// Hint for callers that can trade payload detail for bytes on slow links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFidelity {
    Full,
    Reduced,
}

/// Knobs pushed to polling callers when the link quality changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub tier: QualityTier,
    pub poll_interval: Duration,
    pub payload: PayloadFidelity,
}

impl ConnectionProfile {
    pub fn high() -> Self {
        Self {
            tier: QualityTier::High,
            poll_interval: Duration::from_secs(5),
            payload: PayloadFidelity::Full,
        }
    }

    pub fn low() -> Self {
        Self {
            tier: QualityTier::Low,
            poll_interval: Duration::from_secs(30),
            payload: PayloadFidelity::Reduced,
        }
    }

    pub fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::High => Self::high(),
            QualityTier::Low => Self::low(),
        }
    }
}

/// One observation of the runtime's reported network characteristics,
/// shaped like the platform's connection API so bridged samples deserialize
/// directly. Unknown fields stay `None` and do not count against the link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSample {
    /// Connection class as reported by the platform, e.g. `"4g"`, `"3g"`,
    /// `"slow-2g"`.
    pub effective_type: Option<String>,
    pub downlink_mbps: Option<f64>,
    pub rtt_ms: Option<u64>,
}

impl NetworkSample {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_effective_type(mut self, effective_type: impl Into<String>) -> Self {
        self.effective_type = Some(effective_type.into());
        self
    }
    pub fn with_downlink_mbps(mut self, mbps: f64) -> Self {
        self.downlink_mbps = Some(mbps);
        self
    }
    pub fn with_rtt_ms(mut self, rtt: u64) -> Self {
        self.rtt_ms = Some(rtt);
        self
    }

    /// Classify this sample. Any single degraded signal is enough to call
    /// the link low quality.
    pub fn tier(&self) -> QualityTier {
        if let Some(t) = self.effective_type.as_deref() {
            if matches!(t, "slow-2g" | "2g" | "3g") {
                return QualityTier::Low;
            }
        }
        if self.downlink_mbps.is_some_and(|mbps| mbps < 1.5) {
            return QualityTier::Low;
        }
        if self.rtt_ms.is_some_and(|rtt| rtt > 600) {
            return QualityTier::Low;
        }
        QualityTier::High
    }
}
