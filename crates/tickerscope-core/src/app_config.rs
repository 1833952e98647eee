use std::net::SocketAddr;
use std::num::NonZeroUsize;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which kind of device backs the inference services.
///
/// Only used to pick batch sizes and extraction concurrency; the services
/// themselves own their device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Gpu,
    Cpu,
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceClass::Gpu => write!(f, "gpu"),
            DeviceClass::Cpu => write!(f, "cpu"),
        }
    }
}

/// How a `(label, confidence)` pair collapses into a numeric determination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeterminationMode {
    /// Positive → +1, Negative → −1, anything else → 0.
    Ternary,
    /// Positive → +confidence, Negative → −1, anything else → 0.
    ConfidenceWeighted,
}

impl std::fmt::Display for DeterminationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeterminationMode::Ternary => write!(f, "ternary"),
            DeterminationMode::ConfidenceWeighted => write!(f, "confidence_weighted"),
        }
    }
}

/// Inclusive "too close to call" confidence range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBand {
    lower: f64,
    upper: f64,
}

impl ConfidenceBand {
    /// Builds a band, rejecting bounds outside `[0, 1]` or `lower > upper`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the bounds are invalid.
    pub fn new(lower: f64, upper: f64) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) {
            return Err(format!("band bounds must lie in [0, 1], got {lower}..{upper}"));
        }
        if lower > upper {
            return Err(format!("band lower bound {lower} exceeds upper bound {upper}"));
        }
        Ok(Self { lower, upper })
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    #[must_use]
    pub fn contains(&self, confidence: f64) -> bool {
        self.lower <= confidence && confidence <= self.upper
    }
}

/// Per-device chunk sizes for the two inference services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub sentiment_gpu: NonZeroUsize,
    pub sentiment_cpu: NonZeroUsize,
    pub ner_gpu: NonZeroUsize,
    pub ner_cpu: NonZeroUsize,
}

impl BatchLimits {
    /// Returns `(sentiment, ner)` chunk sizes for the given device.
    #[must_use]
    pub fn for_device(&self, device: DeviceClass) -> (NonZeroUsize, NonZeroUsize) {
        match device {
            DeviceClass::Gpu => (self.sentiment_gpu, self.ner_gpu),
            DeviceClass::Cpu => (self.sentiment_cpu, self.ner_cpu),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub device: DeviceClass,
    pub available_cores: NonZeroUsize,
    pub batch_limits: BatchLimits,
    pub sentiment_concurrency: NonZeroUsize,
    pub lookup_concurrency: NonZeroUsize,
    pub lookup_max_retries: u32,
    pub lookup_retry_backoff_base_ms: u64,
    pub lookup_retry_max_delay_ms: u64,
    pub determination_mode: DeterminationMode,
    pub inconclusive_band: Option<ConfidenceBand>,
    pub request_deadline_secs: u64,
    pub max_request_texts: NonZeroUsize,
    pub classifier_url: String,
    pub ner_url: String,
    pub lookup_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// Number of entity-recognition chunks kept in flight.
    ///
    /// A GPU-backed recognizer only accepts one job at a time; on CPU every
    /// available core can work on its own chunk.
    #[must_use]
    pub fn extraction_concurrency(&self) -> NonZeroUsize {
        match self.device {
            DeviceClass::Gpu => NonZeroUsize::MIN,
            DeviceClass::Cpu => self.available_cores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_band_is_inclusive_on_both_ends() {
        let band = ConfidenceBand::new(0.50, 0.55).unwrap();
        assert!(band.contains(0.50));
        assert!(band.contains(0.52));
        assert!(band.contains(0.55));
        assert!(!band.contains(0.49));
        assert!(!band.contains(0.56));
    }

    #[test]
    fn confidence_band_rejects_inverted_bounds() {
        assert!(ConfidenceBand::new(0.6, 0.5).is_err());
    }

    #[test]
    fn confidence_band_rejects_out_of_range_bounds() {
        assert!(ConfidenceBand::new(-0.1, 0.5).is_err());
        assert!(ConfidenceBand::new(0.5, 1.5).is_err());
    }

    #[test]
    fn batch_limits_pick_device_specific_sizes() {
        let n = |v: usize| NonZeroUsize::new(v).unwrap();
        let limits = BatchLimits {
            sentiment_gpu: n(128),
            sentiment_cpu: n(32),
            ner_gpu: n(256),
            ner_cpu: n(16),
        };
        assert_eq!(limits.for_device(DeviceClass::Gpu), (n(128), n(256)));
        assert_eq!(limits.for_device(DeviceClass::Cpu), (n(32), n(16)));
    }

    #[test]
    fn determination_mode_serializes_snake_case() {
        let json = serde_json::to_string(&DeterminationMode::ConfidenceWeighted).unwrap();
        assert_eq!(json, "\"confidence_weighted\"");
    }
}
