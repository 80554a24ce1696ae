//! Deployment constants and the runtime-mutable detector configuration.

/// Default beat-detection amplitude threshold applied to the pulse source.
pub const DEFAULT_SIGNAL_THRESHOLD: u16 = 550;

/// Inclusive bounds for runtime threshold updates.
pub const MIN_THRESHOLD: u16 = 100;
pub const MAX_THRESHOLD: u16 = 1000;

/// Amplitude at or below this means no finger is on the sensor.
pub const NO_FINGER_SIGNAL_THRESHOLD: i32 = 50;

/// Average BPM above this triggers the "too high" recommendation.
pub const MAX_HEART_RATE: f32 = 120.0;
/// Average BPM below this triggers the "too low" recommendation.
pub const MIN_HEART_RATE: f32 = 40.0;

/// Instantaneous BPM band accepted as a plausible reading.
pub const MIN_VALID_BPM: u16 = 30;
pub const MAX_VALID_BPM: u16 = 200;

/// Continuous-contact duration after which a session report is forced.
pub const REPORT_INTERVAL_MS: u64 = 60_000;

/// Beat-detection sensitivity, mutable at runtime via `SET_THRESHOLD`.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    threshold: u16,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIGNAL_THRESHOLD,
        }
    }
}

impl DetectorConfig {
    pub fn new(threshold: u16) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Apply a new threshold if it is within [MIN_THRESHOLD, MAX_THRESHOLD].
    /// Returns false and keeps the prior value otherwise.
    pub fn set_threshold(&mut self, value: i32) -> bool {
        if value >= MIN_THRESHOLD as i32 && value <= MAX_THRESHOLD as i32 {
            self.threshold = value as u16;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_bounds_are_inclusive() {
        let mut config = DetectorConfig::default();
        assert!(config.set_threshold(100));
        assert_eq!(config.threshold(), 100);
        assert!(config.set_threshold(1000));
        assert_eq!(config.threshold(), 1000);
    }

    #[test]
    fn out_of_range_update_keeps_prior_value() {
        let mut config = DetectorConfig::default();
        assert!(!config.set_threshold(99));
        assert_eq!(config.threshold(), DEFAULT_SIGNAL_THRESHOLD);
        assert!(!config.set_threshold(1001));
        assert_eq!(config.threshold(), DEFAULT_SIGNAL_THRESHOLD);
        assert!(!config.set_threshold(-5));
        assert_eq!(config.threshold(), DEFAULT_SIGNAL_THRESHOLD);
    }
}
