//! Gesture logic and interactor configuration.
//!
//! Values are set once at setup (or rarely), never per frame. Both structs
//! can be loaded from an s-expression plist and rendered back for status output.

use std::path::Path;

use lexpr::Value;
use tracing::debug;

use crate::error::HpuiError;
use crate::sexp::{self, get_float};

// ── Gesture logic ──────────────────────────────────────────

/// Timing and hysteresis parameters of the gesture arbitration engine.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureLogicConfig {
    /// Post-gesture window (ms) during which a new gesture is treated as
    /// spurious and ends as `Canceled`.
    pub debounce_window_ms: f64,
    /// Time (ms) after selection onset during which the priority candidate may change.
    pub commit_delay_ms: f64,
    /// A competitor replaces the tracked candidate only when its heuristic is
    /// below this fraction of the tracked one (0.0-1.0).
    pub switch_tracking_threshold: f32,
}

impl Default for GestureLogicConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 100.0,
            commit_delay_ms: 100.0,
            switch_tracking_threshold: 0.15,
        }
    }
}

impl GestureLogicConfig {
    pub fn validate(&self) -> Result<(), HpuiError> {
        check_window("debounce-window-ms", self.debounce_window_ms)?;
        check_window("commit-delay-ms", self.commit_delay_ms)?;
        let t = self.switch_tracking_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(HpuiError::InvalidConfig(format!(
                "switch-tracking-threshold must be within [0, 1], got {t}"
            )));
        }
        Ok(())
    }

    /// Overlay any values present in `value`.
    pub fn apply_sexp(&mut self, value: &Value) {
        if let Some(v) = get_float(value, "debounce-window-ms") {
            self.debounce_window_ms = v;
        }
        if let Some(v) = get_float(value, "commit-delay-ms") {
            self.commit_delay_ms = v;
        }
        if let Some(v) = get_float(value, "switch-tracking-threshold") {
            self.switch_tracking_threshold = v as f32;
        }
    }

    pub fn config_sexp(&self) -> String {
        format!(
            "(:debounce-window-ms {:.0} :commit-delay-ms {:.0} :switch-tracking-threshold {:.2})",
            self.debounce_window_ms, self.commit_delay_ms, self.switch_tracking_threshold,
        )
    }
}

fn check_window(name: &str, value: f64) -> Result<(), HpuiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(HpuiError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}

// ── Interactor ─────────────────────────────────────────────

/// Configuration for an interactor: its gesture logic plus tap/swipe classification.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractorConfig {
    pub gesture: GestureLogicConfig,
    /// Longest gesture (ms) still classified as a tap.
    pub tap_time_threshold_ms: f64,
    /// Largest cumulative travel (surface units) still classified as a tap.
    pub tap_distance_threshold: f32,
}

impl Default for InteractorConfig {
    fn default() -> Self {
        Self {
            gesture: GestureLogicConfig::default(),
            tap_time_threshold_ms: 400.0,
            tap_distance_threshold: 0.01,
        }
    }
}

impl InteractorConfig {
    pub fn validate(&self) -> Result<(), HpuiError> {
        self.gesture.validate()?;
        check_window("tap-time-threshold-ms", self.tap_time_threshold_ms)?;
        let d = self.tap_distance_threshold;
        if !d.is_finite() || d < 0.0 {
            return Err(HpuiError::InvalidConfig(format!(
                "tap-distance-threshold must be finite and non-negative, got {d}"
            )));
        }
        Ok(())
    }

    pub fn apply_sexp(&mut self, value: &Value) {
        self.gesture.apply_sexp(value);
        if let Some(v) = get_float(value, "tap-time-threshold-ms") {
            self.tap_time_threshold_ms = v;
        }
        if let Some(v) = get_float(value, "tap-distance-threshold") {
            self.tap_distance_threshold = v as f32;
        }
    }

    /// Parse a plist such as `(:commit-delay-ms 200 :tap-time-threshold-ms 300)`
    /// on top of the defaults and validate the result.
    pub fn from_sexp(raw: &str) -> Result<Self, HpuiError> {
        let value = sexp::parse(raw)?;
        let mut config = Self::default();
        config.apply_sexp(&value);
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, HpuiError> {
        let raw = std::fs::read_to_string(path)?;
        debug!("loading interactor config from {}", path.display());
        Self::from_sexp(&raw)
    }

    pub fn config_sexp(&self) -> String {
        format!(
            "(:gesture {} :tap-time-threshold-ms {:.0} :tap-distance-threshold {:.3})",
            self.gesture.config_sexp(),
            self.tap_time_threshold_ms,
            self.tap_distance_threshold,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(GestureLogicConfig::default().validate().is_ok());
        assert!(InteractorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = GestureLogicConfig {
            switch_tracking_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HpuiError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_window_rejected() {
        let config = GestureLogicConfig {
            commit_delay_ms: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = GestureLogicConfig {
            debounce_window_ms: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_sexp_overlays_defaults() {
        let config =
            InteractorConfig::from_sexp("(:commit-delay-ms 200 :tap-distance-threshold 0.02)")
                .unwrap();
        assert_eq!(config.gesture.commit_delay_ms, 200.0);
        assert_eq!(config.gesture.debounce_window_ms, 100.0);
        assert!((config.tap_distance_threshold - 0.02).abs() < 1e-6);
        assert_eq!(config.tap_time_threshold_ms, 400.0);
    }

    #[test]
    fn test_from_sexp_rejects_invalid() {
        let result = InteractorConfig::from_sexp("(:switch-tracking-threshold 2)");
        assert!(matches!(result, Err(HpuiError::InvalidConfig(_))));
        assert!(matches!(
            InteractorConfig::from_sexp("(:commit-delay-ms"),
            Err(HpuiError::Parse(_))
        ));
    }

    #[test]
    fn test_config_sexp() {
        let sexp = InteractorConfig::default().config_sexp();
        assert!(sexp.contains(":debounce-window-ms 100"));
        assert!(sexp.contains(":commit-delay-ms 100"));
        assert!(sexp.contains(":switch-tracking-threshold 0.15"));
        assert!(sexp.contains(":tap-time-threshold-ms 400"));
        assert!(crate::sexp::parse(&sexp).is_ok());
    }
}
