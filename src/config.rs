//! Engine configuration
//!
//! Every threshold and word list the engine uses is tunable here. Partial JSON
//! documents are accepted; anything omitted keeps its default.

use crate::error::EngineError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::phrases::PhraseBook;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default assumed spacing between samples that carry no timestamp
pub const DEFAULT_SAMPLE_INTERVAL_SEC: f64 = 60.0;

/// Look-ahead window for trajectory forecasts
pub const TRAJECTORY_WINDOW_SEC: u32 = 180;

/// Lower bounds of the anxiety bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnxietyBands {
    pub crisis: f64,
    pub high: f64,
    pub moderate: f64,
}

impl Default for AnxietyBands {
    fn default() -> Self {
        Self {
            crisis: 9.0,
            high: 7.0,
            moderate: 4.0,
        }
    }
}

/// Rates beyond which a signal counts as rising or falling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// Anxiety points per minute
    pub anxiety_per_min: f64,
    /// Beats per minute, per minute
    pub heart_rate_bpm_per_min: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            anxiety_per_min: 0.5,
            heart_rate_bpm_per_min: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Current anxiety needed for the sustained rule
    pub sustained_anxiety: f64,
    /// Every sample in the sustained run must stay at or above this
    pub sustained_floor: f64,
    pub sustained_duration_sec: f64,
    pub min_tools_offered: u32,
    pub min_tools_accepted: u32,
    pub validation_attempts: u32,
    pub reassurance_min_anxiety: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            sustained_anxiety: 8.0,
            sustained_floor: 7.0,
            sustained_duration_sec: 300.0,
            min_tools_offered: 2,
            min_tools_accepted: 1,
            validation_attempts: 3,
            reassurance_min_anxiety: 7.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProactiveConfig {
    /// Unsolicited messages allowed per flight
    pub max_per_flight: u32,
    /// How far ahead of a triggering phase to warn
    pub trigger_lead_time_sec: f64,
    pub silence_threshold_sec: f64,
    pub anxiety_spike_per_min: f64,
    pub heart_rate_spike_bpm_per_min: f64,
    pub predicted_spike_min_anxiety: f64,
    /// Turbulence further out than this is not yet worth mentioning
    pub turbulence_lead_time_sec: f64,
}

impl Default for ProactiveConfig {
    fn default() -> Self {
        Self {
            max_per_flight: 5,
            trigger_lead_time_sec: 300.0,
            silence_threshold_sec: 300.0,
            anxiety_spike_per_min: 1.0,
            heart_rate_spike_bpm_per_min: 5.0,
            predicted_spike_min_anxiety: 4.0,
            turbulence_lead_time_sec: 600.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bands: AnxietyBands,
    pub trend: TrendThresholds,
    /// Fallback spacing for samples without timestamps
    pub sample_interval_sec: f64,
    /// Users younger than this get the kid persona
    pub youth_age_threshold: u32,
    /// Average message length (chars) below which a user counts as terse
    pub terse_message_chars: f64,
    /// Archetype score a trait must exceed to drive mode selection
    pub archetype_dominance: f64,
    pub auto_launch_min_anxiety: f64,
    pub history_capacity: usize,
    pub escalation: EscalationConfig,
    pub proactive: ProactiveConfig,
    pub phrases: PhraseBook,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bands: AnxietyBands::default(),
            trend: TrendThresholds::default(),
            sample_interval_sec: DEFAULT_SAMPLE_INTERVAL_SEC,
            youth_age_threshold: 13,
            terse_message_chars: 20.0,
            archetype_dominance: 70.0,
            auto_launch_min_anxiety: 8.0,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            escalation: EscalationConfig::default(),
            proactive: ProactiveConfig::default(),
            phrases: PhraseBook::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::EncodingError(e.to_string()))
    }

    /// Reject configurations the engine cannot reason with
    pub fn validate(&self) -> Result<(), EngineError> {
        let bands = &self.bands;
        let in_scale = |v: f64| v.is_finite() && v > 0.0 && v <= 10.0;
        if !(in_scale(bands.crisis) && in_scale(bands.high) && in_scale(bands.moderate)) {
            return Err(EngineError::InvalidConfig(
                "anxiety bands must lie in (0, 10]".to_string(),
            ));
        }
        if !(bands.crisis > bands.high && bands.high > bands.moderate) {
            return Err(EngineError::InvalidConfig(format!(
                "anxiety bands must descend: crisis {} > high {} > moderate {}",
                bands.crisis, bands.high, bands.moderate
            )));
        }

        if !(self.sample_interval_sec.is_finite() && self.sample_interval_sec > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "sample_interval_sec must be positive, got {}",
                self.sample_interval_sec
            )));
        }

        if self.trend.anxiety_per_min < 0.0 || self.trend.heart_rate_bpm_per_min < 0.0 {
            return Err(EngineError::InvalidConfig(
                "trend thresholds must be non-negative".to_string(),
            ));
        }

        if self.history_capacity < 3 {
            return Err(EngineError::InvalidConfig(format!(
                "history_capacity must hold at least 3 samples, got {}",
                self.history_capacity
            )));
        }

        if self.escalation.sustained_floor > self.escalation.sustained_anxiety {
            return Err(EngineError::InvalidConfig(
                "escalation.sustained_floor cannot exceed sustained_anxiety".to_string(),
            ));
        }

        Ok(())
    }
}
