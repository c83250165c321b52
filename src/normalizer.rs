//! State normalization
//!
//! This module clamps and validates raw snapshot fields before any decision is made.
//! - Anxiety clamped to 0-10, defaulting to 5 when missing or NaN
//! - Mode names mapped onto the known personas
//! - Quality flags recorded for every repair

use crate::types::{Mode, QualityFlag, UserState};
use tracing::debug;

/// Anxiety assumed when none was reported
pub const DEFAULT_ANXIETY: f64 = 5.0;

pub const MIN_ANXIETY: f64 = 0.0;
pub const MAX_ANXIETY: f64 = 10.0;

/// Snapshot fields after repair
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedState {
    /// Anxiety in [0, 10]
    pub anxiety: f64,
    /// Explicit, recognized mode preference
    pub preferred_mode: Option<Mode>,
    pub quality_flags: Vec<QualityFlag>,
}

/// Normalizer for turning a raw snapshot into safe decision inputs
pub struct StateNormalizer;

impl StateNormalizer {
    /// Normalize the fields of a snapshot the engine relies on
    pub fn normalize(state: &UserState) -> NormalizedState {
        let mut quality_flags = Vec::new();

        match state.anxiety_level {
            None => quality_flags.push(QualityFlag::MissingAnxiety),
            Some(v) if v.is_nan() => quality_flags.push(QualityFlag::MissingAnxiety),
            Some(v) if !(MIN_ANXIETY..=MAX_ANXIETY).contains(&v) => {
                quality_flags.push(QualityFlag::AnxietyClamped)
            }
            Some(_) => {}
        }
        let anxiety = normalize_anxiety(state.anxiety_level);

        let raw_preference = state.preferences.preferred_mode.as_deref();
        let preferred_mode = normalize_preference(raw_preference);
        if preferred_mode.is_none() && raw_preference.is_some_and(|p| !p.trim().is_empty()) {
            quality_flags.push(QualityFlag::UnknownPreferredMode);
        }

        if state.physiology.heart_rate.is_none() && state.physiology.heart_rate_history.is_empty() {
            quality_flags.push(QualityFlag::MissingHeartRate);
        }

        if state.anxiety_history.is_irregular()
            || state.physiology.heart_rate_history.is_irregular()
        {
            quality_flags.push(QualityFlag::IrregularSampling);
        }

        if !quality_flags.is_empty() {
            debug!(user_id = %state.user_id, flags = ?quality_flags, "normalized snapshot");
        }

        NormalizedState {
            anxiety,
            preferred_mode,
            quality_flags,
        }
    }
}

/// Clamp anxiety to [0, 10]; absent or NaN becomes the default of 5
pub fn normalize_anxiety(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_nan() => DEFAULT_ANXIETY,
        Some(v) => v.clamp(MIN_ANXIETY, MAX_ANXIETY),
        None => DEFAULT_ANXIETY,
    }
}

/// Map any mode name onto a known mode, falling back to the baseline persona
pub fn normalize_mode(raw: Option<&str>) -> Mode {
    raw.and_then(Mode::parse).unwrap_or_default()
}

/// An explicit preference only counts if it names a mode a user may pick
pub fn normalize_preference(raw: Option<&str>) -> Option<Mode> {
    raw.and_then(Mode::parse).filter(Mode::is_selectable)
}
