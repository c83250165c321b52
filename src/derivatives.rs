//! Rate-of-change analysis
//!
//! Computes first and second derivatives (per minute) of the anxiety and heart
//! rate histories and classifies each as rising, falling or stable.
//!
//! Elapsed time comes from sample timestamps when present. Samples without
//! timestamps fall back to the configured sampling interval.

use crate::config::EngineConfig;
use crate::history::{elapsed_minutes, SampleHistory};
use crate::normalizer::normalize_anxiety;
use crate::types::{Derivatives, DerivativeSummary, SignalDerivative, Trend, UserState};

/// Samples needed before any derivative is reported
pub const MIN_SAMPLES: usize = 3;

/// Derivative engine for anxiety and heart rate histories
pub struct DerivativeEngine;

impl DerivativeEngine {
    /// Derive both signals from a snapshot
    pub fn derive(state: &UserState, config: &EngineConfig) -> Derivatives {
        let anxiety = signal_derivative(
            &anxiety_window(&state.anxiety_history, config),
            config.trend.anxiety_per_min,
            config.sample_interval_sec,
        );

        let hr_history = &state
            .physiology
            .heart_rate_history
            .recent(config.history_capacity);
        let heart_rate = if hr_history.is_empty() {
            // No history is "no signal", never a physiological zero
            SignalDerivative {
                current: state.physiology.heart_rate,
                ..Default::default()
            }
        } else {
            let mut derived = signal_derivative(
                hr_history,
                config.trend.heart_rate_bpm_per_min,
                config.sample_interval_sec,
            );
            if let Some(hr) = state.physiology.heart_rate {
                derived.current = Some(hr);
            }
            derived
        };

        Derivatives {
            anxiety,
            heart_rate,
        }
    }

    /// Summarize derivatives for the decision record
    pub fn summarize(derivatives: &Derivatives, state: &UserState) -> DerivativeSummary {
        let heart_rate_elevation_pct = match (
            derivatives.heart_rate.current,
            state.physiology.baseline_heart_rate,
        ) {
            (Some(hr), Some(base)) if base > 0.0 => Some(((hr - base) / base) * 100.0),
            _ => None,
        };

        DerivativeSummary {
            anxiety_velocity: derivatives.anxiety.first,
            anxiety_acceleration: derivatives.anxiety.second,
            anxiety_trend: derivatives.anxiety.trend,
            heart_rate: derivatives.heart_rate.current,
            heart_rate_velocity: derivatives.heart_rate.first,
            heart_rate_trend: derivatives.heart_rate.trend,
            heart_rate_elevation_pct,
        }
    }
}

/// The anxiety samples the engine reasons over: at most `history_capacity` of
/// the newest, each clamped to the 0-10 scale.
pub fn anxiety_window(history: &SampleHistory, config: &EngineConfig) -> SampleHistory {
    history
        .recent(config.history_capacity)
        .map_values(|v| normalize_anxiety(Some(v)))
}

/// Derivatives of a single history.
///
/// With fewer than three samples both derivatives are zero and the trend is stable.
pub fn signal_derivative(
    history: &SampleHistory,
    trend_threshold: f64,
    fallback_interval_sec: f64,
) -> SignalDerivative {
    let current = history.latest().map(|s| s.value);

    let Some(tail) = history.tail(MIN_SAMPLES) else {
        return SignalDerivative {
            current,
            ..Default::default()
        };
    };
    let (oldest, previous, latest) = (&tail[0], &tail[1], &tail[2]);

    let dt_latest = elapsed_minutes(previous, latest, fallback_interval_sec);
    let dt_previous = elapsed_minutes(oldest, previous, fallback_interval_sec);

    let first = (latest.value - previous.value) / dt_latest;
    let previous_first = (previous.value - oldest.value) / dt_previous;

    // Spacing between the midpoints of the two intervals
    let dt_mid = (dt_latest + dt_previous) / 2.0;
    let second = (first - previous_first) / dt_mid;

    SignalDerivative {
        current,
        first,
        second,
        trend: classify_trend(first, trend_threshold),
    }
}

/// Rising above `threshold`, falling below `-threshold`, stable otherwise
pub fn classify_trend(first: f64, threshold: f64) -> Trend {
    if first > threshold {
        Trend::Rising
    } else if first < -threshold {
        Trend::Falling
    } else {
        Trend::Stable
    }
}
