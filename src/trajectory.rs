//! Short-horizon trajectory prediction
//!
//! Forecasts whether anxiety will spike, plateau or calm over the next three
//! minutes. Rules are evaluated in order and the first match wins; strong
//! movement in either direction is checked before the descent special case so
//! an active downward trend during descent is never read as a spike.

use crate::config::TRAJECTORY_WINDOW_SEC;
use crate::types::{
    Derivatives, FlightPhase, PredictedTrajectory, TimeAxes, TrajectoryOutcome,
};

/// First derivative that on its own signals a spike
const STRONG_RISE_PER_MIN: f64 = 1.0;
/// Rise that signals a spike when also accelerating
const ACCELERATING_RISE_PER_MIN: f64 = 0.5;
/// First derivative at or below which anxiety is clearly easing
const CLEAR_FALL_PER_MIN: f64 = -0.5;
/// Time into descent after which dread tends to build
const DESCENT_DREAD_AFTER_SEC: f64 = 600.0;
const DESCENT_DREAD_MIN_ANXIETY: f64 = 6.0;

/// Inputs shared by every trajectory rule
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryInput<'a> {
    pub derivatives: &'a Derivatives,
    pub axes: &'a TimeAxes,
    pub anxiety: f64,
    pub phase: FlightPhase,
}

struct TrajectoryRule {
    name: &'static str,
    applies: fn(&TrajectoryInput) -> bool,
    outcome: TrajectoryOutcome,
    confidence: f64,
}

/// Ordered rule table, first match wins
const RULES: &[TrajectoryRule] = &[
    TrajectoryRule {
        name: "strong_rise",
        applies: |i| {
            let a = &i.derivatives.anxiety;
            a.first >= STRONG_RISE_PER_MIN
                || (a.first > ACCELERATING_RISE_PER_MIN && a.second > 0.0)
        },
        outcome: TrajectoryOutcome::LikelySpike,
        confidence: 0.7,
    },
    TrajectoryRule {
        name: "clear_fall",
        applies: |i| i.derivatives.anxiety.first <= CLEAR_FALL_PER_MIN,
        outcome: TrajectoryOutcome::LikelyCalm,
        confidence: 0.6,
    },
    TrajectoryRule {
        name: "descent_dread",
        applies: |i| {
            i.phase == FlightPhase::Descent
                && i.axes.time_in_phase_sec > DESCENT_DREAD_AFTER_SEC
                && i.anxiety >= DESCENT_DREAD_MIN_ANXIETY
                && i.derivatives.anxiety.first >= 0.0
        },
        outcome: TrajectoryOutcome::LikelySpike,
        confidence: 0.65,
    },
];

/// Trajectory predictor over derivatives and time axes
pub struct TrajectoryPredictor;

impl TrajectoryPredictor {
    pub fn predict(input: &TrajectoryInput) -> PredictedTrajectory {
        Self::predict_with_rule(input).0
    }

    /// Prediction plus the name of the rule that produced it
    pub fn predict_with_rule(input: &TrajectoryInput) -> (PredictedTrajectory, &'static str) {
        for rule in RULES {
            if (rule.applies)(input) {
                return (
                    PredictedTrajectory {
                        outcome: rule.outcome,
                        confidence: rule.confidence,
                        window_sec: TRAJECTORY_WINDOW_SEC,
                    },
                    rule.name,
                );
            }
        }

        (
            PredictedTrajectory {
                outcome: TrajectoryOutcome::LikelyPlateau,
                confidence: 0.5,
                window_sec: TRAJECTORY_WINDOW_SEC,
            },
            "default",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalDerivative;
    use pretty_assertions::assert_eq;

    fn derivatives(first: f64, second: f64) -> Derivatives {
        Derivatives {
            anxiety: SignalDerivative {
                current: Some(5.0),
                first,
                second,
                ..Default::default()
            },
            heart_rate: SignalDerivative::default(),
        }
    }

    fn predict(
        first: f64,
        second: f64,
        anxiety: f64,
        phase: FlightPhase,
        in_phase: f64,
    ) -> (PredictedTrajectory, &'static str) {
        let d = derivatives(first, second);
        let axes = TimeAxes {
            time_in_phase_sec: in_phase,
            journey_index: 1,
            flight_elapsed_sec: None,
        };
        TrajectoryPredictor::predict_with_rule(&TrajectoryInput {
            derivatives: &d,
            axes: &axes,
            anxiety,
            phase,
        })
    }

    #[test]
    fn test_strong_rise() {
        let (t, rule) = predict(1.0, -2.0, 5.0, FlightPhase::Cruise, 0.0);
        assert_eq!(rule, "strong_rise");
        assert_eq!(t.outcome, TrajectoryOutcome::LikelySpike);
        assert_eq!(t.confidence, 0.7);
        assert_eq!(t.window_sec, 180);
    }

    #[test]
    fn test_accelerating_rise() {
        let (t, _) = predict(0.6, 0.1, 5.0, FlightPhase::Cruise, 0.0);
        assert_eq!(t.outcome, TrajectoryOutcome::LikelySpike);

        // Same rise while decelerating is a plateau
        let (t, _) = predict(0.6, -0.1, 5.0, FlightPhase::Cruise, 0.0);
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyPlateau);
    }

    #[test]
    fn test_clear_fall() {
        let (t, rule) = predict(-0.5, 0.0, 8.0, FlightPhase::Cruise, 0.0);
        assert_eq!(rule, "clear_fall");
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyCalm);
        assert_eq!(t.confidence, 0.6);
    }

    #[test]
    fn test_descent_dread() {
        let (t, rule) = predict(0.1, 0.0, 7.0, FlightPhase::Descent, 700.0);
        assert_eq!(rule, "descent_dread");
        assert_eq!(t.outcome, TrajectoryOutcome::LikelySpike);
        assert_eq!(t.confidence, 0.65);
    }

    #[test]
    fn test_falling_during_descent_is_calm() {
        let (t, rule) = predict(-0.8, 0.0, 7.0, FlightPhase::Descent, 900.0);
        assert_eq!(rule, "clear_fall");
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyCalm);
    }

    #[test]
    fn test_descent_dread_boundaries() {
        // Not yet long enough into descent
        let (t, _) = predict(0.0, 0.0, 7.0, FlightPhase::Descent, 600.0);
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyPlateau);
        // Anxiety below the floor
        let (t, _) = predict(0.0, 0.0, 5.9, FlightPhase::Descent, 700.0);
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyPlateau);
        // Mildly easing
        let (t, _) = predict(-0.2, 0.0, 7.0, FlightPhase::Descent, 700.0);
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyPlateau);
        // Another phase
        let (t, _) = predict(0.0, 0.0, 7.0, FlightPhase::Approach, 700.0);
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyPlateau);
    }

    #[test]
    fn test_default_plateau() {
        let (t, rule) = predict(0.0, 0.0, 3.0, FlightPhase::Cruise, 100.0);
        assert_eq!(rule, "default");
        assert_eq!(t.outcome, TrajectoryOutcome::LikelyPlateau);
        assert_eq!(t.confidence, 0.5);
        assert_eq!(t.window_sec, 180);
    }
}
