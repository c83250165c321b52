//! Relative clocks
//!
//! Derives time-in-phase, the journey index and, when a departure time is
//! known, seconds since departure.

use crate::types::{TimeAxes, UserState};

/// Builder for the relative time axes of a snapshot
pub struct TimeAxisBuilder;

impl TimeAxisBuilder {
    pub fn build(state: &UserState) -> TimeAxes {
        let time_in_phase_sec = if state.flight.time_in_phase_sec.is_finite() {
            state.flight.time_in_phase_sec.max(0.0)
        } else {
            0.0
        };

        // Undefined unless the snapshot says both when it departed and when it was taken
        let flight_elapsed_sec = match (state.flight.departure_time, state.observed_at) {
            (Some(departed), Some(observed)) => {
                let elapsed = (observed - departed).num_milliseconds() as f64 / 1000.0;
                (elapsed >= 0.0).then_some(elapsed)
            }
            _ => None,
        };

        TimeAxes {
            time_in_phase_sec,
            journey_index: state.profile.completed_flights.saturating_add(1),
            flight_elapsed_sec,
        }
    }
}
