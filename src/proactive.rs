//! Proactive outreach
//!
//! Timer-driven check deciding whether to message the user unprompted. The
//! per-flight counter is owned by the caller (`conversation.proactive_sent`);
//! once it reaches the cap nothing else is evaluated.

use crate::config::EngineConfig;
use crate::derivatives::DerivativeEngine;
use crate::normalizer::normalize_anxiety;
use crate::time_axes::TimeAxisBuilder;
use crate::trajectory::{TrajectoryInput, TrajectoryPredictor};
use crate::types::{
    Derivatives, PredictedTrajectory, ProactiveInterventionDecision, ProactiveReason,
    ProactiveTemplate, TrajectoryOutcome, TriggerKind, TurbulenceLevel, UserState,
};
use tracing::debug;

/// Per-check view of the snapshot shared by every rule
#[derive(Debug, Clone, Copy)]
pub struct ProactiveSignals<'a> {
    pub state: &'a UserState,
    pub anxiety: f64,
    pub derivatives: Derivatives,
    pub trajectory: PredictedTrajectory,
    pub config: &'a EngineConfig,
}

impl<'a> ProactiveSignals<'a> {
    /// Run the shared derivative, time-axis and trajectory stages
    pub fn gather(state: &'a UserState, config: &'a EngineConfig) -> Self {
        let anxiety = normalize_anxiety(state.anxiety_level);
        let derivatives = DerivativeEngine::derive(state, config);
        let axes = TimeAxisBuilder::build(state);
        let trajectory = TrajectoryPredictor::predict(&TrajectoryInput {
            derivatives: &derivatives,
            axes: &axes,
            anxiety,
            phase: state.flight.phase,
        });

        Self {
            state,
            anxiety,
            derivatives,
            trajectory,
            config,
        }
    }

    fn in_hard_phase(&self) -> bool {
        self.state.profile.is_hard_phase(self.state.flight.phase)
    }
}

pub struct ProactiveRule {
    pub reason: ProactiveReason,
    pub template: ProactiveTemplate,
    pub applies: fn(&ProactiveSignals) -> bool,
}

/// Outreach rules in priority order
pub const PROACTIVE_RULES: &[ProactiveRule] = &[
    ProactiveRule {
        reason: ProactiveReason::ApproachingTrigger,
        template: ProactiveTemplate::PredictiveWarning,
        applies: approaching_trigger,
    },
    ProactiveRule {
        reason: ProactiveReason::AnxietySpike,
        template: ProactiveTemplate::ProactiveBreathwork,
        applies: |s| s.derivatives.anxiety.first > s.config.proactive.anxiety_spike_per_min,
    },
    ProactiveRule {
        reason: ProactiveReason::HeartRateSpike,
        template: ProactiveTemplate::BiometricCheckIn,
        applies: |s| {
            s.derivatives.heart_rate.first > s.config.proactive.heart_rate_spike_bpm_per_min
        },
    },
    ProactiveRule {
        reason: ProactiveReason::ProlongedSilence,
        template: ProactiveTemplate::GentleCheckIn,
        applies: |s| {
            s.in_hard_phase()
                && s.state
                    .behavior
                    .seconds_since_last_message
                    .is_some_and(|silent| silent > s.config.proactive.silence_threshold_sec)
        },
    },
    ProactiveRule {
        reason: ProactiveReason::TurbulenceAhead,
        template: ProactiveTemplate::HeadsUpTurbulence,
        applies: turbulence_ahead,
    },
    ProactiveRule {
        reason: ProactiveReason::PredictedSpikeWindow,
        template: ProactiveTemplate::ProactiveBreathwork,
        applies: |s| {
            s.trajectory.outcome == TrajectoryOutcome::LikelySpike
                && s.anxiety >= s.config.proactive.predicted_spike_min_anxiety
                && s.in_hard_phase()
        },
    },
];

/// The next phase is tied to a known trigger and starts within the lead time
fn approaching_trigger(s: &ProactiveSignals) -> bool {
    let flight = &s.state.flight;
    let (Some(next), Some(eta)) = (flight.phase.next(), flight.time_to_next_event_sec) else {
        return false;
    };

    (0.0..=s.config.proactive.trigger_lead_time_sec).contains(&eta)
        && s.state
            .profile
            .known_triggers
            .iter()
            .any(|t| t.phase() == Some(next))
}

/// Moderate or worse turbulence is forecast soon and bothers this user
fn turbulence_ahead(s: &ProactiveSignals) -> bool {
    let flight = &s.state.flight;
    let level = flight
        .turbulence_forecast
        .as_deref()
        .map(TurbulenceLevel::from_forecast)
        .unwrap_or(TurbulenceLevel::None);
    // A forecast without an ETA is treated as current
    let imminent = flight
        .turbulence_eta_sec
        .map_or(true, |eta| eta <= s.config.proactive.turbulence_lead_time_sec);

    level >= TurbulenceLevel::Moderate
        && imminent
        && s.state.profile.has_trigger(TriggerKind::Turbulence)
}

/// Monitor deciding on unsolicited outreach
pub struct ProactiveMonitor;

impl ProactiveMonitor {
    pub fn check(state: &UserState, config: &EngineConfig) -> ProactiveInterventionDecision {
        if state.conversation.proactive_sent >= config.proactive.max_per_flight {
            debug!(
                user_id = %state.user_id,
                sent = state.conversation.proactive_sent,
                "proactive rate limit reached"
            );
            return ProactiveInterventionDecision::hold(ProactiveReason::RateLimited);
        }

        Self::evaluate(&ProactiveSignals::gather(state, config))
    }

    /// Evaluate the rules on already gathered signals, ignoring the rate limit
    pub fn evaluate(signals: &ProactiveSignals) -> ProactiveInterventionDecision {
        match PROACTIVE_RULES.iter().find(|rule| (rule.applies)(signals)) {
            Some(rule) => {
                debug!(
                    user_id = %signals.state.user_id,
                    template = rule.template.as_str(),
                    "proactive outreach"
                );
                ProactiveInterventionDecision::intervene(rule.reason, rule.template)
            }
            None => ProactiveInterventionDecision::hold(ProactiveReason::NoRisk),
        }
    }
}
