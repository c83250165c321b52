//! Pipeline orchestration
//!
//! This module provides the public API for Aloft. One message and one snapshot
//! go in, one `EngineOutput` comes out.
//!
//! Stages, in order:
//! 1. StateNormalizer - repair anxiety and the mode preference
//! 2. DerivativeEngine - rates of change
//! 3. TimeAxisBuilder - relative clocks
//! 4. TrajectoryPredictor - three minute forecast
//! 5. CrisisDetector - short-circuits to the crisis protocol
//! 6. ModeSelector - persona cascade
//! 7. ResponsePatternSelector - reply shape
//! 8. EscalationDecider - short-circuits tool selection
//! 9. InterventionRanker - tool choice

use crate::config::EngineConfig;
use crate::crisis::CrisisDetector;
use crate::derivatives::{anxiety_window, DerivativeEngine};
use crate::error::EngineError;
use crate::escalation::{EscalationContext, EscalationDecider};
use crate::intervention::{InterventionRanker, RankingInput, ToolSelection};
use crate::mode::{ModeContext, ModeSelector};
use crate::normalizer::StateNormalizer;
use crate::pattern::ResponsePatternSelector;
use crate::phrases::PhraseKind;
use crate::proactive::ProactiveMonitor;
use crate::time_axes::TimeAxisBuilder;
use crate::trajectory::{TrajectoryInput, TrajectoryPredictor};
use crate::types::{
    ArchetypeTrait, EngineOutput, ProactiveInterventionDecision, ProactiveTemplate, ToolId,
    UserState,
};
use tracing::debug;

/// Decide how to respond to a message.
///
/// Never fails: malformed snapshot fields are repaired and reported through
/// `quality_flags`.
///
/// # Example
/// ```ignore
/// let output = decide("is that noise normal?", &state, &EngineConfig::default());
/// println!("{}", output.mode.as_str());
/// ```
pub fn decide(message: &str, state: &UserState, config: &EngineConfig) -> EngineOutput {
    // Stages 1-4: normalize and derive
    let normalized = StateNormalizer::normalize(state);
    let anxiety = normalized.anxiety;
    let derivatives = DerivativeEngine::derive(state, config);
    let axes = TimeAxisBuilder::build(state);
    let trajectory = TrajectoryPredictor::predict(&TrajectoryInput {
        derivatives: &derivatives,
        axes: &axes,
        anxiety,
        phase: state.flight.phase,
    });

    // Stage 5: crisis gate
    let crisis = CrisisDetector::new(&config.phrases).detect(message);
    let panic_language =
        state.cognitive.panic_language || config.phrases.matches(PhraseKind::Panic, message);

    // Stages 6-7: persona and shape
    let mode_ctx = ModeContext {
        anxiety,
        crisis,
        panic_language,
        preferred_mode: normalized.preferred_mode,
        age: state.age,
        archetype: state.archetype,
        avg_message_length: state.behavior.avg_message_length,
        message,
        config,
    };
    let (mode, rule) = ModeSelector::select_with_rule(&mode_ctx);
    let pattern =
        ResponsePatternSelector::select(anxiety, &config.bands, state.preferences.verbosity);
    debug!(user_id = %state.user_id, mode = mode.as_str(), rule, anxiety, "mode selected");

    let mut output = EngineOutput {
        mode,
        pattern,
        tool_offered: None,
        tool_launched: false,
        validation_only: false,
        crisis_detected: crisis,
        escalate: false,
        escalation_reason: None,
        escalation_template: None,
        detected_anxiety: anxiety,
        derivatives: DerivativeEngine::summarize(&derivatives, state),
        trajectory,
        proactive: false,
        proactive_template: None,
        quality_flags: normalized.quality_flags,
        timestamp: state.observed_at,
    };

    if crisis {
        debug!(user_id = %state.user_id, "crisis protocol, skipping escalation and tools");
        return output;
    }

    // Stage 8: escalation pre-empts any tool
    let anxiety_history = anxiety_window(&state.anxiety_history, config);
    let escalation = EscalationDecider::decide(&EscalationContext {
        anxiety,
        anxiety_history: &anxiety_history,
        anxiety_trend: derivatives.anxiety.trend,
        panic_language,
        dissociation: state.cognitive.dissociation,
        conversation: &state.conversation,
        message,
        config,
    });
    if escalation.escalate {
        output.escalate = true;
        output.escalation_reason = escalation.reason;
        output.escalation_template = escalation.template.map(str::to_string);
        return output;
    }

    // Stage 9: tool choice
    let control_seeking = state.cognitive.control_seeking
        || state.archetype.is_some_and(|scores| {
            let (dominant, score) = scores.dominant();
            dominant == ArchetypeTrait::Control && score > config.archetype_dominance
        });
    let ranked = InterventionRanker::rank(&RankingInput {
        outcome: trajectory.outcome,
        anxiety,
        phase: state.flight.phase,
        control_seeking,
        profile: &state.profile,
    });
    let ToolSelection {
        tool,
        launched,
        validation_only,
    } = InterventionRanker::select(&ranked, &pattern, anxiety, config);

    output.tool_offered = tool;
    output.tool_launched = launched;
    output.validation_only = validation_only;
    output
}

/// Decide whether to reach out to the user unprompted
pub fn check_proactive(state: &UserState, config: &EngineConfig) -> ProactiveInterventionDecision {
    ProactiveMonitor::check(state, config)
}

/// Decide from a JSON snapshot, returning the output as JSON
pub fn decide_json(
    message: &str,
    state_json: &str,
    config: &EngineConfig,
) -> Result<String, EngineError> {
    let state: UserState = serde_json::from_str(state_json)?;
    let output = decide(message, &state, config);
    serde_json::to_string(&output).map_err(|e| EngineError::EncodingError(e.to_string()))
}

/// Proactive check from a JSON snapshot, returning the decision as JSON
pub fn check_proactive_json(
    state_json: &str,
    config: &EngineConfig,
) -> Result<String, EngineError> {
    let state: UserState = serde_json::from_str(state_json)?;
    let decision = check_proactive(&state, config);
    serde_json::to_string(&decision).map_err(|e| EngineError::EncodingError(e.to_string()))
}

/// Engine bound to one configuration.
///
/// Holds no per-user state; a single instance can serve every flight.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create an engine from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, EngineError> {
        Ok(Self {
            config: EngineConfig::from_json(json)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn decide(&self, message: &str, state: &UserState) -> EngineOutput {
        decide(message, state, &self.config)
    }

    pub fn check_proactive(&self, state: &UserState) -> ProactiveInterventionDecision {
        check_proactive(state, &self.config)
    }

    /// Build the unsolicited message decision when the monitor chooses to reach out.
    ///
    /// Runs the full cascade with an empty message. Breathwork templates offer
    /// the core breathing tool; check-ins offer nothing. Nothing auto-launches.
    pub fn proactive_output(&self, state: &UserState) -> Option<EngineOutput> {
        let decision = self.check_proactive(state);
        let template = decision.template.filter(|_| decision.intervene)?;

        let mut output = self.decide("", state);
        output.proactive = true;
        output.proactive_template = Some(template);
        output.tool_launched = false;
        if !output.escalate {
            output.validation_only = false;
            output.tool_offered = match template {
                ProactiveTemplate::ProactiveBreathwork => Some(ToolId::BoxBreathing),
                _ => None,
            };
        }

        debug!(
            user_id = %state.user_id,
            template = template.as_str(),
            mode = output.mode.as_str(),
            "proactive output"
        );
        Some(output)
    }

    pub fn decide_json(&self, message: &str, state_json: &str) -> Result<String, EngineError> {
        decide_json(message, state_json, &self.config)
    }

    pub fn check_proactive_json(&self, state_json: &str) -> Result<String, EngineError> {
        check_proactive_json(state_json, &self.config)
    }
}
