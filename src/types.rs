//! Core types for the Aloft decision engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: the caller-owned user snapshot, the derived signals computed per call,
//! and the decision records handed back to the presentation layer.

use crate::history::SampleHistory;
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Response persona selected for a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Classic,
    Soft,
    Minimal,
    Kid,
    Clinical,
    Nerd,
    Mystic,
    CrisisProtocol,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Classic => "CLASSIC",
            Mode::Soft => "SOFT",
            Mode::Minimal => "MINIMAL",
            Mode::Kid => "KID",
            Mode::Clinical => "CLINICAL",
            Mode::Nerd => "NERD",
            Mode::Mystic => "MYSTIC",
            Mode::CrisisProtocol => "CRISIS_PROTOCOL",
        }
    }

    /// Parse a mode name, case-insensitively. Accepts `-` or `_` separators.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "classic" => Some(Mode::Classic),
            "soft" => Some(Mode::Soft),
            "minimal" => Some(Mode::Minimal),
            "kid" => Some(Mode::Kid),
            "clinical" => Some(Mode::Clinical),
            "nerd" => Some(Mode::Nerd),
            "mystic" => Some(Mode::Mystic),
            "crisis_protocol" => Some(Mode::CrisisProtocol),
            _ => None,
        }
    }

    /// Modes a user may ask for explicitly. Crisis handling is never a preference.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Mode::CrisisProtocol)
    }
}

/// Phase of the flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    Preboarding,
    Boarding,
    DoorClose,
    Taxi,
    Takeoff,
    Climb,
    Cruise,
    Descent,
    Approach,
    Landing,
    Arrived,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FlightPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightPhase::Preboarding => "preboarding",
            FlightPhase::Boarding => "boarding",
            FlightPhase::DoorClose => "door_close",
            FlightPhase::Taxi => "taxi",
            FlightPhase::Takeoff => "takeoff",
            FlightPhase::Climb => "climb",
            FlightPhase::Cruise => "cruise",
            FlightPhase::Descent => "descent",
            FlightPhase::Approach => "approach",
            FlightPhase::Landing => "landing",
            FlightPhase::Arrived => "arrived",
            FlightPhase::Unknown => "unknown",
        }
    }

    /// The phase that normally follows this one
    pub fn next(&self) -> Option<FlightPhase> {
        match self {
            FlightPhase::Preboarding => Some(FlightPhase::Boarding),
            FlightPhase::Boarding => Some(FlightPhase::DoorClose),
            FlightPhase::DoorClose => Some(FlightPhase::Taxi),
            FlightPhase::Taxi => Some(FlightPhase::Takeoff),
            FlightPhase::Takeoff => Some(FlightPhase::Climb),
            FlightPhase::Climb => Some(FlightPhase::Cruise),
            FlightPhase::Cruise => Some(FlightPhase::Descent),
            FlightPhase::Descent => Some(FlightPhase::Approach),
            FlightPhase::Approach => Some(FlightPhase::Landing),
            FlightPhase::Landing => Some(FlightPhase::Arrived),
            FlightPhase::Arrived | FlightPhase::Unknown => None,
        }
    }

    /// Phases where a countdown style reassurance makes sense
    pub fn is_high_salience(&self) -> bool {
        matches!(self, FlightPhase::DoorClose | FlightPhase::Takeoff)
    }
}

/// A situation known to have triggered anxiety for this user before
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    DoorClose,
    Taxi,
    Takeoff,
    Climb,
    Cruise,
    Turbulence,
    Descent,
    Landing,
}

impl TriggerKind {
    /// Flight phase this trigger is tied to, if any
    pub fn phase(&self) -> Option<FlightPhase> {
        match self {
            TriggerKind::DoorClose => Some(FlightPhase::DoorClose),
            TriggerKind::Taxi => Some(FlightPhase::Taxi),
            TriggerKind::Takeoff => Some(FlightPhase::Takeoff),
            TriggerKind::Climb => Some(FlightPhase::Climb),
            TriggerKind::Cruise => Some(FlightPhase::Cruise),
            TriggerKind::Descent => Some(FlightPhase::Descent),
            TriggerKind::Landing => Some(FlightPhase::Landing),
            TriggerKind::Turbulence => None,
        }
    }
}

/// Direction of a signal over the last sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Stable,
}

/// Preferred reply length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Brief,
    #[default]
    Normal,
    Detailed,
}

impl Verbosity {
    /// Parse a verbosity name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" => Some(Verbosity::Brief),
            "normal" => Some(Verbosity::Normal),
            "detailed" => Some(Verbosity::Detailed),
            _ => None,
        }
    }

    /// Multiplier applied to the band's target word count
    pub fn word_scale(&self) -> f64 {
        match self {
            Verbosity::Brief => 0.6,
            Verbosity::Normal => 1.0,
            Verbosity::Detailed => 1.3,
        }
    }
}

/// Dominant coping archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeTrait {
    Cognitive,
    Control,
    Somatic,
    Social,
}

/// Forecast turbulence intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurbulenceLevel {
    None,
    Light,
    Moderate,
    Severe,
    Extreme,
}

impl TurbulenceLevel {
    /// Read the strongest intensity mentioned in a free-text forecast
    /// (e.g. "MOD TURB FL280-350", "light chop", "severe").
    pub fn from_forecast(forecast: &str) -> Self {
        let text = forecast.to_ascii_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if mentions(&["extreme", "extm"]) {
            TurbulenceLevel::Extreme
        } else if mentions(&["severe", "sev "]) {
            TurbulenceLevel::Severe
        } else if mentions(&["moderate", "mod "]) {
            TurbulenceLevel::Moderate
        } else if mentions(&["light", "lgt", "chop"]) {
            TurbulenceLevel::Light
        } else {
            TurbulenceLevel::None
        }
    }
}

// ============================================================================
// User snapshot
// ============================================================================

/// Physiological readings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologicalSignals {
    /// Current heart rate (bpm)
    pub heart_rate: Option<f64>,
    /// Resting baseline heart rate (bpm)
    pub baseline_heart_rate: Option<f64>,
    /// Recent heart rate samples, oldest first
    pub heart_rate_history: SampleHistory,
    /// Heart rate variability (ms, RMSSD)
    pub hrv_rmssd_ms: Option<f64>,
    /// Breaths per minute
    pub respiratory_rate: Option<f64>,
}

/// Conversational behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehavioralSignals {
    pub message_count: u32,
    /// Average characters per user message
    pub avg_message_length: Option<f64>,
    /// Average seconds the user takes to reply
    pub avg_response_latency_sec: Option<f64>,
    pub seconds_since_last_message: Option<f64>,
}

/// Cognitive markers flagged upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitiveFlags {
    pub catastrophizing: bool,
    pub control_seeking: bool,
    pub panic_language: bool,
    pub dissociation: bool,
    pub past_trigger_reference: bool,
}

/// Coping archetype scores (0-100 each)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeScores {
    pub cognitive: f64,
    pub control: f64,
    pub somatic: f64,
    pub social: f64,
}

impl ArchetypeScores {
    /// Highest scoring trait and its score. Ties resolve in declaration order.
    pub fn dominant(&self) -> (ArchetypeTrait, f64) {
        let traits = [
            (ArchetypeTrait::Cognitive, self.cognitive),
            (ArchetypeTrait::Control, self.control),
            (ArchetypeTrait::Somatic, self.somatic),
            (ArchetypeTrait::Social, self.social),
        ];
        traits
            .into_iter()
            .fold(traits[0], |best, t| if t.1 > best.1 { t } else { best })
    }
}

/// Current flight context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightContext {
    pub phase: FlightPhase,
    /// Seconds since entering the current phase
    pub time_in_phase_sec: f64,
    /// Seconds until the next phase change, when known
    pub time_to_next_event_sec: Option<f64>,
    /// Free-text turbulence forecast
    pub turbulence_forecast: Option<String>,
    /// Seconds until forecast turbulence is expected
    pub turbulence_eta_sec: Option<f64>,
    pub departure_time: Option<DateTime<Utc>>,
}

/// What we know about this user from earlier flights
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalProfile {
    #[serde(deserialize_with = "known_only")]
    pub known_triggers: Vec<TriggerKind>,
    pub hard_phases: Vec<FlightPhase>,
    #[serde(deserialize_with = "known_only")]
    pub tools_effective: Vec<ToolId>,
    #[serde(deserialize_with = "known_only")]
    pub tools_ineffective: Vec<ToolId>,
    pub completed_flights: u32,
}

impl HistoricalProfile {
    /// A phase listed as hard, or tied to a known trigger
    pub fn is_hard_phase(&self, phase: FlightPhase) -> bool {
        self.hard_phases.contains(&phase)
            || self
                .known_triggers
                .iter()
                .any(|t| t.phase() == Some(phase))
    }

    pub fn has_trigger(&self, trigger: TriggerKind) -> bool {
        self.known_triggers.contains(&trigger)
    }
}

/// User-declared preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Raw preferred mode name, normalized by the engine
    pub preferred_mode: Option<String>,
    #[serde(deserialize_with = "lenient_verbosity")]
    pub verbosity: Verbosity,
}

/// Running tallies for the current conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    pub interventions_count: u32,
    pub tools_offered: u32,
    pub tools_accepted: u32,
    /// Replies that validated without offering a tool
    pub validation_only_count: u32,
    /// Unsolicited messages sent this flight
    pub proactive_sent: u32,
    pub last_message: Option<String>,
    #[serde(deserialize_with = "lenient_mode")]
    pub last_mode: Option<Mode>,
}

/// Complete snapshot passed into every decision.
///
/// Owned and updated by the caller between invocations; the engine only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserState {
    pub user_id: String,
    pub age: Option<u32>,
    /// Self-reported anxiety (0-10)
    pub anxiety_level: Option<f64>,
    pub anxiety_history: SampleHistory,
    pub physiology: PhysiologicalSignals,
    pub behavior: BehavioralSignals,
    pub cognitive: CognitiveFlags,
    pub archetype: Option<ArchetypeScores>,
    pub flight: FlightContext,
    pub profile: HistoricalProfile,
    pub preferences: Preferences,
    pub conversation: ConversationContext,
    /// When this snapshot was taken. The engine never substitutes the clock.
    pub observed_at: Option<DateTime<Utc>>,
}

// Snapshot fields from other producers may carry values this build does not
// know. They degrade to defaults instead of rejecting the whole snapshot.

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Known(T),
    Unknown(IgnoredAny),
}

/// Keep the entries that name a known variant, drop the rest
fn known_only<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Lenient<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Lenient::Known(value) => Some(value),
            Lenient::Unknown(_) => None,
        })
        .collect())
}

fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<Mode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Lenient<String>>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Lenient::Known(name)) => Mode::parse(&name),
        _ => None,
    })
}

fn lenient_verbosity<'de, D>(deserializer: D) -> Result<Verbosity, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Lenient<String>>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Lenient::Known(name)) => Verbosity::parse(&name).unwrap_or_default(),
        _ => Verbosity::default(),
    })
}

// ============================================================================
// Derived signals
// ============================================================================

/// Rate of change for one signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalDerivative {
    /// Latest reading; `None` means no signal, not zero
    pub current: Option<f64>,
    /// Units per minute
    pub first: f64,
    /// Units per minute squared
    pub second: f64,
    pub trend: Trend,
}

/// Derivatives of anxiety and heart rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Derivatives {
    pub anxiety: SignalDerivative,
    pub heart_rate: SignalDerivative,
}

/// Relative clocks derived from the flight context
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAxes {
    pub time_in_phase_sec: f64,
    /// 1 for a first flight
    pub journey_index: u32,
    /// Seconds since departure, when derivable
    pub flight_elapsed_sec: Option<f64>,
}

/// Short-horizon anxiety forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryOutcome {
    LikelyCalm,
    LikelyPlateau,
    LikelySpike,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedTrajectory {
    pub outcome: TrajectoryOutcome,
    /// 0-1
    pub confidence: f64,
    /// Look-ahead window in seconds
    pub window_sec: u32,
}

// ============================================================================
// Response pattern
// ============================================================================

/// Anxiety band used for response shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnxietyBand {
    Low,
    Moderate,
    High,
    Crisis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationDepth {
    Brief,
    Direct,
    Full,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationDepth {
    Skip,
    Minimal,
    Moderate,
    DeepDiveOk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolUrgency {
    Immediate,
    OfferNow,
    Offer,
    IfRequested,
}

impl ToolUrgency {
    /// Seconds to wait before offering a tool. `None` means only on request.
    pub fn offer_delay_sec(&self) -> Option<u32> {
        match self {
            ToolUrgency::Immediate => Some(0),
            ToolUrgency::OfferNow => Some(10),
            ToolUrgency::Offer => Some(30),
            ToolUrgency::IfRequested => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmpowermentFraming {
    /// "You are safe right now"
    Grounding,
    /// "You've handled this before"
    Reassurance,
    /// "You have tools that work"
    Agency,
    /// "Here's how this works"
    Curiosity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceStyle {
    VeryShort,
    Short,
    Conversational,
    Expansive,
}

/// Shape contract for the reply, independent of its wording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponsePattern {
    pub band: AnxietyBand,
    pub validation: ValidationDepth,
    pub education: EducationDepth,
    pub tool_urgency: ToolUrgency,
    pub empowerment: EmpowermentFraming,
    pub target_words: u32,
    pub sentence_style: SentenceStyle,
    pub humor_allowed: bool,
    /// 0-3
    pub explanation_depth: u8,
}

// ============================================================================
// Interventions
// ============================================================================

/// Calming tools the engine can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Core paced breathing
    BoxBreathing,
    /// Double-inhale, long-exhale reset
    PhysiologicalSigh,
    /// Time-boxed reassurance through a salient phase
    TakeoffCountdown,
    /// Explain what the aircraft is doing
    AviationEducation,
    /// Validate feelings, offer nothing
    ValidationOnly,
}

impl ToolId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::BoxBreathing => "box_breathing",
            ToolId::PhysiologicalSigh => "physiological_sigh",
            ToolId::TakeoffCountdown => "takeoff_countdown",
            ToolId::AviationEducation => "aviation_education",
            ToolId::ValidationOnly => "validation_only",
        }
    }
}

/// A scored tool option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterventionCandidate {
    pub tool: ToolId,
    pub immediate_relief: f64,
    pub skill_building: f64,
    pub agency: f64,
    /// Higher is worse
    pub meta_anxiety_risk: f64,
    pub composite: f64,
}

// ============================================================================
// Decisions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    SustainedHighAnxiety,
    CatastrophicThinking,
    ToolsNotWorking,
    Dissociation,
    ReassuranceIneffective,
    UserRequest,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::SustainedHighAnxiety => "sustained_high_anxiety",
            EscalationReason::CatastrophicThinking => "catastrophic_thinking",
            EscalationReason::ToolsNotWorking => "tools_not_working",
            EscalationReason::Dissociation => "dissociation",
            EscalationReason::ReassuranceIneffective => "reassurance_ineffective",
            EscalationReason::UserRequest => "user_request",
        }
    }

    /// Message template the handoff voice opens with
    pub fn template_key(&self) -> &'static str {
        match self {
            EscalationReason::SustainedHighAnxiety => "charlie_sustained_support",
            EscalationReason::CatastrophicThinking => "charlie_safety_facts",
            EscalationReason::ToolsNotWorking => "charlie_different_approach",
            EscalationReason::Dissociation => "charlie_grounding",
            EscalationReason::ReassuranceIneffective => "charlie_authority_reassurance",
            EscalationReason::UserRequest => "charlie_introduction",
        }
    }
}

/// Whether to hand off to the human-presented authority voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EscalationDecision {
    pub escalate: bool,
    pub reason: Option<EscalationReason>,
    pub template: Option<&'static str>,
}

impl EscalationDecision {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn escalate(reason: EscalationReason) -> Self {
        Self {
            escalate: true,
            reason: Some(reason),
            template: Some(reason.template_key()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProactiveTemplate {
    PredictiveWarning,
    ProactiveBreathwork,
    BiometricCheckIn,
    GentleCheckIn,
    HeadsUpTurbulence,
}

impl ProactiveTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProactiveTemplate::PredictiveWarning => "predictive_warning",
            ProactiveTemplate::ProactiveBreathwork => "proactive_breathwork",
            ProactiveTemplate::BiometricCheckIn => "biometric_check_in",
            ProactiveTemplate::GentleCheckIn => "gentle_check_in",
            ProactiveTemplate::HeadsUpTurbulence => "heads_up_turbulence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProactiveReason {
    RateLimited,
    ApproachingTrigger,
    AnxietySpike,
    HeartRateSpike,
    ProlongedSilence,
    TurbulenceAhead,
    PredictedSpikeWindow,
    NoRisk,
}

/// Whether to message the user unprompted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProactiveInterventionDecision {
    pub intervene: bool,
    pub reason: ProactiveReason,
    pub template: Option<ProactiveTemplate>,
}

impl ProactiveInterventionDecision {
    pub fn hold(reason: ProactiveReason) -> Self {
        Self {
            intervene: false,
            reason,
            template: None,
        }
    }

    pub fn intervene(reason: ProactiveReason, template: ProactiveTemplate) -> Self {
        Self {
            intervene: true,
            reason,
            template: Some(template),
        }
    }
}

/// Quality flag indicating input issues the engine worked around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    MissingAnxiety,
    AnxietyClamped,
    UnknownPreferredMode,
    MissingHeartRate,
    IrregularSampling,
}

/// Compact view of the derivatives for downstream consumers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativeSummary {
    pub anxiety_velocity: f64,
    pub anxiety_acceleration: f64,
    pub anxiety_trend: Trend,
    pub heart_rate: Option<f64>,
    pub heart_rate_velocity: f64,
    pub heart_rate_trend: Trend,
    /// Percent above (or below) the resting baseline
    pub heart_rate_elevation_pct: Option<f64>,
}

/// Decision record returned to the presentation and generation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub mode: Mode,
    pub pattern: ResponsePattern,
    pub tool_offered: Option<ToolId>,
    pub tool_launched: bool,
    /// The ranking chose to validate without a tool
    pub validation_only: bool,
    pub crisis_detected: bool,
    pub escalate: bool,
    pub escalation_reason: Option<EscalationReason>,
    pub escalation_template: Option<String>,
    pub detected_anxiety: f64,
    pub derivatives: DerivativeSummary,
    pub trajectory: PredictedTrajectory,
    pub proactive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proactive_template: Option<ProactiveTemplate>,
    pub quality_flags: Vec<QualityFlag>,
    /// Snapshot time, null when the snapshot carried none
    pub timestamp: Option<DateTime<Utc>>,
}
