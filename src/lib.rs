//! Aloft - Real-time decision engine for flight-anxiety support
//!
//! Given a snapshot of a passenger's emotional state, biometrics, flight context
//! and conversation history, Aloft decides how a supportive conversational agent
//! should respond: which tone to use, how long and how deep the reply should be,
//! which calming exercise to offer, and when to hand over to a human.
//!
//! The engine is a deterministic pipeline:
//! crisis gate → normalization → derivatives → time axes → trajectory
//! → mode selection → response pattern → escalation → intervention ranking.
//!
//! ## Entry points
//!
//! - [`decide`]: one decision for one message
//! - [`check_proactive`]: timer-driven outreach check without a message
//! - [`DecisionEngine`]: the same operations bound to a validated [`EngineConfig`]

pub mod config;
pub mod crisis;
pub mod derivatives;
pub mod encoder;
pub mod error;
pub mod escalation;
pub mod history;
pub mod intervention;
pub mod mode;
pub mod normalizer;
pub mod pattern;
pub mod phrases;
pub mod pipeline;
pub mod proactive;
pub mod time_axes;
pub mod trajectory;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use encoder::{DecisionEncoder, DecisionEnvelope};
pub use error::EngineError;
pub use history::{Sample, SampleHistory};
pub use phrases::{PhraseBook, PhraseList};
pub use pipeline::{check_proactive, decide, DecisionEngine};

pub use types::{
    EngineOutput, EscalationDecision, EscalationReason, FlightPhase, Mode,
    ProactiveInterventionDecision, ResponsePattern, ToolId, UserState,
};

/// Engine version stamped on every decision envelope
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for decision envelopes
pub const PRODUCER_NAME: &str = "aloft";
