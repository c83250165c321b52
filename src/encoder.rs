//! Decision encoding
//!
//! Wraps an `EngineOutput` with producer metadata so the persistence layer can
//! store it next to the snapshot that produced it.

use crate::error::EngineError;
use crate::types::{EngineOutput, FlightPhase, UserState};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope schema version
pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Stored decision record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEnvelope {
    pub envelope_version: String,
    pub engine_version: String,
    pub producer: String,
    pub instance_id: String,
    pub user_id: String,
    pub flight_phase: FlightPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at_utc: Option<String>,
    pub computed_at_utc: String,
    pub output: EngineOutput,
}

/// Encoder producing decision envelopes
pub struct DecisionEncoder {
    instance_id: String,
}

impl Default for DecisionEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a decision together with the snapshot it was made from
    pub fn encode(&self, state: &UserState, output: &EngineOutput) -> DecisionEnvelope {
        DecisionEnvelope {
            envelope_version: ENVELOPE_VERSION.to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            producer: PRODUCER_NAME.to_string(),
            instance_id: self.instance_id.clone(),
            user_id: state.user_id.clone(),
            flight_phase: state.flight.phase,
            observed_at_utc: state.observed_at.map(|at| at.to_rfc3339()),
            computed_at_utc: Utc::now().to_rfc3339(),
            output: output.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        state: &UserState,
        output: &EngineOutput,
    ) -> Result<String, EngineError> {
        let envelope = self.encode(state, output);
        serde_json::to_string(&envelope).map_err(|e| EngineError::EncodingError(e.to_string()))
    }
}
