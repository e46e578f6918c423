//! Case state: the record one request carries through the workflow.
//!
//! A `CaseState` is owned exclusively by one in-flight request and mutated
//! only by the four workflow steps (Plan, Act, Critique, Finalize) in strict
//! sequence. It is never shared across requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::{Document, PatientProfile};

/// Urgency classification of a patient report.
///
/// Set once by the Plan step and never changed afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageLevel {
    Emergency,
    Urgent,
    Routine,
}

impl TriageLevel {
    /// The fixed confidence scalar for this level.
    ///
    /// Deliberately not computed: fixed scalars keep triage auditable and
    /// reproducible across runs.
    pub fn confidence(&self) -> f64 {
        match self {
            TriageLevel::Emergency => 0.95,
            TriageLevel::Urgent => 0.85,
            TriageLevel::Routine => 0.70,
        }
    }

    /// Stable lowercase name used in logs and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageLevel::Emergency => "emergency",
            TriageLevel::Urgent => "urgent",
            TriageLevel::Routine => "routine",
        }
    }
}

/// Terminal disposition of a case. `Pending` is the only non-terminal value;
/// once any other value is set, the status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Approved,
    Escalated,
    Error,
}

impl ResponseStatus {
    pub fn is_terminal(&self) -> bool {
        *self != ResponseStatus::Pending
    }

    /// Stable lowercase name used in logs and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Approved => "approved",
            ResponseStatus::Escalated => "escalated",
            ResponseStatus::Error => "error",
        }
    }
}

/// All state one request carries between workflow steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseState {
    // Immutable inputs.
    pub patient_id: String,
    pub session_id: String,
    pub user_input: String,
    /// PII-masked form of the input, set by Plan. This is the only form
    /// that is logged, classified, or forwarded to collaborators.
    pub masked_input: String,
    /// Wall-clock time the case was created (UTC).
    pub created_at: DateTime<Utc>,

    // Plan step.
    /// Set exactly once by Plan; `None` only before Plan has run.
    pub triage_level: Option<TriageLevel>,
    pub triage_confidence: f64,
    /// Snapshot of the patient record; immutable once fetched.
    pub profile: Option<PatientProfile>,

    // Act step.
    /// Documents from the retrieval collaborator, kept for the life of the
    /// request so refinement passes reuse the same context.
    pub retrieved: Vec<Document>,
    /// Overwritten on every Act pass.
    pub draft_response: Option<String>,

    // Critique step.
    /// 1–5; overwritten each Critique pass. 0 only before the first pass.
    pub critique_score: u8,
    pub critique_feedback: Option<String>,
    /// Append-only within a request. Once non-empty, the gate never returns
    /// Refine again.
    pub safety_violations: Vec<String>,
    /// Incremented exactly once per Critique pass; never exceeds the cap at
    /// loop re-entry.
    pub reflection_iterations: u32,

    // Finalize step.
    pub final_response: Option<String>,
    pub response_status: ResponseStatus,

    // Error capture.
    /// Set on any unrecoverable collaborator failure. Once true, the status
    /// must resolve to Error.
    pub is_error: bool,
    pub error_message: Option<String>,
}

impl CaseState {
    /// Create a fresh case in the pre-Plan state.
    pub fn new(
        patient_id: impl Into<String>,
        session_id: impl Into<String>,
        user_input: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            session_id: session_id.into(),
            user_input: user_input.into(),
            masked_input: String::new(),
            created_at: Utc::now(),
            triage_level: None,
            triage_confidence: 0.0,
            profile: None,
            retrieved: Vec::new(),
            draft_response: None,
            critique_score: 0,
            critique_feedback: None,
            safety_violations: Vec::new(),
            reflection_iterations: 0,
            final_response: None,
            response_status: ResponseStatus::Pending,
            is_error: false,
            error_message: None,
        }
    }

    /// Create a fresh case with a generated session id.
    pub fn new_session(patient_id: impl Into<String>, user_input: impl Into<String>) -> Self {
        Self::new(patient_id, uuid::Uuid::new_v4().to_string(), user_input)
    }

    /// Record an unrecoverable step failure.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.is_error = true;
        self.error_message = Some(message.into());
    }
}

/// The result handed back to the caller of `process_query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub session_id: String,
    pub patient_id: String,
    pub final_response: String,
    pub triage_level: Option<TriageLevel>,
    pub triage_confidence: f64,
    pub critique_score: u8,
    pub response_status: ResponseStatus,
    pub reflection_iterations: u32,
    pub safety_violations: Vec<String>,
    /// False only when the case ended in Error status or was cancelled.
    pub success: bool,
    pub error: Option<String>,
}
