//! Trait seams of the REFLEX workflow.
//!
//! Two groups:
//!
//! - External collaborators (`Retriever`, `ProfileStore`, `Generator`,
//!   `SessionStore`, `PiiMasker`, `KnowledgeLookup`) — the pieces the
//!   workflow depends on but does not implement: vector search, the patient
//!   record system, the language model, the session database, PII masking.
//!   These may fail and may be slow; timeouts are their concern, and a
//!   timeout surfaces here as an ordinary `Err`.
//!
//! - Safety checks (`UrgencyClassify`, `ContraindicationCheck`,
//!   `ResponseCheck`, `HallucinationCheck`) — implemented in-repo by
//!   `reflex-guard` and `reflex-verify`. These are **trusted** and must be
//!   pure, deterministic, and infallible: no I/O, no clock, no randomness.
//!
//! Everything is `Send + Sync` so one `Orchestrator` can be shared across
//! threads; each request still owns its `CaseState` exclusively.

use std::time::Duration;

use reflex_contracts::{
    case::TriageLevel,
    check::{HallucinationReport, SafetyCheck},
    error::ReflexResult,
    profile::{Document, PatientProfile},
};

/// Semantic document retrieval over the medical knowledge corpus.
pub trait Retriever: Send + Sync {
    /// Return up to `limit` documents relevant to `query`, best first.
    ///
    /// An empty result is valid: generation proceeds without context.
    fn retrieve(&self, query: &str, limit: usize) -> ReflexResult<Vec<Document>>;
}

/// Read access to the patient record system.
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile snapshot for `patient_id`.
    ///
    /// `Ok(None)` means the patient is unknown; the workflow proceeds with
    /// an empty profile. Only a transport/store failure returns `Err`.
    fn get_profile(&self, patient_id: &str) -> ReflexResult<Option<PatientProfile>>;
}

/// The text generation collaborator (typically an LLM).
///
/// Implementations are **untrusted**: everything they produce passes through
/// the safety checks before it can reach a patient.
pub trait Generator: Send + Sync {
    fn generate(&self, system_prompt: &str, user_message: &str) -> ReflexResult<String>;
}

/// Persistence for finished case records.
pub trait SessionStore: Send + Sync {
    /// Store `record` under `session_id` with the given time-to-live.
    fn persist(&self, session_id: &str, record: &serde_json::Value, ttl: Duration) -> ReflexResult<()>;

    /// Load a previously persisted record, if it still exists.
    fn load(&self, session_id: &str) -> ReflexResult<Option<serde_json::Value>>;
}

/// PII masking applied to user input before it is logged or classified.
///
/// Infallible: an implementation that cannot mask should return the input
/// unchanged rather than fail the request.
pub trait PiiMasker: Send + Sync {
    fn mask(&self, text: &str) -> String;
}

/// Optional lookup against an external medical terminology base, used by the
/// hallucination detector for terms its local lexicons cannot settle.
pub trait KnowledgeLookup: Send + Sync {
    fn term_exists(&self, term: &str) -> ReflexResult<bool>;
}

/// Urgency classification of a symptom report. Pure and deterministic.
pub trait UrgencyClassify: Send + Sync {
    fn classify(&self, text: &str, profile: Option<&PatientProfile>) -> TriageLevel;
}

/// Drug-condition and drug-drug screening of a candidate response against a
/// patient's conditions and active medications. Pure and deterministic.
pub trait ContraindicationCheck: Send + Sync {
    fn check(&self, candidate: &str, conditions: &[String], medications: &[String]) -> SafetyCheck;
}

/// Dangerous-phrase and quality-floor screening of a candidate response.
pub trait ResponseCheck: Send + Sync {
    fn validate(&self, text: &str, score: u8) -> SafetyCheck;
}

/// Detection of unverifiable medical terms in a candidate response.
pub trait HallucinationCheck: Send + Sync {
    fn detect(&self, text: &str) -> HallucinationReport;
}
