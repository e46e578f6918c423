//! # REFLEX Contracts
//!
//! Shared data contracts for the REFLEX clinical decision-support workflow:
//! the per-request case state, the verdict types produced by the safety
//! checks, the patient profile snapshot, cooperative cancellation, and the
//! unified error taxonomy.
//!
//! This crate holds types only. Behavior lives in `reflex-core` (workflow and
//! gate), `reflex-guard` (deterministic rule checks), and `reflex-verify`
//! (hallucination detection).

pub mod cancel;
pub mod case;
pub mod check;
pub mod error;
pub mod profile;

pub use cancel::CancelToken;
pub use case::{CaseResult, CaseState, ResponseStatus, TriageLevel};
pub use check::{HallucinationReport, SafetyCheck, TermClass};
pub use error::{ReflexError, ReflexResult};
pub use profile::{Document, PatientProfile};

// ── tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_levels_serialize_lowercase() {
        let json = serde_json::to_string(&TriageLevel::Emergency).unwrap();
        assert_eq!(json, "\"emergency\"");
        let back: TriageLevel = serde_json::from_str("\"routine\"").unwrap();
        assert_eq!(back, TriageLevel::Routine);
    }

    #[test]
    fn triage_confidence_is_fixed_per_level() {
        assert_eq!(TriageLevel::Emergency.confidence(), 0.95);
        assert_eq!(TriageLevel::Urgent.confidence(), 0.85);
        assert_eq!(TriageLevel::Routine.confidence(), 0.70);
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!ResponseStatus::Pending.is_terminal());
        assert!(ResponseStatus::Approved.is_terminal());
        assert!(ResponseStatus::Escalated.is_terminal());
        assert!(ResponseStatus::Error.is_terminal());
    }

    #[test]
    fn new_case_starts_pending_with_no_violations() {
        let case = CaseState::new("patient-1", "session-1", "I have a headache");
        assert_eq!(case.response_status, ResponseStatus::Pending);
        assert!(case.masked_input.is_empty());
        assert!(case.triage_level.is_none());
        assert!(case.safety_violations.is_empty());
        assert_eq!(case.reflection_iterations, 0);
        assert!(!case.is_error);
    }

    #[test]
    fn generated_session_ids_are_unique() {
        let a = CaseState::new_session("patient-1", "hello");
        let b = CaseState::new_session("patient-1", "hello");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn set_error_marks_case() {
        let mut case = CaseState::new("p", "s", "q");
        case.set_error("generation failed: timeout");
        assert!(case.is_error);
        assert_eq!(case.error_message.as_deref(), Some("generation failed: timeout"));
    }

    #[test]
    fn error_messages_name_the_failing_collaborator() {
        let err = ReflexError::Retrieval { reason: "connection refused".into() };
        assert_eq!(err.to_string(), "retrieval failed: connection refused");
        let err = ReflexError::Cancelled;
        assert_eq!(err.to_string(), "request cancelled");
    }

    #[test]
    fn flagged_term_classes() {
        assert!(TermClass::Blacklisted.is_flagged());
        assert!(TermClass::Suspicious.is_flagged());
        assert!(!TermClass::Known.is_flagged());
        assert!(!TermClass::Unverified.is_flagged());
    }

    #[test]
    fn case_state_round_trips_through_json() {
        let mut case = CaseState::new("p-42", "s-42", "knee pain");
        case.triage_level = Some(TriageLevel::Urgent);
        case.triage_confidence = TriageLevel::Urgent.confidence();
        case.safety_violations.push("CONTRAINDICATION: naproxen with asthma".into());
        let json = serde_json::to_string(&case).unwrap();
        let back: CaseState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.triage_level, Some(TriageLevel::Urgent));
        assert_eq!(back.safety_violations, case.safety_violations);
    }
}
