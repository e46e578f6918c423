//! The REFLEX orchestrator: the bounded reflective workflow.
//!
//! One call to `process_query()` drives a case through:
//!
//!   Plan → [ Act → Critique → Gate ]* → Finalize
//!
//! The gate loops back to Act at most `MAX_REFLECTION_ITERATIONS` times.
//! The safety invariant is structural: every draft that can reach a patient
//! has passed through Critique, and a draft with a recorded safety violation
//! is never refined and never approved.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use reflex_contracts::{
    cancel::CancelToken,
    case::{CaseResult, CaseState, ResponseStatus, TriageLevel},
    error::{ReflexError, ReflexResult},
    profile::PatientProfile,
};

use crate::gate::{CriticGate, GateDecision};
use crate::traits::{
    ContraindicationCheck, Generator, HallucinationCheck, PiiMasker, ProfileStore, ResponseCheck,
    Retriever, SessionStore, UrgencyClassify,
};

/// Canned response issued for emergency-triaged cases. Never generated.
const EMERGENCY_RESPONSE: &str = "Based on your symptoms, this may be a medical emergency. \
     Call 911 or go to the nearest emergency department immediately. \
     Do not wait for an online response.";

/// Generic text returned when a collaborator failure ends the case.
const ERROR_RESPONSE: &str = "We could not process your request right now. Please try again \
     shortly, and seek medical care directly if your symptoms are serious.";

const CRITIC_PROMPT: &str = "You are a clinical quality reviewer. Rate the following draft \
     response for accuracy, safety, and completeness on a 1-5 scale. Respond with JSON only: \
     {\"score\": <1-5>, \"feedback\": \"<one sentence>\"}";

/// Tunable knobs of the workflow. The defaults are the production values.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Minimum critique score for auto-approval (gate rule 5).
    pub min_approval_score: u8,
    /// Document cap passed to the retriever.
    pub retrieval_limit: usize,
    /// Time-to-live for persisted session records.
    pub session_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            min_approval_score: 4,
            retrieval_limit: 5,
            session_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// The external collaborators the workflow depends on.
pub struct Collaborators {
    pub retriever: Box<dyn Retriever>,
    pub profiles: Box<dyn ProfileStore>,
    pub generator: Box<dyn Generator>,
    pub sessions: Box<dyn SessionStore>,
    pub masker: Box<dyn PiiMasker>,
}

/// The trusted safety checks, injected so the workflow never hard-codes a
/// rule implementation.
pub struct CheckSuite {
    pub triage: Box<dyn UrgencyClassify>,
    pub contraindications: Box<dyn ContraindicationCheck>,
    pub validator: Box<dyn ResponseCheck>,
    pub hallucinations: Box<dyn HallucinationCheck>,
}

/// The workflow driver. One instance may serve many concurrent requests;
/// each call owns its `CaseState` exclusively.
pub struct Orchestrator {
    collab: Collaborators,
    checks: CheckSuite,
    config: OrchestratorConfig,
}

#[derive(Deserialize)]
struct CriticVerdict {
    score: u8,
    feedback: String,
}

impl Orchestrator {
    pub fn new(collab: Collaborators, checks: CheckSuite, config: OrchestratorConfig) -> Self {
        Self { collab, checks, config }
    }

    /// Run one case to a terminal status and return the result.
    ///
    /// Collaborator failures never escape: they resolve to ERROR status with
    /// `success = false`. Pass `session_id = None` to have one generated.
    pub fn process_query(
        &self,
        patient_id: &str,
        user_input: &str,
        session_id: Option<String>,
    ) -> CaseResult {
        self.process_query_with_cancel(patient_id, user_input, session_id, &CancelToken::new())
    }

    /// Like `process_query`, but polls `cancel` before every external call.
    ///
    /// Once the token is raised no further collaborator calls are issued,
    /// nothing is persisted, and the result carries `success = false` with
    /// the non-terminal PENDING status.
    pub fn process_query_with_cancel(
        &self,
        patient_id: &str,
        user_input: &str,
        session_id: Option<String>,
        cancel: &CancelToken,
    ) -> CaseResult {
        let mut case = match session_id {
            Some(id) => CaseState::new(patient_id, id, user_input),
            None => CaseState::new_session(patient_id, user_input),
        };

        match self.run(&mut case, cancel) {
            Ok(()) => Self::into_result(case),
            Err(ReflexError::Cancelled) => Self::into_cancelled_result(case),
            // run() only surfaces cancellation; anything else is a bug in a
            // step, treated the same as a collaborator failure.
            Err(other) => {
                error!(session_id = %case.session_id, error = %other, "workflow step failed");
                case.set_error(other.to_string());
                case.response_status = ResponseStatus::Error;
                case.final_response = Some(ERROR_RESPONSE.to_string());
                Self::into_result(case)
            }
        }
    }

    fn run(&self, case: &mut CaseState, cancel: &CancelToken) -> ReflexResult<()> {
        self.plan(case, cancel)?;

        loop {
            self.act(case, cancel)?;
            self.critique(case, cancel)?;

            match CriticGate::decide(case, self.config.min_approval_score) {
                GateDecision::Refine => {
                    debug!(
                        session_id = %case.session_id,
                        score = case.critique_score,
                        iteration = case.reflection_iterations,
                        "gate requested refinement"
                    );
                }
                GateDecision::Approve(reason) => {
                    debug!(
                        session_id = %case.session_id,
                        reason = ?reason,
                        iteration = case.reflection_iterations,
                        "gate exited the loop"
                    );
                    break;
                }
            }
        }

        self.finalize(case, cancel)
    }

    // ── Plan ─────────────────────────────────────────────────────────────────

    /// Mask PII, fetch the patient profile, classify triage once.
    fn plan(&self, case: &mut CaseState, cancel: &CancelToken) -> ReflexResult<()> {
        // The masked form is the only one logged, classified, or sent to
        // collaborators from here on.
        case.masked_input = self.collab.masker.mask(&case.user_input);

        checkpoint(cancel)?;
        match self.collab.profiles.get_profile(&case.patient_id) {
            Ok(Some(profile)) => case.profile = Some(profile),
            Ok(None) => {
                warn!(
                    session_id = %case.session_id,
                    patient_id = %case.patient_id,
                    "no patient record found, proceeding with empty profile"
                );
                case.profile = Some(PatientProfile::empty());
            }
            Err(err) => {
                error!(session_id = %case.session_id, error = %err, "profile lookup failed");
                case.set_error(err.to_string());
                return Ok(());
            }
        }

        let level = self.checks.triage.classify(&case.masked_input, case.profile.as_ref());
        case.triage_level = Some(level);
        case.triage_confidence = level.confidence();

        info!(
            session_id = %case.session_id,
            triage = level.as_str(),
            confidence = level.confidence(),
            input = %case.masked_input,
            "plan complete"
        );
        Ok(())
    }

    // ── Act ──────────────────────────────────────────────────────────────────

    /// Produce a draft: canned for emergencies, generated otherwise.
    fn act(&self, case: &mut CaseState, cancel: &CancelToken) -> ReflexResult<()> {
        if case.is_error {
            return Ok(());
        }

        if case.triage_level == Some(TriageLevel::Emergency) {
            info!(session_id = %case.session_id, "emergency triage, issuing canned response");
            case.draft_response = Some(EMERGENCY_RESPONSE.to_string());
            return Ok(());
        }

        // Retrieval happens once; refinement passes reuse the same context.
        if case.reflection_iterations == 0 {
            checkpoint(cancel)?;
            match self.collab.retriever.retrieve(&case.masked_input, self.config.retrieval_limit) {
                Ok(docs) => {
                    debug!(session_id = %case.session_id, count = docs.len(), "documents retrieved");
                    case.retrieved = docs;
                }
                Err(err) => {
                    error!(session_id = %case.session_id, error = %err, "retrieval failed");
                    case.set_error(err.to_string());
                    return Ok(());
                }
            }
        }

        let system_prompt = self.build_system_prompt(case);
        checkpoint(cancel)?;
        match self.collab.generator.generate(&system_prompt, &case.masked_input) {
            Ok(draft) => case.draft_response = Some(draft),
            Err(err) => {
                error!(session_id = %case.session_id, error = %err, "generation failed");
                case.set_error(err.to_string());
            }
        }
        Ok(())
    }

    fn build_system_prompt(&self, case: &CaseState) -> String {
        let empty = PatientProfile::empty();
        let profile = case.profile.as_ref().unwrap_or(&empty);

        let mut prompt = String::from(
            "You are a clinical decision-support assistant. Answer the patient's \
             question using only the context provided. Recommend professional \
             follow-up for anything you are not certain about.\n",
        );
        prompt.push_str(&format!(
            "\nPatient conditions: {}\nActive medications: {}\nAllergies: {}\n",
            join_or_none(&profile.conditions),
            join_or_none(&profile.medications),
            join_or_none(&profile.allergies),
        ));
        if !case.retrieved.is_empty() {
            prompt.push_str("\nRelevant reference material:\n");
            for doc in &case.retrieved {
                prompt.push_str("- ");
                prompt.push_str(&doc.content);
                prompt.push('\n');
            }
        }
        if case.reflection_iterations > 0 {
            if let Some(feedback) = &case.critique_feedback {
                prompt.push_str(&format!(
                    "\nA previous draft was rejected by review. Address this feedback: {feedback}\n"
                ));
            }
        }
        prompt
    }

    // ── Critique ─────────────────────────────────────────────────────────────

    /// Run the safety checks and obtain a quality score for the draft.
    ///
    /// Increments `reflection_iterations` exactly once per pass. Emergency
    /// and error cases never reach the pass body, so their count stays 0.
    fn critique(&self, case: &mut CaseState, cancel: &CancelToken) -> ReflexResult<()> {
        if case.is_error {
            return Ok(());
        }

        if case.triage_level == Some(TriageLevel::Emergency) {
            case.critique_score = 5;
            case.critique_feedback = Some("emergency response - safety verified".to_string());
            return Ok(());
        }

        let draft = case.draft_response.clone().unwrap_or_default();
        let empty = PatientProfile::empty();
        let profile = case.profile.as_ref().unwrap_or(&empty);

        // A contraindication ends the pass immediately at the floor score.
        let contra =
            self.checks.contraindications.check(&draft, &profile.conditions, &profile.medications);
        if !contra.safe {
            warn!(session_id = %case.session_id, reason = %contra.reason, "contraindication detected");
            case.safety_violations.push(contra.reason.clone());
            case.critique_score = 1;
            case.critique_feedback = Some(contra.reason);
            case.reflection_iterations += 1;
            return Ok(());
        }

        // Advisory: records a violation but the pass continues, so the case
        // still carries a real quality score into escalation.
        let report = self.checks.hallucinations.detect(&draft);
        if report.flagged {
            warn!(
                session_id = %case.session_id,
                terms = ?report.suspect_terms,
                "unverifiable terms detected"
            );
            case.safety_violations.push(report.message);
        }

        let validation = self.checks.validator.validate(&draft, 4);
        if !validation.safe {
            warn!(session_id = %case.session_id, reason = %validation.reason, "response validation failed");
            case.safety_violations.push(validation.reason);
        }

        let (score, feedback) = self.score_draft(case, &draft, cancel)?;
        case.critique_score = score;
        case.critique_feedback = Some(feedback);
        case.reflection_iterations += 1;

        debug!(
            session_id = %case.session_id,
            score = case.critique_score,
            violations = case.safety_violations.len(),
            iteration = case.reflection_iterations,
            "critique pass complete"
        );
        Ok(())
    }

    /// Ask the generator to score the draft; fall back deterministically when
    /// the call fails or the output is unparseable.
    fn score_draft(
        &self,
        case: &CaseState,
        draft: &str,
        cancel: &CancelToken,
    ) -> ReflexResult<(u8, String)> {
        checkpoint(cancel)?;

        let fallback = if case.safety_violations.is_empty() { 4 } else { 2 };
        let prompt = self.build_critic_prompt(case);
        let raw = match self.collab.generator.generate(&prompt, draft) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(session_id = %case.session_id, error = %err, "critic call failed, using fallback score");
                return Ok((fallback, "automated review unavailable".to_string()));
            }
        };

        match parse_critic_output(&raw) {
            Some((score, feedback)) => Ok((score, feedback)),
            None => {
                warn!(session_id = %case.session_id, "critic output unparseable, using fallback score");
                Ok((fallback, "automated review unavailable".to_string()))
            }
        }
    }

    /// The reviewer sees the patient summary and any safety findings already
    /// recorded against the draft, not the draft alone.
    fn build_critic_prompt(&self, case: &CaseState) -> String {
        let empty = PatientProfile::empty();
        let profile = case.profile.as_ref().unwrap_or(&empty);

        let mut prompt = String::from(CRITIC_PROMPT);
        prompt.push_str(&format!(
            "\nPatient conditions: {}\nActive medications: {}\n",
            join_or_none(&profile.conditions),
            join_or_none(&profile.medications),
        ));
        if !case.safety_violations.is_empty() {
            prompt.push_str("\nSafety findings already recorded against this draft:\n");
            for violation in &case.safety_violations {
                prompt.push_str("- ");
                prompt.push_str(violation);
                prompt.push('\n');
            }
        }
        prompt
    }

    // ── Finalize ─────────────────────────────────────────────────────────────

    /// Resolve the terminal status, set the user-visible text, persist.
    fn finalize(&self, case: &mut CaseState, cancel: &CancelToken) -> ReflexResult<()> {
        checkpoint(cancel)?;

        if case.is_error {
            case.response_status = ResponseStatus::Error;
            case.final_response = Some(ERROR_RESPONSE.to_string());
        } else if case.triage_level == Some(TriageLevel::Emergency) {
            case.response_status = ResponseStatus::Approved;
            case.final_response = case.draft_response.clone();
        } else if case.critique_score >= self.config.min_approval_score
            && case.safety_violations.is_empty()
        {
            case.response_status = ResponseStatus::Approved;
            case.final_response = case.draft_response.clone();
        } else {
            case.response_status = ResponseStatus::Escalated;
            case.final_response = Some(escalation_notice(case));
        }

        let record = session_record(case);
        if let Err(err) =
            self.collab.sessions.persist(&case.session_id, &record, self.config.session_ttl)
        {
            error!(session_id = %case.session_id, error = %err, "session persistence failed");
            case.set_error(err.to_string());
            case.response_status = ResponseStatus::Error;
            case.final_response = Some(ERROR_RESPONSE.to_string());
        }

        info!(
            session_id = %case.session_id,
            status = case.response_status.as_str(),
            score = case.critique_score,
            iterations = case.reflection_iterations,
            violations = case.safety_violations.len(),
            "case finalized"
        );
        Ok(())
    }

    fn into_result(case: CaseState) -> CaseResult {
        let success = case.response_status != ResponseStatus::Error;
        CaseResult {
            session_id: case.session_id,
            patient_id: case.patient_id,
            final_response: case.final_response.unwrap_or_default(),
            triage_level: case.triage_level,
            triage_confidence: case.triage_confidence,
            critique_score: case.critique_score,
            response_status: case.response_status,
            reflection_iterations: case.reflection_iterations,
            safety_violations: case.safety_violations,
            success,
            error: case.error_message,
        }
    }

    fn into_cancelled_result(case: CaseState) -> CaseResult {
        warn!(session_id = %case.session_id, "request cancelled before completion");
        CaseResult {
            session_id: case.session_id,
            patient_id: case.patient_id,
            final_response: String::new(),
            triage_level: case.triage_level,
            triage_confidence: case.triage_confidence,
            critique_score: case.critique_score,
            // Cancellation never forges a terminal status.
            response_status: case.response_status,
            reflection_iterations: case.reflection_iterations,
            safety_violations: case.safety_violations,
            success: false,
            error: Some("cancelled".to_string()),
        }
    }
}

fn checkpoint(cancel: &CancelToken) -> ReflexResult<()> {
    if cancel.is_cancelled() {
        return Err(ReflexError::Cancelled);
    }
    Ok(())
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none recorded".to_string()
    } else {
        items.join(", ")
    }
}

/// Accepts the critic's JSON even when wrapped in surrounding prose.
fn parse_critic_output(raw: &str) -> Option<(u8, String)> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    let verdict: CriticVerdict = serde_json::from_str(raw.get(start..=end)?).ok()?;
    if (1..=5).contains(&verdict.score) {
        Some((verdict.score, verdict.feedback))
    } else {
        None
    }
}

fn escalation_notice(case: &CaseState) -> String {
    let feedback = case
        .critique_feedback
        .as_deref()
        .unwrap_or("the draft did not pass automated review");
    format!(
        "Your question needs review by a clinician before a recommendation can be \
         shared. Reviewer notes: {feedback}. Please contact your healthcare provider \
         to discuss your symptoms directly."
    )
}

fn session_record(case: &CaseState) -> serde_json::Value {
    serde_json::json!({
        "session_id": case.session_id,
        "patient_id": case.patient_id,
        "created_at": case.created_at.to_rfc3339(),
        "triage_level": case.triage_level.map(|l| l.as_str()),
        "triage_confidence": case.triage_confidence,
        "final_response": case.final_response,
        "critique_score": case.critique_score,
        "critique_feedback": case.critique_feedback,
        "response_status": case.response_status.as_str(),
        "reflection_iterations": case.reflection_iterations,
        "safety_violations": case.safety_violations,
        "is_error": case.is_error,
        "error_message": case.error_message,
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
