//! The critic gate: the single decision point between another refinement
//! pass and finalization.
//!
//! The priority order below is the core safety guarantee of the loop. In
//! particular, rule 3 sits ABOVE the score and iteration rules: once any
//! safety rule has fired, the gate exits the loop immediately so a violating
//! draft is never handed back to the generator for another attempt.

use reflex_contracts::case::{CaseState, TriageLevel};

/// Hard cap on Critique passes per request. The gate exits the loop at this
/// count regardless of score.
pub const MAX_REFLECTION_ITERATIONS: u32 = 3;

/// Why the gate chose to exit the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveReason {
    /// A collaborator failed; finalize with ERROR status.
    ErrorPassThrough,
    /// Emergency triage; the canned response is already in place.
    Emergency,
    /// A safety rule fired; refinement is forbidden from here on.
    SafetyViolation,
    /// The iteration cap was reached without an acceptable score.
    IterationCap,
    /// The critique score met the approval threshold.
    ScoreMet,
}

/// The gate's verdict on the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Exit the loop and finalize.
    Approve(ApproveReason),
    /// Run another Act + Critique pass carrying the critique feedback.
    Refine,
}

/// The decision function. Stateless; all inputs come from the case.
pub struct CriticGate;

impl CriticGate {
    /// Decide whether to finalize or refine, in strict priority order:
    ///
    /// 1. `is_error` → finalize (ERROR)
    /// 2. Emergency triage → finalize (canned response, already verified)
    /// 3. any safety violation → finalize; never refine a violating draft
    /// 4. iteration cap reached → finalize
    /// 5. score at or above `min_approval_score` → finalize
    /// 6. otherwise → refine
    pub fn decide(case: &CaseState, min_approval_score: u8) -> GateDecision {
        if case.is_error {
            return GateDecision::Approve(ApproveReason::ErrorPassThrough);
        }
        if case.triage_level == Some(TriageLevel::Emergency) {
            return GateDecision::Approve(ApproveReason::Emergency);
        }
        if !case.safety_violations.is_empty() {
            return GateDecision::Approve(ApproveReason::SafetyViolation);
        }
        if case.reflection_iterations >= MAX_REFLECTION_ITERATIONS {
            return GateDecision::Approve(ApproveReason::IterationCap);
        }
        if case.critique_score >= min_approval_score {
            return GateDecision::Approve(ApproveReason::ScoreMet);
        }
        GateDecision::Refine
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
