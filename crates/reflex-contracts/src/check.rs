//! Verdict types produced by the safety checks.
//!
//! `SafetyCheck` is the shared shape of the contraindication checker and the
//! response validator. `HallucinationReport` and `TermClass` belong to the
//! hallucination detector.

use serde::{Deserialize, Serialize};

/// The verdict of a single deterministic safety check.
///
/// `reason` is always populated: on failure it names the rule that fired,
/// on success it states that the check passed. Messages are written for the
/// audit trail and for escalation notices shown to clinicians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyCheck {
    /// True when no rule fired.
    pub safe: bool,
    /// Human-readable explanation of the outcome.
    pub reason: String,
}

impl SafetyCheck {
    /// A passing verdict with the given explanation.
    pub fn safe(reason: impl Into<String>) -> Self {
        Self { safe: true, reason: reason.into() }
    }

    /// A failing verdict with the given explanation.
    pub fn violation(reason: impl Into<String>) -> Self {
        Self { safe: false, reason: reason.into() }
    }
}

/// The aggregated result of scanning a response for unverifiable medical terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallucinationReport {
    /// True when at least one term was flagged.
    pub flagged: bool,
    /// One human-readable message covering all flagged terms.
    pub message: String,
    /// Every flagged term, in deterministic (sorted) order.
    pub suspect_terms: Vec<String>,
}

impl HallucinationReport {
    /// A clean report for text with nothing to flag.
    pub fn clean(message: impl Into<String>) -> Self {
        Self { flagged: false, message: message.into(), suspect_terms: vec![] }
    }
}

/// Classification of one candidate medical term, evaluated in this order:
/// blacklist, whitelist, structural heuristics, knowledge-base hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermClass {
    /// On the whitelist of verified medical terms — passes.
    Known,
    /// On the blacklist of known-fabricated terms — flagged.
    Blacklisted,
    /// Structurally characteristic of a made-up term — flagged.
    Suspicious,
    /// Not recognized and not verifiable — passes (the detector fails open).
    Unverified,
}

impl TermClass {
    /// True for the classes that contribute to a hallucination flag.
    pub fn is_flagged(&self) -> bool {
        matches!(self, TermClass::Blacklisted | TermClass::Suspicious)
    }
}
