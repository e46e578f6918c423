//! Keyword-driven urgency classification.

use std::sync::Arc;

use tracing::{info, warn};

use reflex_contracts::{case::TriageLevel, profile::PatientProfile};
use reflex_core::traits::UrgencyClassify;

use crate::tables::GuardTables;

/// Classifies a symptom report by scanning for emergency and urgent keywords.
///
/// Pure and deterministic: case-insensitive substring match, emergency set
/// first, then urgent, else routine.
pub struct TriageClassifier {
    tables: Arc<GuardTables>,
}

impl TriageClassifier {
    pub fn new(tables: Arc<GuardTables>) -> Self {
        Self { tables }
    }
}

impl UrgencyClassify for TriageClassifier {
    fn classify(&self, text: &str, _profile: Option<&PatientProfile>) -> TriageLevel {
        let lower = text.to_lowercase();

        for keyword in &self.tables.emergency_keywords {
            if lower.contains(keyword.as_str()) {
                warn!(keyword = %keyword, "emergency keyword matched");
                return TriageLevel::Emergency;
            }
        }
        for keyword in &self.tables.urgent_keywords {
            if lower.contains(keyword.as_str()) {
                info!(keyword = %keyword, "urgent keyword matched");
                return TriageLevel::Urgent;
            }
        }
        TriageLevel::Routine
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
