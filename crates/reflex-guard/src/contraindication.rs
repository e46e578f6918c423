//! Drug-condition and drug-drug contraindication screening.
//!
//! The check runs against the candidate response text, not against a parsed
//! prescription: medication mentions are extracted by matching the fixed
//! vocabulary, then the rule tables are applied in a fixed order with the
//! first failure winning. Pure, total, and idempotent.

use std::sync::Arc;

use tracing::warn;

use reflex_contracts::check::SafetyCheck;
use reflex_core::traits::ContraindicationCheck;

use crate::tables::GuardTables;

pub struct ContraindicationChecker {
    tables: Arc<GuardTables>,
}

impl ContraindicationChecker {
    pub fn new(tables: Arc<GuardTables>) -> Self {
        Self { tables }
    }

    /// Medication names from the fixed vocabulary found in `text` (lowercase).
    fn extract_medications(&self, text: &str) -> Vec<String> {
        self.tables
            .medication_vocabulary
            .iter()
            .filter(|med| text.contains(med.as_str()))
            .cloned()
            .collect()
    }
}

impl ContraindicationCheck for ContraindicationChecker {
    /// Ordered scan, first failure wins:
    ///
    /// 1. drug-condition table against the patient's conditions
    /// 2. drug-drug interaction pairs, anchored on the candidate text
    /// 3. duplicate NSAID class between candidate and active medications
    fn check(&self, candidate: &str, conditions: &[String], medications: &[String]) -> SafetyCheck {
        let text = candidate.to_lowercase();
        let detected = self.extract_medications(&text);
        let existing: Vec<String> = medications.iter().map(|m| m.to_lowercase()).collect();

        // 1. Drug-condition contraindications.
        for (pattern, contra_conditions) in &self.tables.contraindications {
            let mentioned = text.contains(pattern.as_str())
                || detected.iter().any(|m| m.contains(pattern.as_str()));
            if !mentioned {
                continue;
            }
            for condition in conditions {
                let condition_lower = condition.to_lowercase();
                if contra_conditions.iter().any(|c| condition_lower.contains(c.as_str())) {
                    let reason = format!(
                        "CONTRAINDICATION: {pattern} is contraindicated with {condition}"
                    );
                    warn!(medication = %pattern, condition = %condition, "contraindication rule fired");
                    return SafetyCheck::violation(reason);
                }
            }
        }

        // 2. Drug-drug interactions. At least one drug of the pair must come
        // from the candidate; two pre-existing medications alone are the
        // prescriber's standing regimen, not this response's doing.
        let in_candidate =
            |drug: &str| text.contains(drug) || detected.iter().any(|m| m.contains(drug));
        let anywhere =
            |drug: &str| in_candidate(drug) || existing.iter().any(|m| m.contains(drug));
        for rule in &self.tables.interactions {
            let fired = (in_candidate(&rule.first) && anywhere(&rule.second))
                || (in_candidate(&rule.second) && anywhere(&rule.first));
            if fired {
                warn!(first = %rule.first, second = %rule.second, "interaction rule fired");
                return SafetyCheck::violation(rule.message.clone());
            }
        }

        // 3. Duplicate NSAID class.
        let recommends_nsaid = self.tables.nsaid_class.iter().any(|n| text.contains(n.as_str()));
        let already_on_nsaid = self
            .tables
            .nsaid_class
            .iter()
            .any(|n| existing.iter().any(|m| m.contains(n.as_str())));
        if recommends_nsaid && already_on_nsaid {
            warn!("duplicate NSAID class detected");
            return SafetyCheck::violation(
                "CONTRAINDICATION: NSAID combination detected - increased GI and bleeding risk",
            );
        }

        SafetyCheck::safe("no contraindications detected")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reflex_core::traits::ContraindicationCheck;

    use crate::tables::GuardTables;

    use super::ContraindicationChecker;

    fn checker() -> ContraindicationChecker {
        ContraindicationChecker::new(Arc::new(GuardTables::default()))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn naproxen_with_asthma_fails() {
        let verdict = checker().check(
            "You could try naproxen twice daily for the joint pain.",
            &strings(&["Asthma"]),
            &[],
        );
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("naproxen"));
        assert!(verdict.reason.contains("Asthma"));
    }

    #[test]
    fn condition_matching_is_substring_based() {
        // Free-text history entry still matches the table pattern "diabetes".
        let verdict = checker().check(
            "Ibuprofen may help with the swelling.",
            &strings(&["Type 2 diabetes mellitus"]),
            &[],
        );
        assert!(!verdict.safe);
    }

    #[test]
    fn interaction_between_candidate_and_active_medication_fails() {
        let verdict = checker().check(
            "Low-dose aspirin is commonly used here.",
            &[],
            &strings(&["Warfarin 5mg"]),
        );
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("Warfarin + Aspirin"));
    }

    #[test]
    fn existing_regimen_alone_does_not_fire_interactions() {
        // Both interacting drugs are pre-existing; the candidate mentions
        // neither, so this response is not what combines them.
        let verdict = checker().check(
            "Keep monitoring your blood pressure at home.",
            &[],
            &strings(&["warfarin", "aspirin"]),
        );
        assert!(verdict.safe);
    }

    #[test]
    fn duplicate_nsaid_class_fails() {
        let verdict = checker().check(
            "Ibuprofen should take the edge off.",
            &[],
            &strings(&["Naproxen 250mg"]),
        );
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("NSAID combination"));
    }

    #[test]
    fn clean_recommendation_passes() {
        let verdict = checker().check(
            "Rest, hydration, and a follow-up visit next week.",
            &strings(&["asthma"]),
            &strings(&["salbutamol"]),
        );
        assert!(verdict.safe);
        assert_eq!(verdict.reason, "no contraindications detected");
    }

    #[test]
    fn check_is_idempotent() {
        let c = checker();
        let conditions = strings(&["asthma"]);
        let first = c.check("naproxen may help", &conditions, &[]);
        let second = c.check("naproxen may help", &conditions, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn metformin_with_renal_impairment_fails() {
        let verdict = checker().check(
            "Continuing metformin is reasonable.",
            &strings(&["chronic renal impairment"]),
            &[],
        );
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("metformin"));
    }
}
