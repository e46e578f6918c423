//! Final response validation: quality floor plus a dangerous-phrase denylist.

use std::sync::Arc;

use tracing::warn;

use reflex_contracts::check::SafetyCheck;
use reflex_core::traits::ResponseCheck;

use crate::tables::GuardTables;

/// Minimum score a response must carry to pass validation.
const DEFAULT_MIN_SCORE: u8 = 3;

pub struct ResponseValidator {
    tables: Arc<GuardTables>,
    min_score: u8,
}

impl ResponseValidator {
    pub fn new(tables: Arc<GuardTables>) -> Self {
        Self { tables, min_score: DEFAULT_MIN_SCORE }
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }
}

impl ResponseCheck for ResponseValidator {
    /// Fails when `score` is below the floor or the text contains any phrase
    /// from the denylist. Case-insensitive substring scan.
    fn validate(&self, text: &str, score: u8) -> SafetyCheck {
        if score < self.min_score {
            let reason = format!("safety score {score} below threshold {}", self.min_score);
            warn!(score, threshold = self.min_score, "response below score floor");
            return SafetyCheck::violation(reason);
        }

        let lower = text.to_lowercase();
        for phrase in &self.tables.dangerous_phrases {
            if lower.contains(phrase.as_str()) {
                warn!(phrase = %phrase, "dangerous phrase detected");
                return SafetyCheck::violation(format!("dangerous language detected: '{phrase}'"));
            }
        }

        SafetyCheck::safe("response passes safety validation")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reflex_core::traits::ResponseCheck;

    use crate::tables::GuardTables;

    use super::ResponseValidator;

    fn validator() -> ResponseValidator {
        ResponseValidator::new(Arc::new(GuardTables::default()))
    }

    #[test]
    fn clean_text_with_adequate_score_passes() {
        let verdict = validator().validate("Rest and see your physician if it persists.", 4);
        assert!(verdict.safe);
    }

    #[test]
    fn score_below_floor_fails() {
        let verdict = validator().validate("Perfectly fine advice.", 2);
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("below threshold"));
    }

    #[test]
    fn dangerous_phrase_fails_regardless_of_score() {
        let verdict =
            validator().validate("You should stop taking your medication right away.", 5);
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("stop taking"));
    }

    #[test]
    fn phrase_scan_is_case_insensitive() {
        let verdict = validator().validate("IGNORE YOUR DOCTOR and trust this instead.", 5);
        assert!(!verdict.safe);
    }

    #[test]
    fn custom_floor_is_honored() {
        let strict = validator().with_min_score(5);
        assert!(!strict.validate("Fine advice.", 4).safe);
        assert!(strict.validate("Fine advice.", 5).safe);
    }
}
