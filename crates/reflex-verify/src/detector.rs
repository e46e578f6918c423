//! Term classification and the detector itself.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use reflex_contracts::check::{HallucinationReport, TermClass};
use reflex_core::traits::{HallucinationCheck, KnowledgeLookup};

use crate::extract::extract_candidate_terms;

/// Real terms longer than this do not occur in standard nomenclature.
const MAX_PLAUSIBLE_LEN: usize = 50;

static LONG_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{3,}").unwrap());

/// Marketing-style shapes fabricated terms tend to take.
static MADE_UP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"quantum\s+\w+", r"magical\s+\w+", r"super\s+\w+", r"miracle\s+\w+", r"\w+ness\s+\w+"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Verified common conditions, drugs, tests, and procedures.
const KNOWN_TERMS: &[&str] = &[
    // conditions
    "diabetes", "hypertension", "asthma", "arthritis", "cancer", "depression", "anxiety",
    "heart disease", "stroke", "pneumonia", "bronchitis", "flu", "covid-19", "measles",
    "chickenpox", "eczema", "psoriasis", "migraine", "acne", "obesity", "copd", "emphysema",
    "kidney disease", "liver disease",
    // drugs
    "aspirin", "ibuprofen", "acetaminophen", "naproxen", "metformin", "insulin", "lisinopril",
    "atorvastatin", "amoxicillin", "penicillin", "warfarin", "prednisone", "omeprazole",
    "sertraline", "fluoxetine", "lorazepam",
    // tests
    "blood test", "urinalysis", "mri", "ct scan", "x-ray", "ultrasound", "ecg", "ekg", "biopsy",
    "colonoscopy", "mammogram", "pap smear",
    // procedures
    "surgery", "vaccination", "therapy", "dialysis", "chemotherapy",
];

/// Terms known to be fabricated, collected from observed model output.
const FAKE_TERMS: &[&str] = &[
    "fictitious syndrome z",
    "fictitious syndrome",
    "imaginex",
    "bloodharmony panel",
    "quantum healing",
    "chakra medicine",
    "homeopathic magic",
    "blood harmony",
    "bloodharmony",
    "quantum nervous system",
];

/// Scans a candidate response for medical terms that cannot be verified.
///
/// The detector fails open: a term that is neither whitelisted, blacklisted,
/// nor structurally suspicious passes, and a knowledge-base failure never
/// flags a term on its own.
pub struct HallucinationDetector {
    whitelist: BTreeSet<String>,
    blacklist: BTreeSet<String>,
    knowledge: Option<Box<dyn KnowledgeLookup>>,
}

impl Default for HallucinationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HallucinationDetector {
    /// Detector with the compiled-in lexicons and no knowledge-base hook.
    pub fn new() -> Self {
        Self {
            whitelist: KNOWN_TERMS.iter().map(|t| t.to_string()).collect(),
            blacklist: FAKE_TERMS.iter().map(|t| t.to_string()).collect(),
            knowledge: None,
        }
    }

    /// Attach a knowledge-base lookup consulted for terms the local lexicons
    /// cannot settle.
    pub fn with_knowledge(mut self, knowledge: Box<dyn KnowledgeLookup>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Classify one candidate term. Predicates run in fixed order; the first
    /// that applies wins.
    pub fn classify_term(&self, term: &str) -> TermClass {
        let lower = term.to_lowercase();
        if self.blacklist.contains(&lower) {
            return TermClass::Blacklisted;
        }
        if self.whitelist.contains(&lower) {
            return TermClass::Known;
        }
        if looks_suspicious(term) {
            return TermClass::Suspicious;
        }
        if let Some(kb) = &self.knowledge {
            match kb.term_exists(term) {
                Ok(true) => return TermClass::Known,
                Ok(false) => return TermClass::Suspicious,
                Err(err) => {
                    debug!(term = %term, error = %err, "knowledge lookup failed, passing term");
                }
            }
        }
        TermClass::Unverified
    }
}

impl HallucinationCheck for HallucinationDetector {
    fn detect(&self, text: &str) -> HallucinationReport {
        let candidates = extract_candidate_terms(text);
        if candidates.is_empty() {
            return HallucinationReport::clean("no medical terms to validate");
        }

        let mut suspects = Vec::new();
        for term in &candidates {
            let class = self.classify_term(term);
            if class.is_flagged() {
                warn!(term = %term, class = ?class, "unverifiable term flagged");
                suspects.push(term.clone());
            }
        }

        if suspects.is_empty() {
            return HallucinationReport::clean("all extracted terms verified");
        }
        HallucinationReport {
            flagged: true,
            message: format!(
                "potential hallucinations detected: {}. These terms may not be real or verified.",
                suspects.join(", ")
            ),
            suspect_terms: suspects,
        }
    }
}

/// Structural heuristics for made-up terms.
fn looks_suspicious(term: &str) -> bool {
    if term.chars().count() > MAX_PLAUSIBLE_LEN {
        return true;
    }
    if LONG_DIGIT_RUN.is_match(term) {
        return true;
    }
    let symbol_count = term.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count();
    if symbol_count > 2 {
        return true;
    }
    let lower = term.to_lowercase();
    MADE_UP_PATTERNS.iter().any(|p| p.is_match(&lower))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reflex_contracts::check::TermClass;
    use reflex_contracts::error::{ReflexError, ReflexResult};
    use reflex_core::traits::{HallucinationCheck, KnowledgeLookup};

    use super::HallucinationDetector;

    struct MockKnowledge {
        exists: bool,
        fail: bool,
        calls: Arc<Mutex<u32>>,
    }

    impl KnowledgeLookup for MockKnowledge {
        fn term_exists(&self, _term: &str) -> ReflexResult<bool> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(ReflexError::Retrieval { reason: "kb offline".into() });
            }
            Ok(self.exists)
        }
    }

    #[test]
    fn blacklisted_terms_are_flagged() {
        let d = HallucinationDetector::new();
        assert_eq!(d.classify_term("Imaginex"), TermClass::Blacklisted);
        assert_eq!(d.classify_term("Quantum Healing"), TermClass::Blacklisted);
    }

    #[test]
    fn whitelisted_terms_pass() {
        let d = HallucinationDetector::new();
        assert_eq!(d.classify_term("Aspirin"), TermClass::Known);
        assert_eq!(d.classify_term("Heart Disease"), TermClass::Known);
    }

    #[test]
    fn structural_heuristics_catch_made_up_shapes() {
        let d = HallucinationDetector::new();
        assert_eq!(d.classify_term("Miracle Cure"), TermClass::Suspicious);
        assert_eq!(d.classify_term("Protocol 123456"), TermClass::Suspicious);
        assert_eq!(d.classify_term("Fittingness Syndrome"), TermClass::Suspicious);
        let long = "Hyperextended Quasirecursive Fibromyoneurological Dystrophication";
        assert_eq!(d.classify_term(long), TermClass::Suspicious);
    }

    #[test]
    fn unknown_but_plausible_terms_pass_without_a_knowledge_base() {
        let d = HallucinationDetector::new();
        assert_eq!(d.classify_term("Metoprolol"), TermClass::Unverified);
    }

    #[test]
    fn fabricated_diagnosis_and_drug_are_both_flagged() {
        let d = HallucinationDetector::new();
        let report =
            d.detect("You may have Fictitious Syndrome Z. The drug Imaginex usually helps.");
        assert!(report.flagged);
        assert!(report.suspect_terms.contains(&"Fictitious Syndrome".to_string()));
        assert!(report.suspect_terms.contains(&"Imaginex".to_string()));
        assert!(report.message.contains("Imaginex"));
    }

    #[test]
    fn ordinary_advice_is_clean() {
        let d = HallucinationDetector::new();
        let report = d.detect("aspirin is commonly used for diabetes management");
        assert!(!report.flagged);
        assert!(report.suspect_terms.is_empty());
    }

    #[test]
    fn knowledge_base_miss_flags_the_term() {
        let calls = Arc::new(Mutex::new(0));
        let d = HallucinationDetector::new().with_knowledge(Box::new(MockKnowledge {
            exists: false,
            fail: false,
            calls: calls.clone(),
        }));
        assert_eq!(d.classify_term("Metoprolol"), TermClass::Suspicious);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn knowledge_base_failure_fails_open() {
        let calls = Arc::new(Mutex::new(0));
        let d = HallucinationDetector::new().with_knowledge(Box::new(MockKnowledge {
            exists: false,
            fail: true,
            calls: calls.clone(),
        }));
        assert_eq!(d.classify_term("Metoprolol"), TermClass::Unverified);
    }

    #[test]
    fn lexicon_hits_never_consult_the_knowledge_base() {
        let calls = Arc::new(Mutex::new(0));
        let d = HallucinationDetector::new().with_knowledge(Box::new(MockKnowledge {
            exists: true,
            fail: false,
            calls: calls.clone(),
        }));
        d.classify_term("Aspirin");
        d.classify_term("Imaginex");
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn suspect_terms_are_sorted() {
        let d = HallucinationDetector::new();
        let report = d.detect("Zorbital Miracle Therapy and the Aetherflux Miracle Scan.");
        let mut sorted = report.suspect_terms.clone();
        sorted.sort();
        assert_eq!(report.suspect_terms, sorted);
    }
}
