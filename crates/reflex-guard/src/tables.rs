//! The rule tables behind the deterministic safety checks.
//!
//! The canonical tables are compiled in via `Default`. Deployments can
//! override any subset from TOML with `from_toml_str` / `from_file`; fields
//! absent from the TOML keep their canonical values.
//!
//! Matching everywhere is case-insensitive substring, so table entries are
//! stored lowercase and free-text patient data is lowercased at check time.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use reflex_contracts::error::{ReflexError, ReflexResult};

/// One drug-drug interaction pair with its canned warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub first: String,
    pub second: String,
    pub message: String,
}

/// Every lexicon and rule table the guard components consult.
///
/// `contraindications` is a `BTreeMap` so the first-failure-wins scan has a
/// fixed, reproducible order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardTables {
    /// Any hit classifies the report as an emergency.
    pub emergency_keywords: Vec<String>,
    /// Any hit (after the emergency scan) classifies the report as urgent.
    pub urgent_keywords: Vec<String>,
    /// Medication pattern → condition substrings it must never meet.
    pub contraindications: BTreeMap<String, Vec<String>>,
    /// Drug pairs that must not be combined.
    pub interactions: Vec<InteractionRule>,
    /// Phrases that fail response validation outright.
    pub dangerous_phrases: Vec<String>,
    /// Known medication names used to extract mentions from free text.
    pub medication_vocabulary: Vec<String>,
    /// Names counted as the NSAID class for the duplicate-class rule.
    pub nsaid_class: Vec<String>,
}

impl GuardTables {
    /// Parse tables from TOML. Missing fields keep their canonical defaults.
    pub fn from_toml_str(raw: &str) -> ReflexResult<Self> {
        toml::from_str(raw).map_err(|e| ReflexError::Config { reason: e.to_string() })
    }

    /// Load tables from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ReflexResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ReflexError::Config { reason: e.to_string() })?;
        Self::from_toml_str(&raw)
    }
}

impl Default for GuardTables {
    fn default() -> Self {
        Self {
            emergency_keywords: to_strings(&[
                "chest pain",
                "difficulty breathing",
                "severe bleeding",
                "loss of consciousness",
                "stroke",
                "sepsis",
                "anaphylaxis",
                "cardiac arrest",
                "acute myocardial infarction",
                "pulmonary embolism",
                "severe trauma",
                "unconscious",
                "unresponsive",
                "critical",
                "life-threatening",
                "911",
                "emergency",
            ]),
            urgent_keywords: to_strings(&[
                "severe pain",
                "persistent vomiting",
                "high fever",
                "severe headache",
                "acute infection",
                "diabetic emergency",
                "severe allergic reaction",
                "broken bone",
                "deep laceration",
                "abdominal pain",
            ]),
            contraindications: BTreeMap::from([
                (
                    "metformin".to_string(),
                    to_strings(&[
                        "acute kidney injury",
                        "severe dehydration",
                        "renal impairment",
                        "acute illness",
                        "sepsis",
                        "lactic acidosis",
                        "liver disease",
                        "severe heart failure",
                        "acute heart attack",
                        "stroke",
                    ]),
                ),
                (
                    "nsaid".to_string(),
                    to_strings(&[
                        "renal impairment",
                        "severe heart failure",
                        "diabetes",
                        "kidney disease",
                        "hypertension",
                        "cardiovascular disease",
                        "asthma",
                        "gastric ulcer",
                        "bleeding disorder",
                        "severe dehydration",
                        "acute kidney injury",
                    ]),
                ),
                (
                    "ibuprofen".to_string(),
                    to_strings(&[
                        "renal impairment",
                        "severe heart failure",
                        "diabetes",
                        "kidney disease",
                        "hypertension",
                        "cardiovascular disease",
                        "asthma",
                        "gastric ulcer",
                        "bleeding disorder",
                        "severe dehydration",
                    ]),
                ),
                (
                    "naproxen".to_string(),
                    to_strings(&[
                        "renal impairment",
                        "severe heart failure",
                        "diabetes",
                        "kidney disease",
                        "hypertension",
                        "cardiovascular disease",
                        "asthma",
                        "gastric ulcer",
                        "bleeding disorder",
                        "severe dehydration",
                    ]),
                ),
                (
                    "aspirin".to_string(),
                    to_strings(&[
                        "bleeding disorder",
                        "active bleeding",
                        "thrombocytopenia",
                        "asthma",
                        "gastric ulcer",
                        "hemorrhage",
                        "vitamin k deficiency",
                    ]),
                ),
                (
                    "ace-inhibitor".to_string(),
                    to_strings(&[
                        "pregnancy",
                        "hyperkalemia",
                        "high potassium",
                        "renal artery stenosis",
                        "angioedema",
                        "severe renal failure",
                        "acute kidney injury",
                    ]),
                ),
                (
                    "warfarin".to_string(),
                    to_strings(&[
                        "thrombocytopenia",
                        "active bleeding",
                        "hemorrhage",
                        "vitamin k",
                        "low platelet count",
                        "bleeding disorder",
                        "recent surgery",
                    ]),
                ),
                (
                    "beta-blocker".to_string(),
                    to_strings(&[
                        "asthma",
                        "copd",
                        "severe bradycardia",
                        "atrioventricular block",
                        "cardiogenic shock",
                        "decompensated heart failure",
                    ]),
                ),
                (
                    "calcium channel blocker".to_string(),
                    to_strings(&[
                        "severe hypotension",
                        "cardiogenic shock",
                        "acute myocardial infarction",
                        "severe aortic stenosis",
                    ]),
                ),
                (
                    "statin".to_string(),
                    to_strings(&["active liver disease", "elevated liver enzymes", "myopathy"]),
                ),
                ("ssri".to_string(), to_strings(&["maois", "monoamine oxidase", "tramadol"])),
            ]),
            interactions: vec![
                interaction("nsaid", "aspirin", "NSAID + Aspirin: increased bleeding risk and GI ulceration"),
                interaction("nsaid", "warfarin", "NSAID + Warfarin: increased bleeding risk"),
                interaction("nsaid", "ace-inhibitor", "NSAID + ACE inhibitor: renal impairment risk"),
                interaction("nsaid", "metformin", "NSAID + Metformin: lactic acidosis risk with renal impairment"),
                interaction("warfarin", "vitamin k", "Warfarin + Vitamin K: antagonizes anticoagulation"),
                interaction("warfarin", "aspirin", "Warfarin + Aspirin: increased bleeding risk"),
                interaction("ace-inhibitor", "potassium", "ACE inhibitor + Potassium: hyperkalemia risk"),
                interaction("ace-inhibitor", "nsaid", "ACE inhibitor + NSAID: renal impairment"),
                interaction("metformin", "contrast dye", "Metformin + Contrast dye: lactic acidosis risk"),
                interaction("metformin", "alcohol", "Metformin + Alcohol: lactic acidosis risk"),
                interaction("ssri", "maoi", "SSRI + MAOI: serotonin syndrome"),
                interaction("ssri", "tramadol", "SSRI + Tramadol: serotonin syndrome risk"),
            ],
            dangerous_phrases: to_strings(&[
                "ignore your doctor",
                "stop taking",
                "don't go to hospital",
                "no need for emergency",
                "untested remedy",
            ]),
            medication_vocabulary: to_strings(&[
                "naproxen",
                "ibuprofen",
                "aspirin",
                "metformin",
                "warfarin",
                "lisinopril",
                "enalapril",
                "atorvastatin",
                "simvastatin",
                "fluoxetine",
                "sertraline",
                "tramadol",
                "codeine",
                "morphine",
                "vitamin k",
                "potassium",
                "magnesium",
                "calcium",
                "iron",
                "amoxicillin",
                "penicillin",
                "antibiotics",
                "steroids",
            ]),
            nsaid_class: to_strings(&["ibuprofen", "naproxen", "aspirin", "nsaid"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn interaction(first: &str, second: &str, message: &str) -> InteractionRule {
    InteractionRule {
        first: first.to_string(),
        second: second.to_string(),
        message: message.to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use reflex_contracts::error::ReflexError;

    use super::GuardTables;

    #[test]
    fn canonical_tables_are_populated() {
        let tables = GuardTables::default();
        assert!(tables.emergency_keywords.contains(&"chest pain".to_string()));
        assert!(tables.urgent_keywords.contains(&"high fever".to_string()));
        assert!(tables.contraindications["naproxen"].contains(&"asthma".to_string()));
        assert!(tables.interactions.iter().any(|i| i.first == "warfarin" && i.second == "aspirin"));
        assert!(tables.dangerous_phrases.contains(&"stop taking".to_string()));
        assert!(tables.nsaid_class.contains(&"ibuprofen".to_string()));
    }

    #[test]
    fn partial_toml_override_keeps_canonical_defaults() {
        let tables = GuardTables::from_toml_str(
            r#"
            emergency_keywords = ["code blue"]
            "#,
        )
        .unwrap();
        assert_eq!(tables.emergency_keywords, vec!["code blue".to_string()]);
        // Everything not overridden stays canonical.
        assert!(tables.contraindications.contains_key("metformin"));
        assert!(!tables.dangerous_phrases.is_empty());
    }

    #[test]
    fn toml_can_define_interaction_rules() {
        let tables = GuardTables::from_toml_str(
            r#"
            [[interactions]]
            first = "drug-a"
            second = "drug-b"
            message = "A + B: do not combine"
            "#,
        )
        .unwrap();
        assert_eq!(tables.interactions.len(), 1);
        assert_eq!(tables.interactions[0].message, "A + B: do not combine");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = GuardTables::from_toml_str("emergency_keywords = not-a-list").unwrap_err();
        assert!(matches!(err, ReflexError::Config { .. }));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = GuardTables::from_file("/nonexistent/guard.toml").unwrap_err();
        assert!(matches!(err, ReflexError::Config { .. }));
    }
}
