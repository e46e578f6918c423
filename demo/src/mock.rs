//! Mock collaborators for the demo scenarios.
//!
//! These stand in for the real vector store, patient record system, language
//! model, and session database. The generator replays a fixed script so each
//! scenario is fully reproducible.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use reflex_contracts::{
    error::ReflexResult,
    profile::{Document, PatientProfile},
};
use reflex_core::traits::{Generator, PiiMasker, ProfileStore, Retriever, SessionStore};

/// Returns a small fixed set of reference snippets for any query.
pub struct DemoRetriever;

impl Retriever for DemoRetriever {
    fn retrieve(&self, _query: &str, limit: usize) -> ReflexResult<Vec<Document>> {
        let docs = vec![
            Document {
                content: "Mild musculoskeletal pain usually responds to rest, ice, and \
                          over-the-counter analgesics."
                    .to_string(),
                score: 0.92,
                metadata: serde_json::json!({ "source": "demo-corpus" }),
            },
            Document {
                content: "Patients with asthma should avoid NSAIDs unless cleared by their \
                          physician."
                    .to_string(),
                score: 0.85,
                metadata: serde_json::json!({ "source": "demo-corpus" }),
            },
        ];
        Ok(docs.into_iter().take(limit).collect())
    }
}

/// In-memory patient records keyed by patient id.
pub struct DemoProfiles {
    records: HashMap<String, PatientProfile>,
}

impl DemoProfiles {
    pub fn new() -> Self {
        let mut records = HashMap::new();
        records.insert(
            "patient-asthma".to_string(),
            PatientProfile {
                conditions: vec!["Asthma".to_string()],
                medications: vec!["Salbutamol inhaler".to_string()],
                allergies: vec![],
            },
        );
        records.insert(
            "patient-healthy".to_string(),
            PatientProfile { conditions: vec![], medications: vec![], allergies: vec![] },
        );
        Self { records }
    }
}

impl ProfileStore for DemoProfiles {
    fn get_profile(&self, patient_id: &str) -> ReflexResult<Option<PatientProfile>> {
        Ok(self.records.get(patient_id).cloned())
    }
}

/// Replays scripted outputs in order; returns a generic line once exhausted.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(outputs: &[&str]) -> Self {
        Self { script: Mutex::new(outputs.iter().map(|s| s.to_string()).collect()) }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, _system_prompt: &str, _user_message: &str) -> ReflexResult<String> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        Ok(script
            .pop_front()
            .unwrap_or_else(|| "Please follow up with your healthcare provider.".to_string()))
    }
}

/// Keeps persisted session records in memory.
pub struct MemorySessions {
    records: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self { records: Mutex::new(HashMap::new()) }
    }
}

impl SessionStore for MemorySessions {
    fn persist(
        &self,
        session_id: &str,
        record: &serde_json::Value,
        _ttl: Duration,
    ) -> ReflexResult<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(session_id.to_string(), record.clone());
        Ok(())
    }

    fn load(&self, session_id: &str) -> ReflexResult<Option<serde_json::Value>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(session_id).cloned())
    }
}

/// Replaces runs of three or more digits, which is enough to blank phone
/// numbers and record identifiers in demo input.
pub struct DigitMasker;

impl PiiMasker for DigitMasker {
    fn mask(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut digits = String::new();
        for ch in text.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            flush_digits(&mut out, &mut digits);
            out.push(ch);
        }
        flush_digits(&mut out, &mut digits);
        out
    }
}

fn flush_digits(out: &mut String, digits: &mut String) {
    if digits.len() >= 3 {
        out.push_str("[redacted]");
    } else {
        out.push_str(digits);
    }
    digits.clear();
}
