//! Patient profile and retrieved document types.
//!
//! Both are snapshots supplied by external collaborators. Once attached to a
//! case they are never mutated for the life of the request.

use serde::{Deserialize, Serialize};

/// A snapshot of the clinical facts the safety checks need about a patient.
///
/// Fetched once per request from the `ProfileStore` collaborator. Condition
/// and medication strings are matched by case-insensitive substring against
/// the rule tables, so free-text entries like "Type 2 diabetes mellitus"
/// match the table pattern "diabetes".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Known conditions / medical history entries.
    pub conditions: Vec<String>,
    /// Active medications by name.
    pub medications: Vec<String>,
    /// Known allergens.
    pub allergies: Vec<String>,
}

impl PatientProfile {
    /// An empty profile, used when the patient record is absent.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One document returned by the semantic retrieval collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The document text used as generation context.
    pub content: String,
    /// Retrieval similarity score.
    pub score: f64,
    /// Arbitrary source metadata. The workflow never inspects this.
    pub metadata: serde_json::Value,
}
