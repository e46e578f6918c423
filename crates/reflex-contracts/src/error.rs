//! Error taxonomy for the REFLEX workflow.
//!
//! All fallible operations in the REFLEX crates return `ReflexResult<T>`.
//! Collaborator failures (retrieval, profile lookup, generation) are
//! recoverable at the orchestrator level: they set the case's error flag and
//! resolve to a terminal ERROR status instead of escaping `process_query`.

use thiserror::Error;

/// The unified error type for the REFLEX workflow.
#[derive(Debug, Error)]
pub enum ReflexError {
    /// The semantic retrieval collaborator failed or timed out.
    #[error("retrieval failed: {reason}")]
    Retrieval { reason: String },

    /// The patient record store failed or timed out.
    ///
    /// A patient that simply does not exist is NOT an error — the store
    /// returns `Ok(None)` and the workflow proceeds with an empty profile.
    #[error("profile lookup failed: {reason}")]
    ProfileLookup { reason: String },

    /// The text generation collaborator failed or timed out.
    #[error("generation failed: {reason}")]
    Generation { reason: String },

    /// The session store could not persist or load a record.
    #[error("session store failed: {reason}")]
    SessionStore { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The surrounding request was cancelled before the workflow finished.
    #[error("request cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the REFLEX crates.
pub type ReflexResult<T> = Result<T, ReflexError>;
