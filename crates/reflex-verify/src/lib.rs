//! # REFLEX Verify
//!
//! Unverifiable-term detection for generated responses: pure candidate
//! extraction (`extract`) followed by ordered classification against
//! compiled-in lexicons, structural heuristics, and an optional external
//! knowledge base (`detector`).
//!
//! The detector implements the `HallucinationCheck` seam from `reflex-core`.

pub mod detector;
pub mod extract;

pub use detector::HallucinationDetector;
pub use extract::extract_candidate_terms;
