//! # REFLEX Guard
//!
//! The deterministic rule layer of REFLEX: compiled-in (TOML-overridable)
//! rule tables, the keyword triage classifier, the contraindication and
//! interaction checker, and the response validator.
//!
//! Everything here is pure and synchronous. The components implement the
//! check seams from `reflex-core` and are injected into the orchestrator at
//! construction.

pub mod contraindication;
pub mod tables;
pub mod triage;
pub mod validate;

pub use contraindication::ContraindicationChecker;
pub use tables::{GuardTables, InteractionRule};
pub use triage::TriageClassifier;
pub use validate::ResponseValidator;
