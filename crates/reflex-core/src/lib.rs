//! # REFLEX Core
//!
//! The workflow heart of REFLEX: the trait seams for external collaborators
//! and in-repo safety checks, the critic gate that bounds the refinement
//! loop, and the orchestrator that drives a case from free-text input to a
//! terminal status.
//!
//! Rule implementations live in `reflex-guard` and `reflex-verify`; this
//! crate only knows the seams.

pub mod gate;
pub mod orchestrator;
pub mod traits;

pub use gate::{ApproveReason, CriticGate, GateDecision, MAX_REFLECTION_ITERATIONS};
pub use orchestrator::{CheckSuite, Collaborators, Orchestrator, OrchestratorConfig};
pub use traits::{
    ContraindicationCheck, Generator, HallucinationCheck, KnowledgeLookup, PiiMasker,
    ProfileStore, ResponseCheck, Retriever, SessionStore, UrgencyClassify,
};
