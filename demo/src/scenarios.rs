//! End-to-end demo scenarios, one per terminal branch of the workflow.

use std::sync::Arc;

use tracing::info;

use reflex_contracts::case::CaseResult;
use reflex_core::{CheckSuite, Collaborators, Orchestrator, OrchestratorConfig};
use reflex_guard::{ContraindicationChecker, GuardTables, ResponseValidator, TriageClassifier};
use reflex_verify::HallucinationDetector;

use crate::mock::{DemoProfiles, DemoRetriever, DigitMasker, MemorySessions, ScriptedGenerator};

fn build_orchestrator(script: &[&str]) -> Orchestrator {
    let tables = Arc::new(GuardTables::default());
    let collab = Collaborators {
        retriever: Box::new(DemoRetriever),
        profiles: Box::new(DemoProfiles::new()),
        generator: Box::new(ScriptedGenerator::new(script)),
        sessions: Box::new(MemorySessions::new()),
        masker: Box::new(DigitMasker),
    };
    let checks = CheckSuite {
        triage: Box::new(TriageClassifier::new(tables.clone())),
        contraindications: Box::new(ContraindicationChecker::new(tables.clone())),
        validator: Box::new(ResponseValidator::new(tables)),
        hallucinations: Box::new(HallucinationDetector::new()),
    };
    Orchestrator::new(collab, checks, OrchestratorConfig::default())
}

fn print_result(title: &str, result: &CaseResult) {
    println!("── {title} ──");
    println!("  session:    {}", result.session_id);
    println!(
        "  triage:     {} (confidence {:.2})",
        result.triage_level.map(|l| l.as_str()).unwrap_or("unclassified"),
        result.triage_confidence
    );
    println!("  status:     {}", result.response_status.as_str());
    println!("  score:      {}", result.critique_score);
    println!("  iterations: {}", result.reflection_iterations);
    if !result.safety_violations.is_empty() {
        println!("  violations:");
        for v in &result.safety_violations {
            println!("    - {v}");
        }
    }
    println!("  response:   {}", result.final_response);
    println!();
}

/// A routine question that clears review on the first pass.
pub fn routine() {
    info!(scenario = "routine", "starting scenario");
    let orch = build_orchestrator(&[
        "For mild knee pain after running, rest the joint, apply ice for 15 minutes at a \
         time, and see your physician if the pain persists beyond a week.",
        r#"{"score": 5, "feedback": "specific, safe, and complete"}"#,
    ]);
    let result = orch.process_query("patient-healthy", "I have mild knee pain after running", None);
    print_result("Routine approval", &result);
}

/// Emergency keywords trigger the canned referral with no generation at all.
pub fn emergency() {
    info!(scenario = "emergency", "starting scenario");
    let orch = build_orchestrator(&[]);
    let result = orch.process_query(
        "patient-healthy",
        "crushing chest pain and shortness of breath for 20 minutes",
        None,
    );
    print_result("Emergency short-circuit", &result);
}

/// A draft recommending an NSAID to an asthma patient is caught and escalated.
pub fn contraindication() {
    info!(scenario = "contraindication", "starting scenario");
    let orch = build_orchestrator(&[
        "You could take naproxen 250mg twice daily to manage the pain.",
    ]);
    let result = orch.process_query("patient-asthma", "what can I take for my knee pain", None);
    print_result("Contraindication escalation", &result);
}

/// A draft naming fabricated terms is flagged even at a perfect score.
pub fn hallucination() {
    info!(scenario = "hallucination", "starting scenario");
    let orch = build_orchestrator(&[
        "Your symptoms match Fictitious Syndrome Z. I recommend the BloodHarmony Panel \
         and a course of Imaginex.",
        r#"{"score": 5, "feedback": "confident and well structured"}"#,
    ]);
    let result = orch.process_query("patient-healthy", "is there a test for my fatigue", None);
    print_result("Hallucination escalation", &result);
}

/// Three low-scoring passes exhaust the cap and escalate with the last
/// reviewer feedback attached.
pub fn refinement() {
    info!(scenario = "refinement", "starting scenario");
    let orch = build_orchestrator(&[
        "Headaches happen.",
        r#"{"score": 2, "feedback": "dismissive, no concrete guidance"}"#,
        "Headaches can have many causes; drink water.",
        r#"{"score": 3, "feedback": "still too thin for two weeks of symptoms"}"#,
        "Hydrate and rest in a dark room.",
        r#"{"score": 2, "feedback": "does not address duration or red flags"}"#,
    ]);
    let result =
        orch.process_query("patient-healthy", "persistent headaches for two weeks", None);
    print_result("Refinement cap", &result);
}
