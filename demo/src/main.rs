//! REFLEX demo CLI.
//!
//! Runs one or all of the end-to-end scenarios. Each scenario wires the real
//! REFLEX components (guard tables, triage, contraindication checker,
//! hallucination detector, orchestrator) to mock collaborators with scripted
//! generator output, so every run is reproducible.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- emergency
//!   cargo run -p demo -- contraindication

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod mock;
mod scenarios;

/// REFLEX — bounded reflective clinical decision-support demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "REFLEX clinical decision-support demo",
    long_about = "Runs REFLEX demo scenarios showing triage, contraindication screening,\n\
                  hallucination detection, and the bounded refinement loop."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// Routine question approved on the first pass.
    Routine,
    /// Emergency keywords trigger the canned referral.
    Emergency,
    /// NSAID recommendation for an asthma patient is escalated.
    Contraindication,
    /// Fabricated medical terms are flagged and escalated.
    Hallucination,
    /// Persistent low scores exhaust the refinement cap.
    Refinement,
}

fn main() {
    // Set RUST_LOG=debug for verbose workflow tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    match cli.command {
        Command::RunAll => {
            scenarios::routine();
            scenarios::emergency();
            scenarios::contraindication();
            scenarios::hallucination();
            scenarios::refinement();
        }
        Command::Routine => scenarios::routine(),
        Command::Emergency => scenarios::emergency(),
        Command::Contraindication => scenarios::contraindication(),
        Command::Hallucination => scenarios::hallucination(),
        Command::Refinement => scenarios::refinement(),
    }
}

fn print_banner() {
    println!();
    println!("REFLEX — Bounded Reflective Clinical Decision Support");
    println!("=====================================================");
    println!();
    println!("Workflow per request:");
    println!("  [1] Plan: mask PII, fetch profile, classify triage");
    println!("  [2] Act: canned response for emergencies, retrieval + generation otherwise");
    println!("  [3] Critique: contraindication, hallucination, and validation checks + score");
    println!("  [4] Gate: approve, escalate, or loop back (at most 3 passes)");
    println!("  [5] Finalize: APPROVED / ESCALATED / ERROR, session persisted");
    println!();
}
