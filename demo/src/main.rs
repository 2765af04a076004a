//! claimfill Employment Reference — Demo CLI
//!
//! Runs one or all of the three employment-claim scenarios. Each scenario uses
//! the real claimfill components (pipeline, case session, verifier, journal)
//! wired to a scripted model and fictional case files.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- wage-claim
//!   cargo run -p demo -- claim-value-conflict
//!   cargo run -p demo -- repair-conversation

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use claimfill_contracts::error::ClaimfillResult;
use claimfill_ref_employment::scenarios::{claim_value_conflict, repair_conversation, wage_claim};

// ── CLI definition ────────────────────────────────────────────────────────────

/// claimfill: structured extraction and form completion for claim documents.
///
/// Each subcommand runs one or all of the employment-claim scenarios.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "claimfill employment-claim reference demo",
    long_about = "Runs claimfill demo scenarios showing document extraction, schema\n\
                  completion, advisory audits, the repair loop, and journal integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: Wage Claim Intake (full document pipeline).
    WageClaim,
    /// Scenario 2: Claim Value Conflict (audit keeps the claim value open).
    ClaimValueConflict,
    /// Scenario 3: Repair Conversation (chat replies complete the record).
    RepairConversation,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for stage-by-stage output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::WageClaim => wage_claim::run_scenario().await,
        Command::ClaimValueConflict => claim_value_conflict::run_scenario().await,
        Command::RepairConversation => repair_conversation::run_scenario().await,
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run_all() -> ClaimfillResult<()> {
    wage_claim::run_scenario().await?;
    claim_value_conflict::run_scenario().await?;
    repair_conversation::run_scenario().await?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("claimfill: Claim Document Extraction");
    println!("Employment Reference Demo");
    println!("====================================");
    println!();
    println!("Pipeline per case:");
    println!("  [1] Ingest and Describe every document; unreadable files are carried, not fatal");
    println!("  [2] Classify documents by party, Extract a fragment from each, Combine into one record");
    println!("  [3] Diff against the template, Revise from the full text, Inject the patch");
    println!("  [4] Verify the record and run the advisory audits concurrently");
    println!("  [5] Every transition journaled to a SHA-256 hash chain");
    println!();
}
