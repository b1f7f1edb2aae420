//! `vaultcloze status` - report what the next regen would do

use vaultcloze_core::error::Result;
use vaultcloze_core::report::StatusReport;
use vaultcloze_core::status::StatusScanner;
use vaultcloze_core::store::FsStore;
use vaultcloze_core::tracker::Staleness;

use crate::cli::OutputFormat;
use crate::commands::dispatch::CommandContext;

/// Execute the status command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let workspace = ctx.workspace()?;
    let store = FsStore::new();

    let report = StatusScanner::new(
        &store,
        &workspace.config,
        workspace.vault,
        &workspace.collection_root,
    )
    .scan()?;

    match ctx.cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => print_human(&report, ctx.cli.quiet),
    }
    Ok(())
}

fn describe(staleness: &Staleness) -> String {
    match staleness {
        Staleness::Fresh => "up to date".to_string(),
        Staleness::NeverProcessed => "never processed".to_string(),
        Staleness::Modified => "modified".to_string(),
        Staleness::ReferenceModified(doc) => format!("embedded {} changed", doc),
        Staleness::Forced => "forced".to_string(),
    }
}

fn print_human(report: &StatusReport, quiet: bool) {
    for issue in &report.issues {
        eprintln!("[{}]: {}", issue.kind, issue.message);
    }
    if quiet {
        return;
    }

    println!(
        "{} documents, {} stale",
        report.documents,
        report.stale.len()
    );
    for stale in &report.stale {
        println!("  {} ({})", stale.document, describe(&stale.staleness));
    }
    for folder in &report.orphaned_documents {
        println!("orphaned document folder: {}", folder.display());
    }
}
