//! `vaultcloze regen` - regenerate artifacts for stale documents

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vaultcloze_core::driver::RegenerationDriver;
use vaultcloze_core::error::{ClozeError, Result};
use vaultcloze_core::render::{InlineMath, MarkdownRenderer, RenderPipeline};
use vaultcloze_core::report::{DocumentStatus, RunReport};
use vaultcloze_core::store::FsStore;

use crate::cli::OutputFormat;
use crate::commands::dispatch::CommandContext;

/// Execute the regen command
pub fn execute(ctx: &CommandContext, force: bool) -> Result<()> {
    let workspace = ctx.workspace()?;
    let store = FsStore::new();

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        tracing::debug!(error = %e, "ctrl-c handler not installed");
    }

    let renderer = MarkdownRenderer;
    let imager = InlineMath;
    let pipeline = RenderPipeline::new(&renderer, &imager);
    let report = RegenerationDriver::new(
        &store,
        &workspace.config,
        workspace.vault,
        &workspace.collection_root,
        pipeline,
    )
    .force(force)
    .interrupt_on(interrupted)
    .run()?;

    match ctx.cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => print_human(&report, ctx.cli.quiet),
    }

    if report.interrupted {
        return Err(ClozeError::Interrupted);
    }
    Ok(())
}

fn print_human(report: &RunReport, quiet: bool) {
    for outcome in &report.outcomes {
        if !quiet {
            match outcome.status {
                DocumentStatus::Processed => {
                    println!("{}: {} clozes", outcome.document, outcome.clozes.len())
                }
                DocumentStatus::NoClozes => println!("{}: no clozes", outcome.document),
                DocumentStatus::Failed => println!("{}: failed", outcome.document),
            }
        }
        for issue in &outcome.issues {
            eprintln!("  {} [{}]: {}", outcome.document, issue.kind, issue.message);
        }
        if !quiet {
            for folder in &outcome.orphans {
                println!("  orphaned cloze folder: {}", folder.display());
            }
        }
    }

    if quiet {
        return;
    }
    for folder in &report.orphaned_documents {
        println!("orphaned document folder: {}", folder.display());
    }

    let counts = &report.counts;
    println!(
        "Processed {} of {} documents ({} clozes, {} unchanged, {} failed)",
        counts.processed + counts.no_clozes,
        counts.documents,
        counts.clozes,
        counts.fresh,
        counts.failed
    );
}
