//! Batch command - rename many invoice files at once.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use invren_core::batch::{
    BatchOrchestrator, BatchResult, DocumentOutcome, DocumentRequest, PipelineRemote, RetryPolicy,
    MAX_BATCH_SIZE,
};
use invren_core::naming::resolve_conflict;
use invren_core::pipeline::Pipeline;
use invren_core::text::FileTextSource;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Entity whose fiscal calendar applies
    #[arg(short, long)]
    entity: Option<String>,

    /// Rename files in place instead of only printing new names
    #[arg(long)]
    rename: bool,

    /// Show planned renames without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Move renamed files into fiscal quarter subfolders, e.g. 2025/Q1
    #[arg(long)]
    organize: bool,

    /// Process only the first 50 files of an oversized batch
    #[arg(long)]
    truncate: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Retry attempts per file
    #[arg(long, default_value = "3")]
    retries: u32,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let requests: Vec<DocumentRequest> = files
        .iter()
        .filter_map(|p| p.to_str())
        .map(|p| match &args.entity {
            Some(entity) => DocumentRequest::for_entity(p, entity.clone()),
            None => DocumentRequest::new(p),
        })
        .collect();

    let policy = RetryPolicy {
        max_attempts: args.retries.max(1),
        ..RetryPolicy::default()
    };
    let pipeline = Pipeline::new(&config);
    let remote = PipelineRemote::new(pipeline, FileTextSource::new("."));
    let orchestrator = BatchOrchestrator::new(remote, policy);

    let pb = ProgressBar::new(requests.len().min(MAX_BATCH_SIZE) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let result = if args.truncate {
        if requests.len() > MAX_BATCH_SIZE {
            warn!(
                "Batch of {} files truncated to the first {}",
                requests.len(),
                MAX_BATCH_SIZE
            );
        }
        let truncated = orchestrator.run_truncated(&requests);
        pb.inc(truncated.outcomes.len() as u64);
        truncated
    } else {
        orchestrator.run_with_progress(&requests, |_, _| pb.inc(1))?
    };

    pb.finish_with_message("Complete");

    // Apply renames, resolving conflicts per directory as we go.
    let mut renames: Vec<(PathBuf, String, PathBuf, String)> = Vec::new();
    for outcome in &result.outcomes {
        let DocumentOutcome::Success { output, .. } = outcome else {
            continue;
        };

        let source = PathBuf::from(output.record.source_name());
        let parent = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let current = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let target_dir = match (&output.folder, args.organize) {
            (Some(folder), true) => parent.join(folder),
            _ => parent.clone(),
        };

        let mut existing: HashSet<String> = match fs::read_dir(&target_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|n| *n != current || target_dir != parent)
                .collect(),
            Err(_) => HashSet::new(),
        };
        // Names already claimed earlier in this batch also count.
        existing.extend(
            renames
                .iter()
                .filter(|(_, _, dir, _)| *dir == target_dir)
                .map(|(_, _, _, name)| name.clone()),
        );

        let final_name = resolve_conflict(&output.naming.file_name, &existing)?;
        renames.push((parent, current, target_dir, final_name));
    }

    for (parent, current, target_dir, final_name) in &renames {
        if args.rename && !args.dry_run {
            fs::create_dir_all(target_dir)?;
            fs::rename(parent.join(current), target_dir.join(final_name))?;
            debug!("Renamed {} -> {}", current, final_name);
        } else {
            println!("  {} -> {}", current, target_dir.join(final_name).display());
        }
    }

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &result)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        result.outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(result.succeeded()).green(),
        style(result.failed()).red()
    );
    if result.truncated > 0 {
        println!(
            "   {} files past the {}-file cap were skipped",
            style(result.truncated).yellow(),
            MAX_BATCH_SIZE
        );
    }

    let failed: Vec<_> = result
        .outcomes
        .iter()
        .filter(|o| !o.is_success())
        .collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in failed {
            if let DocumentOutcome::Failed { source_name, error, attempts } = outcome {
                println!("  - {} ({} attempts): {}", source_name, attempts, error);
            }
        }
    }

    Ok(())
}

fn write_summary(path: &PathBuf, result: &BatchResult) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "new_name",
        "supplier",
        "invoice_number",
        "date",
        "amount",
        "quarter",
        "confidence",
        "attempts",
        "error",
    ])?;

    for outcome in &result.outcomes {
        match outcome {
            DocumentOutcome::Success { output, attempts } => {
                wtr.write_record([
                    output.record.source_name(),
                    "success",
                    &output.naming.file_name,
                    &output.naming.supplier,
                    &output.naming.invoice_number,
                    &output.naming.date,
                    &output.naming.amount,
                    output.naming.quarter.as_deref().unwrap_or(""),
                    &format!("{:.2}", output.confidence),
                    &attempts.to_string(),
                    "",
                ])?;
            }
            DocumentOutcome::Failed { source_name, error, attempts } => {
                wtr.write_record([
                    source_name,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &attempts.to_string(),
                    &error.to_string(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
