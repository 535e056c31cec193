//! Process command - rename a single invoice file.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use invren_core::naming::resolve_conflict;
use invren_core::pipeline::{Pipeline, PipelineOutput};
use invren_core::text::{FileTextSource, TextSource};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Entity whose fiscal calendar applies
    #[arg(short, long)]
    entity: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Rename the file in place instead of only printing the new name
    #[arg(long)]
    rename: bool,

    /// Show the planned rename without touching the file
    #[arg(long)]
    dry_run: bool,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let parent = args
        .input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Input path has no file name"))?;

    info!("Processing file: {}", args.input.display());

    let source = FileTextSource::new(&parent);
    let text = source.fetch(file_name)?;

    let pipeline = Pipeline::new(&config);
    let output = pipeline.process(file_name, &text, args.entity.as_deref())?;

    // Resolve against what is already in the directory.
    let existing: HashSet<String> = fs::read_dir(&parent)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n != file_name)
        .collect();
    let final_name = resolve_conflict(&output.naming.file_name, &existing)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print_summary(&output, &final_name, args.show_confidence),
    }

    if args.rename && !args.dry_run {
        let target = parent.join(&final_name);
        fs::rename(&args.input, &target)?;
        println!(
            "{} Renamed to {}",
            style("✓").green(),
            target.display()
        );
    } else if args.dry_run {
        println!(
            "{} Would rename {} -> {}",
            style("ℹ").blue(),
            args.input.display(),
            final_name
        );
    }

    info!("Processed in {:?}", start.elapsed());
    Ok(())
}

fn print_summary(output: &PipelineOutput, final_name: &str, show_confidence: bool) {
    println!("{} {}", style("New name:").bold(), final_name);
    println!("  Supplier:       {}", output.naming.supplier);
    println!("  Invoice number: {}", output.naming.invoice_number);
    println!("  Date:           {}", output.naming.date);
    println!("  Amount:         {}", output.naming.amount);
    if let Some(c) = &output.classification {
        println!("  Fiscal quarter: {} {}", c.quarter_label, c.fiscal_year);
    }
    if let Some(folder) = &output.folder {
        println!("  Filing folder:  {}", folder);
    }
    println!("  Confidence:     {:.0}%", output.confidence * 100.0);

    if show_confidence {
        println!();
        println!("{}", style("Field confidence:").bold());
        for field in [
            invren_core::models::Field::Supplier,
            invren_core::models::Field::InvoiceNumber,
            invren_core::models::Field::Date,
            invren_core::models::Field::Amount,
            invren_core::models::Field::Currency,
        ] {
            match output.record.confidence(field) {
                Some(score) => println!("  {:15} {:.0}%", field.as_str(), score * 100.0),
                None => println!("  {:15} {}", field.as_str(), style("missing").yellow()),
            }
        }
    }

    for warning in &output.warnings {
        println!("{} {}", style("⚠").yellow(), warning);
    }
}
