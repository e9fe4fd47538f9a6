//! Batch command - extract every new bill into the record table.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use ecobill_core::ledger::{dedup_candidates, RecordStore};
use ecobill_core::models::record::OutputLayout;
use ecobill_core::pipeline::{BatchPipeline, Outcome, SourceDocument};

use super::{chart_path, load_bill, load_config, open_page_image, source_id};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files glob pattern (PDF or TXT)
    #[arg(required = true)]
    input: String,

    /// Record table to append to; also the ledger of captured bills
    #[arg(short, long, default_value = "facturas.csv")]
    output: PathBuf,

    /// Directory with rendered first pages named <stem>.png
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Save chart crops here; switches the table to the extended layout
    #[arg(long)]
    chart_dir: Option<PathBuf>,

    /// Drop repeated file names before filtering against the ledger
    #[arg(long)]
    dedup_candidates: bool,
}

/// A bill that could not be read.
struct Failure {
    path: PathBuf,
    error: String,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if args.chart_dir.is_some() {
        config.chart.enabled = true;
        config.output.layout = OutputLayout::Extended;
    }

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let mut paths: HashMap<String, PathBuf> = HashMap::new();
    let mut candidates = Vec::with_capacity(files.len());
    for path in &files {
        let id = source_id(path);
        paths.entry(id.clone()).or_insert_with(|| path.clone());
        candidates.push(id);
    }
    let candidates: Vec<String> = if args.dedup_candidates {
        dedup_candidates(&candidates).into_iter().map(str::to_string).collect()
    } else {
        candidates
    };

    let store = RecordStore::new(
        &args.output,
        config.output.layout,
        config.output.source_column.clone(),
    );
    let ledger = store.load_ledger().with_context(|| {
        format!(
            "Refusing to run: record table {} cannot be trusted",
            store.path().display()
        )
    })?;

    let mut pipeline = BatchPipeline::new(&config, ledger)?;
    let pending = pipeline.pending(&candidates);

    println!(
        "{} Found {} files, {} not yet captured",
        style("ℹ").blue(),
        candidates.len(),
        pending.len()
    );

    let pb = ProgressBar::new(pending.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} bills")?
            .progress_chars("=>-"),
    );

    let mut extracted = 0usize;
    let mut skipped = candidates.len() - pending.len();
    let mut total_kwh = Decimal::ZERO;
    let mut failures = Vec::new();
    let mut attempted = HashSet::new();

    for id in pending {
        pb.inc(1);
        // Repeats of a name already captured or already failed this run.
        if pipeline.is_known(id) || !attempted.insert(id) {
            debug!("Skipping repeated {}", id);
            skipped += 1;
            continue;
        }
        let Some(path) = paths.get(id) else {
            continue;
        };

        let want_image = config.chart.enabled && args.pages_dir.is_none();
        let bill = match load_bill(path, &config, want_image) {
            Ok(bill) => bill,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                failures.push(Failure {
                    path: path.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let mut doc = SourceDocument::new(id, bill.text);
        if let Some(chart_dir) = &args.chart_dir {
            let page_image = match &args.pages_dir {
                Some(dir) => {
                    let rendered = chart_path(dir, path, ".png");
                    if rendered.exists() {
                        open_page_image(&rendered)
                            .map_err(|e| warn!("{}", e))
                            .ok()
                    } else {
                        debug!("No rendered page at {}", rendered.display());
                        None
                    }
                }
                None => bill.page_image,
            };
            if let Some(image) = page_image {
                doc = doc.with_page_image(image, chart_path(chart_dir, path, &config.chart.file_suffix));
            }
        }

        match pipeline.process(&doc) {
            Outcome::Extracted(record) => {
                if let Some(kwh) = record.consumption_decimal() {
                    total_kwh += kwh;
                }
                // Persist row by row so an interrupted run keeps its progress.
                store.append(std::slice::from_ref(&record))?;
                extracted += 1;
            }
            Outcome::Skipped | Outcome::Rejected => skipped += 1,
        }
    }

    pb.finish_with_message("Complete");

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        candidates.len(),
        start.elapsed()
    );
    println!(
        "   {} extracted, {} skipped, {} failed",
        style(extracted).green(),
        style(skipped).yellow(),
        style(failures.len()).red()
    );
    println!("   {} kWh in new records", total_kwh.normalize());
    println!(
        "{} Records appended to {}",
        style("✓").green(),
        store.path().display()
    );

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for failure in &failures {
            println!("  - {}: {}", failure.path.display(), failure.error);
        }
    }

    Ok(())
}
