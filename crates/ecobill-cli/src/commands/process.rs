//! Process command - extract fields from a single bill.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{info, warn};

use ecobill_core::chart::{save_chart_crop, ChartRegion};
use ecobill_core::invoice::BillExtractor;
use ecobill_core::models::record::{InvoiceRecord, OutputLayout};

use super::{load_bill, load_config, open_page_image, source_id};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or TXT with extracted page text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Rendered first page image used for the chart crop
    #[arg(long)]
    page_image: Option<PathBuf>,

    /// Save the consumption chart crop to this file
    #[arg(long)]
    chart_out: Option<PathBuf>,

    /// List fields that could not be found
    #[arg(long)]
    show_missing: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let want_image = args.chart_out.is_some() && args.page_image.is_none();
    let bill = load_bill(&args.input, &config, want_image)?;

    let extractor = BillExtractor::from_config(&config.extraction)?;
    let fields = extractor.extract(&bill.text);
    let missing = fields.missing();
    let mut record = ecobill_core::assemble_record(source_id(&args.input), fields);

    if let Some(chart_out) = &args.chart_out {
        let page = match &args.page_image {
            Some(path) => Some(open_page_image(path)?),
            None => bill.page_image,
        };
        match page {
            Some(page) => {
                if save_chart_crop(&page, &ChartRegion::from_config(&config.chart), chart_out) {
                    record.chart_image_path = Some(chart_out.display().to_string());
                }
            }
            None => warn!("No page image for {}, chart skipped", args.input.display()),
        }
    }

    let layout = if args.chart_out.is_some() {
        OutputLayout::Extended
    } else {
        config.output.layout
    };
    let output = format_record(&record, args.format, layout, &config.output.source_column)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_missing {
        eprintln!();
        if missing.is_empty() {
            eprintln!("{} All fields found", style("ℹ").blue());
        } else {
            let names: Vec<_> = missing.iter().map(|f| f.name()).collect();
            eprintln!("{} Missing fields: {}", style("⚠").yellow(), names.join(", "));
        }
        eprintln!("{} Processing time: {:?}", style("ℹ").blue(), start.elapsed());
    }

    Ok(())
}

fn format_record(
    record: &InvoiceRecord,
    format: OutputFormat,
    layout: OutputLayout,
    source_column: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(layout.columns(source_column))?;
            wtr.write_record(record.to_row(layout))?;
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => Ok(format_record_text(record)),
    }
}

fn format_record_text(record: &InvoiceRecord) -> String {
    let show = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    let mut output = String::new();
    output.push_str(&format!("Source:      {}\n", record.source_id));
    output.push_str(&format!("Account:     {}\n", show(&record.account_id)));
    output.push_str(&format!("Address:     {}\n", show(&record.address)));
    output.push_str(&format!("Reading:     {}\n", show(&record.reading_date)));
    output.push_str(&format!("Consumption: {} kWh\n", show(&record.consumption_kwh)));
    if let Some(chart) = &record.chart_image_path {
        output.push_str(&format!("Chart:       {}\n", chart));
    }
    output
}
