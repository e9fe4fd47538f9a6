//! Config command - inspect and check extraction settings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use ecobill_core::chart::ChartRegion;
use ecobill_core::invoice::BillExtractor;
use ecobill_core::models::config::EcobillConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the configuration in effect
    Show,

    /// Write a configuration file with the default markers
    Init(InitArgs),

    /// Print one value (e.g., "extraction.energy_marker")
    Get {
        /// Dotted key
        key: String,
    },

    /// Validate a configuration file and summarize what it extracts
    Check {
        /// File to check (default: the config in effect)
        file: Option<PathBuf>,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(config_path),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Get { key } => get_config(&key, config_path),
        ConfigCommand::Check { file } => {
            let file = file.or_else(|| config_path.map(PathBuf::from));
            check_config(file.as_deref())
        }
        ConfigCommand::Path => show_path(config_path),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ecobill")
        .join("config.json")
}

fn effective_path(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

fn show_config(config_path: Option<&str>) -> anyhow::Result<()> {
    if !effective_path(config_path).exists() {
        eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }

    let config = super::load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    EcobillConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );
    println!("   Edit the markers in \"extraction\" to match another issuer.");

    Ok(())
}

fn get_config(key: &str, config_path: Option<&str>) -> anyhow::Result<()> {
    let json = serde_json::to_value(super::load_config(config_path)?)?;
    println!("{}", serde_json::to_string_pretty(lookup(&json, key)?)?);
    Ok(())
}

/// Follow a dotted key, naming the valid keys at the level where it misses.
fn lookup<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    let mut current = json;
    let mut walked = Vec::new();
    for part in key.split('.') {
        let Some(next) = current.get(part) else {
            let valid = current
                .as_object()
                .map(|map| map.keys().map(String::as_str).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            let at = if walked.is_empty() {
                "top level".to_string()
            } else {
                format!("'{}'", walked.join("."))
            };
            if valid.is_empty() {
                anyhow::bail!("Configuration key not found: {} ({} is a value)", key, at);
            }
            anyhow::bail!("Configuration key not found: {}. Keys at {}: {}", key, at, valid);
        };
        walked.push(part);
        current = next;
    }
    Ok(current)
}

fn check_config(file: Option<&Path>) -> anyhow::Result<()> {
    let path = file.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let config = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str::<EcobillConfig>(&content)
            .with_context(|| format!("{} is not a valid config file", path.display()))?
    } else {
        eprintln!(
            "{} No config file at {}, checking defaults.",
            style("ℹ").blue(),
            path.display()
        );
        EcobillConfig::default()
    };

    if let Err(e) = config.validate() {
        println!("{} {}", style("✗").red(), e);
        anyhow::bail!("Configuration {} is not usable", path.display());
    }
    BillExtractor::from_config(&config.extraction)?;

    let ex = &config.extraction;
    println!("{} Configuration is usable", style("✓").green());
    println!(
        "   Account:     bare line of {}..={} digits",
        ex.account_min_digits, ex.account_max_digits
    );
    println!(
        "   Address:     {} lines after \"{}\"",
        ex.address_line_count, ex.address_marker
    );
    println!("   Reading:     date number {} in the text", ex.reading_date_index + 1);
    println!(
        "   Consumption: \"{}\" (+{} lines), then \"{}\" with \"{}\"",
        ex.energy_marker, ex.energy_window, ex.variable_charge_marker, ex.variable_charge_unit
    );

    let region = ChartRegion::from_config(&config.chart);
    let state = if config.chart.enabled { "enabled" } else { "disabled" };
    match region.pixel_rect(1000, 1000) {
        Ok((x, y, w, h)) => println!(
            "   Chart:       {}, {}x{} at ({}, {}) on a 1000x1000 page",
            state, w, h, x, y
        ),
        Err(e) => println!("   Chart:       {}, {}", state, e),
    }
    println!(
        "   Output:      {:?} layout, source column \"{}\"",
        config.output.layout, config.output.source_column
    );

    Ok(())
}

fn show_path(config_path: Option<&str>) -> anyhow::Result<()> {
    let config_path = effective_path(config_path);

    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'ecobill config init' to create a configuration file.");
    }

    Ok(())
}
