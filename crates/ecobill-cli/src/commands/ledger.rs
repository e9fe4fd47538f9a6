//! Ledger command - list the sources already in a record table.

use std::path::PathBuf;

use clap::Args;
use console::style;

use ecobill_core::ledger::RecordStore;
use ecobill_core::models::record::OutputLayout;

use super::load_config;

/// Arguments for the ledger command.
#[derive(Args)]
pub struct LedgerArgs {
    /// Record table to read
    #[arg(default_value = "facturas.csv")]
    table: PathBuf,

    /// The table uses the extended layout with a chart column
    #[arg(long)]
    extended: bool,

    /// Only print the number of known sources
    #[arg(long)]
    count: bool,
}

pub fn run(args: LedgerArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let layout = if args.extended {
        OutputLayout::Extended
    } else {
        config.output.layout
    };

    let store = RecordStore::new(&args.table, layout, config.output.source_column.clone());
    let ledger = store.load_ledger()?;

    if args.count {
        println!("{}", ledger.len());
        return Ok(());
    }

    let mut ids: Vec<&String> = ledger.ids().iter().collect();
    ids.sort();
    for id in ids {
        println!("{}", id);
    }
    eprintln!(
        "{} {} sources in {}",
        style("ℹ").blue(),
        ledger.len(),
        store.path().display()
    );
    Ok(())
}
