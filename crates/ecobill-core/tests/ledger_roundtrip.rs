use std::collections::HashSet;
use std::fs;

use ecobill_core::{BatchPipeline, EcobillConfig, Outcome, RecordStore, SourceDocument};
use pretty_assertions::assert_eq;

const BILL: &str = "\
ECOGAS
Emitida 01/03/2024
00451234
Domicilio suministro
Bv. San Juan 450
Córdoba
Córdoba
Periodo 10/02/2024 al 10/03/2024
Cargo Variable consumo kWh
312,5 kWh x 0,1120";

/// Appending N new records to empty storage and reloading yields those N ids.
#[test]
fn test_append_then_reload_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let config = EcobillConfig::default();
    let store = RecordStore::new(
        dir.path().join("facturas.csv"),
        config.output.layout,
        config.output.source_column.clone(),
    );

    let mut pipeline = BatchPipeline::new(&config, store.load_ledger().unwrap()).unwrap();
    let ids = ["marzo.pdf", "abril.pdf", "https://mail.example/att?id=7", "mayo.pdf"];

    let records: Vec<_> = ids
        .iter()
        .filter_map(|id| match pipeline.process(&SourceDocument::new(*id, BILL)) {
            Outcome::Extracted(record) => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(store.append(&records).unwrap(), ids.len());

    let reloaded = store.load_ledger().unwrap();
    let expected: HashSet<String> = ids.iter().map(|s| s.to_string()).collect();
    assert_eq!(reloaded.ids(), &expected);

    let first = &store.load_records().unwrap()[0];
    assert_eq!(first.account_id, "00451234");
    assert_eq!(first.address, "Bv. San Juan 450, Córdoba, Córdoba");
    assert_eq!(first.reading_date, "10/02/2024");
    assert_eq!(first.consumption_kwh, "312.5");
}

/// A second run over the same candidates extracts nothing.
#[test]
fn test_second_run_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let config = EcobillConfig::default();
    let store = RecordStore::new(dir.path().join("facturas.csv"), config.output.layout, "link");
    let candidates = ["a.pdf", "b.pdf", "a.pdf"];

    for run in 0..2 {
        let mut pipeline = BatchPipeline::new(&config, store.load_ledger().unwrap()).unwrap();
        let pending = pipeline.pending(&candidates);
        let mut records = Vec::new();
        for id in pending {
            if let Outcome::Extracted(record) = pipeline.process(&SourceDocument::new(id, BILL)) {
                records.push(record);
            }
        }
        store.append(&records).unwrap();

        let expected = if run == 0 { 2 } else { 0 };
        assert_eq!(records.len(), expected);
    }

    let content = fs::read_to_string(store.path()).unwrap();
    assert_eq!(content.lines().count(), 3);
}

/// A corrupted table stops the run instead of looking empty.
#[test]
fn test_corrupted_table_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("facturas.csv");
    fs::write(&path, "nic;direccion;fecha\n1;2;3\n").unwrap();

    let store = RecordStore::new(&path, EcobillConfig::default().output.layout, "link");
    let err = store.load_ledger().unwrap_err();
    assert!(err.to_string().contains("link"));
}
