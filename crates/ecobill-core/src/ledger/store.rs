//! Append-only CSV table of extracted records.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use super::Ledger;
use crate::error::{LedgerError, Result};
use crate::models::record::{InvoiceRecord, OutputLayout};

/// Persisted record table backing the ledger.
///
/// Rows are only ever appended. The header is written once, when the file is
/// created, and is never migrated to another layout.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    layout: OutputLayout,
    source_column: String,
}

impl RecordStore {
    /// Create a store for the table at `path`.
    pub fn new(path: impl Into<PathBuf>, layout: OutputLayout, source_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            layout,
            source_column: source_column.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Column names in table order.
    pub fn header(&self) -> Vec<String> {
        self.layout.columns(&self.source_column)
    }

    fn has_content(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Rebuild the ledger from the source column of the table.
    ///
    /// A missing or empty file is an empty ledger. A table that exists but
    /// cannot be trusted is an error.
    pub fn load_ledger(&self) -> Result<Ledger> {
        let mut ledger = Ledger::new();
        self.read_rows(|row| {
            ledger.insert(row.source_id);
        })?;
        info!("loaded {} known sources from {}", ledger.len(), self.path.display());
        Ok(ledger)
    }

    /// Read all records back from the table.
    pub fn load_records(&self) -> Result<Vec<InvoiceRecord>> {
        let mut records = Vec::new();
        self.read_rows(|row| records.push(row))?;
        Ok(records)
    }

    fn read_rows(&self, mut visit: impl FnMut(InvoiceRecord)) -> Result<()> {
        if !self.has_content()? {
            debug!("no record table at {}", self.path.display());
            return Ok(());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.unreadable(e))?;

        let found: Vec<String> = reader
            .headers()
            .map_err(|e| self.unreadable(e))?
            .iter()
            .map(str::to_string)
            .collect();

        if !found.iter().any(|column| *column == self.source_column) {
            return Err(LedgerError::MissingColumn {
                path: self.path.clone(),
                column: self.source_column.clone(),
            }
            .into());
        }

        let expected = self.header();
        if found != expected {
            return Err(LedgerError::HeaderMismatch {
                path: self.path.clone(),
                expected,
                found,
            }
            .into());
        }

        let mut row = StringRecord::new();
        loop {
            let more = reader.read_record(&mut row).map_err(|e| self.unreadable(e))?;
            if !more {
                break;
            }
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            visit(self.parse_row(&row, line, expected.len())?);
        }
        Ok(())
    }

    fn parse_row(&self, row: &StringRecord, line: u64, width: usize) -> Result<InvoiceRecord> {
        if row.len() != width {
            return Err(LedgerError::MalformedRow {
                path: self.path.clone(),
                line,
                reason: format!("expected {} fields, found {}", width, row.len()),
            }
            .into());
        }

        let field = |index: usize| row.get(index).unwrap_or_default().to_string();
        let source_id = field(4);
        if source_id.is_empty() {
            return Err(LedgerError::EmptySourceId {
                path: self.path.clone(),
                line,
            }
            .into());
        }

        let chart_image_path = match self.layout {
            OutputLayout::Extended => Some(field(5)).filter(|path| !path.is_empty()),
            OutputLayout::Core => None,
        };

        Ok(InvoiceRecord {
            source_id,
            account_id: field(0),
            address: field(1),
            reading_date: field(2),
            consumption_kwh: field(3),
            chart_image_path,
        })
    }

    fn unreadable(&self, e: csv::Error) -> LedgerError {
        LedgerError::Unreadable {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    /// Append records, writing the header first if the table is new.
    ///
    /// Returns the number of rows written.
    pub fn append(&self, records: &[InvoiceRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let needs_header = !self.has_content()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(self.header())?;
        }
        for record in records {
            writer.write_record(record.to_row(self.layout))?;
        }
        writer.flush()?;

        debug!("appended {} rows to {}", records.len(), self.path.display());
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcobillError;
    use pretty_assertions::assert_eq;

    fn record(source_id: &str) -> InvoiceRecord {
        InvoiceRecord {
            source_id: source_id.to_string(),
            account_id: "1234567".to_string(),
            address: "Calle 1, Ciudad, Provincia".to_string(),
            reading_date: "15/02/2024".to_string(),
            consumption_kwh: "56.78".to_string(),
            chart_image_path: None,
        }
    }

    fn core_store(path: &Path) -> RecordStore {
        RecordStore::new(path, OutputLayout::Core, "link")
    }

    #[test]
    fn test_missing_table_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = core_store(&dir.path().join("bills.csv")).load_ledger().unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("bills.csv");
        let store = core_store(&path);

        store.append(&[record("a.pdf")]).unwrap();
        store.append(&[record("b.pdf")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().filter(|l| l.starts_with("account_id")).count(),
            1
        );
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_records_read_back_with_commas() {
        let dir = tempfile::tempdir().unwrap();
        let store = core_store(&dir.path().join("bills.csv"));
        let written = vec![record("a.pdf"), InvoiceRecord { source_id: "b.pdf".to_string(), ..Default::default() }];

        store.append(&written).unwrap();
        assert_eq!(store.load_records().unwrap(), written);
    }

    #[test]
    fn test_extended_layout_chart_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("bills.csv"), OutputLayout::Extended, "link");
        let mut with_chart = record("a.pdf");
        with_chart.chart_image_path = Some("charts/a_chart.png".to_string());

        store.append(&[with_chart.clone(), record("b.pdf")]).unwrap();
        assert_eq!(store.load_records().unwrap(), vec![with_chart, record("b.pdf")]);
    }

    #[test]
    fn test_missing_source_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.csv");
        fs::write(&path, "account_id,address\n1234567,x\n").unwrap();

        let err = core_store(&path).load_ledger().unwrap_err();
        assert!(matches!(err, EcobillError::Ledger(LedgerError::MissingColumn { .. })));
    }

    #[test]
    fn test_layout_switch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.csv");
        core_store(&path).append(&[record("a.pdf")]).unwrap();

        let extended = RecordStore::new(&path, OutputLayout::Extended, "link");
        let err = extended.load_ledger().unwrap_err();
        assert!(matches!(err, EcobillError::Ledger(LedgerError::HeaderMismatch { .. })));
    }

    #[test]
    fn test_short_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.csv");
        fs::write(
            &path,
            "account_id,address,reading_date,consumption_kwh,link\n1,2,3,4,a.pdf\n1,2\n",
        )
        .unwrap();

        let err = core_store(&path).load_ledger().unwrap_err();
        match err {
            EcobillError::Ledger(LedgerError::MalformedRow { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_source_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.csv");
        fs::write(&path, "account_id,address,reading_date,consumption_kwh,link\n1,2,3,4,\n").unwrap();

        let err = core_store(&path).load_ledger().unwrap_err();
        assert!(matches!(err, EcobillError::Ledger(LedgerError::EmptySourceId { .. })));
    }

    #[test]
    fn test_undecodable_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.csv");
        let mut content = b"account_id,address,reading_date,consumption_kwh,link\n1,".to_vec();
        content.extend_from_slice(&[0xff, 0xfe]);
        content.extend_from_slice(b",3,4,a.pdf\n");
        fs::write(&path, content).unwrap();

        let err = core_store(&path).load_ledger().unwrap_err();
        assert!(matches!(err, EcobillError::Ledger(LedgerError::Unreadable { .. })));
        assert!(err.to_string().contains("utf-8"));
    }

    #[test]
    fn test_undecodable_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bills.csv");
        fs::write(&path, [b'l', 0xc3, b'\n', b'a']).unwrap();

        let err = core_store(&path).load_records().unwrap_err();
        assert!(matches!(err, EcobillError::Ledger(LedgerError::Unreadable { .. })));
    }
}
