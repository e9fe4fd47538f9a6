//! Error types for the ecobill-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the ecobill library.
///
/// Fields that cannot be found in a bill are not errors; extractors report
/// them as empty values. Everything here is either an I/O problem or a
/// data-integrity problem the caller has to look at.
#[derive(Error, Debug)]
pub enum EcobillError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Persisted record storage could not be trusted.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Chart crop error.
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),

    /// CSV encoding error while writing records.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Integrity failures of the persisted record table.
///
/// These must reach the operator: treating a broken table as empty would
/// re-ingest every document already captured.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The header row has no source identifier column.
    #[error("{path}: header has no `{column}` column")]
    MissingColumn { path: PathBuf, column: String },

    /// The header row does not match the configured output layout.
    #[error("{path}: header {found:?} does not match expected columns {expected:?}")]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A data row does not have the shape of the header.
    #[error("{path}:{line}: malformed row: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// A data row has an empty source identifier.
    #[error("{path}:{line}: empty source identifier")]
    EmptySourceId { path: PathBuf, line: u64 },

    /// The file exists but could not be decoded as CSV.
    #[error("{path}: unreadable record table: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Errors related to cropping the consumption chart.
#[derive(Error, Debug)]
pub enum ChartError {
    /// Crop fractions are outside the page or inverted.
    #[error("invalid crop region: {0}")]
    InvalidRegion(String),

    /// The crop rectangle has no pixels for this page size.
    #[error("crop region is empty for a {width}x{height} page")]
    EmptyCrop { width: u32, height: u32 },
}

/// Result type for the ecobill library.
pub type Result<T> = std::result::Result<T, EcobillError>;
