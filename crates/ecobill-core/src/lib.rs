//! Core library for utility bill field extraction.
//!
//! This crate provides:
//! - Line heuristics extracting account id, supply address, reading date and
//!   consumption from bill text
//! - A deduplication ledger backed by an append-only CSV record table
//! - A best-effort consumption chart crop from a rendered first page
//! - PDF text access (lopdf, pdf-extract)

pub mod chart;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod pdf;
pub mod pipeline;

pub use chart::{crop_chart, save_chart_crop, ChartRegion};
pub use error::{ChartError, EcobillError, LedgerError, PdfError, Result};
pub use invoice::{assemble_record, segment_lines, BillExtractor, ExtractedFields, Field, FieldExtractor, Lines};
pub use ledger::{dedup_candidates, filter_new, Ledger, RecordStore};
pub use models::{EcobillConfig, InvoiceRecord, OutputLayout};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::{BatchPipeline, Outcome, SourceDocument};
