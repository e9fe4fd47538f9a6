//! Data models for extracted bill records.

pub mod config;
pub mod record;

pub use config::{ChartConfig, EcobillConfig, ExtractionConfig, OutputConfig, PdfConfig};
pub use record::{InvoiceRecord, OutputLayout};
