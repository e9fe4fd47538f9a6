//! PDF text and page image access.
//!
//! Stands in for the text extraction primitive; the extraction engine only
//! ever sees the joined page text.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text of each page, in page order.
    fn extract_page_texts(&self) -> Result<Vec<String>>;

    /// Extract the text of all pages joined with `separator`.
    fn extract_text(&self, separator: &str) -> Result<String> {
        Ok(self.extract_page_texts()?.join(separator))
    }

    /// Largest embedded image of the first page, for scanned bills.
    fn first_page_image(&self) -> Result<Option<DynamicImage>>;
}
