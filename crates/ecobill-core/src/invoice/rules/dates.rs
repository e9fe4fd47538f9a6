//! Reading date extraction.

use tracing::debug;

use super::patterns::DATE_DMY;
use crate::invoice::{Field, FieldExtractor, Lines};
use crate::models::config::ExtractionConfig;

/// All `DD/MM/YYYY` substrings of a text, in order of appearance.
pub fn extract_dates(text: &str) -> Vec<&str> {
    DATE_DMY.find_iter(text).map(|m| m.as_str()).collect()
}

/// The n-th date found anywhere in the document text.
///
/// Bills print the issue date first, so the default picks the second date.
pub struct ReadingDateExtractor {
    index: usize,
}

impl ReadingDateExtractor {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.reading_date_index)
    }
}

impl Default for ReadingDateExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldExtractor for ReadingDateExtractor {
    fn field(&self) -> Field {
        Field::ReadingDate
    }

    fn extract(&self, lines: &Lines<'_>) -> Option<String> {
        // Dates may sit mid-line, so scan the whole text rather than lines.
        let dates = extract_dates(lines.text());
        debug!("found {} dates in document", dates.len());
        dates.get(self.index).map(|date| date.to_string())
    }
}
