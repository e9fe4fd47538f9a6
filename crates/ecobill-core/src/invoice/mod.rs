//! Bill field extraction module.
//!
//! Each field is found by a heuristic over the ordered lines of a document.
//! A miss is a normal outcome and yields an empty field, never an error.

mod extractor;
mod segmenter;
pub mod rules;

pub use extractor::{assemble_record, BillExtractor, ExtractedFields, FallbackChain};
pub use segmenter::{segment_lines, Lines};

use std::fmt;

/// Fields extracted from a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Account/meter identifier.
    AccountId,
    /// Supply address.
    Address,
    /// Meter reading date.
    ReadingDate,
    /// Energy consumption in kWh.
    Consumption,
}

impl Field {
    /// Column-style name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::AccountId => "account_id",
            Field::Address => "address",
            Field::ReadingDate => "reading_date",
            Field::Consumption => "consumption_kwh",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single heuristic producing one field.
///
/// Implementations are pure: the same lines always give the same answer.
pub trait FieldExtractor {
    /// The field this heuristic produces.
    fn field(&self) -> Field;

    /// Look for the field, `None` when the layout does not match.
    fn extract(&self, lines: &Lines<'_>) -> Option<String>;
}
