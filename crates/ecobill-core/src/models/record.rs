//! The extracted bill record and its tabular layout.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Date format of the reading date as printed on bills.
pub const READING_DATE_FORMAT: &str = "%d/%m/%Y";

/// Column set of the persisted record table.
///
/// Switching layouts needs a fresh table; existing tables are never migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// Four extracted fields plus the source identifier.
    #[default]
    Core,
    /// Core columns plus the path of the cropped chart image.
    Extended,
}

impl OutputLayout {
    /// Ordered column names for this layout.
    pub fn columns(&self, source_column: &str) -> Vec<String> {
        let mut columns = vec![
            "account_id".to_string(),
            "address".to_string(),
            "reading_date".to_string(),
            "consumption_kwh".to_string(),
            source_column.to_string(),
        ];
        if *self == OutputLayout::Extended {
            columns.push("chart_image_path".to_string());
        }
        columns
    }
}

/// One extracted bill.
///
/// Every extracted field is a plain string and is empty when the heuristic
/// found nothing, so a record is always appendable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Link or file name of the originating document. Never empty.
    pub source_id: String,

    /// Account/meter identifier (NIC).
    pub account_id: String,

    /// Supply address fragments joined with ", ".
    pub address: String,

    /// Meter reading date as `DD/MM/YYYY`, not validated.
    pub reading_date: String,

    /// Consumption with `.` as decimal separator.
    pub consumption_kwh: String,

    /// Cropped chart image, extended layout only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_image_path: Option<String>,
}

impl InvoiceRecord {
    /// Check whether all four extracted fields are empty.
    pub fn is_blank(&self) -> bool {
        self.account_id.is_empty()
            && self.address.is_empty()
            && self.reading_date.is_empty()
            && self.consumption_kwh.is_empty()
    }

    /// Reading date as a calendar date, if it is one.
    pub fn reading_date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.reading_date, READING_DATE_FORMAT).ok()
    }

    /// Consumption as a decimal number.
    pub fn consumption_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.consumption_kwh).ok()
    }

    /// Row values in the column order of `layout`.
    pub fn to_row(&self, layout: OutputLayout) -> Vec<String> {
        let mut row = vec![
            self.account_id.clone(),
            self.address.clone(),
            self.reading_date.clone(),
            self.consumption_kwh.clone(),
            self.source_id.clone(),
        ];
        if layout == OutputLayout::Extended {
            row.push(self.chart_image_path.clone().unwrap_or_default());
        }
        row
    }
}
