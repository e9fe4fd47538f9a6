//! Common regex patterns for bill field extraction.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{EcobillError, Result};

lazy_static! {
    // Reading dates, DD/MM/YYYY with no calendar check and no word boundary
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\d{2}/\d{2}/\d{4}"
    ).unwrap();

    // Energy block value, the whole trimmed line (e.g. 123,45)
    pub static ref ENERGY_VALUE: Regex = Regex::new(
        r"^\d+,\d{2}$"
    ).unwrap();

    // Variable charge value, anywhere in the line (e.g. 45,6)
    pub static ref VARIABLE_CHARGE_VALUE: Regex = Regex::new(
        r"\d+,\d+"
    ).unwrap();

    // Account identifier with the default 6..=10 digit range
    pub static ref ACCOUNT_ID: Regex = Regex::new(
        r"^\d{6,10}$"
    ).unwrap();
}

/// Pattern of a bare digit run of `min..=max` digits and nothing else.
pub fn bare_digits(min: usize, max: usize) -> Result<Regex> {
    if min == 0 || min > max {
        return Err(EcobillError::Config(format!(
            "account digit range {}..={} is empty",
            min, max
        )));
    }
    Regex::new(&format!(r"^\d{{{},{}}}$", min, max)).map_err(|e| {
        EcobillError::Config(format!("account digit range {}..={}: {}", min, max, e))
    })
}

/// Replace the locale decimal comma with a period.
pub fn normalize_decimal(value: &str) -> String {
    value.replace(',', ".")
}
