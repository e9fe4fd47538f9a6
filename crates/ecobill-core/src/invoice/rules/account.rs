//! Account identifier (NIC) extraction.

use regex::Regex;
use tracing::debug;

use super::patterns::{bare_digits, ACCOUNT_ID};
use crate::error::Result;
use crate::invoice::{Field, FieldExtractor, Lines};
use crate::models::config::ExtractionConfig;

/// First line consisting only of a bare digit run.
///
/// Page numbers and amounts are shorter or carry separators, so the first
/// bare run of account length is taken as the identifier.
pub struct AccountIdExtractor {
    pattern: Regex,
}

impl AccountIdExtractor {
    /// Fails when `min_digits..=max_digits` cannot be turned into a pattern.
    pub fn new(min_digits: usize, max_digits: usize) -> Result<Self> {
        Ok(Self {
            pattern: bare_digits(min_digits, max_digits)?,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Self::new(config.account_min_digits, config.account_max_digits)
    }
}

impl Default for AccountIdExtractor {
    fn default() -> Self {
        Self {
            pattern: ACCOUNT_ID.clone(),
        }
    }
}

impl FieldExtractor for AccountIdExtractor {
    fn field(&self) -> Field {
        Field::AccountId
    }

    fn extract(&self, lines: &Lines<'_>) -> Option<String> {
        let (index, value) = lines
            .iter()
            .map(str::trim)
            .enumerate()
            .find(|(_, line)| self.pattern.is_match(line))?;
        debug!("account id found on line {}", index);
        Some(value.to_string())
    }
}
