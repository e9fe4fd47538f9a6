//! Bill extractor combining the per-field heuristics.

use std::time::Instant;

use tracing::debug;

use super::rules::{
    AccountIdExtractor, AddressExtractor, EnergyWindowExtractor, ReadingDateExtractor,
    VariableChargeExtractor,
};
use super::{segment_lines, Field, FieldExtractor, Lines};
use crate::error::Result;
use crate::models::config::ExtractionConfig;
use crate::models::record::InvoiceRecord;

type BoxedExtractor = Box<dyn FieldExtractor + Send + Sync>;

/// Ordered list of strategies for one field; the first hit wins.
///
/// New heuristics are appended with [`FallbackChain::push`] without touching
/// the existing ones.
pub struct FallbackChain {
    field: Field,
    strategies: Vec<BoxedExtractor>,
}

impl FallbackChain {
    /// Create an empty chain for `field`.
    pub fn new(field: Field) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy, builder style.
    pub fn with(mut self, strategy: impl FieldExtractor + Send + Sync + 'static) -> Self {
        self.push(strategy);
        self
    }

    /// Append a strategy after the existing ones.
    pub fn push(&mut self, strategy: impl FieldExtractor + Send + Sync + 'static) {
        debug_assert_eq!(strategy.field(), self.field);
        self.strategies.push(Box::new(strategy));
    }

    /// Number of strategies in the chain.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl FieldExtractor for FallbackChain {
    fn field(&self) -> Field {
        self.field
    }

    fn extract(&self, lines: &Lines<'_>) -> Option<String> {
        self.strategies.iter().enumerate().find_map(|(tier, strategy)| {
            let value = strategy.extract(lines).filter(|v| !v.is_empty())?;
            debug!("{} found by strategy {}", self.field, tier + 1);
            Some(value)
        })
    }
}

/// Values of the four fields, empty where extraction missed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub account_id: String,
    pub address: String,
    pub reading_date: String,
    pub consumption_kwh: String,
}

impl ExtractedFields {
    /// Fields that came back empty.
    pub fn missing(&self) -> Vec<Field> {
        [
            (Field::AccountId, &self.account_id),
            (Field::Address, &self.address),
            (Field::ReadingDate, &self.reading_date),
            (Field::Consumption, &self.consumption_kwh),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Runs every field chain over a document.
///
/// Fields are independent: a miss on one never stops the others.
pub struct BillExtractor {
    account_id: FallbackChain,
    address: FallbackChain,
    reading_date: FallbackChain,
    consumption: FallbackChain,
}

impl BillExtractor {
    /// Create an extractor with the default markers.
    pub fn new() -> Self {
        Self::with_account(AccountIdExtractor::default(), &ExtractionConfig::default())
    }

    /// Create an extractor from issuer-specific settings.
    ///
    /// Fails when the account digit range cannot be compiled.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self::with_account(AccountIdExtractor::from_config(config)?, config))
    }

    fn with_account(account: AccountIdExtractor, config: &ExtractionConfig) -> Self {
        Self {
            account_id: FallbackChain::new(Field::AccountId).with(account),
            address: FallbackChain::new(Field::Address).with(AddressExtractor::from_config(config)),
            reading_date: FallbackChain::new(Field::ReadingDate)
                .with(ReadingDateExtractor::from_config(config)),
            consumption: FallbackChain::new(Field::Consumption)
                .with(EnergyWindowExtractor::from_config(config))
                .with(VariableChargeExtractor::from_config(config)),
        }
    }

    /// Mutable access to the chain of one field, to append strategies.
    pub fn chain_mut(&mut self, field: Field) -> &mut FallbackChain {
        match field {
            Field::AccountId => &mut self.account_id,
            Field::Address => &mut self.address,
            Field::ReadingDate => &mut self.reading_date,
            Field::Consumption => &mut self.consumption,
        }
    }

    /// Extract all fields from already segmented lines.
    pub fn extract_lines(&self, lines: &Lines<'_>) -> ExtractedFields {
        let run = |chain: &FallbackChain| chain.extract(lines).unwrap_or_default();
        ExtractedFields {
            account_id: run(&self.account_id),
            address: run(&self.address),
            reading_date: run(&self.reading_date),
            consumption_kwh: run(&self.consumption),
        }
    }

    /// Extract all fields from the concatenated page text of a document.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let start = Instant::now();
        let lines = segment_lines(text);
        let fields = self.extract_lines(&lines);

        debug!(
            "extracted fields from {} lines in {}us, missing {:?}",
            lines.len(),
            start.elapsed().as_micros(),
            fields.missing()
        );
        fields
    }

    /// Extract a full record for `source_id`.
    pub fn extract_record(&self, source_id: &str, text: &str) -> InvoiceRecord {
        assemble_record(source_id, self.extract(text))
    }
}

impl Default for BillExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Combine extracted fields with the document identifier.
///
/// Never fails; a record whose fields are all empty is still valid.
pub fn assemble_record(source_id: impl Into<String>, fields: ExtractedFields) -> InvoiceRecord {
    InvoiceRecord {
        source_id: source_id.into(),
        account_id: fields.account_id,
        address: fields.address,
        reading_date: fields.reading_date,
        consumption_kwh: fields.consumption_kwh,
        chart_image_path: None,
    }
}
