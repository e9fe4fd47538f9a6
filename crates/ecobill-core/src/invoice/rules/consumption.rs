//! Energy consumption extraction.
//!
//! Two strategies, tried in order by the bill extractor:
//! the value block under the active energy marker, then the number on the
//! line after the variable charge row.

use tracing::debug;

use super::patterns::{normalize_decimal, ENERGY_VALUE, VARIABLE_CHARGE_VALUE};
use crate::invoice::{Field, FieldExtractor, Lines};
use crate::models::config::ExtractionConfig;

/// Last `digits,dd` line in a window after the active energy marker.
pub struct EnergyWindowExtractor {
    marker: String,
    window: usize,
}

impl EnergyWindowExtractor {
    pub fn new(marker: impl Into<String>, window: usize) -> Self {
        Self {
            marker: marker.into(),
            window,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.energy_marker.clone(), config.energy_window)
    }
}

impl Default for EnergyWindowExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldExtractor for EnergyWindowExtractor {
    fn field(&self) -> Field {
        Field::Consumption
    }

    fn extract(&self, lines: &Lines<'_>) -> Option<String> {
        let index = lines.position_of(&self.marker)?;

        // Later matches in the window overwrite earlier ones.
        let value = lines
            .following(index, self.window)
            .iter()
            .map(|line| line.trim())
            .filter(|line| ENERGY_VALUE.is_match(line))
            .last()?;

        debug!("energy value {} under marker on line {}", value, index);
        Some(normalize_decimal(value))
    }
}

/// First `digits,digits` on the line after the variable charge row.
pub struct VariableChargeExtractor {
    marker: String,
    unit: String,
}

impl VariableChargeExtractor {
    pub fn new(marker: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            unit: unit.into(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.variable_charge_marker.clone(),
            config.variable_charge_unit.clone(),
        )
    }
}

impl Default for VariableChargeExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldExtractor for VariableChargeExtractor {
    fn field(&self) -> Field {
        Field::Consumption
    }

    fn extract(&self, lines: &Lines<'_>) -> Option<String> {
        let index = lines
            .iter()
            .position(|line| line.contains(&self.marker) && line.contains(&self.unit))?;
        let next = lines.get(index + 1)?;
        let value = VARIABLE_CHARGE_VALUE.find(next)?;

        debug!("variable charge value {} on line {}", value.as_str(), index + 1);
        Some(normalize_decimal(value.as_str()))
    }
}
