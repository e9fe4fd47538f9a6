//! Configuration structures for the extraction pipeline.
//!
//! Issuer-specific marker strings, crop fractions and column names live here
//! so that bills from another issuer can be handled by swapping a config file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::record::OutputLayout;
use crate::error::{EcobillError, Result};

/// Longest account identifier the extractor accepts.
pub const MAX_ACCOUNT_DIGITS: usize = 32;

/// Main configuration for the ecobill pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcobillConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Chart crop configuration.
    pub chart: ChartConfig,

    /// Record table configuration.
    pub output: OutputConfig,

    /// PDF text configuration.
    pub pdf: PdfConfig,
}

/// Markers and windows used by the field heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Shortest bare digit run accepted as an account identifier.
    pub account_min_digits: usize,

    /// Longest bare digit run accepted as an account identifier.
    pub account_max_digits: usize,

    /// Line marker preceding the supply address.
    pub address_marker: String,

    /// Number of lines after the marker that make up the address.
    pub address_line_count: usize,

    /// Separator between address fragments.
    pub address_separator: String,

    /// Zero-based index of the reading date among all dates in the text.
    pub reading_date_index: usize,

    /// Line marker of the active energy block.
    pub energy_marker: String,

    /// Number of lines scanned after the energy marker.
    pub energy_window: usize,

    /// Line marker of the variable charge row.
    pub variable_charge_marker: String,

    /// Unit that must appear on the variable charge row.
    pub variable_charge_unit: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            account_min_digits: 6,
            account_max_digits: 10,
            address_marker: "Domicilio suministro".to_string(),
            address_line_count: 3,
            address_separator: ", ".to_string(),
            // The first date on these bills is the issue date.
            reading_date_index: 1,
            energy_marker: "Energía Activa".to_string(),
            energy_window: 4,
            variable_charge_marker: "Cargo Variable".to_string(),
            variable_charge_unit: "kWh".to_string(),
        }
    }
}

/// Relative rectangle of the consumption chart on the first page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Crop the chart when a page image is available.
    pub enabled: bool,

    /// Left edge as a fraction of page width.
    pub left: f64,

    /// Right edge as a fraction of page width.
    pub right: f64,

    /// Top edge as a fraction of page height.
    pub top: f64,

    /// Bottom edge as a fraction of page height.
    pub bottom: f64,

    /// Appended to the document stem to name the chart image.
    pub file_suffix: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            left: 0.05,
            right: 0.495,
            top: 0.455,
            bottom: 0.585,
            file_suffix: "_chart.png".to_string(),
        }
    }
}

/// Record table configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Column set of the table.
    pub layout: OutputLayout,

    /// Name of the source identifier column.
    pub source_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            layout: OutputLayout::Core,
            source_column: "link".to_string(),
        }
    }
}

/// PDF text configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Inserted between page texts when joining a document.
    pub page_separator: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_separator: "\n".to_string(),
        }
    }
}

impl EcobillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| EcobillError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| EcobillError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the extractors cannot work with.
    pub fn validate(&self) -> Result<()> {
        let ex = &self.extraction;
        if ex.account_min_digits == 0 || ex.account_min_digits > ex.account_max_digits {
            return Err(EcobillError::Config(format!(
                "account digit range {}..={} is empty",
                ex.account_min_digits, ex.account_max_digits
            )));
        }
        if ex.account_max_digits > MAX_ACCOUNT_DIGITS {
            return Err(EcobillError::Config(format!(
                "account_max_digits {} exceeds {}",
                ex.account_max_digits, MAX_ACCOUNT_DIGITS
            )));
        }
        for (name, marker) in [
            ("address_marker", &ex.address_marker),
            ("energy_marker", &ex.energy_marker),
            ("variable_charge_marker", &ex.variable_charge_marker),
        ] {
            if marker.is_empty() {
                return Err(EcobillError::Config(format!("{} must not be empty", name)));
            }
        }

        let chart = &self.chart;
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_unit(chart.left) && in_unit(chart.right) && in_unit(chart.top) && in_unit(chart.bottom))
            || chart.left >= chart.right
            || chart.top >= chart.bottom
        {
            return Err(EcobillError::Config(format!(
                "chart region left={} right={} top={} bottom={} is not inside the page",
                chart.left, chart.right, chart.top, chart.bottom
            )));
        }

        if self.output.source_column.is_empty() {
            return Err(EcobillError::Config("source_column must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        assert!(EcobillConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EcobillConfig =
            serde_json::from_str(r#"{"output": {"layout": "extended"}}"#).unwrap();
        assert_eq!(config.output.layout, OutputLayout::Extended);
        assert_eq!(config.output.source_column, "link");
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_rejects_inverted_chart_region() {
        let mut config = EcobillConfig::default();
        config.chart.left = 0.6;
        assert!(matches!(config.validate(), Err(EcobillError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_digit_range() {
        let mut config = EcobillConfig::default();
        config.extraction.account_min_digits = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_digit_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"extraction": {"account_max_digits": 100000}}"#).unwrap();
        assert!(matches!(EcobillConfig::from_file(&path), Err(EcobillError::Config(_))));

        let mut config = EcobillConfig::default();
        config.extraction.account_max_digits = MAX_ACCOUNT_DIGITS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = EcobillConfig::default();
        config.chart.enabled = true;
        config.save(&path).unwrap();
        assert_eq!(EcobillConfig::from_file(&path).unwrap(), config);
    }
}
