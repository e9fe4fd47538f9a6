//! Supply address extraction.

use tracing::debug;

use crate::invoice::{Field, FieldExtractor, Lines};
use crate::models::config::ExtractionConfig;

/// Lines following the first address marker, trimmed and joined.
pub struct AddressExtractor {
    marker: String,
    line_count: usize,
    separator: String,
}

impl AddressExtractor {
    pub fn new(marker: impl Into<String>, line_count: usize, separator: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            line_count,
            separator: separator.into(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.address_marker.clone(),
            config.address_line_count,
            config.address_separator.clone(),
        )
    }
}

impl Default for AddressExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldExtractor for AddressExtractor {
    fn field(&self) -> Field {
        Field::Address
    }

    fn extract(&self, lines: &Lines<'_>) -> Option<String> {
        let index = lines.position_of(&self.marker)?;
        let parts = lines.following(index, self.line_count);

        // A truncated block is a miss, not a partial address.
        if parts.len() < self.line_count {
            debug!("address marker on line {} has only {} lines after it", index, parts.len());
            return None;
        }

        let address = parts
            .iter()
            .map(|part| part.trim())
            .collect::<Vec<_>>()
            .join(&self.separator);
        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::segment_lines;

    #[test]
    fn test_extract_address() {
        let lines = segment_lines("Domicilio suministro\nCalle 1\nCiudad\nProvincia");
        assert_eq!(
            AddressExtractor::default().extract(&lines),
            Some("Calle 1, Ciudad, Provincia".to_string())
        );
    }

    #[test]
    fn test_marker_inside_line_and_trimmed_parts() {
        let text = "Datos - Domicilio suministro:\n  Av. Colón 1234 \nCórdoba\n X5000 \notra";
        let lines = segment_lines(text);
        assert_eq!(
            AddressExtractor::default().extract(&lines),
            Some("Av. Colón 1234, Córdoba, X5000".to_string())
        );
    }

    #[test]
    fn test_only_first_marker_is_used() {
        let text = "Domicilio suministro\na\nb\nc\nDomicilio suministro\nx\ny\nz";
        let lines = segment_lines(text);
        assert_eq!(AddressExtractor::default().extract(&lines), Some("a, b, c".to_string()));
    }

    #[test]
    fn test_truncated_block_is_a_miss() {
        let lines = segment_lines("Domicilio suministro\nCalle 1\nCiudad");
        assert_eq!(AddressExtractor::default().extract(&lines), None);
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let lines = segment_lines("domicilio suministro\na\nb\nc");
        assert_eq!(AddressExtractor::default().extract(&lines), None);
    }
}
