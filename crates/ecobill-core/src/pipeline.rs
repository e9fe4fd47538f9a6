//! One batch run: ledger gate, extraction, optional chart crop.

use std::path::PathBuf;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::chart::{save_chart_crop, ChartRegion};
use crate::error::Result;
use crate::invoice::BillExtractor;
use crate::ledger::{filter_new, Ledger};
use crate::models::config::EcobillConfig;
use crate::models::record::{InvoiceRecord, OutputLayout};

/// A document handed over by the acquisition layer.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    /// Link or file name identifying the document.
    pub source_id: String,
    /// Text of all pages, already joined in page order.
    pub text: String,
    /// Rendered first page, used for the chart crop.
    pub page_image: Option<DynamicImage>,
    /// Where to save the chart crop.
    pub chart_path: Option<PathBuf>,
}

impl SourceDocument {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_page_image(mut self, image: DynamicImage, chart_path: impl Into<PathBuf>) -> Self {
        self.page_image = Some(image);
        self.chart_path = Some(chart_path.into());
        self
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// New document; the record is ready to be appended.
    Extracted(InvoiceRecord),
    /// Already in the ledger, nothing extracted.
    Skipped,
    /// No source identifier, nothing extracted.
    Rejected,
}

/// Owns the ledger for one single-threaded run.
pub struct BatchPipeline {
    extractor: BillExtractor,
    region: ChartRegion,
    crop_charts: bool,
    ledger: Ledger,
}

impl BatchPipeline {
    /// Fails on a config that does not pass [`EcobillConfig::validate`].
    pub fn new(config: &EcobillConfig, ledger: Ledger) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: BillExtractor::from_config(&config.extraction)?,
            region: ChartRegion::from_config(&config.chart),
            crop_charts: config.chart.enabled && config.output.layout == OutputLayout::Extended,
            ledger,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn is_known(&self, source_id: &str) -> bool {
        self.ledger.contains(source_id)
    }

    /// Candidates worth extracting, in input order.
    pub fn pending<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Vec<&'a str> {
        filter_new(candidates, self.ledger.ids())
    }

    /// Process one document and record its identifier in the ledger.
    pub fn process(&mut self, doc: &SourceDocument) -> Outcome {
        if doc.source_id.is_empty() {
            warn!("document without source identifier rejected");
            return Outcome::Rejected;
        }
        if self.ledger.contains(&doc.source_id) {
            info!("skipping {}: already captured", doc.source_id);
            return Outcome::Skipped;
        }

        let mut record = self.extractor.extract_record(&doc.source_id, &doc.text);
        if self.crop_charts {
            record.chart_image_path = self.crop_chart(doc);
        }

        self.ledger.insert(doc.source_id.clone());
        info!("extracted {}", doc.source_id);
        Outcome::Extracted(record)
    }

    fn crop_chart(&self, doc: &SourceDocument) -> Option<String> {
        let (Some(page), Some(path)) = (&doc.page_image, &doc.chart_path) else {
            debug!("no page image for {}, chart skipped", doc.source_id);
            return None;
        };
        save_chart_crop(page, &self.region, path).then(|| path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use pretty_assertions::assert_eq;

    const BILL: &str = "1234567\nDomicilio suministro\nCalle 1\nCiudad\nProvincia\n01/01/2024 15/02/2024\nEnergía Activa\n56,78";

    fn extended_config() -> EcobillConfig {
        let mut config = EcobillConfig::default();
        config.output.layout = OutputLayout::Extended;
        config.chart.enabled = true;
        config
    }

    #[test]
    fn test_new_document_is_extracted_once() {
        let mut pipeline = BatchPipeline::new(&EcobillConfig::default(), Ledger::new()).unwrap();
        let doc = SourceDocument::new("a.pdf", BILL);

        let Outcome::Extracted(record) = pipeline.process(&doc) else {
            panic!("expected extraction");
        };
        assert_eq!(record.consumption_kwh, "56.78");
        assert_eq!(record.reading_date, "15/02/2024");
        assert!(pipeline.is_known("a.pdf"));

        // Same identifier later in the run.
        assert_eq!(pipeline.process(&doc), Outcome::Skipped);
    }

    #[test]
    fn test_known_document_is_skipped() {
        let mut pipeline =
            BatchPipeline::new(&EcobillConfig::default(), Ledger::from_ids(["a.pdf"])).unwrap();
        assert_eq!(pipeline.process(&SourceDocument::new("a.pdf", BILL)), Outcome::Skipped);
        assert_eq!(pipeline.into_ledger().len(), 1);
    }

    #[test]
    fn test_empty_source_id_is_rejected() {
        let mut pipeline = BatchPipeline::new(&EcobillConfig::default(), Ledger::new()).unwrap();
        assert_eq!(pipeline.process(&SourceDocument::new("", BILL)), Outcome::Rejected);
        assert!(pipeline.ledger().is_empty());
    }

    #[test]
    fn test_unusable_config_is_an_error() {
        let config: EcobillConfig = serde_json::from_str(
            r#"{"extraction": {"account_min_digits": 10, "account_max_digits": 6}}"#,
        )
        .unwrap();
        assert!(matches!(
            BatchPipeline::new(&config, Ledger::new()),
            Err(crate::error::EcobillError::Config(_))
        ));

        let mut config = EcobillConfig::default();
        config.extraction.account_max_digits = 100_000;
        assert!(BatchPipeline::new(&config, Ledger::new()).is_err());
    }

    #[test]
    fn test_pending_keeps_order() {
        let pipeline =
            BatchPipeline::new(&EcobillConfig::default(), Ledger::from_ids(["a", "b"])).unwrap();
        assert_eq!(pipeline.pending(&["a", "c", "c", "b", "d"]), vec!["c", "c", "d"]);
    }

    #[test]
    fn test_chart_crop_in_extended_layout() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("a_chart.png");
        let page = DynamicImage::ImageRgb8(RgbImage::new(1000, 1000));
        let doc = SourceDocument::new("a.pdf", BILL).with_page_image(page, &chart_path);

        let mut pipeline = BatchPipeline::new(&extended_config(), Ledger::new()).unwrap();
        let Outcome::Extracted(record) = pipeline.process(&doc) else {
            panic!("expected extraction");
        };
        assert_eq!(record.chart_image_path, Some(chart_path.display().to_string()));
        assert!(chart_path.exists());
    }

    #[test]
    fn test_chart_failure_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let page = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        let doc = SourceDocument::new("a.pdf", BILL).with_page_image(page, dir.path().join("a.png"));

        let mut pipeline = BatchPipeline::new(&extended_config(), Ledger::new()).unwrap();
        let Outcome::Extracted(record) = pipeline.process(&doc) else {
            panic!("expected extraction");
        };
        assert!(record.chart_image_path.is_none());
        assert_eq!(record.account_id, "1234567");
    }

    #[test]
    fn test_core_layout_never_crops() {
        let dir = tempfile::tempdir().unwrap();
        let chart_path = dir.path().join("a_chart.png");
        let page = DynamicImage::ImageRgb8(RgbImage::new(1000, 1000));
        let doc = SourceDocument::new("a.pdf", BILL).with_page_image(page, &chart_path);

        let mut config = EcobillConfig::default();
        config.chart.enabled = true;
        let mut pipeline = BatchPipeline::new(&config, Ledger::new()).unwrap();
        assert!(matches!(pipeline.process(&doc), Outcome::Extracted(r) if r.chart_image_path.is_none()));
        assert!(!chart_path.exists());
    }
}
