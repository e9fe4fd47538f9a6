//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod ledger;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::DynamicImage;
use tracing::{debug, warn};

use ecobill_core::models::config::EcobillConfig;
use ecobill_core::pdf::{PdfExtractor, PdfProcessor};

/// Load the config file given with `--config`, or the user config, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EcobillConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let default = config::default_config_path();
            if !default.exists() {
                return Ok(EcobillConfig::default());
            }
            default
        }
    };
    EcobillConfig::from_file(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Source identifier of a bill file: its file name.
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A bill loaded from disk.
pub struct LoadedBill {
    pub text: String,
    pub page_image: Option<DynamicImage>,
}

/// Read a PDF, or a text file holding already extracted page text.
pub fn load_bill(path: &Path, config: &EcobillConfig, want_image: bool) -> anyhow::Result<LoadedBill> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::new();
            extractor.load(&data)?;

            let text = extractor.extract_text(&config.pdf.page_separator)?;
            if text.trim().is_empty() {
                debug!("No text extracted from {}", path.display());
            }

            let page_image = if want_image {
                logged_page_image(extractor.first_page_image(), path)
            } else {
                None
            };
            Ok(LoadedBill { text, page_image })
        }
        "txt" => Ok(LoadedBill {
            text: fs::read_to_string(path)?,
            page_image: None,
        }),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Page image of a bill, with a failed lookup logged and treated as none.
fn logged_page_image(
    image: ecobill_core::pdf::Result<Option<DynamicImage>>,
    path: &Path,
) -> Option<DynamicImage> {
    image
        .map_err(|e| warn!("No page image in {}: {}", path.display(), e))
        .ok()
        .flatten()
}

/// Open a pre-rendered page image.
pub fn open_page_image(path: &Path) -> anyhow::Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to open page image {}", path.display()))
}

/// Chart image path for a bill: `<dir>/<stem><suffix>`.
pub fn chart_path(dir: &Path, bill: &Path, suffix: &str) -> PathBuf {
    let stem = bill
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bill".to_string());
    dir.join(format!("{}{}", stem, suffix))
}
