//! Consumption chart crop from a rendered first page.
//!
//! Best effort side output: the chart is assumed to sit at a fixed relative
//! position on the page and its content is never checked.

use std::fs;
use std::path::Path;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

use crate::error::{ChartError, Result};
use crate::models::config::ChartConfig;

/// Chart rectangle as fractions of page width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRegion {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for ChartRegion {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

impl ChartRegion {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            left: config.left,
            right: config.right,
            top: config.top,
            bottom: config.bottom,
        }
    }

    /// Pixel rectangle `(x, y, width, height)` for a page of the given size.
    pub fn pixel_rect(&self, width: u32, height: u32) -> std::result::Result<(u32, u32, u32, u32), ChartError> {
        let unit = 0.0..=1.0;
        if ![self.left, self.right, self.top, self.bottom]
            .iter()
            .all(|v| unit.contains(v))
            || self.left >= self.right
            || self.top >= self.bottom
        {
            return Err(ChartError::InvalidRegion(format!("{:?}", self)));
        }

        let x0 = (self.left * f64::from(width)) as u32;
        let x1 = (self.right * f64::from(width)) as u32;
        let y0 = (self.top * f64::from(height)) as u32;
        let y1 = (self.bottom * f64::from(height)) as u32;

        if x1 <= x0 || y1 <= y0 {
            return Err(ChartError::EmptyCrop { width, height });
        }
        Ok((x0, y0, x1 - x0, y1 - y0))
    }
}

/// Cut the chart rectangle out of a page image.
pub fn crop_chart(page: &DynamicImage, region: &ChartRegion) -> std::result::Result<DynamicImage, ChartError> {
    let (width, height) = page.dimensions();
    let (x, y, w, h) = region.pixel_rect(width, height)?;
    debug!("cropping chart {}x{} at ({}, {}) from {}x{} page", w, h, x, y, width, height);
    Ok(page.crop_imm(x, y, w, h))
}

fn crop_and_save(page: &DynamicImage, region: &ChartRegion, out_path: &Path) -> Result<()> {
    let chart = crop_chart(page, region)?;
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    chart.save(out_path)?;
    Ok(())
}

/// Crop the chart and save it to `out_path`.
///
/// Never fails the caller: any error is logged and reported as `false`.
pub fn save_chart_crop(page: &DynamicImage, region: &ChartRegion, out_path: &Path) -> bool {
    match crop_and_save(page, region, out_path) {
        Ok(()) => {
            debug!("saved chart to {}", out_path.display());
            true
        }
        Err(e) => {
            warn!("could not save chart to {}: {}", out_path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_default_region_pixels() {
        let rect = ChartRegion::default().pixel_rect(1000, 2000).unwrap();
        assert_eq!(rect, (50, 910, 445, 260));
    }

    #[test]
    fn test_crop_dimensions() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])));
        let chart = crop_chart(&page, &ChartRegion::default()).unwrap();
        assert_eq!(chart.dimensions(), (89, 13));
    }

    #[test]
    fn test_tiny_page_is_empty_crop() {
        let page = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(matches!(
            crop_chart(&page, &ChartRegion::default()),
            Err(ChartError::EmptyCrop { .. })
        ));
    }

    #[test]
    fn test_save_chart_crop() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("charts").join("a_chart.png");
        let page = DynamicImage::ImageRgb8(RgbImage::new(1000, 1000));

        assert!(save_chart_crop(&page, &ChartRegion::default(), &out));
        let saved = image::open(&out).unwrap();
        assert_eq!(saved.dimensions(), (445, 130));
    }

    #[test]
    fn test_failures_become_false() {
        let dir = tempfile::tempdir().unwrap();
        let page = DynamicImage::ImageRgb8(RgbImage::new(400, 400));

        let inverted = ChartRegion { left: 0.5, right: 0.1, ..ChartRegion::default() };
        assert!(!save_chart_crop(&page, &inverted, &dir.path().join("a.png")));

        // No encoder for this extension.
        assert!(!save_chart_crop(&page, &ChartRegion::default(), &dir.path().join("a.unknown")));
    }
}
