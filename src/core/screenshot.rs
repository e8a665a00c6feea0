use crate::config::toml_config::ScreenshotConfig;
use crate::domain::model::Viewport;
use crate::utils::error::{Result, ScrapeError};
use image::ImageFormat;
use std::io::Cursor;

/// Pixel box cut out of a viewport screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Box from (`left`, `top`) to (`width - right_margin`,
    /// `height - bottom_margin`) of the viewport.
    pub fn inset(viewport: Viewport, margins: &ScreenshotConfig) -> Result<Self> {
        let right = viewport.width.saturating_sub(margins.right_margin);
        let bottom = viewport.height.saturating_sub(margins.bottom_margin);

        if right <= margins.left || bottom <= margins.top {
            return Err(ScrapeError::ConfigError {
                message: format!(
                    "screenshot margins leave no area in a {}x{} viewport",
                    viewport.width, viewport.height
                ),
            });
        }

        Ok(Self {
            x: margins.left,
            y: margins.top,
            width: right - margins.left,
            height: bottom - margins.top,
        })
    }
}

/// Crops a PNG to `rect`, clamped to the image bounds, and re-encodes it.
pub fn crop_png(png: &[u8], rect: CropRect) -> Result<Vec<u8>> {
    let image = image::load_from_memory_with_format(png, ImageFormat::Png)?;

    let x = rect.x.min(image.width());
    let y = rect.y.min(image.height());
    let width = rect.width.min(image.width() - x);
    let height = rect.height.min(image.height() - y);

    let cropped = image.crop_imm(x, y, width, height);

    let mut out = Cursor::new(Vec::new());
    cropped.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
