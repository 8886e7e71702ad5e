//! QR rendering.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Options for QR rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Minimum width and height of the image in pixels.
    pub min_dimension: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { min_dimension: 400 }
    }
}

fn encode(text: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H)
        .map_err(|e| anyhow!("Proof text does not fit in a QR code: {}", e))
}

/// Fails when `text` is too long for a QR code at error correction level H.
pub fn ensure_fits(text: &str) -> Result<()> {
    encode(text).map(|_| ())
}

/// Render text as a PNG QR code with high error correction.
#[tracing::instrument(skip(text, options), fields(text_len = text.len()))]
pub fn render_png(text: &str, options: &RenderOptions) -> Result<Vec<u8>> {
    let code = encode(text)?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(options.min_dimension, options.min_dimension)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode QR code as PNG")?;
    tracing::debug!(png_len = png.len(), "Rendered QR code");
    Ok(png)
}

/// Render text as a `data:image/png;base64,...` URL.
pub fn render_data_url(text: &str, options: &RenderOptions) -> Result<String> {
    let png = render_png(text, options)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}
