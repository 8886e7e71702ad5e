//! QR text extraction from raster images (PNG, JPEG).

use anyhow::{Context, Result, bail};
use certproof_core::{Error, ProofExtractor, looks_like_pdf};

/// Decode the first readable QR code in an image.
#[tracing::instrument(skip(data), fields(data_len = data.len()))]
pub fn scan_qr_text(data: &[u8]) -> Result<String> {
    if looks_like_pdf(data) {
        bail!("PDF pages are not rasterized; submit a PDF with an embedded proof or an image of the QR code");
    }

    let image = image::load_from_memory(data)
        .context("Failed to decode image")?
        .to_luma8();
    let (width, height) = image.dimensions();
    tracing::debug!(width, height, "Scanning image for QR codes");

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            image.get_pixel(x as u32, y as u32).0[0]
        });

    let grids = prepared.detect_grids();
    if grids.is_empty() {
        bail!("QR code could not be found in image");
    }

    let mut last_error = None;
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => return Ok(content),
            Err(e) => {
                tracing::debug!(error = %e, "QR grid could not be decoded");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) => bail!("QR code could not be decoded: {}", e),
        None => bail!("QR code could not be found in image"),
    }
}

/// Extracts proof text from an image of the certificate's QR code.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrImageExtractor;

impl ProofExtractor for QrImageExtractor {
    fn name(&self) -> &'static str {
        "qr-image"
    }

    fn extract(&self, data: &[u8]) -> certproof_core::Result<String> {
        scan_qr_text(data).map_err(|e| Error::Extraction(format!("{:#}", e)))
    }
}
