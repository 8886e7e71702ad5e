//! QR backend: renders proof text as a QR image and reads it back from raster images.

pub mod render;
pub mod scan;

pub use render::{RenderOptions, ensure_fits, render_data_url, render_png};
pub use scan::{QrImageExtractor, scan_qr_text};
