//! Image encoding: `DynamicImage` → base64 PNG `data:` URI.
//!
//! Page images are embedded inline so each page document stays a single
//! self-contained file. PNG is lossless, which keeps scanned form lines and
//! stamps crisp.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as a `data:image/png;base64,…` URI.
pub fn to_data_uri(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(format!("data:image/png;base64,{b64}"))
}
