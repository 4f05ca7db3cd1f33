//! PNG data URIs for rasterized pages.

use crate::{EngineError, RgbaImage};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use std::io::Cursor;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encodes an RGBA surface as a `data:image/png;base64,...` URI.
pub fn encode_png_data_uri(image: &RgbaImage) -> Result<String, EngineError> {
    let mut png_bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|err| EngineError::Encode(format!("PNG encoding failed: {err}")))?;

    let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png_bytes.len() * 4 / 3 + 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    STANDARD.encode_string(&png_bytes, &mut uri);

    Ok(uri)
}

/// Decodes the payload of a base64 data URI back into raw bytes.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, EngineError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| EngineError::Encode("data URI has no payload".to_owned()))?;

    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(EngineError::Encode(format!("not a base64 data URI: {header}")));
    }

    STANDARD.decode(payload).map_err(|err| EngineError::Encode(format!("invalid base64: {err}")))
}
