//! Image payload helpers: MIME sniffing and `data:` URL rendering.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Detects common image formats from their magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// Renders `bytes` as a self-contained URL usable as an `<img src>`.
pub fn data_url(bytes: &[u8]) -> String {
    let mime = sniff_image_mime(bytes).unwrap_or(FALLBACK_MIME);
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
