//! Media type sniffing and the cache allow-list.
//!
//! The media type of a downloaded document is always derived from its bytes.
//! A `Content-Type` announced by the remote side is never consulted.

use crate::Error;

/// Media types accepted into the cache. Matching is exact and case-sensitive.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/gif", "image/png"];

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Check a media type against the allow-list.
pub fn is_allowed(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// Reject any media type outside the allow-list.
///
/// # Errors
///
/// Returns `Error::MimeRejected` carrying the offending type.
pub fn filter_mime_types(mime: &str) -> Result<(), Error> {
    if is_allowed(mime) { Ok(()) } else { Err(Error::MimeRejected(mime.to_string())) }
}

/// Detect a media type from magic bytes.
///
/// Images are matched on their full signatures; everything unrecognized is
/// `text/plain` when it looks like text and `application/octet-stream`
/// otherwise.
pub fn sniff(bytes: &[u8]) -> &'static str {
    if bytes.is_empty() {
        return "application/x-empty";
    }

    if bytes.starts_with(PNG_SIGNATURE) {
        return "image/png";
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }
    if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        return "image/tiff";
    }
    if bytes.starts_with(b"BM") && bytes.len() >= 14 {
        return "image/bmp";
    }

    match bytes {
        [b'%', b'P', b'D', b'F', ..] => "application/pdf",
        [0x50, 0x4B, 0x03, 0x04, ..] => "application/zip",
        [0x1F, 0x8B, ..] => "application/gzip",
        [b'<', b'?', b'x', b'm', b'l', ..] => "application/xml",
        _ => sniff_text(bytes),
    }
}

fn sniff_text(bytes: &[u8]) -> &'static str {
    let head = &bytes[..bytes.len().min(1024)];

    let looks_like_text = head
        .iter()
        .all(|&b| b.is_ascii_graphic() || b.is_ascii_whitespace() || b >= 0x80);
    if !looks_like_text {
        return "application/octet-stream";
    }

    let trimmed = head.trim_ascii_start();
    let lower: Vec<u8> = trimmed.iter().take(15).map(u8::to_ascii_lowercase).collect();
    if lower.starts_with(b"<!doctype html") || lower.starts_with(b"<html") {
        "text/html"
    } else if trimmed.starts_with(b"{") || trimmed.starts_with(b"[") {
        "application/json"
    } else {
        "text/plain"
    }
}
