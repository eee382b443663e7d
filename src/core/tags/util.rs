//! core/tags/util.rs
//! Small parsing helpers shared by tag reading/writing.

use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::core::types::TrackMetadata;

/// Parse strings like:
/// - "3" -> (Some(3), None)
/// - "3/12" -> (Some(3), Some(12))
pub(crate) fn parse_slash_pair_u32(s: Option<&str>) -> (Option<u32>, Option<u32>) {
    let Some(s) = s else { return (None, None) };
    let s = s.trim();
    if s.is_empty() {
        return (None, None);
    }

    let mut parts = s.split('/');
    let a = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let b = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    (a, b)
}

/// Parse common "boolean-ish" tag values.
/// Accepts: "1", "0", "true", "false", "yes", "no", "y", "n"
pub(crate) fn parse_boolish(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Leading year of a date string ("1998", "1998-04-01", "1998/04").
pub(crate) fn parse_year_prefix(s: &str) -> Option<i32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

/// Parse a variable-length big-endian integer into u64 (ID3 PCNT format).
pub(crate) fn parse_be_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }

    // If it's longer than 8 bytes, keep the least-significant 8.
    let bytes = if bytes.len() > 8 {
        &bytes[bytes.len() - 8..]
    } else {
        bytes
    };

    let mut v: u64 = 0;
    for &b in bytes {
        v = (v << 8) | (b as u64);
    }
    Some(v)
}

/// POPM byte (0..=255) -> 0.0..=1.0
pub(crate) fn popm_to_rating(byte: u8) -> f32 {
    byte as f32 / 255.0
}

/// 0.0..=1.0 -> POPM byte. Out-of-range input is clamped.
pub(crate) fn rating_to_popm(rating: f32) -> u8 {
    if rating.is_nan() {
        return 0;
    }
    (rating.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Best-effort MIME type from the first bytes of an image.
pub(crate) fn sniff_image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.starts_with(b"BM") {
        "image/bmp"
    } else {
        // APIC needs *something*; most players assume JPEG anyway.
        "image/jpeg"
    }
}

/// Lowercased file extension, if any.
pub(crate) fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Fill filesize + mtime from the filesystem. Silently skips what can't be read.
pub(crate) fn fill_file_stats(path: &Path, out: &mut TrackMetadata) {
    let Ok(meta) = std::fs::metadata(path) else {
        return;
    };

    out.filesize = Some(meta.len());
    out.mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64);
}
