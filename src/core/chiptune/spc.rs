//! SNES SPC700 dumps (`.spc`) and their ID666 tag.
//!
//! The tag lives in the fixed 256-byte header. It comes in two layouts
//! ("text" and "binary") that differ from offset 0x9E on; nothing in the
//! file says which one was used, so we guess from the bytes.

use crate::core::tags::util::parse_year_prefix;
use crate::core::types::TrackMetadata;
use crate::error::{TagError, TagResult};

use super::fixed_text;

pub(crate) const MAGIC: &[u8] = b"SNES-SPC700 Sound File Data";

/// Bytes we need to see to read the tag.
pub(crate) const HEADER_LEN: usize = 0x100;

/// The S-DSP always runs at 32 kHz.
pub(crate) const SAMPLE_RATE: u32 = 32_000;

const HAS_ID666: usize = 0x23;
const ID666_PRESENT: u8 = 26;

const SONG_TITLE: (usize, usize) = (0x2E, 32);
const GAME_TITLE: (usize, usize) = (0x4E, 32);
const DUMPER: (usize, usize) = (0x6E, 16);
const COMMENTS: (usize, usize) = (0x7E, 32);

// Text layout
const TEXT_DATE: (usize, usize) = (0x9E, 11);
const TEXT_SECONDS: (usize, usize) = (0xA9, 3);
const TEXT_FADE_MS: (usize, usize) = (0xAC, 5);
const TEXT_ARTIST: (usize, usize) = (0xB1, 32);

// Binary layout
const BIN_DAY: usize = 0x9E;
const BIN_MONTH: usize = 0x9F;
const BIN_YEAR: usize = 0xA0;
const BIN_SECONDS: usize = 0xA9;
const BIN_FADE_MS: usize = 0xAC;
const BIN_ARTIST: (usize, usize) = (0xB0, 32);

pub(crate) fn has_magic(header: &[u8]) -> bool {
    header.starts_with(MAGIC)
}

/// Parse the ID666 tag out of an SPC header.
///
/// A header without the "tag present" marker is valid and yields a
/// record with only the stream properties.
pub(crate) fn parse(header: &[u8]) -> TagResult<TrackMetadata> {
    if !has_magic(header) {
        return Err(TagError::malformed("SPC", "missing SNES-SPC700 signature"));
    }
    if header.len() < HEADER_LEN {
        return Err(TagError::malformed(
            "SPC",
            format!("header is {} bytes, need {HEADER_LEN}", header.len()),
        ));
    }

    let mut m = TrackMetadata {
        filetype: Some("spc".to_string()),
        sample_rate: Some(SAMPLE_RATE),
        channels: Some(2),
        ..Default::default()
    };

    if header[HAS_ID666] != ID666_PRESENT {
        return Ok(m);
    }

    m.title = fixed_text(header, SONG_TITLE);
    m.album = fixed_text(header, GAME_TITLE);
    m.comment = fixed_text(header, COMMENTS);
    if let Some(dumper) = fixed_text(header, DUMPER) {
        m.user_text.insert("DUMPER".to_string(), dumper);
    }

    let (date, seconds, fade_ms, artist) = if is_text_layout(header) {
        (
            fixed_text(header, TEXT_DATE),
            fixed_text(header, TEXT_SECONDS).and_then(|s| s.parse::<u64>().ok()),
            fixed_text(header, TEXT_FADE_MS).and_then(|s| s.parse::<u64>().ok()),
            fixed_text(header, TEXT_ARTIST),
        )
    } else {
        (
            binary_date(header),
            Some(le_u24(&header[BIN_SECONDS..BIN_SECONDS + 3]) as u64),
            Some(le_u32(&header[BIN_FADE_MS..BIN_FADE_MS + 4]) as u64),
            fixed_text(header, BIN_ARTIST),
        )
    };

    m.artist = artist;
    // Dates are "MM/DD/YYYY" in practice; the year is whatever ends it.
    m.year = date.as_deref().and_then(year_from_dump_date);
    m.date = date;

    match (seconds, fade_ms) {
        (Some(0), Some(0) | None) | (None, _) => {}
        (Some(s), fade) => m.duration_ms = Some(s * 1000 + fade.unwrap_or(0)),
    }

    Ok(m)
}

/// Text layout keeps only digits, slashes and padding in the
/// date/length block; the binary one stores raw integers there.
fn is_text_layout(header: &[u8]) -> bool {
    let lengths = &header[TEXT_SECONDS.0..TEXT_ARTIST.0];
    let lengths_ok = lengths
        .iter()
        .all(|&b| b == 0 || b == b' ' || b.is_ascii_digit());

    let date = &header[TEXT_DATE.0..TEXT_DATE.0 + TEXT_DATE.1];
    let date_ok = date
        .iter()
        .all(|&b| b == 0 || b.is_ascii_digit() || b == b'/' || b == b'-' || b == b' ');

    lengths_ok && date_ok
}

fn binary_date(header: &[u8]) -> Option<String> {
    let day = header[BIN_DAY];
    let month = header[BIN_MONTH];
    let year = u16::from_le_bytes([header[BIN_YEAR], header[BIN_YEAR + 1]]);
    if day == 0 || month == 0 || year == 0 || day > 31 || month > 12 {
        return None;
    }
    Some(format!("{month:02}/{day:02}/{year:04}"))
}

fn year_from_dump_date(date: &str) -> Option<i32> {
    let last = date.rsplit(['/', '-']).next()?;
    parse_year_prefix(last).or_else(|| parse_year_prefix(date))
}

fn le_u24(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], 0])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
