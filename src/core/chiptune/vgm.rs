//! Video Game Music logs (`.vgm`) and their GD3 tag.

use crate::core::tags::util::parse_year_prefix;
use crate::core::types::TrackMetadata;
use crate::error::{TagError, TagResult};

pub(crate) const MAGIC: &[u8] = b"Vgm ";
const GD3_MAGIC: &[u8] = b"Gd3 ";

/// VGM sample counts are always in 44.1 kHz units.
pub(crate) const SAMPLE_RATE: u32 = 44_100;

const TOTAL_SAMPLES: usize = 0x18;
/// GD3 offset field; the value is relative to this position.
const GD3_OFFSET: usize = 0x14;
const MIN_HEADER: usize = 0x40;

/// GD3 string order.
#[derive(Debug, Default)]
struct Gd3 {
    track_en: String,
    track_jp: String,
    game_en: String,
    game_jp: String,
    system_en: String,
    system_jp: String,
    author_en: String,
    author_jp: String,
    release_date: String,
    ripper: String,
    notes: String,
}

pub(crate) fn has_magic(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Parse the VGM header and its GD3 tag (if any).
pub(crate) fn parse(data: &[u8]) -> TagResult<TrackMetadata> {
    if !has_magic(data) {
        return Err(TagError::malformed("VGM", "missing 'Vgm ' signature"));
    }
    if data.len() < MIN_HEADER {
        return Err(TagError::malformed(
            "VGM",
            format!("header is {} bytes, need {MIN_HEADER}", data.len()),
        ));
    }

    let mut m = TrackMetadata {
        filetype: Some("vgm".to_string()),
        sample_rate: Some(SAMPLE_RATE),
        channels: Some(2),
        ..Default::default()
    };

    let samples = read_u32(data, TOTAL_SAMPLES).unwrap_or(0) as u64;
    if samples > 0 {
        m.duration_ms = Some(samples * 1000 / SAMPLE_RATE as u64);
    }

    let gd3_rel = read_u32(data, GD3_OFFSET).unwrap_or(0) as usize;
    if gd3_rel == 0 {
        return Ok(m);
    }

    let gd3 = parse_gd3(data, GD3_OFFSET + gd3_rel)?;

    m.title = prefer(&gd3.track_en, &gd3.track_jp);
    m.album = prefer(&gd3.game_en, &gd3.game_jp);
    m.artist = prefer(&gd3.author_en, &gd3.author_jp);
    m.comment = prefer(&gd3.notes, "");
    if let Some(date) = prefer(&gd3.release_date, "") {
        m.year = parse_year_prefix(&date);
        m.date = Some(date);
    }
    if let Some(system) = prefer(&gd3.system_en, &gd3.system_jp) {
        m.user_text.insert("SYSTEM".to_string(), system);
    }
    if let Some(ripper) = prefer(&gd3.ripper, "") {
        m.user_text.insert("RIPPER".to_string(), ripper);
    }

    Ok(m)
}

fn parse_gd3(data: &[u8], at: usize) -> TagResult<Gd3> {
    let header = data
        .get(at..at + 12)
        .ok_or_else(|| TagError::malformed("VGM", format!("GD3 offset {at:#x} past end of file")))?;
    if !header.starts_with(GD3_MAGIC) {
        return Err(TagError::malformed("VGM", "GD3 block has no 'Gd3 ' signature"));
    }

    let len = read_u32(data, at + 8).unwrap_or(0) as usize;
    let start = at + 12;
    let end = (start + len).min(data.len());

    let mut strings = utf16_strings(&data[start..end]).into_iter();
    let mut next = || strings.next().unwrap_or_default();

    Ok(Gd3 {
        track_en: next(),
        track_jp: next(),
        game_en: next(),
        game_jp: next(),
        system_en: next(),
        system_jp: next(),
        author_en: next(),
        author_jp: next(),
        release_date: next(),
        ripper: next(),
        notes: next(),
    })
}

/// Split a run of NUL-terminated UTF-16LE strings.
fn utf16_strings(bytes: &[u8]) -> Vec<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    units
        .split(|&u| u == 0)
        .map(String::from_utf16_lossy)
        .collect()
}

fn prefer(primary: &str, secondary: &str) -> Option<String> {
    [primary, secondary]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let b = data.get(at..at + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn utf16z(s: &str) -> Vec<u8> {
        let mut out: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
        out.extend_from_slice(&[0, 0]);
        out
    }

    /// Minimal VGM: 0x40-byte header, no data, GD3 right after.
    pub(crate) fn tagged_vgm() -> Vec<u8> {
        let mut data = vec![0u8; MIN_HEADER];
        data[..4].copy_from_slice(MAGIC);
        data[0x08..0x0C].copy_from_slice(&0x0000_0150u32.to_le_bytes());
        data[TOTAL_SAMPLES..TOTAL_SAMPLES + 4].copy_from_slice(&(44_100u32 * 95).to_le_bytes());
        let gd3_rel = (MIN_HEADER - GD3_OFFSET) as u32;
        data[GD3_OFFSET..GD3_OFFSET + 4].copy_from_slice(&gd3_rel.to_le_bytes());

        let mut body = Vec::new();
        for s in [
            "Green Hill Zone",
            "",
            "Sonic the Hedgehog",
            "",
            "Sega Mega Drive",
            "",
            "",
            "Masato Nakamura",
            "1991/06/23",
            "someone",
            "loops twice",
        ] {
            body.extend(utf16z(s));
        }

        data.extend_from_slice(GD3_MAGIC);
        data.extend_from_slice(&0x0000_0100u32.to_le_bytes());
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend(body);
        data
    }

    #[test]
    fn reads_gd3_fields() {
        let m = parse(&tagged_vgm()).unwrap();
        assert_eq!(m.title.as_deref(), Some("Green Hill Zone"));
        assert_eq!(m.album.as_deref(), Some("Sonic the Hedgehog"));
        // English author is empty, so the Japanese one is used.
        assert_eq!(m.artist.as_deref(), Some("Masato Nakamura"));
        assert_eq!(m.year, Some(1991));
        assert_eq!(m.comment.as_deref(), Some("loops twice"));
        assert_eq!(m.user_text["SYSTEM"], "Sega Mega Drive");
        assert_eq!(m.user_text["RIPPER"], "someone");
        assert_eq!(m.duration_ms, Some(95_000));
    }

    #[test]
    fn no_gd3_is_fine() {
        let mut data = vec![0u8; MIN_HEADER];
        data[..4].copy_from_slice(MAGIC);
        let m = parse(&data).unwrap();
        assert!(m.title.is_none());
        assert!(m.duration_ms.is_none());
        assert_eq!(m.sample_rate, Some(44_100));
    }

    #[test]
    fn dangling_gd3_offset_is_malformed() {
        let mut data = vec![0u8; MIN_HEADER];
        data[..4].copy_from_slice(MAGIC);
        data[GD3_OFFSET..GD3_OFFSET + 4].copy_from_slice(&0x1000u32.to_le_bytes());
        assert!(matches!(parse(&data), Err(TagError::Malformed { .. })));
    }
}
