//! core/tags/read.rs
//! Read ID3 frames from an MP3 and convert them into a partial `TrackMetadata`.
//!
//! Only frames that are actually present become `Some`, so the result can be
//! merged on top of whatever the container probe already found.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use id3::frame::Content;
use id3::{Tag, TagLike};

use crate::core::types::TrackMetadata;
use crate::error::TagResult;

use super::util::{parse_be_u64, parse_boolish, parse_slash_pair_u32, popm_to_rating};

/// Read the ID3v2 tag at `path`.
///
/// A file without a tag is not an error: it yields an empty record.
pub(crate) fn read_id3(path: &Path) -> TagResult<TrackMetadata> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(build_from_tag(&tag)),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(TrackMetadata::default()),
        Err(e) => Err(e.into()),
    }
}

fn build_from_tag(tag: &Tag) -> TrackMetadata {
    // Pull TRCK / TPOS string values so we can parse totals (e.g. "3/12").
    let (track_no_from_text, track_total) =
        parse_slash_pair_u32(text_frame(tag, "TRCK").as_deref());
    let (disc_no_from_text, disc_total) = parse_slash_pair_u32(text_frame(tag, "TPOS").as_deref());

    let artwork_count = tag
        .frames()
        .filter(|f| f.id() == "APIC" || f.id() == "PIC")
        .count();

    let user_text = collect_user_text(tag);

    // Compilation flag is messy in real libraries.
    let compilation = text_frame(tag, "TCMP")
        .and_then(|s| parse_boolish(&s))
        .or_else(|| user_text.get("COMPILATION").and_then(|s| parse_boolish(s)));

    // POPM is common (iTunes etc), PCNT exists too.
    let (rating, popm_count) = popm_rating_and_count(tag);
    let play_count = popm_count
        .or_else(|| pcnt_count(tag))
        .map(|c| c.min(u32::MAX as u64) as u32);

    TrackMetadata {
        title: tag
            .title()
            .map(str::to_owned)
            .or_else(|| text_frame(tag, "TIT2")),
        artist: tag
            .artist()
            .map(str::to_owned)
            .or_else(|| text_frame(tag, "TPE1")),
        album: tag
            .album()
            .map(str::to_owned)
            .or_else(|| text_frame(tag, "TALB")),
        album_artist: text_frame(tag, "TPE2"),
        composer: text_frame(tag, "TCOM"),
        performer: text_frame(tag, "TPE3"),
        grouping: text_frame(tag, "TIT1"),
        genre: text_frame(tag, "TCON"),
        comment: first_comment(tag),
        lyrics: first_lyrics(tag),

        track_no: tag.track().or(track_no_from_text),
        track_total,
        disc_no: tag.disc().or(disc_no_from_text),
        disc_total,

        year: tag.year(),
        date: text_frame(tag, "TDRC").or_else(|| text_frame(tag, "TYER")),
        bpm: text_frame(tag, "TBPM").and_then(|s| s.trim().parse::<u32>().ok()),
        compilation,

        play_count,
        rating,

        has_embedded_art: Some(artwork_count > 0),

        user_text,
        extra_text: collect_extra_text(tag),

        ..Default::default()
    }
}

/// Get a best-effort string value from a frame id.
/// Some frames that are "text-ish" may not be Content::Text.
fn text_frame(tag: &Tag, id: &str) -> Option<String> {
    let frame = tag.get(id)?;
    match frame.content() {
        Content::Text(s) => Some(s.clone()),
        Content::Link(s) => Some(s.clone()),
        _ => None,
    }
}

fn first_comment(tag: &Tag) -> Option<String> {
    tag.frames().find_map(|frame| match frame.content() {
        Content::Comment(c) if frame.id() == "COMM" => Some(c.text.clone()),
        _ => None,
    })
}

fn first_lyrics(tag: &Tag) -> Option<String> {
    tag.frames().find_map(|frame| match frame.content() {
        Content::Lyrics(l) if frame.id() == "USLT" => Some(l.text.clone()),
        _ => None,
    })
}

fn collect_user_text(tag: &Tag) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    for frame in tag.frames() {
        if frame.id() == "TXXX" {
            if let Content::ExtendedText(et) = frame.content() {
                out.insert(et.description.clone(), et.value.clone());
            }
        }
    }

    out
}

fn popm_rating_and_count(tag: &Tag) -> (Option<f32>, Option<u64>) {
    for frame in tag.frames() {
        if frame.id() == "POPM" {
            if let Content::Popularimeter(p) = frame.content() {
                return (Some(popm_to_rating(p.rating)), Some(p.counter));
            }
        }
    }
    (None, None)
}

fn pcnt_count(tag: &Tag) -> Option<u64> {
    for frame in tag.frames() {
        if frame.id() != "PCNT" {
            continue;
        }
        let unk = frame.content().to_unknown().ok()?;
        return parse_be_u64(unk.as_ref().data.as_slice());
    }
    None
}

fn collect_extra_text(tag: &Tag) -> BTreeMap<String, String> {
    let known: HashSet<&'static str> = HashSet::from([
        "TIT2", "TPE1", "TALB", "TPE2", "TPE3", "TRCK", "TPOS", "TYER", "TDRC", "TCON", "TCOM",
        "TIT1", "TBPM", "TCMP", "TXXX", "COMM", "USLT", "POPM", "PCNT", "APIC", "PIC",
    ]);

    let mut out = BTreeMap::new();

    for frame in tag.frames() {
        let id = frame.id();

        if !id.starts_with('T') || known.contains(id) {
            continue;
        }

        if let Content::Text(s) = frame.content() {
            out.insert(id.to_string(), s.clone());
        }
    }

    out
}
