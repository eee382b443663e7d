//! core/tags/container.rs
//! Container-level probing (Symphonia): "is this audio?", stream properties,
//! and the tags/pictures Symphonia exposes for non-ID3 formats
//! (Vorbis comments, MP4 atoms, RIFF INFO, ...).

use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::{CODEC_TYPE_NULL, CodecParameters};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey, Value};
use symphonia::core::probe::{Hint, ProbeResult};
use symphonia::core::units::TimeBase;

use crate::core::types::TrackMetadata;
use crate::error::TagResult;

use super::util::{extension_lower, parse_boolish, parse_slash_pair_u32, parse_year_prefix};

/// What one Symphonia probe of a file yields.
#[derive(Debug, Default)]
pub(crate) struct ContainerInfo {
    /// Stream properties + container tags, as a partial record.
    pub metadata: TrackMetadata,
    /// First embedded visual, if the container has one.
    pub art: Option<Vec<u8>>,
}

fn open_probe(path: &Path) -> TagResult<ProbeResult> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_lower(path) {
        hint.with_extension(&ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    Ok(probed)
}

/// True if Symphonia recognizes the container and it has a real audio track.
pub(crate) fn is_audio_file(path: &Path) -> bool {
    match open_probe(path) {
        Ok(probed) => probed
            .format
            .default_track()
            .map(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .unwrap_or(false),
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "symphonia probe rejected file");
            false
        }
    }
}

/// Probe `path` and collect everything Symphonia can tell us about it.
pub(crate) fn read_container(path: &Path) -> TagResult<ContainerInfo> {
    let mut probed = open_probe(path)?;
    let mut info = ContainerInfo::default();

    info.metadata.filetype = extension_lower(path);

    if let Some(track) = probed.format.default_track() {
        apply_codec_params(&track.codec_params, &mut info.metadata);
    }

    // Metadata found while probing (e.g. an ID3 block in front of the
    // container) first, then the container's own. Later revisions win.
    if let Some(meta) = probed.metadata.get() {
        if let Some(rev) = meta.current() {
            apply_revision(rev, &mut info);
        }
    }
    if let Some(rev) = probed.format.metadata().current() {
        apply_revision(rev, &mut info);
    }

    Ok(info)
}

fn apply_codec_params(params: &CodecParameters, out: &mut TrackMetadata) {
    out.sample_rate = params.sample_rate;
    out.bit_depth = params.bits_per_sample;
    out.channels = params.channels.map(|c| c.count() as u32);
    out.duration_ms = duration_from_params(params.time_base, params.n_frames);
}

fn duration_from_params(time_base: Option<TimeBase>, n_frames: Option<u64>) -> Option<u64> {
    let tb = time_base?;
    let frames = n_frames?;

    let t = tb.calc_time(frames);
    // Time is { seconds: u64, frac: f64 } in symphonia 0.5.x.
    let ms = (t.seconds as f64 * 1000.0) + (t.frac * 1000.0);
    Some(ms.round() as u64)
}

fn apply_revision(rev: &MetadataRevision, info: &mut ContainerInfo) {
    let mut partial = TrackMetadata::default();

    for tag in rev.tags() {
        let Some(key) = tag.std_key else {
            // Keep unmapped keys around like ID3's TXXX.
            if !tag.key.is_empty() {
                partial
                    .user_text
                    .insert(tag.key.clone(), value_text(&tag.value));
            }
            continue;
        };
        apply_std_tag(key, &tag.value, &mut partial);
    }

    if !rev.visuals().is_empty() {
        partial.has_embedded_art = Some(true);
        if info.art.is_none() {
            info.art = rev.visuals().first().map(|v| v.data.to_vec());
        }
    }

    info.metadata.merge_from(partial);
}

fn apply_std_tag(key: StandardTagKey, value: &Value, out: &mut TrackMetadata) {
    let text = value_text(value);
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let owned = || Some(text.to_string());

    match key {
        StandardTagKey::TrackTitle => out.title = owned(),
        StandardTagKey::Artist => out.artist = owned(),
        StandardTagKey::Album => out.album = owned(),
        StandardTagKey::AlbumArtist => out.album_artist = owned(),
        StandardTagKey::Composer => out.composer = owned(),
        StandardTagKey::Performer => out.performer = owned(),
        StandardTagKey::ContentGroup => out.grouping = owned(),
        StandardTagKey::Genre => out.genre = owned(),
        StandardTagKey::Comment => out.comment = owned(),
        StandardTagKey::Lyrics => out.lyrics = owned(),
        StandardTagKey::TrackNumber => {
            // Vorbis often carries "3/12" in TRACKNUMBER.
            let (n, total) = parse_slash_pair_u32(Some(text));
            out.track_no = n.or(out.track_no);
            out.track_total = total.or(out.track_total);
        }
        StandardTagKey::TrackTotal => out.track_total = text.parse().ok(),
        StandardTagKey::DiscNumber => {
            let (n, total) = parse_slash_pair_u32(Some(text));
            out.disc_no = n.or(out.disc_no);
            out.disc_total = total.or(out.disc_total);
        }
        StandardTagKey::DiscTotal => out.disc_total = text.parse().ok(),
        StandardTagKey::Date | StandardTagKey::ReleaseDate => {
            out.year = parse_year_prefix(text).or(out.year);
            out.date = owned();
        }
        StandardTagKey::Bpm => out.bpm = text.parse::<f32>().ok().map(|b| b.round() as u32),
        StandardTagKey::Compilation => out.compilation = parse_boolish(text),
        _ => {
            out.extra_text.insert(format!("{key:?}"), text.to_string());
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
