//! Core data types shared between the providers and the worker.
//!
//! Rule of thumb:
//! - These structs should be "boring bags of data"
//! - No transport code
//! - No filesystem code
//! - No tag parsing code
//!
//! `TrackMetadata` is the record a `ReadMetadata` reply carries and the
//! payload of the write requests.
//!
//! Every field is an `Option` (or a map) so that "this provider did not
//! resolve it" and "resolved to nothing" stay distinguishable. That is what
//! lets two providers write into the same record one after the other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata for ONE audio file.
///
/// The file path is not part of the record; requests carry it separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackMetadata {
    // Core tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_total: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Free-form date text (TDRC etc). Libraries vary too much to parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compilation: Option<bool>,

    // Statistics stored in the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u32>,
    /// 0.0 ..= 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,

    // File + stream properties
    /// Short lowercase container name ("mp3", "flac", "spc", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    /// Modification time, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_embedded_art: Option<bool>,

    /// User-defined text (TXXX description -> value).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_text: BTreeMap<String, String>,

    /// "Escape hatch" for text frames we don't map to a field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_text: BTreeMap<String, String>,
}

/// Overwrite `dst` only when `src` resolved something.
fn take<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dst = src;
    }
}

impl TrackMetadata {
    /// Merge another (partial) record into this one.
    ///
    /// - `Some` in `other` replaces our value
    /// - `None` in `other` leaves our value alone
    /// - maps are extended; `other` wins on key collisions
    pub fn merge_from(&mut self, other: TrackMetadata) {
        take(&mut self.title, other.title);
        take(&mut self.artist, other.artist);
        take(&mut self.album, other.album);
        take(&mut self.album_artist, other.album_artist);
        take(&mut self.composer, other.composer);
        take(&mut self.performer, other.performer);
        take(&mut self.grouping, other.grouping);
        take(&mut self.genre, other.genre);
        take(&mut self.comment, other.comment);
        take(&mut self.lyrics, other.lyrics);

        take(&mut self.track_no, other.track_no);
        take(&mut self.track_total, other.track_total);
        take(&mut self.disc_no, other.disc_no);
        take(&mut self.disc_total, other.disc_total);

        take(&mut self.year, other.year);
        take(&mut self.date, other.date);
        take(&mut self.bpm, other.bpm);
        take(&mut self.compilation, other.compilation);

        take(&mut self.play_count, other.play_count);
        take(&mut self.rating, other.rating);

        take(&mut self.filetype, other.filetype);
        take(&mut self.filesize, other.filesize);
        take(&mut self.mtime, other.mtime);
        take(&mut self.duration_ms, other.duration_ms);
        take(&mut self.sample_rate, other.sample_rate);
        take(&mut self.bit_depth, other.bit_depth);
        take(&mut self.channels, other.channels);
        take(&mut self.has_embedded_art, other.has_embedded_art);

        self.user_text.extend(other.user_text);
        self.extra_text.extend(other.extra_text);
    }

    /// True if nothing at all has been resolved.
    pub fn is_empty(&self) -> bool {
        *self == TrackMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut base = TrackMetadata {
            title: Some("X".into()),
            year: Some(1998),
            ..Default::default()
        };
        base.merge_from(TrackMetadata {
            artist: Some("Y".into()),
            ..Default::default()
        });

        assert_eq!(base.title.as_deref(), Some("X"));
        assert_eq!(base.artist.as_deref(), Some("Y"));
        assert_eq!(base.year, Some(1998));
    }

    #[test]
    fn merge_overrides_on_overlap() {
        let mut base = TrackMetadata {
            title: Some("Primary".into()),
            ..Default::default()
        };
        base.user_text.insert("MOOD".into(), "calm".into());
        base.user_text.insert("KEEP".into(), "me".into());

        let mut other = TrackMetadata {
            title: Some("Fallback".into()),
            ..Default::default()
        };
        other.user_text.insert("MOOD".into(), "loud".into());
        base.merge_from(other);

        assert_eq!(base.title.as_deref(), Some("Fallback"));
        assert_eq!(base.user_text["MOOD"], "loud");
        assert_eq!(base.user_text["KEEP"], "me");
    }

    #[test]
    fn empty_record_is_empty() {
        assert!(TrackMetadata::default().is_empty());
        let m = TrackMetadata {
            channels: Some(2),
            ..Default::default()
        };
        assert!(!m.is_empty());
    }

    #[test]
    fn unresolved_fields_are_not_encoded() {
        let m = TrackMetadata {
            title: Some("Only".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"title":"Only"}"#);

        let back: TrackMetadata = serde_json::from_str("{}").unwrap();
        assert!(back.is_empty());
    }
}
