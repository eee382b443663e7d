//! core/tags/mod.rs
//!
//! The general-purpose provider.
//! - Symphonia answers "is this audio?" and supplies stream properties plus
//!   container tags for every format it knows.
//! - The `id3` crate reads/writes ID3v2 on MP3s; it is the only writable format.

mod art;
mod container;
mod read;
pub(crate) mod util;
mod write;

use std::path::Path;

use id3::Version;

use crate::core::provider::TagProvider;
use crate::core::types::TrackMetadata;
use crate::error::{TagError, TagResult};

use util::{extension_lower, fill_file_stats};

/// Extensions whose tags we can write with the `id3` crate.
const ID3_EXTENSIONS: &[&str] = &["mp3"];

pub struct GeneralTagProvider {
    /// ID3 version used when writing.
    write_version: Version,
}

impl GeneralTagProvider {
    pub fn new(write_version: Version) -> Self {
        Self { write_version }
    }

    fn require_id3(path: &Path, what: &'static str) -> TagResult<()> {
        let writable = extension_lower(path)
            .map(|ext| ID3_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if writable {
            Ok(())
        } else {
            Err(TagError::unsupported(path, what))
        }
    }

    /// Container first, then ID3 on top (ID3 is the richer source on MP3s).
    fn try_read(&self, path: &Path) -> TagResult<TrackMetadata> {
        let container = container::read_container(path);

        let mut partial = if Self::require_id3(path, "id3 read").is_err() {
            container?.metadata
        } else {
            // Symphonia is picky about MP3 framing; the ID3 tag may still be fine.
            let mut partial = match container {
                Ok(info) => info.metadata,
                Err(e) => {
                    tracing::trace!(path = %path.display(), error = %e, "container probe failed, ID3 only");
                    TrackMetadata {
                        filetype: extension_lower(path),
                        ..Default::default()
                    }
                }
            };
            match read::read_id3(path) {
                Ok(id3) => partial.merge_from(id3),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable ID3 tag, keeping container fields");
                }
            }
            partial
        };

        fill_file_stats(path, &mut partial);
        Ok(partial)
    }

    /// Fold a write result into the boolean the trait reports.
    fn outcome(&self, path: &Path, op: &'static str, result: TagResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(TagError::Unsupported { .. }) => {
                tracing::debug!(provider = self.name(), op, path = %path.display(), "not writable here");
                false
            }
            Err(e @ TagError::MissingField { .. }) => {
                tracing::debug!(provider = self.name(), op, path = %path.display(), error = %e, "nothing to write");
                false
            }
            Err(e) => {
                tracing::warn!(provider = self.name(), op, path = %path.display(), error = %e, "write failed");
                false
            }
        }
    }
}

impl Default for GeneralTagProvider {
    fn default() -> Self {
        Self::new(Version::Id3v24)
    }
}

impl TagProvider for GeneralTagProvider {
    fn name(&self) -> &'static str {
        "general"
    }

    fn probe_is_media_file(&self, path: &Path) -> bool {
        container::is_audio_file(path)
    }

    fn read_metadata(&self, path: &Path, out: &mut TrackMetadata) {
        match self.try_read(path) {
            Ok(partial) => out.merge_from(partial),
            Err(e) => {
                tracing::debug!(provider = self.name(), path = %path.display(), error = %e, "read failed");
            }
        }
    }

    fn write_metadata(&self, path: &Path, metadata: &TrackMetadata) -> bool {
        let result = Self::require_id3(path, "tag write")
            .and_then(|()| write::write_id3(path, metadata, self.write_version));
        self.outcome(path, "write_metadata", result)
    }

    fn read_embedded_art(&self, path: &Path) -> Vec<u8> {
        if Self::require_id3(path, "id3 art").is_ok() {
            if let Some(data) = art::read_id3_art(path) {
                return data;
            }
        }

        match container::read_container(path) {
            Ok(info) => info.art.unwrap_or_default(),
            Err(e) => {
                tracing::debug!(provider = self.name(), path = %path.display(), error = %e, "no art");
                Vec::new()
            }
        }
    }

    fn write_embedded_art(&self, path: &Path, data: &[u8]) -> bool {
        let result = Self::require_id3(path, "art write")
            .and_then(|()| art::write_id3_art(path, data, self.write_version));
        self.outcome(path, "write_embedded_art", result)
    }

    fn write_playcount(&self, path: &Path, metadata: &TrackMetadata) -> bool {
        let result = Self::require_id3(path, "playcount write").and_then(|()| {
            let count = metadata
                .play_count
                .ok_or(TagError::MissingField { field: "play_count" })?;
            write::write_playcount(path, count, self.write_version)
        });
        self.outcome(path, "write_playcount", result)
    }

    fn write_rating(&self, path: &Path, metadata: &TrackMetadata) -> bool {
        let result = Self::require_id3(path, "rating write").and_then(|()| {
            let rating = metadata
                .rating
                .ok_or(TagError::MissingField { field: "rating" })?;
            write::write_rating(path, rating, self.write_version)
        });
        self.outcome(path, "write_rating", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3::{Tag, TagLike};
    use std::path::PathBuf;

    /// An "MP3" with no tag: a few bytes of silence-ish junk.
    fn untagged_mp3(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![0u8; 512]).unwrap();
        path
    }

    /// ID3v2.4 tag holding a valid TIT2 and then a POPM frame whose email
    /// is never terminated, so the whole tag fails to parse.
    fn mp3_with_broken_tag(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let tit2 = b"\x03Keep me";
        let popm = b"no-terminator";
        let mut bytes = b"ID3\x04\x00\x00".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, (20 + tit2.len() + popm.len()) as u8]);
        bytes.extend_from_slice(b"TIT2");
        bytes.extend_from_slice(&[0, 0, 0, tit2.len() as u8, 0, 0]);
        bytes.extend_from_slice(tit2);
        bytes.extend_from_slice(b"POPM");
        bytes.extend_from_slice(&[0, 0, 0, popm.len() as u8, 0, 0]);
        bytes.extend_from_slice(popm);
        bytes.extend_from_slice(&[0u8; 512]);

        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn tag_with_title(path: &Path, title: &str) {
        let mut tag = Tag::new();
        tag.set_title(title);
        tag.set_artist("Artist");
        tag.set_text("TRCK", "3/12");
        tag.write_to_path(path, Version::Id3v24).unwrap();
    }

    #[test]
    fn id3_read_only_sets_resolved_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "a.mp3");
        tag_with_title(&path, "Song");

        let mut out = TrackMetadata {
            genre: Some("Kept".into()),
            ..Default::default()
        };
        GeneralTagProvider::default().read_metadata(&path, &mut out);

        assert_eq!(out.title.as_deref(), Some("Song"));
        assert_eq!(out.artist.as_deref(), Some("Artist"));
        assert_eq!(out.track_no, Some(3));
        assert_eq!(out.track_total, Some(12));
        assert_eq!(out.genre.as_deref(), Some("Kept"));
        assert_eq!(out.filesize, Some(std::fs::metadata(&path).unwrap().len()));
    }

    #[test]
    fn unreadable_file_leaves_record_alone() {
        let mut out = TrackMetadata {
            title: Some("X".into()),
            ..Default::default()
        };
        GeneralTagProvider::default().read_metadata(Path::new("/nonexistent/z.mp3"), &mut out);
        assert_eq!(
            out,
            TrackMetadata {
                title: Some("X".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "w.mp3");
        let provider = GeneralTagProvider::default();

        let m = TrackMetadata {
            title: Some("New".into()),
            album: Some("LP".into()),
            comment: Some("hello".into()),
            disc_no: Some(1),
            disc_total: Some(2),
            ..Default::default()
        };
        assert!(provider.write_metadata(&path, &m));

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("New"));
        assert_eq!(tag.album(), Some("LP"));
        assert_eq!(tag.disc(), Some(1));
        assert!(tag.artist().is_none());

        let mut out = TrackMetadata::default();
        provider.read_metadata(&path, &mut out);
        assert_eq!(out.comment.as_deref(), Some("hello"));
        assert_eq!(out.disc_total, Some(2));
    }

    #[test]
    fn blank_fields_remove_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "b.mp3");
        tag_with_title(&path, "Old");

        let m = TrackMetadata {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(GeneralTagProvider::default().write_metadata(&path, &m));

        let tag = Tag::read_from_path(&path).unwrap();
        assert!(tag.title().is_none());
        assert!(tag.artist().is_none());
    }

    #[test]
    fn non_mp3_writes_report_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.flac");
        std::fs::write(&path, b"fLaC").unwrap();
        let provider = GeneralTagProvider::default();
        let m = TrackMetadata::default();

        assert!(!provider.write_metadata(&path, &m));
        assert!(!provider.write_embedded_art(&path, b"\x89PNG"));
        assert!(!provider.write_playcount(&path, &m));
        assert!(!provider.write_rating(&path, &m));
        // untouched
        assert_eq!(std::fs::read(&path).unwrap(), b"fLaC");
    }

    #[test]
    fn playcount_and_rating_share_popm() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "p.mp3");
        let provider = GeneralTagProvider::default();

        let stats = TrackMetadata {
            play_count: Some(42),
            rating: Some(1.0),
            ..Default::default()
        };
        assert!(provider.write_playcount(&path, &stats));
        assert!(provider.write_rating(&path, &stats));

        let mut out = TrackMetadata::default();
        provider.read_metadata(&path, &mut out);
        assert_eq!(out.play_count, Some(42));
        assert_eq!(out.rating, Some(1.0));

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.frames().filter(|f| f.id() == "POPM").count(), 1);
    }

    #[test]
    fn art_round_trip_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "art.mp3");
        let provider = GeneralTagProvider::default();
        let png = b"\x89PNG\r\n\x1a\nfake".to_vec();

        assert!(provider.read_embedded_art(&path).is_empty());
        assert!(provider.write_embedded_art(&path, &png));
        assert_eq!(provider.read_embedded_art(&path), png);

        assert!(provider.write_embedded_art(&path, &[]));
        assert!(provider.read_embedded_art(&path).is_empty());
    }

    #[test]
    fn junk_is_not_media() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "junk.mp3");
        assert!(!GeneralTagProvider::default().probe_is_media_file(&path));
    }

    #[test]
    fn broken_tag_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = mp3_with_broken_tag(&dir, "broken.mp3");
        assert!(Tag::read_from_path(&path).is_err());
        let before = std::fs::read(&path).unwrap();
        let provider = GeneralTagProvider::default();

        let m = TrackMetadata {
            title: Some("New".into()),
            play_count: Some(7),
            rating: Some(0.5),
            ..Default::default()
        };
        assert!(!provider.write_rating(&path, &m));
        assert!(!provider.write_playcount(&path, &m));
        assert!(!provider.write_metadata(&path, &m));
        assert!(!provider.write_embedded_art(&path, b"\x89PNG"));

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn broken_tag_still_reports_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = mp3_with_broken_tag(&dir, "broken.mp3");

        let mut out = TrackMetadata::default();
        GeneralTagProvider::default().read_metadata(&path, &mut out);

        assert_eq!(out.filetype.as_deref(), Some("mp3"));
        assert_eq!(out.filesize, Some(std::fs::metadata(&path).unwrap().len()));
    }

    #[test]
    fn absent_statistics_keep_stored_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = untagged_mp3(&dir, "s.mp3");
        let provider = GeneralTagProvider::default();

        let stats = TrackMetadata {
            play_count: Some(9),
            rating: Some(0.6),
            ..Default::default()
        };
        assert!(provider.write_playcount(&path, &stats));
        assert!(provider.write_rating(&path, &stats));

        let nothing = TrackMetadata::default();
        assert!(!provider.write_playcount(&path, &nothing));
        assert!(!provider.write_rating(&path, &nothing));

        let mut out = TrackMetadata::default();
        provider.read_metadata(&path, &mut out);
        assert_eq!(out.play_count, Some(9));
        assert_eq!(out.rating, Some(util::popm_to_rating(153)));
    }
}
