//! The [`TagProvider`] trait: the capability set every tag backend offers.

use std::path::Path;

use super::types::TrackMetadata;

/// A tag backend that reads and writes metadata for media files.
///
/// Providers are stateless with respect to requests: each call stands on
/// its own, given a path and (for writes) a payload. Failures are never
/// raised across this trait; a provider reports them as `false` or as
/// empty data and logs the cause itself.
pub trait TagProvider {
    /// Human-readable name identifying this provider (used in logs).
    fn name(&self) -> &'static str;

    /// Whether `path` is a media file this provider understands.
    fn probe_is_media_file(&self, path: &Path) -> bool;

    /// Read metadata into `out`.
    ///
    /// Contract: set only the fields actually resolved. Never reset `out`;
    /// another provider may already have written into it.
    fn read_metadata(&self, path: &Path, out: &mut TrackMetadata);

    fn write_metadata(&self, path: &Path, metadata: &TrackMetadata) -> bool;

    /// First embedded picture, or empty bytes when there is none.
    fn read_embedded_art(&self, path: &Path) -> Vec<u8>;

    /// Replace embedded art. Empty `data` removes it.
    fn write_embedded_art(&self, path: &Path, data: &[u8]) -> bool;

    /// Store `metadata.play_count` in the file. `None` writes nothing and reports `false`.
    fn write_playcount(&self, path: &Path, metadata: &TrackMetadata) -> bool;

    /// Store `metadata.rating` in the file. `None` writes nothing and reports `false`.
    fn write_rating(&self, path: &Path, metadata: &TrackMetadata) -> bool;
}
