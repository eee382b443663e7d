//! core/chiptune/mod.rs
//!
//! The specialized provider: game-console music rips.
//! - `.spc` (SNES, ID666 tag in the header)
//! - `.vgm` (Sega/arcade chip logs, GD3 tag at the end)
//!
//! These formats are read-only here. Every write reports `false`.

mod spc;
mod vgm;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::provider::TagProvider;
use crate::core::tags::util::{extension_lower, fill_file_stats};
use crate::core::types::TrackMetadata;
use crate::error::{TagError, TagResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Spc,
    Vgm,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match extension_lower(path)?.as_str() {
            "spc" => Some(Self::Spc),
            "vgm" => Some(Self::Vgm),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChiptuneTagProvider;

impl ChiptuneTagProvider {
    pub fn new() -> Self {
        Self
    }

    fn try_read(&self, path: &Path) -> TagResult<TrackMetadata> {
        let format =
            Format::from_path(path).ok_or_else(|| TagError::unsupported(path, "chiptune read"))?;

        let mut partial = match format {
            // Only the header matters; dumps are 64 KiB+ of RAM image.
            Format::Spc => spc::parse(&read_prefix(path, spc::HEADER_LEN)?)?,
            // GD3 sits at the end, so read it all. VGMs are small.
            Format::Vgm => vgm::parse(&std::fs::read(path)?)?,
        };

        fill_file_stats(path, &mut partial);
        Ok(partial)
    }

    fn read_only(&self, path: &Path, op: &'static str) -> bool {
        tracing::debug!(provider = self.name(), op, path = %path.display(), "format is read-only");
        false
    }
}

impl TagProvider for ChiptuneTagProvider {
    fn name(&self) -> &'static str {
        "chiptune"
    }

    fn probe_is_media_file(&self, path: &Path) -> bool {
        let Some(format) = Format::from_path(path) else {
            return false;
        };

        let magic_len = match format {
            Format::Spc => spc::MAGIC.len(),
            Format::Vgm => vgm::MAGIC.len(),
        };
        let Ok(head) = read_prefix(path, magic_len) else {
            return false;
        };

        match format {
            Format::Spc => spc::has_magic(&head),
            Format::Vgm => vgm::has_magic(&head),
        }
    }

    fn read_metadata(&self, path: &Path, out: &mut TrackMetadata) {
        match self.try_read(path) {
            Ok(partial) => out.merge_from(partial),
            Err(e) => {
                tracing::debug!(provider = self.name(), path = %path.display(), error = %e, "read failed");
            }
        }
    }

    fn write_metadata(&self, path: &Path, _metadata: &TrackMetadata) -> bool {
        self.read_only(path, "write_metadata")
    }

    fn read_embedded_art(&self, _path: &Path) -> Vec<u8> {
        Vec::new()
    }

    fn write_embedded_art(&self, path: &Path, _data: &[u8]) -> bool {
        self.read_only(path, "write_embedded_art")
    }

    fn write_playcount(&self, path: &Path, _metadata: &TrackMetadata) -> bool {
        self.read_only(path, "write_playcount")
    }

    fn write_rating(&self, path: &Path, _metadata: &TrackMetadata) -> bool {
        self.read_only(path, "write_rating")
    }
}

/// Up to `len` bytes from the start of the file.
fn read_prefix(path: &Path, len: usize) -> TagResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(len);
    File::open(path)?.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Fixed-width, NUL-padded Latin-ish text field. Blank -> None.
pub(crate) fn fixed_text(buf: &[u8], (offset, len): (usize, usize)) -> Option<String> {
    let field = buf.get(offset..offset + len)?;
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let s = String::from_utf8_lossy(&field[..end]);
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
