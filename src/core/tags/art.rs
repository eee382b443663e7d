use std::path::Path;

use id3::frame::{Content, Frame, Picture, PictureType};
use id3::{Tag, TagLike, Version};

use crate::error::TagResult;

use super::util::sniff_image_mime;
use super::write::load_or_new;

/// Bytes of the first embedded picture (APIC/PIC), if any.
pub(crate) fn read_id3_art(path: &Path) -> Option<Vec<u8>> {
    let tag = Tag::read_from_path(path).ok()?;

    tag.frames()
        .filter(|f| f.id() == "APIC" || f.id() == "PIC")
        .find_map(|f| match f.content() {
            Content::Picture(p) => Some(p.data.clone()),
            _ => None,
        })
}

/// Replace every picture with a single front cover.
/// Empty `data` just removes them.
pub(crate) fn write_id3_art(path: &Path, data: &[u8], version: Version) -> TagResult<()> {
    let mut tag = load_or_new(path)?;

    let _ = tag.remove("APIC");
    let _ = tag.remove("PIC");

    if !data.is_empty() {
        let picture = Picture {
            mime_type: sniff_image_mime(data).to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: data.to_vec(),
        };
        let _ = tag.add_frame(Frame::with_content("APIC", Content::Picture(picture)));
    }

    tag.write_to_path(path, version)?;
    Ok(())
}
