//! Write ID3 tags back to an MP3, based on a `TrackMetadata`.

use std::path::Path;

use id3::frame::{Comment, Content, ExtendedText, Frame, Lyrics, Popularimeter};
use id3::{Tag, TagLike, Version};

use crate::core::types::TrackMetadata;
use crate::error::TagResult;

use super::util::rating_to_popm;

/// POPM "user" we own. Other players' POPM frames are left alone.
pub(crate) const POPM_USER: &str = "no@email";

/// Helper: set/remove a plain text frame (T***)
fn set_text_opt(tag: &mut Tag, id: &str, v: &Option<String>) {
    match v.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => tag.set_text(id, s.to_string()),
        _ => {
            tag.remove(id);
        }
    }
}

/// Helper: write TRCK/TPOS as "n" or "n/total" (or remove if None)
fn set_slash_pair(tag: &mut Tag, id: &str, n: Option<u32>, total: Option<u32>) {
    match n {
        None => {
            let _ = tag.remove(id); // TagLike::remove returns Vec<Frame>; discard it
        }
        Some(n) => match total {
            Some(t) => tag.set_text(id, format!("{}/{}", n, t)),
            None => tag.set_text(id, n.to_string()),
        },
    }
}

/// Load the existing tag, or start fresh when the file has none.
///
/// A tag that is present but unparseable is an error: rewriting it from
/// scratch would drop every frame we could not read.
pub(crate) fn load_or_new(path: &Path) -> TagResult<Tag> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(Tag::new()),
        Err(e) => Err(e.into()),
    }
}

/// Write the tag fields of `m` to the file at `path`.
///
/// Semantics:
/// - `None` (or empty/whitespace string) => remove that frame from the file.
/// - Statistics (play count / rating) are NOT touched here; they have their
///   own requests.
pub(crate) fn write_id3(path: &Path, m: &TrackMetadata, version: Version) -> TagResult<()> {
    let mut tag = load_or_new(path)?;

    set_text_opt(&mut tag, "TIT2", &m.title);
    set_text_opt(&mut tag, "TPE1", &m.artist);
    set_text_opt(&mut tag, "TALB", &m.album);
    set_text_opt(&mut tag, "TPE2", &m.album_artist);
    set_text_opt(&mut tag, "TCOM", &m.composer);
    set_text_opt(&mut tag, "TPE3", &m.performer);
    set_text_opt(&mut tag, "TIT1", &m.grouping);
    set_text_opt(&mut tag, "TCON", &m.genre);

    set_slash_pair(&mut tag, "TRCK", m.track_no, m.track_total);
    set_slash_pair(&mut tag, "TPOS", m.disc_no, m.disc_total);

    match m.year {
        Some(y) => tag.set_year(y),
        None => tag.remove_year(),
    }
    set_text_opt(&mut tag, "TDRC", &m.date);

    match m.bpm {
        Some(b) => tag.set_text("TBPM", b.to_string()),
        None => {
            let _ = tag.remove("TBPM");
        }
    }

    match m.compilation {
        Some(true) => tag.set_text("TCMP", "1"),
        _ => {
            let _ = tag.remove("TCMP");
        }
    }

    // Comment (COMM): replace with a single "eng" comment
    let _ = tag.remove("COMM");
    if let Some(s) = non_blank(&m.comment) {
        let _ = tag.add_frame(Comment {
            lang: "eng".to_string(),
            description: "".to_string(),
            text: s.to_string(),
        });
    }

    // Lyrics (USLT): same idea
    let _ = tag.remove("USLT");
    if let Some(s) = non_blank(&m.lyrics) {
        let _ = tag.add_frame(Lyrics {
            lang: "eng".to_string(),
            description: "".to_string(),
            text: s.to_string(),
        });
    }

    // TXXX frames are only added/updated, never mass-removed:
    // hosts usually don't round-trip every user frame.
    for (description, value) in &m.user_text {
        let txxx = ExtendedText {
            description: description.clone(),
            value: value.clone(),
        };
        let _ = tag.add_frame(Frame::with_content("TXXX", Content::ExtendedText(txxx)));
    }

    tag.write_to_path(path, version)?;
    Ok(())
}

/// Store the play count in our POPM frame, keeping its rating byte.
pub(crate) fn write_playcount(path: &Path, play_count: u32, version: Version) -> TagResult<()> {
    let mut tag = load_or_new(path)?;

    let mut popm = take_own_popm(&mut tag);
    popm.counter = play_count as u64;
    let _ = tag.add_frame(Frame::with_content("POPM", Content::Popularimeter(popm)));

    // A stale PCNT would disagree with POPM on the next read.
    let _ = tag.remove("PCNT");

    tag.write_to_path(path, version)?;
    Ok(())
}

/// Store the rating in our POPM frame, keeping its counter.
pub(crate) fn write_rating(path: &Path, rating: f32, version: Version) -> TagResult<()> {
    let mut tag = load_or_new(path)?;

    let mut popm = take_own_popm(&mut tag);
    popm.rating = rating_to_popm(rating);
    let _ = tag.add_frame(Frame::with_content("POPM", Content::Popularimeter(popm)));

    tag.write_to_path(path, version)?;
    Ok(())
}

/// Pull our POPM frame out of the tag (or a blank one if absent).
fn take_own_popm(tag: &mut Tag) -> Popularimeter {
    let existing = tag.frames().find_map(|f| match f.content() {
        Content::Popularimeter(p) if p.user == POPM_USER => Some(p.clone()),
        _ => None,
    });

    // POPM frames are keyed by user; drop ours and re-add it afterwards.
    let others: Vec<Frame> = tag
        .remove("POPM")
        .into_iter()
        .filter(|f| match f.content() {
            Content::Popularimeter(p) => p.user != POPM_USER,
            _ => false,
        })
        .collect();
    for f in others {
        let _ = tag.add_frame(f);
    }

    existing.unwrap_or_else(|| Popularimeter {
        user: POPM_USER.to_string(),
        rating: 0,
        counter: 0,
    })
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
