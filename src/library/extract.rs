use std::fs;
use std::path::Path;

use chrono::Utc;
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag};
use tracing::{debug, warn};

use crate::error::ExtractError;

use super::cover::decode_cover;
use super::model::{TrackRecord, UNKNOWN_GENRE};
use super::tempo::{derive_bpm, parse_bpm_tag};

/// Read tags and audio properties of one file into a `TrackRecord`.
///
/// Never panics on bad input: a missing file, permission problem, corrupt
/// container or unsupported codec comes back as an `ExtractError`.
pub fn extract_track(path: &Path) -> Result<TrackRecord, ExtractError> {
    let meta = fs::metadata(path).map_err(|e| ExtractError::from_io(path, e))?;
    if !meta.is_file() {
        return Err(ExtractError::Missing(path.to_path_buf()));
    }

    let tagged = lofty::read_from_path(path).map_err(|source| {
        if let lofty::error::ErrorKind::Io(io) = source.kind() {
            let kind = io.kind();
            return ExtractError::from_io(path, std::io::Error::new(kind, source.to_string()));
        }
        ExtractError::Format {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut track = TrackRecord::new(path);
    track.file_size = meta.len();
    track.date_added = Utc::now();

    let props = tagged.properties();
    track.duration = props.duration();
    track.bitrate = props.audio_bitrate().unwrap_or(0);
    track.sample_rate = props.sample_rate().unwrap_or(0);

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

    let genre_tag = tag.and_then(|t| non_blank(t.genre().as_deref()));
    let comment_tag = tag.and_then(|t| non_blank(t.comment().as_deref()));
    let explicit_bpm = tag.and_then(explicit_bpm);

    if let Some(tag) = tag {
        if let Some(v) = non_blank(tag.title().as_deref()) {
            track.title = v;
        }
        if let Some(v) = non_blank(tag.artist().as_deref()) {
            track.artist = v;
        }
        if let Some(v) = non_blank(tag.album().as_deref()) {
            track.album = v;
        }
        track.year = year_from_tag(tag).unwrap_or(0);

        if let Some(picture) = tag.pictures().first() {
            match decode_cover(picture.data()) {
                Ok(art) => track.cover_art = Some(art),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to decode cover art"),
            }
        }
    }

    track.bpm = derive_bpm(explicit_bpm, comment_tag.as_deref(), genre_tag.as_deref());
    track.genre = genre_tag.unwrap_or_else(|| UNKNOWN_GENRE.to_string());
    track.comment = comment_tag;

    debug!(
        path = %path.display(),
        title = %track.title,
        bpm = track.bpm,
        "extracted track"
    );
    Ok(track)
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn explicit_bpm(tag: &Tag) -> Option<u32> {
    [ItemKey::IntegerBpm, ItemKey::Bpm]
        .iter()
        .filter_map(|key| tag.get_string(key))
        .filter_map(parse_bpm_tag)
        .find(|&bpm| bpm > 0)
}

fn year_from_tag(tag: &Tag) -> Option<u32> {
    [ItemKey::Year, ItemKey::RecordingDate]
        .iter()
        .filter_map(|key| tag.get_string(key))
        .find_map(parse_year)
}

/// Year from the leading digits of a date-ish tag value: `2004`, `2004-05-01`, `2004/05`.
pub(crate) fn parse_year(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    digits[..4].parse().ok().filter(|&y| y > 0)
}
