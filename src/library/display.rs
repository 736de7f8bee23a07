use std::time::Duration;

use crate::config::TrackDisplayField;

use super::model::TrackRecord;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Placeholder artist/album values are skipped so an untagged file shows up
/// as its title alone. Falls back to the title when no parts were produced.
pub fn display_from_fields(track: &TrackRecord, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Title => {
                if !track.title.trim().is_empty() {
                    parts.push(track.title.trim().to_string());
                }
            }
            TrackDisplayField::Artist => {
                let a = track.artist.trim();
                if !a.is_empty() && a != super::UNKNOWN_ARTIST {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                let a = track.album.trim();
                if !a.is_empty() && a != super::UNKNOWN_ALBUM {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = track.path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            TrackDisplayField::Path => {
                parts.push(track.path.display().to_string());
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}

/// `mm:ss`, switching to `h:mm:ss` past one hour.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Human-readable size on a 1024 scale, e.g. `3.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

    for (unit, scale) in UNITS {
        if bytes > scale {
            let v = bytes as f64 / scale as f64;
            let text = format!("{v:.2}");
            let text = text.trim_end_matches('0').trim_end_matches('.');
            return format!("{text} {unit}");
        }
    }
    if bytes == 0 {
        "0 Bytes".to_string()
    } else {
        format!("{bytes} Bytes")
    }
}

pub fn format_bitrate(kbps: u32) -> String {
    format!("{kbps} kbps")
}

pub fn format_sample_rate(hz: u32) -> String {
    format!("{hz} Hz")
}

pub fn format_bpm(bpm: u32) -> String {
    format!("{bpm} BPM")
}
