//! Fixtures shared by unit tests across modules.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::tag::{Tag, TagType};

use crate::library::{Track, TrackRecord};

const SAMPLE_RATE: u32 = 8_000;

/// Write a silent 8 kHz mono 16-bit PCM WAV of `millis` length.
pub fn write_wav(path: &Path, millis: u32) -> PathBuf {
    let samples = SAMPLE_RATE as u64 * millis as u64 / 1000;
    let data_len = (samples * 2) as u32;
    let byte_rate = SAMPLE_RATE * 2;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, out).unwrap();
    path.to_path_buf()
}

/// Text tags for [`write_tagged_wav`]; `None` leaves the field out.
#[derive(Default)]
pub struct WavTags<'a> {
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub genre: Option<&'a str>,
    pub comment: Option<&'a str>,
}

/// Write a WAV like [`write_wav`] and attach a RIFF INFO tag.
pub fn write_tagged_wav(path: &Path, millis: u32, tags: WavTags<'_>) -> PathBuf {
    write_wav(path, millis);

    let mut tag = Tag::new(TagType::RiffInfo);
    if let Some(v) = tags.title {
        tag.set_title(v.to_string());
    }
    if let Some(v) = tags.artist {
        tag.set_artist(v.to_string());
    }
    if let Some(v) = tags.album {
        tag.set_album(v.to_string());
    }
    if let Some(v) = tags.genre {
        tag.set_genre(v.to_string());
    }
    if let Some(v) = tags.comment {
        tag.set_comment(v.to_string());
    }
    tag.save_to_path(path, WriteOptions::default()).unwrap();
    path.to_path_buf()
}

/// A track record with the given tags and no file behind it.
pub fn track(path: &str, artist: &str, title: &str, genre: &str, secs: u64) -> Track {
    let mut t = TrackRecord::new(path);
    t.artist = artist.to_string();
    t.title = title.to_string();
    t.genre = genre.to_string();
    t.duration = Duration::from_secs(secs);
    Arc::new(t)
}
