use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Shared handle to a track; queue, groups and engine all point at the same record.
pub type Track = Arc<TrackRecord>;

/// Metadata and runtime descriptor for one audio file.
///
/// Identity is the file path: equality and hashing ignore every other field.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub path: PathBuf,
    pub file_name: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: u32,
    pub comment: Option<String>,
    pub duration: Duration,
    /// Audio bitrate in kbps (0 when unknown).
    pub bitrate: u32,
    /// Sample rate in Hz (0 when unknown).
    pub sample_rate: u32,
    pub bpm: u32,
    pub file_size: u64,
    /// Upper-case extension without the dot, e.g. `MP3`.
    pub format: String,
    pub date_added: DateTime<Utc>,
    pub cover_art: Option<CoverArt>,
    playback: PlaybackFlags,
}

impl TrackRecord {
    /// Build a record with placeholder metadata for `path`.
    ///
    /// The extractor fills in real values; tests use this directly.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        let format = path
            .extension()
            .map(|s| s.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_default();

        Self {
            path,
            file_name,
            title,
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            genre: UNKNOWN_GENRE.to_string(),
            year: 0,
            comment: None,
            duration: Duration::ZERO,
            bitrate: 0,
            sample_rate: 0,
            bpm: 0,
            file_size: 0,
            format,
            date_added: Utc::now(),
            cover_art: None,
            playback: PlaybackFlags::default(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.playing.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.playback.paused.load(Ordering::Acquire)
    }

    /// Mirror the engine's state onto the record. Only the playback engine calls this.
    pub(crate) fn set_playback_flags(&self, playing: bool, paused: bool) {
        self.playback.playing.store(playing, Ordering::Release);
        self.playback.paused.store(paused, Ordering::Release);
    }
}

impl PartialEq for TrackRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for TrackRecord {}

impl Hash for TrackRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Decoded cover image, already scaled down to fit the display box.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverArt {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

#[derive(Debug, Default)]
struct PlaybackFlags {
    playing: AtomicBool,
    paused: AtomicBool,
}

impl Clone for PlaybackFlags {
    fn clone(&self) -> Self {
        Self {
            playing: AtomicBool::new(self.playing.load(Ordering::Acquire)),
            paused: AtomicBool::new(self.paused.load(Ordering::Acquire)),
        }
    }
}
