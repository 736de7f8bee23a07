use std::path::PathBuf;

use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/groove/config.toml` or `~/.config/groove/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `GROOVE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub audio: AudioSettings,
    pub groups: GroupSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,

    /// Which fields make up a track's display string.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "flac", "wav", "m4a", "ogg", "wma", "aac", "opus"]
                .into_iter()
                .map(String::from)
                .collect(),
            follow_links: true,
            include_hidden: true,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often the position is sampled while playing (milliseconds).
    pub position_interval_ms: u64,
    /// A drained stream within this distance of the end counts as "song ended"
    /// rather than "stopped" (milliseconds).
    pub end_tolerance_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            position_interval_ms: 100,
            end_tolerance_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    /// Size of the "Recently Added" group.
    pub recent_limit: usize,
    /// Tracks strictly longer than this land in "Long Tracks" (seconds).
    pub long_track_secs: u64,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            recent_limit: 50,
            long_track_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Where volume/shuffle/loop are persisted. Defaults to a file next to the executable.
    pub preferences_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when neither `GROOVE_LOG` nor `RUST_LOG` is set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Album,
    Filename,
    Path,
}
