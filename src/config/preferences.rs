use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PreferencesError;

/// File name used when the preferences live next to the executable.
pub const PREFERENCES_FILE_NAME: &str = "groove-prefs.toml";

/// User choices that survive restarts.
///
/// Stored as a small TOML document:
///
/// ```toml
/// volume = 0.5
/// shuffle = false
/// loop = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub volume: f32,
    pub shuffle: bool,
    #[serde(rename = "loop")]
    pub loop_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            volume: 0.5,
            shuffle: false,
            loop_enabled: false,
        }
    }
}

impl Preferences {
    /// Read preferences from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, PreferencesError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PreferencesError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut prefs: Preferences =
            toml::from_str(&content).map_err(|source| PreferencesError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        prefs.volume = clamp_volume(prefs.volume);
        Ok(prefs)
    }

    /// Write preferences to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Clamp a volume to `[0.0, 1.0]`; NaN becomes silence.
pub fn clamp_volume(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Resolve where preferences are stored.
///
/// Order: `GROOVE_PREFS_PATH`, the configured override, then next to the executable.
pub fn resolve_preferences_path(configured: Option<&Path>) -> Result<PathBuf, PreferencesError> {
    if let Some(p) = env::var_os("GROOVE_PREFS_PATH") {
        return Ok(PathBuf::from(p));
    }
    if let Some(p) = configured {
        return Ok(p.to_path_buf());
    }
    let exe = env::current_exe().map_err(|_| PreferencesError::NoLocation)?;
    exe.parent()
        .map(|dir| dir.join(PREFERENCES_FILE_NAME))
        .ok_or(PreferencesError::NoLocation)
}
