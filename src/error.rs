//! Error types for each core component.
//!
//! Errors are recovered at the component boundary closest to their cause:
//! the scanner turns `ExtractError` into status events, the engine turns
//! `PlaybackError` into `false`, and the session only logs `PreferencesError`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reading a single audio file failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {0}")]
    Missing(PathBuf),
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported or corrupt audio file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
}

impl ExtractError {
    pub(crate) fn from_io(path: &std::path::Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::Missing(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// A scan could not be set up or was interrupted by shutdown.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("directory does not exist: {0}")]
    NotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("permission denied while listing {0}")]
    PermissionDenied(PathBuf),
    #[error("scanner was shut down")]
    ShutDown,
}

/// Opening a decode/output pipeline failed.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    NoOutputDevice(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Loading or saving the persisted preferences failed.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("preferences I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid preferences file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no location available for the preferences file")]
    NoLocation,
}

/// A user playlist edit was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("playlist name is blank")]
    BlankName,
    #[error("\"{0}\" is reserved")]
    Reserved(String),
    #[error("a playlist named \"{0}\" already exists")]
    Duplicate(String),
}
