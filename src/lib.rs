//! Core of a desktop music player: metadata extraction, library scanning,
//! grouping, a playback engine and the session that ties them together.

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod groups;
pub mod library;
pub mod logging;
pub mod playlists;
pub mod runtime;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;
