//! Audio-related small types.
//!
//! This module defines the engine's observable state and the timing
//! options it is constructed with.

use std::time::Duration;

use crate::config::AudioSettings;

/// Observable state of the playback engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing playing; a track may still be loaded.
    #[default]
    Stopped,
    /// A decoder is being opened for a new track.
    Loading,
    Playing,
    Paused,
    /// `shutdown()` was called; every later call is a no-op.
    Disposed,
}

/// Timing knobs for position sampling and end-of-track detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// How often the position is sampled while playing.
    pub position_interval: Duration,
    /// A stream that drains within this distance of its end counts as ended.
    pub end_tolerance: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&AudioSettings::default())
    }
}

impl From<&AudioSettings> for EngineOptions {
    fn from(settings: &AudioSettings) -> Self {
        Self {
            position_interval: Duration::from_millis(settings.position_interval_ms.max(1)),
            end_tolerance: Duration::from_millis(settings.end_tolerance_ms),
        }
    }
}
