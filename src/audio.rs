//! Playback engine and its audio backends.
//!
//! `PlaybackEngine` owns one decode/output pipeline at a time and publishes
//! state changes on its event bus. The backend seam keeps rodio behind the
//! `AudioBackend`/`Pipeline` traits.

mod backend;
mod device;
mod engine;
mod sink;
mod ticker;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::{AudioBackend, Pipeline};
pub use device::RodioBackend;
pub use engine::PlaybackEngine;
pub use sink::{FileDecoder, RodioPipeline};
pub use types::{EngineOptions, PlaybackState};

#[cfg(test)]
mod tests;
