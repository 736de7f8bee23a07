use std::path::Path;
use std::time::Duration;

use crate::error::PlaybackError;

/// One attached decode/output pipeline.
///
/// A pipeline is created paused and is owned exclusively by the engine.
/// Dropping it releases the output resources.
pub trait Pipeline: Send + 'static {
    fn play(&mut self);
    fn pause(&mut self);
    /// Move back to the start, reopening the stream if it was drained.
    fn rewind(&mut self) -> Result<(), PlaybackError>;
    fn position(&self) -> Duration;
    fn seek(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f32);
    /// The stream ran out of samples.
    fn is_finished(&self) -> bool;
}

/// Where decoders come from and where pipelines play.
///
/// Opening and attaching are split so a slow or failing open never touches
/// the pipeline that is currently loaded.
pub trait AudioBackend: Send + Sync + 'static {
    /// An opened, not yet attached decoder.
    type Source: Send;
    type Pipeline: Pipeline;

    /// Open `path` and start decoding it. Returns the decoder and its duration, if known.
    fn open(&self, path: &Path) -> Result<(Self::Source, Option<Duration>), PlaybackError>;

    /// Attach an opened decoder to the output, paused, at `volume`.
    fn attach(&self, path: &Path, source: Self::Source, volume: f32) -> Self::Pipeline;

    /// Release the output device.
    fn shutdown(&self) {}
}
