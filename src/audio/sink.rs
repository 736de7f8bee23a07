//! Utilities for creating `rodio` sinks from audio files.
//!
//! The helpers here encapsulate opening/decoding a file and preparing a
//! paused `Sink` that the engine drives through the `Pipeline` trait.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, Sink};
use tracing::{debug, warn};

use crate::error::PlaybackError;

use super::backend::Pipeline;

pub type FileDecoder = Decoder<BufReader<File>>;

/// Open `path` and hand it to rodio's decoder.
pub(super) fn open_decoder(path: &Path) -> Result<FileDecoder, PlaybackError> {
    let file = File::open(path).map_err(|source| PlaybackError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A `Sink` playing one file on the shared mixer.
pub struct RodioPipeline {
    sink: Sink,
    path: PathBuf,
}

impl RodioPipeline {
    /// Create a paused sink for `source` at `volume`.
    pub(super) fn new(mixer: &Mixer, path: &Path, source: FileDecoder, volume: f32) -> Self {
        let sink = Sink::connect_new(mixer);
        sink.set_volume(volume);
        sink.append(source);
        sink.pause();
        Self {
            sink,
            path: path.to_path_buf(),
        }
    }
}

impl Pipeline for RodioPipeline {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn rewind(&mut self) -> Result<(), PlaybackError> {
        // A drained sink has dropped its decoder; queue a fresh one.
        if self.sink.empty() {
            self.sink.append(open_decoder(&self.path)?);
            return Ok(());
        }

        if let Err(e) = self.sink.try_seek(Duration::ZERO) {
            debug!(path = %self.path.display(), error = %e, "seek to start failed, reopening");
            let paused = self.sink.is_paused();
            self.sink.clear();
            self.sink.append(open_decoder(&self.path)?);
            if !paused {
                self.sink.play();
            }
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn seek(&mut self, position: Duration) {
        // An empty sink would hold the seek for whatever source is appended next.
        if self.sink.empty() {
            debug!(path = %self.path.display(), "seek ignored on a drained sink");
            return;
        }
        if let Err(e) = self.sink.try_seek(position) {
            warn!(path = %self.path.display(), error = %e, "seek failed");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
