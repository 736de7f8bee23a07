use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{OutputStreamBuilder, Source};
use tracing::{debug, info};

use crate::error::PlaybackError;

use super::backend::AudioBackend;
use super::sink::{FileDecoder, RodioPipeline, open_decoder};

/// The default output device, driven through rodio.
///
/// The `OutputStream` lives on a dedicated thread for as long as the backend
/// does; the engine only ever sees the stream's mixer.
pub struct RodioBackend {
    mixer: Mixer,
    release: Mutex<Option<Sender<()>>>,
    device_thread: Mutex<Option<JoinHandle<()>>>,
}

impl RodioBackend {
    /// Open the system's default output device.
    pub fn open_default() -> Result<Self, PlaybackError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<Mixer, String>>();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("groove-audio".into())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
                // but noisy for a console app.
                stream.log_on_drop(false);
                let _ = ready_tx.send(Ok(stream.mixer().clone()));

                // Hold the stream until shutdown or until the backend is dropped.
                let _ = release_rx.recv();
                debug!("closing output stream");
            })
            .map_err(|e| PlaybackError::NoOutputDevice(e.to_string()))?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| PlaybackError::NoOutputDevice("audio thread exited".into()))?
            .map_err(PlaybackError::NoOutputDevice)?;
        info!("opened default audio output");

        Ok(Self {
            mixer,
            release: Mutex::new(Some(release_tx)),
            device_thread: Mutex::new(Some(handle)),
        })
    }
}

impl AudioBackend for RodioBackend {
    type Source = FileDecoder;
    type Pipeline = RodioPipeline;

    fn open(&self, path: &Path) -> Result<(FileDecoder, Option<Duration>), PlaybackError> {
        let decoder = open_decoder(path)?;
        let duration = decoder.total_duration();
        Ok((decoder, duration))
    }

    fn attach(&self, path: &Path, source: FileDecoder, volume: f32) -> RodioPipeline {
        RodioPipeline::new(&self.mixer, path, source, volume)
    }

    fn shutdown(&self) {
        if let Ok(mut release) = self.release.lock() {
            release.take();
        }
        if let Ok(mut handle) = self.device_thread.lock() {
            if let Some(h) = handle.take() {
                let _ = h.join();
            }
        }
    }
}
