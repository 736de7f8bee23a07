//! In-memory backend for engine and session tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::PlaybackError;

use super::backend::{AudioBackend, Pipeline};

/// Knobs and observations shared between a test and the backend it handed out.
#[derive(Default)]
struct Shared {
    opened: Mutex<Vec<PathBuf>>,
    gate: Mutex<Option<Receiver<()>>>,
    failing: Mutex<HashSet<PathBuf>>,
    duration: Mutex<Option<Duration>>,
    pipelines: Mutex<Vec<Arc<PipelineControl>>>,
    shut_down: AtomicBool,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    shared: Arc<Shared>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported by every later `open`.
    pub fn set_duration(&self, duration: Option<Duration>) {
        *self.shared.duration.lock().unwrap() = duration;
    }

    /// Make opening `path` fail with a decode error.
    pub fn fail_on(&self, path: &Path) {
        self.shared.failing.lock().unwrap().insert(path.to_path_buf());
    }

    /// Block the next `open` until the returned sender fires (or is dropped).
    pub fn hold_next_open(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.shared.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.shared.opened.lock().unwrap().clone()
    }

    /// Controls of every pipeline attached so far, oldest first.
    pub fn pipelines(&self) -> Vec<Arc<PipelineControl>> {
        self.shared.pipelines.lock().unwrap().clone()
    }

    pub fn last_pipeline(&self) -> Arc<PipelineControl> {
        self.pipelines().pop().expect("no pipeline attached")
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shut_down.load(Ordering::SeqCst)
    }
}

impl AudioBackend for FakeBackend {
    type Source = PathBuf;
    type Pipeline = FakePipeline;

    fn open(&self, path: &Path) -> Result<(PathBuf, Option<Duration>), PlaybackError> {
        let gate = self.shared.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }

        self.shared.opened.lock().unwrap().push(path.to_path_buf());
        if self.shared.failing.lock().unwrap().contains(path) {
            return Err(PlaybackError::Decode {
                path: path.to_path_buf(),
                reason: "unsupported codec".into(),
            });
        }
        Ok((path.to_path_buf(), *self.shared.duration.lock().unwrap()))
    }

    fn attach(&self, path: &Path, _source: PathBuf, volume: f32) -> FakePipeline {
        let ctl = Arc::new(PipelineControl {
            path: path.to_path_buf(),
            volume: Mutex::new(volume),
            ..PipelineControl::default()
        });
        self.shared.pipelines.lock().unwrap().push(ctl.clone());
        FakePipeline { ctl }
    }

    fn shutdown(&self) {
        self.shared.shut_down.store(true, Ordering::SeqCst);
    }
}

/// What a test can see and steer on one attached pipeline.
#[derive(Default)]
pub struct PipelineControl {
    pub path: PathBuf,
    playing: AtomicBool,
    finished: AtomicBool,
    released: AtomicBool,
    rewinds: AtomicUsize,
    position: Mutex<Duration>,
    volume: Mutex<f32>,
}

impl PipelineControl {
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn rewinds(&self) -> usize {
        self.rewinds.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    pub fn position(&self) -> Duration {
        *self.position.lock().unwrap()
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    /// Simulate the stream running dry at `position`.
    pub fn drain_at(&self, position: Duration) {
        self.set_position(position);
        self.finished.store(true, Ordering::SeqCst);
    }
}

pub struct FakePipeline {
    ctl: Arc<PipelineControl>,
}

impl Pipeline for FakePipeline {
    fn play(&mut self) {
        self.ctl.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&mut self) {
        self.ctl.playing.store(false, Ordering::SeqCst);
    }

    fn rewind(&mut self) -> Result<(), PlaybackError> {
        self.ctl.rewinds.fetch_add(1, Ordering::SeqCst);
        self.ctl.finished.store(false, Ordering::SeqCst);
        self.ctl.set_position(Duration::ZERO);
        Ok(())
    }

    fn position(&self) -> Duration {
        self.ctl.position()
    }

    fn seek(&mut self, position: Duration) {
        self.ctl.set_position(position);
    }

    fn set_volume(&mut self, volume: f32) {
        *self.ctl.volume.lock().unwrap() = volume;
    }

    fn is_finished(&self) -> bool {
        self.ctl.finished.load(Ordering::SeqCst)
    }
}

impl Drop for FakePipeline {
    fn drop(&mut self) {
        self.ctl.playing.store(false, Ordering::SeqCst);
        self.ctl.released.store(true, Ordering::SeqCst);
    }
}
