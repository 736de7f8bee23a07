use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::clamp_volume;
use crate::events::{Event, EventBus, EventKind};
use crate::library::Track;

use super::backend::{AudioBackend, Pipeline};
use super::ticker::Ticker;
use super::types::{EngineOptions, PlaybackState};

/// Everything the engine mutates, behind one lock.
struct EngineState<P> {
    track: Option<Track>,
    /// Only ever `Stopped`, `Playing` or `Paused`; loading and disposal are flags.
    state: PlaybackState,
    position: Duration,
    total: Duration,
    volume: f32,
    loading: bool,
    disposed: bool,
    pipeline: Option<P>,
    /// Events queued under the lock, in state-change order, awaiting `flush`.
    outbox: Vec<Event>,
}

impl<P: Pipeline> EngineState<P> {
    fn mirror_flags(&self) {
        if let Some(track) = &self.track {
            track.set_playback_flags(
                self.state == PlaybackState::Playing,
                self.state == PlaybackState::Paused,
            );
        }
    }
}

struct EngineInner<B: AudioBackend> {
    backend: B,
    options: EngineOptions,
    state: Mutex<EngineState<B::Pipeline>>,
    ticker: Mutex<Option<Ticker>>,
    /// Held while draining the outbox so concurrent flushes keep their order.
    emit_order: Mutex<()>,
    events: EventBus,
}

/// Owns the single decode/output pipeline and reports what it does.
///
/// Cloning yields another handle to the same engine. Every method is safe to
/// call from any thread. Events are queued under the state lock and emitted
/// after it is released, in the order the state changed.
pub struct PlaybackEngine<B: AudioBackend> {
    inner: Arc<EngineInner<B>>,
}

impl<B: AudioBackend> Clone for PlaybackEngine<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: AudioBackend> PlaybackEngine<B> {
    pub fn new(backend: B, options: EngineOptions, volume: f32) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                backend,
                options,
                state: Mutex::new(EngineState {
                    track: None,
                    state: PlaybackState::Stopped,
                    position: Duration::ZERO,
                    total: Duration::ZERO,
                    volume: clamp_volume(volume),
                    loading: false,
                    disposed: false,
                    pipeline: None,
                    outbox: Vec::new(),
                }),
                ticker: Mutex::new(None),
                emit_order: Mutex::new(()),
                events: EventBus::new(),
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self, kinds: &[EventKind]) -> std::sync::mpsc::Receiver<Event> {
        self.inner.events.subscribe(kinds)
    }

    fn lock(&self) -> MutexGuard<'_, EngineState<B::Pipeline>> {
        // A poisoned lock only means a panic elsewhere; the state itself stays coherent.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver queued events. Never called with the state lock held.
    fn flush(&self) {
        let _order = self
            .inner
            .emit_order
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let pending = std::mem::take(&mut self.lock().outbox);
        for event in pending {
            self.inner.events.emit(event);
        }
    }

    /// Load `track`, replacing whatever was loaded before.
    ///
    /// Returns `false` without touching the current session when the engine is
    /// disposed, another load is in flight, the file is missing, or the decoder
    /// cannot be opened.
    pub fn load(&self, track: &Track) -> bool {
        {
            let mut st = self.lock();
            if st.disposed {
                return false;
            }
            if st.loading {
                debug!(path = %track.path.display(), "load rejected: another load in flight");
                return false;
            }
            if !track.path.is_file() {
                warn!(path = %track.path.display(), "cannot load: file is missing");
                return false;
            }
            st.loading = true;
        }

        // Open the decoder outside the lock; a failure here leaves the loaded track alone.
        let opened = self.inner.backend.open(&track.path);

        let mut st = self.lock();
        st.loading = false;
        if st.disposed {
            return false;
        }
        let (source, duration) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                warn!(error = %e, "failed to load track");
                return false;
            }
        };

        if let Some(mut old) = st.pipeline.take() {
            old.pause();
        }
        if let Some(old) = st.track.take() {
            old.set_playback_flags(false, false);
        }

        let pipeline = self.inner.backend.attach(&track.path, source, st.volume);
        st.pipeline = Some(pipeline);
        st.track = Some(track.clone());
        st.state = PlaybackState::Stopped;
        st.position = Duration::ZERO;
        st.total = duration.unwrap_or(track.duration);
        st.mirror_flags();
        st.outbox.push(Event::TrackChanged(Some(track.clone())));
        drop(st);

        self.stop_ticker();
        info!(path = %track.path.display(), "loaded track");
        self.flush();
        true
    }

    /// Start or resume output. Rewinds first when the stream already ran out.
    pub fn play(&self) {
        {
            let mut guard = self.lock();
            let st = &mut *guard;
            if st.disposed || st.loading || st.state == PlaybackState::Playing {
                return;
            }
            let Some(pipeline) = st.pipeline.as_mut() else {
                return;
            };
            if pipeline.is_finished() {
                if let Err(e) = pipeline.rewind() {
                    warn!(error = %e, "failed to restart track");
                    return;
                }
                st.position = Duration::ZERO;
            }
            pipeline.play();
            st.state = PlaybackState::Playing;
            st.mirror_flags();
            st.outbox.push(Event::PlaybackStarted);
        }

        self.start_ticker();
        self.flush();
    }

    pub fn pause(&self) {
        {
            let mut guard = self.lock();
            let st = &mut *guard;
            if st.disposed || st.state != PlaybackState::Playing {
                return;
            }
            if let Some(pipeline) = st.pipeline.as_mut() {
                pipeline.pause();
                st.position = pipeline.position().min(st.total);
            }
            st.state = PlaybackState::Paused;
            st.mirror_flags();
            st.outbox.push(Event::PlaybackPaused);
        }

        self.stop_ticker();
        self.flush();
    }

    /// Stop output and rewind to the start. Safe in any state.
    pub fn stop(&self) {
        {
            let mut st = self.lock();
            if st.disposed {
                return;
            }
            if let Some(pipeline) = st.pipeline.as_mut() {
                pipeline.pause();
                if let Err(e) = pipeline.rewind() {
                    warn!(error = %e, "failed to rewind on stop");
                }
            }
            st.state = PlaybackState::Stopped;
            st.position = Duration::ZERO;
            st.mirror_flags();
            if st.track.is_some() {
                st.outbox.push(Event::PlaybackStopped);
            }
        }

        self.stop_ticker();
        self.flush();
    }

    pub fn toggle_play_pause(&self) {
        if self.state() == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek to `position`, clamped to the track length.
    ///
    /// Ignored once the stream has drained; the next `play()` starts over.
    pub fn set_position(&self, position: Duration) {
        {
            let mut guard = self.lock();
            let st = &mut *guard;
            if st.disposed || st.loading || st.track.is_none() {
                return;
            }
            let position = position.min(st.total);
            let Some(pipeline) = st.pipeline.as_mut() else {
                return;
            };
            if pipeline.is_finished() {
                debug!("seek ignored: stream already drained");
                return;
            }
            pipeline.seek(position);
            st.position = position;
            st.outbox.push(Event::PositionChanged(position));
        }

        self.flush();
    }

    /// Seek to a percentage (0 to 100) of the track length.
    pub fn set_position_percent(&self, percent: f64) {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        let total = self.total_duration();
        self.set_position(total.mul_f64(percent / 100.0));
    }

    /// Set the output volume, clamped to `[0, 1]`.
    pub fn set_volume(&self, volume: f32) {
        let volume = clamp_volume(volume);
        {
            let mut st = self.lock();
            if st.disposed {
                return;
            }
            st.volume = volume;
            if let Some(pipeline) = st.pipeline.as_mut() {
                pipeline.set_volume(volume);
            }
            st.outbox.push(Event::VolumeChanged(volume));
        }
        self.flush();
    }

    /// Release the pipeline and the device. Every later call is a no-op.
    pub fn shutdown(&self) {
        {
            let mut st = self.lock();
            if st.disposed {
                return;
            }
            st.disposed = true;
            if let Some(mut pipeline) = st.pipeline.take() {
                pipeline.pause();
            }
            if let Some(track) = &st.track {
                track.set_playback_flags(false, false);
            }
            st.state = PlaybackState::Stopped;
            st.outbox.clear();
        }

        self.stop_ticker();
        self.inner.backend.shutdown();
        self.inner.events.close();
        info!("playback engine shut down");
    }

    pub fn current_track(&self) -> Option<Track> {
        self.lock().track.clone()
    }

    pub fn state(&self) -> PlaybackState {
        let st = self.lock();
        if st.disposed {
            PlaybackState::Disposed
        } else if st.loading {
            PlaybackState::Loading
        } else {
            st.state
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Current position; sampled live while playing.
    pub fn position(&self) -> Duration {
        let st = self.lock();
        match (&st.pipeline, st.state) {
            (Some(pipeline), PlaybackState::Playing) => pipeline.position().min(st.total),
            _ => st.position,
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.lock().total
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    fn start_ticker(&self) {
        let weak = Arc::downgrade(&self.inner);
        let ticker = Ticker::spawn(self.inner.options.position_interval, move || {
            match weak.upgrade() {
                Some(inner) => PlaybackEngine { inner }.tick(),
                None => false,
            }
        });

        let ticker = match ticker {
            Ok(ticker) => Some(ticker),
            Err(e) => {
                warn!(error = %e, "failed to start position sampling");
                None
            }
        };
        let previous = match self.inner.ticker.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, ticker),
            Err(_) => None,
        };
        drop(previous);
    }

    fn stop_ticker(&self) {
        let previous = match self.inner.ticker.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        drop(previous);
    }

    /// One position sample. Returns `false` once sampling should stop.
    fn tick(&self) -> bool {
        let keep_going = {
            let mut guard = self.lock();
            let st = &mut *guard;
            if st.disposed || st.state != PlaybackState::Playing {
                return false;
            }
            let Some(pipeline) = st.pipeline.as_ref() else {
                return false;
            };
            let finished = pipeline.is_finished();
            let sampled = pipeline.position().min(st.total);

            if !finished {
                st.position = sampled;
                st.outbox.push(Event::PositionChanged(sampled));
                true
            } else {
                // The sink may forget its position once drained; keep the furthest seen.
                st.position = st.position.max(sampled);
                st.state = PlaybackState::Stopped;
                st.mirror_flags();

                let remaining = st.total.saturating_sub(st.position);
                let event = match &st.track {
                    Some(track) if remaining <= self.inner.options.end_tolerance => {
                        debug!(?remaining, "track ended");
                        Event::SongEnded(track.clone())
                    }
                    _ => {
                        debug!(?remaining, "stream drained early");
                        Event::PlaybackStopped
                    }
                };
                st.outbox.push(event);
                false
            }
        };

        self.flush();
        keep_going
    }
}
