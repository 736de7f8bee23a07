//! Typed events published by the core.
//!
//! Consumers subscribe to the kinds they care about and receive events over an
//! `mpsc` channel, in the order the underlying state changed. Emitting never
//! blocks and never runs consumer code on the emitter's thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::library::Track;

#[derive(Debug, Clone)]
pub enum Event {
    /// A new track was loaded (or the current one was cleared).
    TrackChanged(Option<Track>),
    PlaybackStarted,
    PlaybackPaused,
    /// Playback stopped by request, or the stream drained before its end.
    PlaybackStopped,
    /// The stream of this track drained at (or within tolerance of) its end.
    SongEnded(Track),
    PositionChanged(Duration),
    ScanProgress(ScanProgress),
    /// Human-readable scan status: start, completion, per-file errors.
    ScanStatus(String),
    ScanFinished { tracks: usize },
    GroupsChanged { count: usize },
    /// A user playlist was created, edited or deleted.
    PlaylistsChanged { count: usize },
    ShuffleChanged(bool),
    LoopChanged(bool),
    VolumeChanged(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TrackChanged,
    PlaybackStarted,
    PlaybackPaused,
    PlaybackStopped,
    SongEnded,
    PositionChanged,
    ScanProgress,
    ScanStatus,
    ScanFinished,
    GroupsChanged,
    PlaylistsChanged,
    ShuffleChanged,
    LoopChanged,
    VolumeChanged,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TrackChanged(_) => EventKind::TrackChanged,
            Event::PlaybackStarted => EventKind::PlaybackStarted,
            Event::PlaybackPaused => EventKind::PlaybackPaused,
            Event::PlaybackStopped => EventKind::PlaybackStopped,
            Event::SongEnded(_) => EventKind::SongEnded,
            Event::PositionChanged(_) => EventKind::PositionChanged,
            Event::ScanProgress(_) => EventKind::ScanProgress,
            Event::ScanStatus(_) => EventKind::ScanStatus,
            Event::ScanFinished { .. } => EventKind::ScanFinished,
            Event::GroupsChanged { .. } => EventKind::GroupsChanged,
            Event::PlaylistsChanged { .. } => EventKind::PlaylistsChanged,
            Event::ShuffleChanged(_) => EventKind::ShuffleChanged,
            Event::LoopChanged(_) => EventKind::LoopChanged,
            Event::VolumeChanged(_) => EventKind::VolumeChanged,
        }
    }
}

/// Progress after one file of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProgress {
    /// 0.0 to 100.0.
    pub percent: f64,
    pub processed: usize,
    pub total: usize,
    pub file_name: String,
}

impl ScanProgress {
    pub fn new(processed: usize, total: usize, file_name: String) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (processed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            percent,
            processed,
            total,
            file_name,
        }
    }
}

struct Subscriber {
    /// `None` means every kind.
    kinds: Option<Vec<EventKind>>,
    tx: Sender<Event>,
}

impl Subscriber {
    fn wants(&self, kind: EventKind) -> bool {
        self.kinds.as_ref().is_none_or(|k| k.contains(&kind))
    }
}

/// Fan-out of events to any number of channel subscribers.
///
/// Cloning yields another handle to the same bus. After `close()` every emit
/// is a no-op.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive only the listed kinds.
    pub fn subscribe(&self, kinds: &[EventKind]) -> Receiver<Event> {
        self.add(Some(kinds.to_vec()))
    }

    /// Receive every event.
    pub fn subscribe_all(&self) -> Receiver<Event> {
        self.add(None)
    }

    fn add(&self, kinds: Option<Vec<EventKind>>) -> Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Subscriber { kinds, tx });
        }
        rx
    }

    /// Deliver `event` to every interested subscriber. Dropped receivers are pruned.
    pub fn emit(&self, event: Event) {
        if self.is_closed() {
            return;
        }
        let kind = event.kind();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|s| !s.wants(kind) || s.tx.send(event.clone()).is_ok());
        }
    }

    /// Stop delivering events and drop all subscribers.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}
