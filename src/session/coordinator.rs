//! Session model types: `Session`, `Command` and `LibraryStats`.
//!
//! The `Session` is a single-threaded owner driven by its caller. Slow work
//! (scanning a tree, opening a decoder) runs on worker threads; results come
//! back over channels and are applied by `process_pending`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, EngineOptions, PlaybackEngine, PlaybackState};
use crate::config::{Preferences, Settings, resolve_preferences_path};
use crate::error::{PlaylistError, ScanError};
use crate::events::{Event, EventBus, EventKind};
use crate::groups::{Group, build_groups};
use crate::library::{Scanner, Track, TrackRecord};
use crate::playlists::Playlists;

use super::queue::Queue;

/// Where to seek to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seek {
    To(Duration),
    /// 0 to 100.
    Percent(f64),
}

/// Everything a front end can ask the session to do.
#[derive(Debug, Clone)]
pub enum Command {
    Scan(PathBuf),
    Play(Track),
    Pause,
    Stop,
    TogglePlayPause,
    Next,
    Previous,
    Seek(Seek),
    SetVolume(f32),
    ToggleShuffle,
    ToggleLoop,
    /// Index into `Session::groups()`.
    LoadGroup(usize),
    CreatePlaylist { name: String, tracks: Vec<Track> },
    AddToPlaylist { name: String, track: Track },
    RemoveFromPlaylist { name: String, track: Track },
    DeletePlaylist(String),
    /// Make the named user playlist the queue.
    LoadPlaylist(String),
}

/// Aggregate numbers over the current library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryStats {
    pub tracks: usize,
    pub groups: usize,
    pub genres: usize,
    pub artists: usize,
    pub total_duration: Duration,
}

type ScanOutcome = Result<Vec<TrackRecord>, ScanError>;

struct LoadOutcome {
    track: Track,
    loaded: bool,
}

/// The playlist/session coordinator.
pub struct Session<B: AudioBackend> {
    engine: PlaybackEngine<B>,
    engine_events: Receiver<Event>,
    scanner: Scanner,
    events: EventBus,
    settings: Settings,
    library: Vec<Track>,
    groups: Vec<Group>,
    playlists: Playlists,
    queue: Queue,
    prefs_path: Option<PathBuf>,
    scan_job: Option<Receiver<ScanOutcome>>,
    load_job: Option<Receiver<LoadOutcome>>,
    shut_down: bool,
}

impl<B: AudioBackend> Session<B> {
    /// Create a session, restoring preferences from their resolved location.
    pub fn new(backend: B, settings: Settings) -> Self {
        let configured = settings.session.preferences_path.as_deref();
        let prefs_path = match resolve_preferences_path(configured) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "preferences will not be persisted");
                None
            }
        };
        Self::with_preferences_path(backend, settings, prefs_path)
    }

    /// Create a session that keeps its preferences at `prefs_path`.
    ///
    /// A missing or unreadable preferences file silently yields the defaults.
    pub fn with_preferences_path(
        backend: B,
        settings: Settings,
        prefs_path: Option<PathBuf>,
    ) -> Self {
        let prefs = match prefs_path.as_deref().map(Preferences::load_from) {
            Some(Ok(prefs)) => prefs,
            Some(Err(e)) => {
                debug!(error = %e, "using default preferences");
                Preferences::default()
            }
            None => Preferences::default(),
        };

        let options = EngineOptions::from(&settings.audio);
        let engine = PlaybackEngine::new(backend, options, prefs.volume);
        let engine_events = engine.events().subscribe_all();
        let events = EventBus::new();
        let scanner = Scanner::new(settings.library.clone(), events.clone());

        Self {
            engine,
            engine_events,
            scanner,
            events,
            settings,
            library: Vec::new(),
            groups: Vec::new(),
            playlists: Playlists::new(),
            queue: Queue::new(prefs.shuffle, prefs.loop_enabled),
            prefs_path,
            scan_job: None,
            load_job: None,
            shut_down: false,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self, kinds: &[EventKind]) -> Receiver<Event> {
        self.events.subscribe(kinds)
    }

    pub fn engine(&self) -> &PlaybackEngine<B> {
        &self.engine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library(&self) -> &[Track] {
        &self.library
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn playlists(&self) -> &Playlists {
        &self.playlists
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn current_track(&self) -> Option<Track> {
        self.engine.current_track()
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            volume: self.engine.volume(),
            shuffle: self.queue.shuffle(),
            loop_enabled: self.queue.loop_enabled(),
        }
    }

    pub fn preferences_path(&self) -> Option<&Path> {
        self.prefs_path.as_deref()
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_job.is_some()
    }

    /// A track switch is in flight, either here or inside the engine.
    pub fn is_loading(&self) -> bool {
        self.load_job.is_some() || self.engine.is_loading()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Apply a front-end command. Returns whether it was accepted.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Scan(dir) => self.scan(&dir),
            Command::Play(track) => self.play(&track),
            Command::Pause => {
                self.pause();
                true
            }
            Command::Stop => {
                self.stop();
                true
            }
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Next => self.next(),
            Command::Previous => self.previous(),
            Command::Seek(to) => {
                self.seek(to);
                true
            }
            Command::SetVolume(v) => {
                self.set_volume(v);
                true
            }
            Command::ToggleShuffle => {
                self.toggle_shuffle();
                true
            }
            Command::ToggleLoop => {
                self.toggle_loop();
                true
            }
            Command::LoadGroup(index) => self.load_group(index),
            Command::CreatePlaylist { name, tracks } => {
                report_refusal(&name, self.create_playlist(&name, tracks))
            }
            Command::AddToPlaylist { name, track } => {
                report_refusal(&name, self.add_to_playlist(&name, track))
            }
            Command::RemoveFromPlaylist { name, track } => self.remove_from_playlist(&name, &track),
            Command::DeletePlaylist(name) => self.delete_playlist(&name),
            Command::LoadPlaylist(name) => self.load_playlist(&name),
        }
    }

    /// Start scanning `dir` on a worker thread. Ignored while a scan is running.
    pub fn scan(&mut self, dir: &Path) -> bool {
        if self.shut_down {
            return false;
        }
        if self.scan_job.is_some() {
            debug!(dir = %dir.display(), "scan ignored: one is already running");
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let scanner = self.scanner.clone();
        let root = dir.to_path_buf();
        let spawned = thread::Builder::new()
            .name("groove-scan".into())
            .spawn(move || {
                let _ = tx.send(scanner.scan(&root));
            });

        match spawned {
            Ok(_) => {
                self.scan_job = Some(rx);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to start scan");
                self.events.emit(Event::ScanStatus(format!("Scan failed: {e}")));
                false
            }
        }
    }

    /// Switch to `track` and start playing it.
    ///
    /// The decoder is opened on a worker thread; the switch completes in a
    /// later `process_pending`. Rejected while another switch is in flight.
    pub fn play(&mut self, track: &Track) -> bool {
        if self.shut_down {
            return false;
        }
        if self.is_loading() {
            debug!(path = %track.path.display(), "play ignored: a track is still loading");
            return false;
        }

        self.engine.stop();

        let (tx, rx) = mpsc::channel();
        let engine = self.engine.clone();
        let requested = track.clone();
        let spawned = thread::Builder::new()
            .name("groove-load".into())
            .spawn(move || {
                let loaded = engine.load(&requested);
                let _ = tx.send(LoadOutcome {
                    track: requested,
                    loaded,
                });
            });

        match spawned {
            Ok(_) => {
                self.load_job = Some(rx);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to start loading");
                false
            }
        }
    }

    /// Play the queue entry at `index`.
    pub fn play_index(&mut self, index: usize) -> bool {
        match self.queue.get(index).cloned() {
            Some(track) => self.play(&track),
            None => false,
        }
    }

    pub fn next(&mut self) -> bool {
        if self.shut_down || self.is_loading() {
            return false;
        }
        match self.queue.next_index(&mut rand::thread_rng()) {
            Some(i) => self.play_index(i),
            None => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.shut_down || self.is_loading() {
            return false;
        }
        match self.queue.previous_index(&mut rand::thread_rng()) {
            Some(i) => self.play_index(i),
            None => false,
        }
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Pause or resume; with nothing loaded, start the queue's current entry.
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        if self.engine.current_track().is_some() {
            self.engine.toggle_play_pause();
            return true;
        }
        match self.queue.current().cloned() {
            Some(track) => self.play(&track),
            None => false,
        }
    }

    pub fn seek(&mut self, to: Seek) {
        match to {
            Seek::To(position) => self.engine.set_position(position),
            Seek::Percent(percent) => self.engine.set_position_percent(percent),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
    }

    pub fn toggle_shuffle(&mut self) {
        if self.shut_down {
            return;
        }
        let on = !self.queue.shuffle();
        self.queue.set_shuffle(on);
        self.events.emit(Event::ShuffleChanged(on));
    }

    pub fn toggle_loop(&mut self) {
        if self.shut_down {
            return;
        }
        let on = !self.queue.loop_enabled();
        self.queue.set_loop(on);
        self.events.emit(Event::LoopChanged(on));
    }

    /// Make group `index` the queue, keeping the current track selected when it is a member.
    pub fn load_group(&mut self, index: usize) -> bool {
        if self.shut_down {
            return false;
        }
        let Some(group) = self.groups.get(index) else {
            return false;
        };
        let tracks = group.tracks.clone();
        info!(group = %group.name, tracks = tracks.len(), "queue replaced by group");
        let current = self.engine.current_track();
        self.queue.replace(tracks, current.as_ref());
        true
    }

    /// Create a user playlist. Names are unique regardless of case, and the
    /// all-tracks name is reserved.
    pub fn create_playlist(&mut self, name: &str, tracks: Vec<Track>) -> Result<(), PlaylistError> {
        if self.shut_down {
            return Ok(());
        }
        self.playlists.create(name, tracks)?;
        self.playlists_changed();
        Ok(())
    }

    /// Add `track` to the playlist `name`, creating it when missing.
    /// Returns `Ok(false)` when the track was already listed.
    pub fn add_to_playlist(&mut self, name: &str, track: Track) -> Result<bool, PlaylistError> {
        if self.shut_down {
            return Ok(false);
        }
        let added = self.playlists.add(name, track)?;
        if added {
            self.playlists_changed();
        }
        Ok(added)
    }

    /// Remove `track` from the playlist `name`; an emptied playlist is deleted.
    pub fn remove_from_playlist(&mut self, name: &str, track: &Track) -> bool {
        if self.shut_down || !self.playlists.remove(name, track) {
            return false;
        }
        self.playlists_changed();
        true
    }

    pub fn delete_playlist(&mut self, name: &str) -> bool {
        if self.shut_down || !self.playlists.delete(name) {
            return false;
        }
        self.playlists_changed();
        true
    }

    /// Make the user playlist `name` the queue, keeping the current track
    /// selected when it is listed.
    pub fn load_playlist(&mut self, name: &str) -> bool {
        if self.shut_down {
            return false;
        }
        let Some(playlist) = self.playlists.get(name) else {
            debug!(playlist = %name, "no such playlist");
            return false;
        };
        let tracks = playlist.tracks.clone();
        info!(playlist = %playlist.name, tracks = tracks.len(), "queue replaced by playlist");
        let current = self.engine.current_track();
        self.queue.replace(tracks, current.as_ref());
        true
    }

    fn playlists_changed(&self) {
        self.events.emit(Event::PlaylistsChanged {
            count: self.playlists.len(),
        });
    }

    /// Case-insensitive substring search over title, artist, album and genre.
    /// A blank term matches the whole library.
    pub fn search(&self, term: &str) -> Vec<Track> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.library.clone();
        }
        self.library
            .iter()
            .filter(|t| {
                [&t.title, &t.artist, &t.album, &t.genre]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            })
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> LibraryStats {
        let genres: HashSet<String> = self
            .library
            .iter()
            .map(|t| t.genre.trim().to_lowercase())
            .collect();
        let artists: HashSet<String> = self
            .library
            .iter()
            .map(|t| t.artist.trim().to_lowercase())
            .collect();
        LibraryStats {
            tracks: self.library.len(),
            groups: self.groups.len(),
            genres: genres.len(),
            artists: artists.len(),
            total_duration: self.library.iter().map(|t| t.duration).sum(),
        }
    }

    /// Write volume, shuffle and loop to the preferences file.
    /// Failures are logged and reported as `false`.
    pub fn save_preferences(&self) -> bool {
        let Some(path) = self.prefs_path.as_deref() else {
            warn!("no preferences location; not saving");
            return false;
        };
        match self.preferences().save_to(path) {
            Ok(()) => {
                debug!(path = %path.display(), "preferences saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to save preferences");
                false
            }
        }
    }

    /// Apply finished background work and react to engine events.
    ///
    /// Call this regularly from the owning thread.
    pub fn process_pending(&mut self) {
        if self.shut_down {
            return;
        }
        self.poll_scan();
        self.poll_load();
        self.drain_engine_events();
    }

    fn poll_scan(&mut self) {
        let Some(rx) = &self.scan_job else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(ScanError::ShutDown),
        };
        self.scan_job = None;

        match outcome {
            Ok(records) => self.replace_library(records),
            Err(ScanError::ShutDown) => debug!("scan ended by shutdown"),
            Err(e) => {
                warn!(error = %e, "scan failed");
                self.events.emit(Event::ScanStatus(format!("Scan failed: {e}")));
            }
        }
    }

    fn replace_library(&mut self, records: Vec<TrackRecord>) {
        self.library = records.into_iter().map(Arc::new).collect();
        let current = self.engine.current_track();
        self.queue.replace(self.library.clone(), current.as_ref());
        self.groups = build_groups(&self.library, &self.settings.groups);
        self.playlists.retain_library(&self.library);

        info!(tracks = self.library.len(), groups = self.groups.len(), "library replaced");
        self.events.emit(Event::ScanFinished {
            tracks: self.library.len(),
        });
        self.events.emit(Event::GroupsChanged {
            count: self.groups.len(),
        });
    }

    fn poll_load(&mut self) {
        let Some(rx) = &self.load_job else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.load_job = None;
                return;
            }
        };
        self.load_job = None;

        if !outcome.loaded {
            warn!(path = %outcome.track.path.display(), "could not play track");
            return;
        }
        if !self.queue.select(&outcome.track) {
            debug!(path = %outcome.track.path.display(), "playing a track outside the queue");
        }
        self.engine.play();
    }

    fn drain_engine_events(&mut self) {
        let pending: Vec<Event> = self.engine_events.try_iter().collect();
        for event in pending {
            let ended = match &event {
                Event::SongEnded(track) => Some(track.clone()),
                _ => None,
            };
            self.events.emit(event);
            if let Some(track) = ended {
                self.on_song_ended(&track);
            }
        }
    }

    /// React to the end of `ended`, unless something newer already took over.
    fn on_song_ended(&mut self, ended: &Track) {
        let still_current = self.engine.current_track().as_ref() == Some(ended);
        if !still_current || self.is_loading() || self.engine.state() != PlaybackState::Stopped {
            debug!(path = %ended.path.display(), "ignoring end of a superseded track");
            return;
        }
        if self.queue.loop_enabled() {
            debug!(path = %ended.path.display(), "looping track");
            self.play(ended);
        } else {
            self.next();
        }
    }

    /// Save preferences, stop scanning and release the audio device.
    /// Every later call is a no-op.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.save_preferences();
        self.scanner.shutdown();
        self.engine.shutdown();
        self.events.close();
        self.shut_down = true;
        info!("session shut down");
    }
}

fn report_refusal<T>(name: &str, result: Result<T, PlaylistError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            warn!(playlist = %name, error = %e, "playlist edit refused");
            false
        }
    }
}
