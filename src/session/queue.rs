//! The active play sequence.
//!
//! The queue only answers "which index comes next"; actually switching
//! tracks is the session's job.

use rand::Rng;

use crate::library::Track;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    index: usize,
    shuffle: bool,
    loop_enabled: bool,
}

impl Queue {
    pub fn new(shuffle: bool, loop_enabled: bool) -> Self {
        Self {
            shuffle,
            loop_enabled,
            ..Self::default()
        }
    }

    /// Swap in a new track list, keeping `keep` selected when it is part of it.
    pub fn replace(&mut self, tracks: Vec<Track>, keep: Option<&Track>) {
        self.index = keep
            .and_then(|k| tracks.iter().position(|t| t == k))
            .unwrap_or(0);
        self.tracks = tracks;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current index; `None` only for an empty queue.
    pub fn index(&self) -> Option<usize> {
        (!self.tracks.is_empty()).then_some(self.index)
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Point the queue at `track`. Returns `false` when it is not queued.
    pub fn select(&mut self, track: &Track) -> bool {
        match self.tracks.iter().position(|t| t == track) {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn set_shuffle(&mut self, on: bool) {
        self.shuffle = on;
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop(&mut self, on: bool) {
        self.loop_enabled = on;
    }

    /// Index to move to on "next". `None` when there is nowhere else to go.
    pub fn next_index<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let len = self.tracks.len();
        if len <= 1 {
            return None;
        }
        if self.shuffle {
            return Some(rng.gen_range(0..len));
        }
        Some((self.index + 1) % len)
    }

    /// Index to move to on "previous". Shuffle has no history, so it draws again.
    pub fn previous_index<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let len = self.tracks.len();
        if len <= 1 {
            return None;
        }
        if self.shuffle {
            return Some(rng.gen_range(0..len));
        }
        Some((self.index + len - 1) % len)
    }
}
