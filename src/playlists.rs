//! User-made playlists.
//!
//! Unlike groups, playlists are edited by hand and survive library rescans;
//! their tracks are re-pointed at the new records by path.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::PlaylistError;
use crate::groups::ALL_TRACKS;
use crate::library::{Track, format_duration};

#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Playlist {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tracks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.contains(track)
    }

    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().map(|t| t.duration).sum()
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.total_duration())
    }

    /// Append `track` unless it is already listed.
    fn push_unique(&mut self, track: Track) -> bool {
        if self.contains(&track) {
            return false;
        }
        self.tracks.push(track);
        true
    }
}

/// Names compare case-insensitively, after trimming.
fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Whether `name` can never be used for a user playlist.
pub fn is_reserved(name: &str) -> bool {
    same_name(name, ALL_TRACKS)
}

/// The user playlists, in creation order.
#[derive(Debug, Clone, Default)]
pub struct Playlists {
    lists: Vec<Playlist>,
}

impl Playlists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Playlist] {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Playlist> {
        self.lists.iter().find(|p| same_name(&p.name, name))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.lists.iter().position(|p| same_name(&p.name, name))
    }

    /// Create a playlist holding `tracks` (duplicates dropped).
    pub fn create(&mut self, name: &str, tracks: Vec<Track>) -> Result<&Playlist, PlaylistError> {
        let name = checked_name(name)?;
        if self.position(name).is_some() {
            return Err(PlaylistError::Duplicate(name.to_string()));
        }

        let mut playlist = Playlist::new(name);
        for track in tracks {
            playlist.push_unique(track);
        }
        info!(playlist = %name, tracks = playlist.len(), "playlist created");
        self.lists.push(playlist);
        Ok(&self.lists[self.lists.len() - 1])
    }

    /// Add `track` to `name`, creating the playlist when it does not exist.
    ///
    /// Returns `Ok(false)` when the track was already in it.
    pub fn add(&mut self, name: &str, track: Track) -> Result<bool, PlaylistError> {
        let name = checked_name(name)?;
        match self.position(name) {
            Some(i) => Ok(self.lists[i].push_unique(track)),
            None => {
                self.create(name, vec![track])?;
                Ok(true)
            }
        }
    }

    /// Remove `track` from `name`. A playlist left empty is deleted.
    pub fn remove(&mut self, name: &str, track: &Track) -> bool {
        let Some(i) = self.position(name) else {
            return false;
        };
        let list = &mut self.lists[i];
        let Some(at) = list.tracks.iter().position(|t| t == track) else {
            return false;
        };
        list.tracks.remove(at);
        if list.is_empty() {
            debug!(playlist = %list.name, "removing emptied playlist");
            self.lists.remove(i);
        }
        true
    }

    pub fn delete(&mut self, name: &str) -> bool {
        if is_reserved(name) {
            return false;
        }
        match self.position(name) {
            Some(i) => {
                let removed = self.lists.remove(i);
                info!(playlist = %removed.name, "playlist deleted");
                true
            }
            None => false,
        }
    }

    /// Re-point every entry at the matching record of a new library, dropping
    /// tracks whose files are gone. Playlists themselves are kept.
    pub fn retain_library(&mut self, library: &[Track]) {
        let by_path: HashMap<&Path, &Track> =
            library.iter().map(|t| (t.path.as_path(), t)).collect();
        for list in &mut self.lists {
            let before = list.len();
            list.tracks = list
                .tracks
                .iter()
                .filter_map(|t| by_path.get(t.path.as_path()).map(|&t| t.clone()))
                .collect();
            if list.len() != before {
                let dropped = before - list.len();
                debug!(playlist = %list.name, dropped, "tracks left the library");
            }
        }
    }
}

fn checked_name(name: &str) -> Result<&str, PlaylistError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlaylistError::BlankName);
    }
    if is_reserved(name) {
        return Err(PlaylistError::Reserved(name.to_string()));
    }
    Ok(name)
}
