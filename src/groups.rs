//! Named, read-only views over a track set.
//!
//! Groups are rebuilt wholesale from the library; nothing here is updated
//! incrementally.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::GroupSettings;
use crate::library::{Track, UNKNOWN_GENRE, format_duration};

pub const ALL_TRACKS: &str = "All Tracks";
pub const RECENTLY_ADDED: &str = "Recently Added";
pub const LONG_TRACKS: &str = "Long Tracks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    All,
    Genre,
    RecentlyAdded,
    LongTracks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub kind: GroupKind,
    /// Attribute value the group was built from, e.g. the normalized genre.
    pub key: String,
    pub tracks: Vec<Track>,
    pub total_duration: Duration,
}

impl Group {
    fn new(
        name: impl Into<String>,
        kind: GroupKind,
        key: impl Into<String>,
        tracks: Vec<Track>,
    ) -> Self {
        let total_duration = tracks.iter().map(|t| t.duration).sum();
        Self {
            name: name.into(),
            kind,
            key: key.into(),
            tracks,
            total_duration,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// `mm:ss`, or `h:mm:ss` past an hour.
    pub fn formatted_duration(&self) -> String {
        format_duration(self.total_duration)
    }
}

/// Partition `tracks` into browsing groups.
///
/// Order: "All Tracks", one group per genre sorted by name, then "Recently
/// Added" and "Long Tracks" when they have members.
pub fn build_groups(tracks: &[Track], settings: &GroupSettings) -> Vec<Group> {
    let mut groups = Vec::new();
    if tracks.is_empty() {
        return groups;
    }

    let mut all = tracks.to_vec();
    sort_by_artist_title(&mut all);
    groups.push(Group::new(ALL_TRACKS, GroupKind::All, "", all));

    let mut by_genre: BTreeMap<String, Vec<Track>> = BTreeMap::new();
    for track in tracks {
        by_genre.entry(genre_key(&track.genre)).or_default().push(track.clone());
    }
    let mut genres: Vec<Group> = by_genre
        .into_iter()
        .map(|(key, mut members)| {
            sort_by_artist_title(&mut members);
            Group::new(title_case(&key), GroupKind::Genre, key, members)
        })
        .collect();
    genres.sort_by_cached_key(|g| g.name.to_lowercase());
    groups.extend(genres);

    if settings.recent_limit > 0 {
        let mut recent = tracks.to_vec();
        recent.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        recent.truncate(settings.recent_limit);
        groups.push(Group::new(RECENTLY_ADDED, GroupKind::RecentlyAdded, "", recent));
    }

    let threshold = Duration::from_secs(settings.long_track_secs);
    let mut long: Vec<Track> = tracks
        .iter()
        .filter(|t| t.duration > threshold)
        .cloned()
        .collect();
    if !long.is_empty() {
        long.sort_by(|a, b| b.duration.cmp(&a.duration));
        groups.push(Group::new(LONG_TRACKS, GroupKind::LongTracks, "", long));
    }

    groups
}

fn sort_by_artist_title(tracks: &mut [Track]) {
    tracks.sort_by_cached_key(|t| (t.artist.to_lowercase(), t.title.to_lowercase()));
}

/// Trimmed, lower-cased genre; blank becomes "unknown".
fn genre_key(genre: &str) -> String {
    let g = genre.trim();
    if g.is_empty() {
        UNKNOWN_GENRE.to_lowercase()
    } else {
        g.to_lowercase()
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::TrackRecord;
    use crate::testutil::track;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn names(groups: &[Group]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    fn titles(group: &Group) -> Vec<&str> {
        group.tracks.iter().map(|t| t.title.as_str()).collect()
    }

    fn library() -> Vec<Track> {
        vec![
            track("/m/1.mp3", "beta", "Song B", "rock", 200),
            track("/m/2.mp3", "Alpha", "Zed", "Rock ", 180),
            track("/m/3.mp3", "alpha", "apple", "Jazz", 400),
            track("/m/4.mp3", "Gamma", "Tune", "", 90),
            track("/m/5.mp3", "Delta", "Long One", "drum and bass", 600),
            track("/m/6.mp3", "Eps", "Mystery", UNKNOWN_GENRE, 120),
        ]
    }

    #[test]
    fn all_tracks_first_then_genres_by_name() {
        let groups = build_groups(&library(), &GroupSettings::default());
        assert_eq!(
            names(&groups),
            vec![
                ALL_TRACKS,
                "Drum And Bass",
                "Jazz",
                "Rock",
                "Unknown",
                RECENTLY_ADDED,
                LONG_TRACKS
            ]
        );
        assert_eq!(
            titles(&groups[0]),
            vec!["apple", "Zed", "Song B", "Long One", "Mystery", "Tune"]
        );
        assert_eq!(groups[0].kind, GroupKind::All);
    }

    #[test]
    fn genres_are_normalized_and_blank_is_unknown() {
        let groups = build_groups(&library(), &GroupSettings::default());
        let rock = groups.iter().find(|g| g.name == "Rock").unwrap();
        assert_eq!(rock.key, "rock");
        assert_eq!(rock.kind, GroupKind::Genre);
        assert_eq!(titles(rock), vec!["Zed", "Song B"]);

        let unknown = groups.iter().find(|g| g.name == "Unknown").unwrap();
        assert_eq!(titles(unknown), vec!["Mystery", "Tune"]);
    }

    #[test]
    fn long_tracks_are_longest_first() {
        let groups = build_groups(&library(), &GroupSettings::default());
        let long = groups.iter().find(|g| g.kind == GroupKind::LongTracks).unwrap();
        assert_eq!(titles(long), vec!["Long One", "apple"]);
        assert_eq!(long.total_duration, Duration::from_secs(1000));
        assert_eq!(long.formatted_duration(), "16:40");
    }

    #[test]
    fn recently_added_is_newest_first_and_limited() {
        let tracks: Vec<Track> = (0..5)
            .map(|i| {
                let mut t = TrackRecord::new(format!("/m/{i}.mp3"));
                t.date_added = Utc.with_ymd_and_hms(2024, 1, 1 + i, 0, 0, 0).unwrap();
                Arc::new(t)
            })
            .collect();
        let settings = GroupSettings {
            recent_limit: 3,
            ..GroupSettings::default()
        };

        let groups = build_groups(&tracks, &settings);
        let recent = groups.iter().find(|g| g.kind == GroupKind::RecentlyAdded).unwrap();
        assert_eq!(titles(recent), vec!["4", "3", "2"]);
    }

    #[test]
    fn synthetic_groups_only_when_non_empty() {
        let short = vec![track("/m/a.mp3", "A", "a", "Pop", 30)];
        let settings = GroupSettings {
            recent_limit: 0,
            ..GroupSettings::default()
        };
        let groups = build_groups(&short, &settings);
        assert_eq!(names(&groups), vec![ALL_TRACKS, "Pop"]);

        assert!(build_groups(&[], &GroupSettings::default()).is_empty());
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let tracks = library();
        let first = build_groups(&tracks, &GroupSettings::default());
        let second = build_groups(&tracks, &GroupSettings::default());
        assert_eq!(first, second);
    }

    #[test]
    fn total_duration_formats_hours() {
        let tracks: Vec<Track> = (0..3)
            .map(|i| track(&format!("/m/{i}.mp3"), "A", &format!("t{i}"), "Ambient", 1500))
            .collect();
        let groups = build_groups(&tracks, &GroupSettings::default());
        assert_eq!(groups[0].formatted_duration(), "1:15:00");
    }
}
