//! Tempo (BPM) derivation.
//!
//! Sources are tried in a fixed order: an explicit BPM tag, a number written
//! next to "bpm" in the comment, and finally a per-genre estimate.

use std::sync::LazyLock;

use regex::Regex;

/// Used when nothing else gives a tempo.
pub const DEFAULT_BPM: u32 = 120;

const COMMENT_BPM_RANGE: std::ops::RangeInclusive<u32> = 1..=300;

/// How a genre row's keywords are matched against the lower-cased genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreRule {
    /// At least one keyword is a substring.
    Any(&'static [&'static str]),
    /// Every keyword is a substring, in any order.
    All(&'static [&'static str]),
}

impl GenreRule {
    pub fn matches(&self, genre: &str) -> bool {
        match self {
            GenreRule::Any(keywords) => keywords.iter().any(|k| genre.contains(k)),
            GenreRule::All(keywords) => keywords.iter().all(|k| genre.contains(k)),
        }
    }
}

/// Genre rules and their typical tempo. Evaluated top to bottom, first hit wins,
/// so the order is part of the behavior.
pub const GENRE_BPM_TABLE: &[(GenreRule, u32)] = &[
    (GenreRule::Any(&["ballad", "blues"]), 80),
    (GenreRule::Any(&["jazz"]), 90),
    (GenreRule::Any(&["rock"]), 120),
    (GenreRule::Any(&["pop"]), 110),
    (GenreRule::Any(&["metal"]), 140),
    (GenreRule::Any(&["electronic", "edm", "dance"]), 128),
    (GenreRule::Any(&["hip-hop", "hip hop", "hiphop", "rap"]), 100),
    (GenreRule::Any(&["reggae"]), 75),
    (GenreRule::Any(&["country"]), 95),
    (GenreRule::Any(&["classical"]), 80),
    (GenreRule::Any(&["ambient"]), 70),
    (GenreRule::Any(&["techno"]), 130),
    (GenreRule::Any(&["house"]), 125),
    (GenreRule::Any(&["trance"]), 135),
    (GenreRule::All(&["drum", "bass"]), 170),
    (GenreRule::Any(&["punk"]), 150),
    (GenreRule::Any(&["folk"]), 85),
];

static COMMENT_BPM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*bpm|bpm\s*:\s*(\d+)").expect("comment bpm pattern is valid")
});

/// Derive a track's tempo from its tags.
pub fn derive_bpm(explicit: Option<u32>, comment: Option<&str>, genre: Option<&str>) -> u32 {
    if let Some(bpm) = explicit.filter(|&b| b > 0) {
        return bpm;
    }
    if let Some(bpm) = comment.and_then(bpm_from_comment) {
        return bpm;
    }
    estimate_bpm_from_genre(genre)
}

/// Parse an explicit BPM tag value such as `128` or `127.9`.
pub fn parse_bpm_tag(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u32)
}

/// Look for a tempo written in a free-text comment.
pub fn bpm_from_comment(comment: &str) -> Option<u32> {
    let lower = comment.to_lowercase();
    let idx = lower.find("bpm")?;

    // "... 95 bpm": the word right before the first "bpm".
    if idx > 0 {
        let before = lower[..idx].trim();
        if let Some(last) = before.split(' ').next_back() {
            if let Ok(bpm) = last.parse::<u32>() {
                if COMMENT_BPM_RANGE.contains(&bpm) {
                    return Some(bpm);
                }
            }
        }
    }

    COMMENT_BPM
        .captures_iter(&lower)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
        .find(|bpm| COMMENT_BPM_RANGE.contains(bpm))
}

/// Estimate a tempo from the genre name.
pub fn estimate_bpm_from_genre(genre: Option<&str>) -> u32 {
    let Some(genre) = genre.map(str::trim).filter(|g| !g.is_empty()) else {
        return DEFAULT_BPM;
    };
    let genre = genre.to_lowercase();

    GENRE_BPM_TABLE
        .iter()
        .find(|(rule, _)| rule.matches(&genre))
        .map(|&(_, bpm)| bpm)
        .unwrap_or(DEFAULT_BPM)
}
