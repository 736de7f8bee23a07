//! Audio file discovery and metadata extraction.

mod cover;
mod display;
mod extract;
mod model;
mod scan;
mod tempo;

pub use cover::{MAX_COVER_EDGE, decode_cover};
pub use display::{
    display_from_fields, format_bitrate, format_bpm, format_duration, format_file_size,
    format_sample_rate,
};
pub use extract::extract_track;
pub use model::{CoverArt, Track, TrackRecord, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_GENRE};
pub use scan::Scanner;
pub use tempo::{DEFAULT_BPM, GENRE_BPM_TABLE, GenreRule, derive_bpm, estimate_bpm_from_genre};
