//! Configuration loader, schema types and persisted preferences.
//!
//! `Settings` is read-only configuration (file + environment). `Preferences`
//! holds the volume/shuffle/loop choices the session writes back on exit.

mod load;
mod preferences;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use preferences::*;
pub use schema::*;
