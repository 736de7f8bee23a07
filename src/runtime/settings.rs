use tracing::warn;

use crate::config;
use crate::logging;

/// Load settings and bring up logging from them.
///
/// Config is optional: problems are logged and the defaults are used.
pub fn load_settings() -> config::Settings {
    let (settings, problem) = config::Settings::load_or_default();
    logging::init(&settings.logging);
    if let Some(msg) = problem {
        warn!("{msg}");
    }
    settings
}
