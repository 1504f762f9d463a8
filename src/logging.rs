//! Browser console logging through the `log` facade.

use log::LevelFilter;

/// Install the console logger. Later calls only adjust the level.
pub fn init(filter: LevelFilter) {
    if let Some(level) = filter.to_level() {
        // Err means a logger is already installed; keep it.
        let _ = console_log::init_with_level(level);
    }
    log::set_max_level(filter);
}
