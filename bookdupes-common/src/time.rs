//! Timestamp utilities

use chrono::Local;

/// Local-time suffix used to keep colliding trash destinations apart
///
/// Format: `YYYYmmdd-HHMMSS` (e.g. `20240131-235959`)
pub fn now_suffix() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}
