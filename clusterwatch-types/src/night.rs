//! Night detection for dimming a display.

use chrono::{Local, Timelike};

/// First hour (inclusive) of the night window.
pub const NIGHT_START_HOUR: u32 = 21;

/// First hour after the night window ends.
pub const NIGHT_END_HOUR: u32 = 6;

/// Whether `hour` (0-23) falls in `[21, 24) ∪ [0, 6)`.
pub fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Whether the given wall-clock time is at night.
pub fn is_night<T: Timelike>(time: &T) -> bool {
    is_night_hour(time.hour())
}

/// Whether it is currently night in local time.
///
/// Recomputed on every call; nothing is cached.
pub fn is_night_now() -> bool {
    is_night(&Local::now())
}
