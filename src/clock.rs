//! Wall-clock helpers in the configured timezone

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format used for `time`, `last_updated` and heartbeat payloads
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time in `tz`
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Current time in `tz`, formatted as `YYYY-MM-DD HH:MM:SS`
pub fn format_now(tz: Tz) -> String {
    now_in(tz).format(TIME_FORMAT).to_string()
}
