pub mod table;
pub mod json;

use chrono::{DateTime, Duration, Utc};

/// Timestamp layout used in listings, e.g. `2024-5-1 9:3:7`.
pub const DATE_FORMAT: &str = "%Y-%-m-%-d %-H:%-M:%-S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Spell out a duration as hours, minutes and seconds.
///
/// Hours and minutes are omitted when zero, seconds are always present:
/// `"1 hour 2 minutes 3 seconds"`, `"0 second"`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    if hours > 0 {
        push_unit(&mut out, hours, "hour");
        out.push(' ');
    }
    if minutes > 0 {
        push_unit(&mut out, minutes, "minute");
        out.push(' ');
    }
    push_unit(&mut out, seconds, "second");
    out
}

fn push_unit(out: &mut String, value: i64, unit: &str) {
    out.push_str(&format!("{value} {unit}"));
    if value > 1 {
        out.push('s');
    }
}
