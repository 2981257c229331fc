//! Relative timestamps for note lists ("5 min ago", "Yesterday").

use chrono::{DateTime, Utc};

/// Formats `then` relative to `now`.
///
/// Under a minute reads "Just now"; under an hour "N min ago"; then
/// "1 hour ago" / "N hours ago" up to a day, "Yesterday", "N days ago" for
/// the rest of the week, and a plain date (`Mar 1, 2026`) beyond that.
/// Timestamps in the future read as "Just now".
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if elapsed.num_seconds() < 60 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 2 {
        "1 hour ago".to_string()
    } else if hours < 24 {
        format!("{hours} hours ago")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{days} days ago")
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}
