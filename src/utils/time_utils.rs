use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Formats how long ago an epoch-millis timestamp was, for set listings.
pub fn format_ago(timestamp_ms: i64) -> String {
    let diff = (now_ms() - timestamp_ms) / 1000;
    if diff <= 0 {
        return "just now".to_string();
    }

    let minutes = ((diff as f64) / 60.0).round() as i64;
    let hours = ((diff as f64) / 3600.0).round() as i64;
    let days = ((diff as f64) / 86_400.0).round() as i64;

    if days > 0 {
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if minutes > 0 {
        format!("{} minute{} ago", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        format!("{} second{} ago", diff, if diff == 1 { "" } else { "s" })
    }
}
