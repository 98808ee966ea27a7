//! Ban rules shared by login, session reads, and the admin surface.

use chrono::Duration;

use crate::types::Timestamp;

/// Whether a ban is in force at `now`.
///
/// A banned account with no end date is banned permanently; one whose end
/// date has passed is treated as not banned even if the flag is still set.
pub fn is_ban_active(is_banned: bool, banned_until: Option<Timestamp>, now: Timestamp) -> bool {
    if !is_banned {
        return false;
    }
    match banned_until {
        None => true,
        Some(until) => until > now,
    }
}

/// Compute the ban end date for a duration in days. `0` means permanent.
pub fn ban_until_from_days(duration_days: u32, now: Timestamp) -> Option<Timestamp> {
    if duration_days == 0 {
        None
    } else {
        Some(now + Duration::days(i64::from(duration_days)))
    }
}

/// User-facing message shown when a banned account tries to sign in.
pub fn ban_message(banned_until: Option<Timestamp>) -> String {
    match banned_until {
        Some(until) => format!(
            "You are banned until {}.",
            until.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "You are permanently banned.".to_string(),
    }
}
