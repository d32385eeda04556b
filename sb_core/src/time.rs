// ABOUTME: Utilities for working with times and timestamps.
// ABOUTME: Provides RFC3339 formatting and filesystem-safe screenshot names.
use ::time::{format_description::well_known::Rfc3339, OffsetDateTime};
use std::time::SystemTime;

/// Get the current system time
pub fn utc_now() -> SystemTime {
    SystemTime::now()
}

/// Convert a SystemTime to an RFC3339 timestamp string
///
/// # Examples
///
/// ```
/// use sb_core::to_rfc3339;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let time = UNIX_EPOCH + Duration::from_secs(1_609_459_200); // 2021-01-01
/// assert_eq!(to_rfc3339(time), "2021-01-01T00:00:00Z");
/// ```
pub fn to_rfc3339(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Get current time as an RFC3339 formatted string
pub fn now_iso8601() -> String {
    to_rfc3339(utc_now())
}

/// Format a timestamp for use in a screenshot filename.
///
/// Second precision, colons replaced with dashes so the result is safe on
/// every filesystem: `2021-01-01T00-00-00`. This is the name format the
/// player management backend expects alongside uploads.
///
/// # Examples
///
/// ```
/// use sb_core::screenshot_timestamp;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let time = UNIX_EPOCH + Duration::from_secs(1_609_459_200);
/// assert_eq!(screenshot_timestamp(time), "2021-01-01T00-00-00");
/// ```
pub fn screenshot_timestamp(time: SystemTime) -> String {
    // RFC3339 always leads with "YYYY-MM-DDTHH:MM:SS"; keep that prefix and
    // swap the colons.
    to_rfc3339(time)
        .chars()
        .take(19)
        .map(|c| if c == ':' { '-' } else { c })
        .collect()
}
