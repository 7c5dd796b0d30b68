//! Http date helpers. Manifest timestamps are written in RFC1123 style, always
//! in UTC, with one second resolution, eg. `Wed, 01 Jan 2020 00:00:00
//! GMT+00:00`.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// [chrono] format string used for all manifest timestamps.
pub const FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT+00:00";

/// Formats `timestamp` as manifest date. Sub-second part is dropped.
///
/// # Examples
///
/// ```
/// # use afcache_pack_common::http_date::format;
/// # use chrono::{TimeZone, Utc};
/// let timestamp = Utc.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap();
/// assert_eq!(format(&timestamp), "Wed, 01 Jan 2020 01:00:00 GMT+00:00");
/// ```
pub fn format(timestamp: &DateTime<Utc>) -> String {
    timestamp.trunc_subsecs(0).format(FORMAT).to_string()
}

/// Parses manifest date created by [format].
pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let timestamp = NaiveDateTime::parse_from_str(value, FORMAT)?.and_utc();
    Ok(timestamp)
}
