//! # Temporal Module
//!
//! Timestamp handling for validity intervals. Both stores serialize
//! timestamps as `YYYY-MM-DD HH:MM:SS+00:00` strings in UTC; internally we
//! work with UTC epoch seconds to keep comparisons and sorting cheap.

use anyhow::Context;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// A temporal instant as UTC epoch seconds.
pub type Timestamp = i64;

/// Sentinel for an open-ended validity interval: `2999-12-31 23:59:59+00:00`.
///
/// The primary store marks the current binding of a device with this
/// far-future end timestamp rather than a NULL, so "still valid" is an
/// ordinary comparison.
pub const OPEN_END: Timestamp = 32_503_679_999;

/// Wire format used by both stores for validity timestamps.
const STORE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// Parse a store timestamp string into epoch seconds.
pub fn parse_timestamp(text: &str) -> anyhow::Result<Timestamp> {
    let parsed = OffsetDateTime::parse(text, STORE_FORMAT)
        .with_context(|| format!("invalid timestamp: {text}"))?;
    Ok(parsed.unix_timestamp())
}

/// Format epoch seconds back into the stores' timestamp format.
pub fn format_timestamp(instant: Timestamp) -> anyhow::Result<String> {
    let datetime = OffsetDateTime::from_unix_timestamp(instant)
        .with_context(|| format!("timestamp out of range: {instant}"))?;
    datetime
        .format(STORE_FORMAT)
        .with_context(|| format!("cannot format timestamp: {instant}"))
}

/// Whether a validity end marks an open-ended (still current) interval.
#[inline]
pub fn is_open_ended(end: Timestamp) -> bool {
    end == OPEN_END
}
