//! Building blocks for the reporting endpoints: week bucketing and CSV rows.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Length of the trailing window covered by the weekly submission histogram.
pub const WEEKLY_WINDOW_WEEKS: i64 = 8;

/// Column titles of the score export, in order.
pub const SCORE_EXPORT_HEADER: [&str; 6] =
    ["Submission", "Judge", "Rubric", "Score", "Comment", "Scored At"];

/// One histogram bar: the Monday a week starts on, and how many rows fell in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct WeekBucket {
    #[schema(value_type = String, example = "2025-09-01")]
    pub week: NaiveDate,
    #[schema(example = 12)]
    pub count: u64,
}

/// The Monday on or before `date` (ISO week start).
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First instant counted by the histogram ending at `now`.
///
/// This is the first Monday at or after `now - WEEKLY_WINDOW_WEEKS`, so every
/// bucket covers a whole week and none is dated before the window opens.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let cutoff = (now - Duration::weeks(WEEKLY_WINDOW_WEEKS)).date_naive();
    let monday = week_start(cutoff);
    let first = if monday < cutoff {
        monday + Duration::weeks(1)
    } else {
        monday
    };
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Count timestamps per ISO week, oldest week first.
///
/// Timestamps before [`window_start`] are ignored. Weeks without any
/// timestamp are omitted.
pub fn weekly_histogram<I>(timestamps: I, now: DateTime<Utc>) -> Vec<WeekBucket>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let start = window_start(now);
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for ts in timestamps {
        if ts < start {
            continue;
        }
        *buckets.entry(week_start(ts.date_naive())).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(week, count)| WeekBucket { week, count })
        .collect()
}

/// Timestamp format used in the score export.
pub fn format_export_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Encode one CSV record, terminated with CRLF.
pub fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}
