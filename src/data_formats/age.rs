//! Human readable "age" of a post or comment, e.g. `3d` for three days.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Coarsest first. Months and minutes share the `m` suffix.
const UNITS: [(i64, char); 6] = [
    (YEAR, 'y'),
    (MONTH, 'm'),
    (WEEK, 'w'),
    (DAY, 'd'),
    (HOUR, 'h'),
    (MINUTE, 'm'),
];

/// Elapsed time between `created_at` and `now`, reduced to the coarsest
/// non-zero unit. Anything under a minute, or in the future, is `0m`.
pub fn age_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - created_at).num_seconds();
    if elapsed > 0 {
        for (seconds, suffix) in UNITS {
            let count = elapsed / seconds;
            if count > 0 {
                return format!("{}{}", count, suffix);
            }
        }
    }
    "0m".to_owned()
}
