//! Day-date normalization.
//!
//! Whatever dates the model proposed are discarded: day `i` is always
//! `start + i days`. The number of days returned is trusted as-is.

use chrono::NaiveDate;

use crate::models::trip::ItineraryDay;

/// Short human-readable date, e.g. `Jan 10, 2024`.
pub fn format_short(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Overwrite each day's date with a contiguous sequence anchored at `start`.
/// Every other field passes through untouched.
pub fn normalize(days: Vec<ItineraryDay>, start: NaiveDate) -> Vec<ItineraryDay> {
    days.into_iter()
        .zip(start.iter_days())
        .map(|(day, date)| ItineraryDay {
            date: format_short(date),
            ..day
        })
        .collect()
}
