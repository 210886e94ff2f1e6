use chrono::{Datelike, Duration, NaiveDate};

/// Subtract a number of calendar days from a date
pub fn subtract_days(date: NaiveDate, days: u32) -> NaiveDate {
    date - Duration::days(days as i64)
}

/// All dates from `start` to `end`, inclusive, one day apart
///
/// Returns an empty vector when `start > end`.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Format a date the way the map header shows it (DD/MM/YYYY)
pub fn formatted_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Zero-based index of the day within its year (Jan 1st = 0)
pub fn day_index_in_year(date: NaiveDate) -> u32 {
    date.ordinal0()
}
