use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::core::date::dates_between;

/// Error from date-axis construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AxisError {
    #[error("playback window must cover at least one day (got {days})")]
    InvalidWindow { days: u32 },
}

/// The ordered, contiguous sequence of calendar dates playback moves through
///
/// Built once per playback session and never mutated afterwards; the
/// scheduler rebuilds it whenever the window length or end anchor changes.
/// Invariant: strictly increasing, no missing days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateAxis {
    dates: Vec<NaiveDate>,
}

impl DateAxis {
    /// The empty axis held while playback is disabled
    pub fn empty() -> Self {
        Self { dates: Vec::new() }
    }

    /// Build an axis of `window_days` consecutive dates ending at `end`, inclusive
    pub fn ending_at(end: NaiveDate, window_days: u32) -> Result<Self, AxisError> {
        if window_days == 0 {
            return Err(AxisError::InvalidWindow { days: window_days });
        }
        let start = end
            .checked_sub_signed(Duration::days(window_days as i64 - 1))
            .ok_or(AxisError::InvalidWindow { days: window_days })?;
        Ok(Self::between(start, end))
    }

    /// Build an axis over an inclusive date range (empty when `start > end`)
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            dates: dates_between(start, end),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Date at a given index, if in range
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Index of the final date, `None` on an empty axis
    pub fn last_index(&self) -> Option<usize> {
        self.dates.len().checked_sub(1)
    }

    /// Saturate an arbitrary index into `[0, len - 1]`
    ///
    /// Returns `None` on an empty axis; never errors on out-of-range input.
    pub fn clamp_index(&self, index: i64) -> Option<usize> {
        let last = self.last_index()?;
        Some(index.clamp(0, last as i64) as usize)
    }

    /// Position of a date on the axis (the axis is sorted, so binary search)
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}
