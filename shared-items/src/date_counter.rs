//! Sparse per-day activity log.

use chrono::{Days, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::dates::{elapsed_days, format_day, parse_day, AggregateMode, SortDirection, TimeFrame};

/// Count recorded on one calendar day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: f64,
}

/// Mapping from calendar day to a numeric count.
///
/// Days that were never logged read as zero. Range queries walk the range
/// day by day so results are always chronological.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateCounter {
    entries: BTreeMap<NaiveDate, f64>,
}

impl DateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the day's count
    pub fn log(&mut self, day: NaiveDate, delta: f64) {
        self.record(day, delta, false);
    }

    /// Replace the day's count
    pub fn set(&mut self, day: NaiveDate, value: f64) {
        self.record(day, value, true);
    }

    pub fn record(&mut self, day: NaiveDate, value: f64, overwrite: bool) {
        let slot = self.entries.entry(day).or_insert(0.0);
        if overwrite {
            *slot = value;
        } else {
            *slot += value;
        }
    }

    pub fn count_on(&self, day: NaiveDate) -> f64 {
        self.entries.get(&day).copied().unwrap_or(0.0)
    }

    /// Sum of each day from `start` to `end`, including `end` when `inclusive_end`
    pub fn count_in_range(&self, start: NaiveDate, end: NaiveDate, inclusive_end: bool) -> f64 {
        let mut total = 0.0;
        let mut curr = start;
        while curr < end || (inclusive_end && curr == end) {
            total += self.count_on(curr);
            match curr.succ_opt() {
                Some(next) => curr = next,
                None => break,
            }
        }
        total
    }

    /// Every day of the inclusive range with its count, zeros included
    pub fn range_activity(&self, start: NaiveDate, end: NaiveDate) -> Vec<DayCount> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|day| DayCount {
                day,
                count: self.count_on(day),
            })
            .collect()
    }

    /// Sum of all entries, or the per-day average from the first entry up to `today`
    pub fn total(&self, mode: AggregateMode, today: NaiveDate) -> f64 {
        let sum: f64 = self.entries.values().sum();
        match mode {
            AggregateMode::Total => sum,
            AggregateMode::Average => match self.first_date() {
                None => 0.0,
                Some(first) => {
                    let days = (elapsed_days(first, today) + 1).max(1);
                    sum / days as f64
                }
            },
        }
    }

    /// Total (or average over `days`) of the last `days` days ending with `today`
    pub fn count_past_days(&self, days: u32, mode: AggregateMode, today: NaiveDate) -> f64 {
        if days == 0 {
            return 0.0;
        }
        let start = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(NaiveDate::MIN);
        let total = self.count_in_range(start, today, true);
        match mode {
            AggregateMode::Total => total,
            AggregateMode::Average => total / f64::from(days),
        }
    }

    pub fn count_over_time_frame(
        &self,
        count: u32,
        frame: TimeFrame,
        mode: AggregateMode,
        today: NaiveDate,
    ) -> f64 {
        self.count_past_days(count.saturating_mul(frame.days()), mode, today)
    }

    pub fn sorted_entries(&self, direction: SortDirection) -> Vec<DayCount> {
        let iter = self.entries.iter().map(|(day, count)| DayCount {
            day: *day,
            count: *count,
        });
        match direction {
            SortDirection::Ascending => iter.collect(),
            SortDirection::Descending => iter.rev().collect(),
        }
    }

    /// Split the inclusive range into at most `max_buckets` equal spans and
    /// sum each span. Each bucket is dated by its first day; the last bucket
    /// is cut off at `end`.
    pub fn bucketed_for_chart(&self, start: NaiveDate, end: NaiveDate, max_buckets: usize) -> Vec<DayCount> {
        if end < start || max_buckets == 0 {
            return Vec::new();
        }

        let days = elapsed_days(start, end) + 1;
        let bars = days.min(max_buckets as i64);
        let step = (days + bars - 1) / bars;

        let mut buckets = Vec::new();
        let mut curr = start;
        while curr <= end {
            let Some(next) = curr.checked_add_days(Days::new(step as u64)) else {
                buckets.push(DayCount {
                    day: curr,
                    count: self.count_in_range(curr, end, true),
                });
                break;
            };
            let count = if next > end {
                self.count_in_range(curr, end, true)
            } else {
                self.count_in_range(curr, next, false)
            };
            buckets.push(DayCount { day: curr, count });
            curr = next;
        }
        buckets
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next_back().copied()
    }

    /// Logged days in chronological order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.entries.keys().copied().collect()
    }

    /// Counts in chronological order of their days
    pub fn values(&self) -> Vec<f64> {
        self.entries.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, f64)> + '_ {
        self.entries.iter().map(|(day, count)| (*day, *count))
    }
}

impl FromIterator<(NaiveDate, f64)> for DateCounter {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        let mut counter = Self::new();
        for (day, count) in iter {
            counter.log(day, count);
        }
        counter
    }
}

impl Serialize for DateCounter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(day, count)| (format_day(*day), *count)))
    }
}

impl<'de> Deserialize<'de> for DateCounter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, f64>>::deserialize(deserializer)?.unwrap_or_default();
        let mut counter = Self::new();
        for (key, count) in raw {
            let day = parse_day(&key).map_err(D::Error::custom)?;
            counter.log(day, count);
        }
        Ok(counter)
    }
}
