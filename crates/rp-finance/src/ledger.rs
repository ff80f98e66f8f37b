//! Weekly hours ledger
//!
//! Hours are keyed by the Sunday that starts their week. A week
//! `[sunday, sunday + 6]` is editable while it overlaps the line item's
//! `[start_date, end_date]`.
//!
//! Older records were keyed on Mondays. When records are loaded, a Monday key
//! is read as the preceding Sunday (any other non-Sunday key as the Sunday of
//! its week). A Sunday-keyed record always wins over a re-keyed one for the
//! same week, and among several re-keyed records the first one wins.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rp_core::types::DateRange;
use rp_models::{LineItem, WeeklyHour};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Week of {week} is outside {start}..{end}")]
    WeekOutOfRange {
        week: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("{0} is not a week start (Sunday)")]
    NotWeekStart(NaiveDate),

    #[error("Hours for week of {week} must not be negative: {hours}")]
    NegativeHours { week: NaiveDate, hours: Decimal },
}

/// Sunday starting the week that contains `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Saturday ending the week that starts on `week`
pub fn week_end(week: NaiveDate) -> NaiveDate {
    week + Duration::days(6)
}

/// Whether the week starting on `week` shares a day with `range`
pub fn week_overlaps(week: NaiveDate, range: &DateRange) -> bool {
    range.overlaps(week, week_end(week))
}

/// Sundays of every week overlapping `[start, end]`, in order
pub fn weeks_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    let last = week_start(end);
    let mut weeks = Vec::new();
    let mut week = week_start(start);
    while week <= last {
        weeks.push(week);
        week += Duration::days(7);
    }
    weeks
}

/// Weekly hours of one line item, bounded by its date range
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyHoursLedger {
    range: DateRange,
    hours: BTreeMap<NaiveDate, Decimal>,
}

impl WeeklyHoursLedger {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            hours: BTreeMap::new(),
        }
    }

    /// Build a ledger from stored records, applying the legacy key rule
    pub fn from_records(range: DateRange, records: &[WeeklyHour]) -> Self {
        let mut current = BTreeMap::new();
        let mut legacy = BTreeMap::new();

        for record in records {
            if record.week_start_date.weekday() == Weekday::Sun {
                current.entry(record.week_start_date).or_insert(record.hours);
            } else {
                legacy
                    .entry(week_start(record.week_start_date))
                    .or_insert(record.hours);
            }
        }

        legacy.extend(current);
        Self {
            range,
            hours: legacy,
        }
    }

    pub fn from_line_item(item: &LineItem) -> Self {
        Self::from_records(item.date_range(), &item.weekly_hours)
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn is_editable(&self, week: NaiveDate) -> bool {
        week_overlaps(week_start(week), &self.range)
    }

    /// Stored hours for the week containing `date`, zero when absent
    pub fn hours(&self, date: NaiveDate) -> Decimal {
        self.hours
            .get(&week_start(date))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Write hours for an editable week
    pub fn set_hours(&mut self, week: NaiveDate, hours: Decimal) -> Result<(), LedgerError> {
        if week.weekday() != Weekday::Sun {
            return Err(LedgerError::NotWeekStart(week));
        }
        if hours < Decimal::ZERO {
            return Err(LedgerError::NegativeHours { week, hours });
        }
        if !self.is_editable(week) {
            return Err(LedgerError::WeekOutOfRange {
                week,
                start: self.range.start,
                end: self.range.end,
            });
        }
        self.hours.insert(week, hours);
        Ok(())
    }

    /// Move or resize the date range.
    ///
    /// Weeks holding non-zero hours that no longer overlap the new range are
    /// zeroed; their Sundays are returned so the caller can persist the
    /// zeroes.
    pub fn apply_date_range(&mut self, range: DateRange) -> Vec<NaiveDate> {
        self.range = range;
        let mut cleared = Vec::new();
        for (week, hours) in self.hours.iter_mut() {
            if !hours.is_zero() && !week_overlaps(*week, &range) {
                *hours = Decimal::ZERO;
                cleared.push(*week);
            }
        }
        cleared
    }

    /// Sum of hours over `weeks` that overlap the range. A week listed more
    /// than once counts once. `None` when the sum overflows.
    pub fn hours_in_weeks(&self, weeks: &[NaiveDate]) -> Option<Decimal> {
        let mut seen = std::collections::BTreeSet::new();
        weeks
            .iter()
            .map(|w| week_start(*w))
            .filter(|w| seen.insert(*w))
            .filter(|w| week_overlaps(*w, &self.range))
            .try_fold(Decimal::ZERO, |total, w| total.checked_add(self.hours(w)))
    }

    /// Sum of every week overlapping the range, `None` on overflow
    pub fn total_hours(&self) -> Option<Decimal> {
        self.hours
            .iter()
            .filter(|(week, _)| week_overlaps(**week, &self.range))
            .try_fold(Decimal::ZERO, |total, (_, hours)| total.checked_add(*hours))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.hours.iter().map(|(w, h)| (*w, *h))
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Sunday-keyed records, ordered by week
    pub fn to_records(&self) -> Vec<WeeklyHour> {
        self.iter().map(|(w, h)| WeeklyHour::new(w, h)).collect()
    }
}
