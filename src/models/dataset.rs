use chrono::{Datelike, NaiveDate};

use crate::models::TemperatureRecord;

/// The loaded table of daily records, sorted by date. Read-only after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<TemperatureRecord>,
    dropped_rows: usize,
}

impl Dataset {
    pub fn new(mut records: Vec<TemperatureRecord>) -> Self {
        // Stable sort keeps duplicate dates in source order.
        records.sort_by_key(|r| r.date);
        Self {
            records,
            dropped_rows: 0,
        }
    }

    pub fn with_dropped_rows(mut self, dropped_rows: usize) -> Self {
        self.dropped_rows = dropped_rows;
        self
    }

    pub fn records(&self) -> &[TemperatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows discarded by the loader because their date could not be parsed.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        self.date_range()
            .map(|(first, last)| (first.year(), last.year()))
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_range()
            .map(|(first, last)| first <= date && date <= last)
            .unwrap_or(false)
    }

    /// First record on `date`, if any.
    pub fn find(&self, date: NaiveDate) -> Option<&TemperatureRecord> {
        let idx = self.records.partition_point(|r| r.date < date);
        self.records.get(idx).filter(|r| r.date == date)
    }

    /// Every record on the given month/day, in ascending year order.
    pub fn same_day(&self, month: u32, day: u32) -> impl Iterator<Item = &TemperatureRecord> {
        self.records
            .iter()
            .filter(move |r| r.is_same_day(month, day))
    }

    /// Records whose year lies in `from..=to`.
    pub fn years_between(&self, from: i32, to: i32) -> impl Iterator<Item = &TemperatureRecord> {
        self.records
            .iter()
            .filter(move |r| (from..=to).contains(&r.year()))
    }
}
