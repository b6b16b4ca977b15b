use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, TemperatureField, TemperatureRecord};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// Descriptive statistics over the present values of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStats {
    pub mean: f64,
    /// Sample standard deviation; `None` below two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl FieldStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            Some((sum_sq / (count - 1) as f64).sqrt())
        } else {
            None
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev,
            min,
            max,
            count,
        })
    }
}

/// The same-day historical distribution for one month/day.
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalStats {
    pub month: u32,
    pub day: u32,
    /// Number of records on this month/day, including ones with missing values.
    pub count: usize,
    pub year_range: (i32, i32),
    pub average: Option<FieldStats>,
    pub minimum: Option<FieldStats>,
    pub maximum: Option<FieldStats>,
    /// Matching records in ascending year order.
    pub history: Vec<TemperatureRecord>,
}

impl HistoricalStats {
    pub fn field(&self, field: TemperatureField) -> Option<&FieldStats> {
        match field {
            TemperatureField::Average => self.average.as_ref(),
            TemperatureField::Minimum => self.minimum.as_ref(),
            TemperatureField::Maximum => self.maximum.as_ref(),
        }
    }

    pub fn mean(&self, field: TemperatureField) -> Option<f64> {
        self.field(field).map(|s| s.mean)
    }

    pub fn years(&self) -> usize {
        (self.year_range.1 - self.year_range.0 + 1) as usize
    }
}

/// Competition rank of `value` among `values` ordered from highest to
/// lowest: ties share the best rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayRank {
    pub rank: usize,
    pub total: usize,
}

/// Percentage of `values` strictly below `value`. `None` for an empty slice.
pub fn percentile_rank(values: &[f64], value: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let below = values.iter().filter(|v| **v < value).count();
    Some(below as f64 * 100.0 / values.len() as f64)
}

/// One plus the number of values strictly greater than `value`.
pub fn descending_min_rank(values: &[f64], value: f64) -> usize {
    1 + values.iter().filter(|v| **v > value).count()
}

/// Compares a day against every recorded year sharing its month and day.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoricalComparator;

impl HistoricalComparator {
    pub fn new() -> Self {
        Self
    }

    pub fn stats(&self, dataset: &Dataset, month: u32, day: u32) -> Result<HistoricalStats> {
        let history: Vec<TemperatureRecord> = dataset.same_day(month, day).cloned().collect();

        let (first, last) = match (history.first(), history.last()) {
            (Some(first), Some(last)) => (first.year(), last.year()),
            _ => return Err(ProcessingError::InsufficientHistory { month, day }),
        };

        let field_stats = |field: TemperatureField| {
            let values: Vec<f64> = history.iter().filter_map(|r| r.value(field)).collect();
            FieldStats::from_values(&values)
        };

        let stats = HistoricalStats {
            month,
            day,
            count: history.len(),
            year_range: (first, last),
            average: field_stats(TemperatureField::Average),
            minimum: field_stats(TemperatureField::Minimum),
            maximum: field_stats(TemperatureField::Maximum),
            history,
        };

        debug!(
            "{:02}-{:02}: {} records from {} to {}",
            month, day, stats.count, first, last
        );

        Ok(stats)
    }

    /// Percentile rank of `value` within the same-day distribution of `field`.
    pub fn percentile(
        &self,
        dataset: &Dataset,
        month: u32,
        day: u32,
        value: f64,
        field: TemperatureField,
    ) -> Result<f64> {
        let values = self.same_day_values(dataset, month, day, field);
        percentile_rank(&values, value).ok_or(ProcessingError::InsufficientHistory { month, day })
    }

    /// Rank of the record on `date` among its same-day distribution,
    /// hottest first.
    pub fn rank(&self, dataset: &Dataset, date: NaiveDate, field: TemperatureField) -> Result<DayRank> {
        let value = dataset
            .find(date)
            .and_then(|r| r.value(field))
            .ok_or(ProcessingError::NoData { date })?;

        let values = self.same_day_values(dataset, date.month(), date.day(), field);

        Ok(DayRank {
            rank: descending_min_rank(&values, value),
            total: values.len(),
        })
    }

    /// Mean of the same-day distribution leaving out one year.
    pub fn mean_excluding_year(
        &self,
        dataset: &Dataset,
        month: u32,
        day: u32,
        year: i32,
        field: TemperatureField,
    ) -> Option<f64> {
        let values: Vec<f64> = dataset
            .same_day(month, day)
            .filter(|r| r.year() != year)
            .filter_map(|r| r.value(field))
            .collect();
        FieldStats::from_values(&values).map(|s| s.mean)
    }

    fn same_day_values(
        &self,
        dataset: &Dataset,
        month: u32,
        day: u32,
        field: TemperatureField,
    ) -> Vec<f64> {
        dataset
            .same_day(month, day)
            .filter_map(|r| r.value(field))
            .collect()
    }
}
