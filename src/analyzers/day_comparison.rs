use crate::analyzers::{DayRank, HistoricalComparator, HistoricalStats, TemperatureBand};
use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, TemperatureField, TemperatureRecord};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// How one field of the selected day sits in its same-day history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparison {
    pub field: TemperatureField,
    pub value: f64,
    pub historical_mean: f64,
    pub deviation: f64,
    pub percentile: f64,
    pub band: TemperatureBand,
}

/// A selected date compared with every year sharing its month and day.
#[derive(Debug, Clone, Serialize)]
pub struct DayComparison {
    pub date: NaiveDate,
    pub record: TemperatureRecord,
    pub stats: HistoricalStats,
    /// Fields with both a value on the day and a historical mean.
    pub fields: Vec<FieldComparison>,
    /// Rank of the average temperature, hottest first.
    pub rank: Option<DayRank>,
    /// Historical mean average temperature without the selected year.
    pub past_mean: Option<f64>,
}

impl DayComparison {
    pub fn compare(
        comparator: &HistoricalComparator,
        dataset: &Dataset,
        date: NaiveDate,
    ) -> Result<Self> {
        if !dataset.contains_date(date) {
            return Err(ProcessingError::NoData { date });
        }
        let record = dataset
            .find(date)
            .cloned()
            .ok_or(ProcessingError::NoData { date })?;

        let (month, day) = (date.month(), date.day());
        let stats = comparator.stats(dataset, month, day)?;

        let mut fields = Vec::with_capacity(TemperatureField::ALL.len());
        for field in TemperatureField::ALL {
            let (value, mean) = match (record.value(field), stats.mean(field)) {
                (Some(value), Some(mean)) => (value, mean),
                _ => continue,
            };
            let percentile = comparator.percentile(dataset, month, day, value, field)?;
            fields.push(FieldComparison {
                field,
                value,
                historical_mean: mean,
                deviation: value - mean,
                percentile,
                band: TemperatureBand::from_percentile(percentile),
            });
        }

        let rank = comparator
            .rank(dataset, date, TemperatureField::Average)
            .ok();
        let past_mean = comparator.mean_excluding_year(
            dataset,
            month,
            day,
            date.year(),
            TemperatureField::Average,
        );

        Ok(Self {
            date,
            record,
            stats,
            fields,
            rank,
            past_mean,
        })
    }

    pub fn field(&self, field: TemperatureField) -> Option<&FieldComparison> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} compared with {:02}-{:02} in {} records ({}~{})",
            self.date,
            self.stats.month,
            self.stats.day,
            self.stats.count,
            self.stats.year_range.0,
            self.stats.year_range.1
        )];

        for comparison in &self.fields {
            lines.push(format!(
                "- {}: {:.1}°C, historical mean {:.1}°C, deviation {:+.1}°C, lower {:.1}% ({})",
                comparison.field,
                comparison.value,
                comparison.historical_mean,
                comparison.deviation,
                comparison.percentile,
                comparison.band
            ));
        }

        for field in TemperatureField::ALL {
            if self.field(field).is_none() {
                lines.push(format!("- {}: no data", field));
            }
        }

        if let (Some(past_mean), Some(avg)) = (self.past_mean, self.record.avg_temp) {
            lines.push(format!(
                "Average vs other years: {:+.1}°C (mean of other years {:.1}°C)",
                avg - past_mean,
                past_mean
            ));
        }

        if let Some(rank) = self.rank {
            lines.push(format!(
                "Ranked #{} warmest of {} recorded {:02}-{:02} days",
                rank.rank, rank.total, self.stats.month, self.stats.day
            ));
        }

        lines.join("\n")
    }

    /// Year-by-year history, one line per record.
    pub fn history_table(&self) -> String {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |t| format!("{:.1}", t));
        let mut lines = vec!["year    avg    min    max".to_string()];
        for record in &self.stats.history {
            let marker = if record.date == self.date { " <" } else { "" };
            lines.push(format!(
                "{:<4} {:>6} {:>6} {:>6}{}",
                record.year(),
                fmt(record.avg_temp),
                fmt(record.min_temp),
                fmt(record.max_temp),
                marker
            ));
        }
        lines.join("\n")
    }
}
