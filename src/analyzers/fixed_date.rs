use crate::analyzers::{HistoricalComparator, TemperatureBand};
use crate::models::{Dataset, FixedDateCalendar, TemperatureField};
use crate::utils::constants::{
    COLDER_THAN_NORMAL_MAX_PERCENTILE, COLD_POOL_MAX_PERCENTILE, DEFAULT_TOP_N,
    WARM_POOL_MIN_PERCENTILE,
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// A calendar entry joined to its dataset record and same-day history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixedDateEntry {
    pub label: String,
    pub date: NaiveDate,
    pub avg_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub historical_mean: Option<f64>,
    pub deviation: Option<f64>,
    pub percentile: Option<f64>,
}

impl FixedDateEntry {
    pub fn value(&self, field: TemperatureField) -> Option<f64> {
        match field {
            TemperatureField::Average => self.avg_temp,
            TemperatureField::Minimum => self.min_temp,
            TemperatureField::Maximum => self.max_temp,
        }
    }

    pub fn band(&self) -> Option<TemperatureBand> {
        self.percentile.map(TemperatureBand::from_percentile)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedDateAnnotator {
    comparator: HistoricalComparator,
}

impl FixedDateAnnotator {
    pub fn new() -> Self {
        Self {
            comparator: HistoricalComparator::new(),
        }
    }

    /// Join every calendar entry that has a record in `dataset`, in calendar
    /// order. Entries without a record are left out.
    pub fn annotate(&self, calendar: &FixedDateCalendar, dataset: &Dataset) -> Vec<FixedDateEntry> {
        let mut entries = Vec::with_capacity(calendar.len());

        for entry in &calendar.entries {
            let record = match dataset.find(entry.date) {
                Some(record) => record,
                None => {
                    debug!("No record for {} ({}), skipping", entry.label, entry.date);
                    continue;
                }
            };

            let (month, day) = (entry.date.month(), entry.date.day());
            let historical_mean = self
                .comparator
                .stats(dataset, month, day)
                .ok()
                .and_then(|stats| stats.mean(TemperatureField::Average));
            let percentile = record.avg_temp.and_then(|value| {
                self.comparator
                    .percentile(dataset, month, day, value, TemperatureField::Average)
                    .ok()
            });
            let deviation = match (record.avg_temp, historical_mean) {
                (Some(value), Some(mean)) => Some(value - mean),
                _ => None,
            };

            entries.push(FixedDateEntry {
                label: entry.label.clone(),
                date: entry.date,
                avg_temp: record.avg_temp,
                min_temp: record.min_temp,
                max_temp: record.max_temp,
                historical_mean,
                deviation,
                percentile,
            });
        }

        debug!(
            "Annotated {} of {} calendar entries from '{}'",
            entries.len(),
            calendar.len(),
            calendar.name
        );

        entries
    }
}

/// Aggregates over an annotated sequence.
#[derive(Debug, Clone, Serialize)]
pub struct FixedDateSummary {
    pub field: TemperatureField,
    pub coldest: Option<FixedDateEntry>,
    pub warmest: Option<FixedDateEntry>,
    pub mean_temp: Option<f64>,
    /// Entries with percentile at or below 30.
    pub colder_than_normal: usize,
    pub total: usize,
}

impl FixedDateSummary {
    /// Extremes keep the first entry among equal values.
    pub fn from_entries(entries: &[FixedDateEntry], field: TemperatureField) -> Self {
        let mut coldest: Option<(&FixedDateEntry, f64)> = None;
        let mut warmest: Option<(&FixedDateEntry, f64)> = None;
        let mut sum = 0.0;
        let mut count = 0;

        for entry in entries {
            let value = match entry.value(field) {
                Some(value) => value,
                None => continue,
            };
            if coldest.map_or(true, |(_, v)| value < v) {
                coldest = Some((entry, value));
            }
            if warmest.map_or(true, |(_, v)| value > v) {
                warmest = Some((entry, value));
            }
            sum += value;
            count += 1;
        }

        let colder_than_normal = entries
            .iter()
            .filter(|e| e.percentile.map_or(false, |p| p <= COLDER_THAN_NORMAL_MAX_PERCENTILE))
            .count();

        Self {
            field,
            coldest: coldest.map(|(entry, _)| entry.clone()),
            warmest: warmest.map(|(entry, _)| entry.clone()),
            mean_temp: (count > 0).then(|| sum / count as f64),
            colder_than_normal,
            total: entries.len(),
        }
    }
}

/// Up to `n` entries at or below the 20th percentile, coldest first.
pub fn coldest_entries(entries: &[FixedDateEntry], n: usize) -> Vec<FixedDateEntry> {
    let mut pool: Vec<(&FixedDateEntry, f64)> = entries
        .iter()
        .filter_map(|e| e.percentile.map(|p| (e, p)))
        .filter(|(_, p)| *p <= COLD_POOL_MAX_PERCENTILE)
        .collect();
    pool.sort_by(|a, b| a.1.total_cmp(&b.1));
    pool.into_iter().take(n).map(|(e, _)| e.clone()).collect()
}

/// Up to `n` entries at or above the 80th percentile, warmest first.
pub fn warmest_entries(entries: &[FixedDateEntry], n: usize) -> Vec<FixedDateEntry> {
    let mut pool: Vec<(&FixedDateEntry, f64)> = entries
        .iter()
        .filter_map(|e| e.percentile.map(|p| (e, p)))
        .filter(|(_, p)| *p >= WARM_POOL_MIN_PERCENTILE)
        .collect();
    pool.sort_by(|a, b| b.1.total_cmp(&a.1));
    pool.into_iter().take(n).map(|(e, _)| e.clone()).collect()
}

/// Everything the fixed-date view shows.
#[derive(Debug, Clone, Serialize)]
pub struct FixedDateReport {
    pub calendar: String,
    pub calendar_version: u32,
    pub entries: Vec<FixedDateEntry>,
    pub summary: FixedDateSummary,
    pub coldest: Vec<FixedDateEntry>,
    pub warmest: Vec<FixedDateEntry>,
}

impl FixedDateReport {
    pub fn build(
        annotator: &FixedDateAnnotator,
        calendar: &FixedDateCalendar,
        dataset: &Dataset,
        field: TemperatureField,
        top_n: usize,
    ) -> Self {
        let entries = annotator.annotate(calendar, dataset);
        let summary = FixedDateSummary::from_entries(&entries, field);
        let coldest = coldest_entries(&entries, top_n);
        let warmest = warmest_entries(&entries, top_n);

        Self {
            calendar: calendar.name.clone(),
            calendar_version: calendar.version,
            entries,
            summary,
            coldest,
            warmest,
        }
    }

    pub fn with_defaults(calendar: &FixedDateCalendar, dataset: &Dataset) -> Self {
        Self::build(
            &FixedDateAnnotator::new(),
            calendar,
            dataset,
            TemperatureField::Average,
            DEFAULT_TOP_N,
        )
    }

    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return format!(
                "Calendar '{}' v{}: no entries fall inside the dataset",
                self.calendar, self.calendar_version
            );
        }

        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |t| format!("{:.1}", t));
        let s = &self.summary;
        let field = s.field.short_name();
        let mut lines = vec![format!(
            "Calendar '{}' v{}: {} entries with data",
            self.calendar, self.calendar_version, s.total
        )];

        if let Some(coldest) = &s.coldest {
            lines.push(format!(
                "Coldest ({}): {} ({}) {}°C",
                field,
                coldest.label,
                coldest.date,
                fmt(coldest.value(s.field))
            ));
        }
        if let Some(warmest) = &s.warmest {
            lines.push(format!(
                "Warmest ({}): {} ({}) {}°C",
                field,
                warmest.label,
                warmest.date,
                fmt(warmest.value(s.field))
            ));
        }
        lines.push(format!("Mean ({}): {}°C", field, fmt(s.mean_temp)));
        lines.push(format!(
            "Colder than normal: {} of {}",
            s.colder_than_normal, s.total
        ));

        lines.push(String::new());
        lines.push("label  date         avg    min    max   hist    dev  lower%".to_string());
        for e in &self.entries {
            lines.push(format!(
                "{:<6} {} {:>6} {:>6} {:>6} {:>6} {:>6} {:>7}",
                e.label,
                e.date,
                fmt(e.avg_temp),
                fmt(e.min_temp),
                fmt(e.max_temp),
                fmt(e.historical_mean),
                e.deviation.map_or_else(|| "-".to_string(), |d| format!("{:+.1}", d)),
                fmt(e.percentile)
            ));
        }

        let mut push_pool = |title: &str, pool: &[FixedDateEntry]| {
            if pool.is_empty() {
                return;
            }
            lines.push(String::new());
            lines.push(title.to_string());
            for e in pool {
                lines.push(format!(
                    "- {} ({}): avg {}°C, min {}°C, {} (lower {}%)",
                    e.label,
                    e.date,
                    fmt(e.avg_temp),
                    fmt(e.min_temp),
                    e.band().map_or("-", |b| b.description()),
                    fmt(e.percentile)
                ));
            }
        };
        push_pool("Coldest (at or below 20th percentile):", &self.coldest);
        push_pool("Warmest (at or above 80th percentile):", &self.warmest);

        lines.join("\n")
    }
}
