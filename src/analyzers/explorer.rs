use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, TemperatureField, TemperatureRecord};
use crate::utils::constants::DEFAULT_EXTREMES_N;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-field means for one group of days.
#[derive(Debug, Clone, Copy, Default)]
struct GroupAccumulator {
    avg: MeanAccumulator,
    min: MeanAccumulator,
    max: MeanAccumulator,
    days: usize,
}

impl GroupAccumulator {
    fn push(&mut self, record: &TemperatureRecord) {
        self.avg.push(record.avg_temp);
        self.min.push(record.min_temp);
        self.max.push(record.max_temp);
        self.days += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAggregate {
    pub year: i32,
    pub avg_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: u32,
    pub avg_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub days: usize,
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub per_decade: f64,
}

impl TrendLine {
    /// `None` with fewer than two points or when every x is the same.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in points {
            sxy += (x - mean_x) * (y - mean_y);
            sxx += (x - mean_x).powi(2);
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
            per_decade: slope * 10.0,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Free exploration over a year range.
#[derive(Debug, Clone, Serialize)]
pub struct ExplorationReport {
    pub from_year: i32,
    pub to_year: i32,
    pub days: usize,
    pub yearly: Vec<YearlyAggregate>,
    pub monthly: Vec<MonthlyAggregate>,
    /// Fit of yearly mean average temperature against year.
    pub trend: Option<TrendLine>,
    pub coldest_days: Vec<TemperatureRecord>,
    pub warmest_days: Vec<TemperatureRecord>,
}

pub struct Explorer {
    extremes: usize,
}

impl Explorer {
    pub fn new() -> Self {
        Self {
            extremes: DEFAULT_EXTREMES_N,
        }
    }

    pub fn with_extremes(mut self, extremes: usize) -> Self {
        self.extremes = extremes;
        self
    }

    pub fn explore(&self, dataset: &Dataset, from_year: i32, to_year: i32) -> Result<ExplorationReport> {
        let records: Vec<&TemperatureRecord> = dataset.years_between(from_year, to_year).collect();
        if records.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "no records between {} and {}",
                from_year, to_year
            )));
        }

        let yearly = yearly_aggregates(&records);
        let monthly = monthly_aggregates(&records);
        let points: Vec<(f64, f64)> = yearly
            .iter()
            .filter_map(|y| y.avg_temp.map(|t| (y.year as f64, t)))
            .collect();
        let trend = TrendLine::fit(&points);

        debug!(
            "Explored {}-{}: {} days, {} years",
            from_year,
            to_year,
            records.len(),
            yearly.len()
        );

        Ok(ExplorationReport {
            from_year,
            to_year,
            days: records.len(),
            yearly,
            monthly,
            trend,
            coldest_days: extreme_days(&records, self.extremes, false),
            warmest_days: extreme_days(&records, self.extremes, true),
        })
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn yearly_aggregates(records: &[&TemperatureRecord]) -> Vec<YearlyAggregate> {
    let mut groups: BTreeMap<i32, GroupAccumulator> = BTreeMap::new();
    for record in records {
        groups.entry(record.year()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(year, acc)| YearlyAggregate {
            year,
            avg_temp: acc.avg.mean(),
            min_temp: acc.min.mean(),
            max_temp: acc.max.mean(),
            days: acc.days,
        })
        .collect()
}

pub fn monthly_aggregates(records: &[&TemperatureRecord]) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<u32, GroupAccumulator> = BTreeMap::new();
    for record in records {
        groups.entry(record.month()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(month, acc)| MonthlyAggregate {
            month,
            avg_temp: acc.avg.mean(),
            min_temp: acc.min.mean(),
            max_temp: acc.max.mean(),
            days: acc.days,
        })
        .collect()
}

/// The `n` coldest or warmest days by average temperature. Equal values keep
/// their date order.
pub fn extreme_days(records: &[&TemperatureRecord], n: usize, warmest: bool) -> Vec<TemperatureRecord> {
    let mut ranked: Vec<(&TemperatureRecord, f64)> = records
        .iter()
        .filter_map(|r| r.value(TemperatureField::Average).map(|v| (*r, v)))
        .collect();

    if warmest {
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    } else {
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    ranked.into_iter().take(n).map(|(r, _)| r.clone()).collect()
}

impl ExplorationReport {
    pub fn summary(&self) -> String {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |t| format!("{:.1}", t));
        let mut lines = vec![format!(
            "Years {}-{}: {} days",
            self.from_year, self.to_year, self.days
        )];

        match &self.trend {
            Some(trend) => lines.push(format!(
                "Trend of yearly mean: {:+.2}°C per decade",
                trend.per_decade
            )),
            None => lines.push("Trend of yearly mean: not enough data".to_string()),
        }

        lines.push(String::new());
        lines.push("year    avg    min    max  days".to_string());
        for y in &self.yearly {
            lines.push(format!(
                "{:<4} {:>6} {:>6} {:>6} {:>5}",
                y.year,
                fmt(y.avg_temp),
                fmt(y.min_temp),
                fmt(y.max_temp),
                y.days
            ));
        }

        lines.push(String::new());
        lines.push("month   avg    min    max".to_string());
        for m in &self.monthly {
            lines.push(format!(
                "{:>5} {:>6} {:>6} {:>6}",
                m.month,
                fmt(m.avg_temp),
                fmt(m.min_temp),
                fmt(m.max_temp)
            ));
        }

        let mut push_days = |title: &str, days: &[TemperatureRecord]| {
            lines.push(String::new());
            lines.push(title.to_string());
            for r in days {
                lines.push(format!(
                    "- {}: avg {}°C, min {}°C, max {}°C",
                    r.date,
                    fmt(r.avg_temp),
                    fmt(r.min_temp),
                    fmt(r.max_temp)
                ));
            }
        };
        push_days("Coldest days:", &self.coldest_days);
        push_days("Warmest days:", &self.warmest_days);

        lines.join("\n")
    }
}
