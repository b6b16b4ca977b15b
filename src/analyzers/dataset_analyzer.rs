use crate::error::{ProcessingError, Result};
use crate::models::Dataset;
use crate::utils::constants::{MAX_VALID_TEMP, MIN_VALID_TEMP};
use chrono::NaiveDate;
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub temperature_stats: TemperatureStats,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureStats {
    /// Lowest minimum temperature and its date.
    pub coldest: Option<(NaiveDate, f64)>,
    /// Highest maximum temperature and its date.
    pub hottest: Option<(NaiveDate, f64)>,
    pub avg_temp: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub total_records: usize,
    pub complete_records: usize,
    pub missing_records: usize,
    /// Rows the loader dropped for an unparseable date.
    pub dropped_rows: usize,
    /// Records holding a value outside [-50, 50] °C.
    pub out_of_range_records: usize,
    pub out_of_range_dates: Vec<NaiveDate>,
}

impl DataQuality {
    pub fn complete_percentage(&self) -> f64 {
        (self.complete_records as f64 / self.total_records as f64) * 100.0
    }

    pub fn missing_percentage(&self) -> f64 {
        (self.missing_records as f64 / self.total_records as f64) * 100.0
    }
}

const MAX_REPORTED_VIOLATIONS: usize = 10;

pub struct DatasetAnalyzer;

impl DatasetAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, dataset: &Dataset) -> Result<DatasetStatistics> {
        let date_range = dataset
            .date_range()
            .ok_or_else(|| ProcessingError::MissingData("No records to analyze".to_string()))?;

        let mut coldest: Option<(NaiveDate, f64)> = None;
        let mut hottest: Option<(NaiveDate, f64)> = None;
        let mut temp_sum = 0.0f64;
        let mut temp_count = 0;

        let mut complete_count = 0;
        let mut missing_count = 0;
        let mut out_of_range_count = 0;
        let mut out_of_range_dates = Vec::new();

        for record in dataset.records() {
            if let Some(min) = record.min_temp {
                if coldest.map_or(true, |(_, t)| min < t) {
                    coldest = Some((record.date, min));
                }
            }

            if let Some(max) = record.max_temp {
                if hottest.map_or(true, |(_, t)| max > t) {
                    hottest = Some((record.date, max));
                }
            }

            if let Some(avg) = record.avg_temp {
                temp_sum += avg;
                temp_count += 1;
            }

            if record.is_complete() {
                complete_count += 1;
            } else {
                missing_count += 1;
            }

            if record.validate().is_err() {
                out_of_range_count += 1;
                if out_of_range_dates.len() < MAX_REPORTED_VIOLATIONS {
                    out_of_range_dates.push(record.date);
                }
            }
        }

        Ok(DatasetStatistics {
            total_records: dataset.len(),
            date_range,
            temperature_stats: TemperatureStats {
                coldest,
                hottest,
                avg_temp: (temp_count > 0).then(|| temp_sum / temp_count as f64),
            },
            data_quality: DataQuality {
                total_records: dataset.len(),
                complete_records: complete_count,
                missing_records: missing_count,
                dropped_rows: dataset.dropped_rows(),
                out_of_range_records: out_of_range_count,
                out_of_range_dates,
            },
        })
    }
}

impl Default for DatasetAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStatistics {
    pub fn summary(&self) -> String {
        let extreme = |v: Option<(NaiveDate, f64)>| {
            v.map_or_else(
                || "No valid measurements".to_string(),
                |(date, t)| format!("{:.1}°C on {}", t, date),
            )
        };
        let average = self
            .temperature_stats
            .avg_temp
            .map_or_else(|| "No valid measurements".to_string(), |t| format!("{:.1}°C", t));

        let mut summary = format!(
            "Records: {} days\n\
            Date Range: {} to {}\n\
            Data Quality: {:.1}% complete, {:.1}% with missing values, {} rows dropped\n\
            Coldest minimum: {}\n\
            Hottest maximum: {}\n\
            Average: {}",
            self.total_records,
            self.date_range.0,
            self.date_range.1,
            self.data_quality.complete_percentage(),
            self.data_quality.missing_percentage(),
            self.data_quality.dropped_rows,
            extreme(self.temperature_stats.coldest),
            extreme(self.temperature_stats.hottest),
            average
        );

        if self.data_quality.out_of_range_records > 0 {
            let dates: Vec<String> = self
                .data_quality
                .out_of_range_dates
                .iter()
                .map(|d| d.to_string())
                .collect();
            summary.push_str(&format!(
                "\nWarning: {} records outside [{}, {}]°C (e.g. {})",
                self.data_quality.out_of_range_records,
                MIN_VALID_TEMP,
                MAX_VALID_TEMP,
                dates.join(", ")
            ));
        }

        summary
    }
}
