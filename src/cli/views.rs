use crate::analyzers::explorer::yearly_aggregates;
use crate::analyzers::{
    DatasetAnalyzer, DayComparison, Explorer, FixedDateAnnotator, FixedDateReport,
    HistoricalComparator,
};
use crate::cli::args::{ExportTable, OutputFormat};
use crate::error::{ProcessingError, Result};
use crate::models::{CalendarVariant, Dataset, FixedDateCalendar, TemperatureField, TemperatureRecord};
use crate::settings::Settings;
use crate::utils::generate_default_export_filename;
use crate::writers::ParquetWriter;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What to write for `export`.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub table: ExportTable,
    pub date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
    pub compression: Option<String>,
    pub variant: Option<CalendarVariant>,
    pub calendar: Option<PathBuf>,
}

/// Renders each view of a loaded dataset as text or JSON.
pub struct Views<'a> {
    settings: &'a Settings,
    format: OutputFormat,
}

impl<'a> Views<'a> {
    pub fn new(settings: &'a Settings, format: OutputFormat) -> Self {
        Self { settings, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn summary(&self, dataset: &Dataset, out: &mut dyn Write) -> Result<()> {
        let stats = DatasetAnalyzer::new().analyze(dataset)?;
        emit(out, self.format, &stats, || stats.summary())
    }

    /// Compare `date` (default: the last loaded date) with its same-day history.
    pub fn compare(
        &self,
        dataset: &Dataset,
        date: Option<NaiveDate>,
        history: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let date = match date.or_else(|| last_date(dataset)) {
            Some(date) => date,
            None => return Err(ProcessingError::MissingData("dataset is empty".to_string())),
        };

        match DayComparison::compare(&HistoricalComparator::new(), dataset, date) {
            Ok(comparison) => emit(out, self.format, &comparison, || {
                if history {
                    format!("{}\n\n{}", comparison.summary(), comparison.history_table())
                } else {
                    comparison.summary()
                }
            }),
            Err(e) if e.is_no_data() => no_data(out, self.format, &e),
            Err(e) => Err(e),
        }
    }

    pub fn exam(
        &self,
        dataset: &Dataset,
        calendar: &FixedDateCalendar,
        field: TemperatureField,
        top: Option<usize>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let report = FixedDateReport::build(
            &FixedDateAnnotator::new(),
            calendar,
            dataset,
            field,
            top.unwrap_or(self.settings.top_n),
        );
        emit(out, self.format, &report, || report.summary())
    }

    pub fn explore(
        &self,
        dataset: &Dataset,
        from: Option<i32>,
        to: Option<i32>,
        extremes: Option<usize>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let (from, to) = self.explore_range(dataset, from, to)?;
        let explorer = Explorer::new().with_extremes(extremes.unwrap_or(self.settings.extremes_n));
        let report = explorer.explore(dataset, from, to)?;
        emit(out, self.format, &report, || report.summary())
    }

    /// Default range runs from the configured start year, clamped into the
    /// data, to the last loaded year.
    pub fn explore_range(
        &self,
        dataset: &Dataset,
        from: Option<i32>,
        to: Option<i32>,
    ) -> Result<(i32, i32)> {
        let (first, last) = dataset
            .year_range()
            .ok_or_else(|| ProcessingError::MissingData("dataset is empty".to_string()))?;

        let from = from.unwrap_or_else(|| self.settings.explore_start_year.max(first).min(last));
        let to = to.unwrap_or(last);
        if from > to {
            return Err(ProcessingError::InvalidFormat(format!(
                "start year {} is after end year {}",
                from, to
            )));
        }
        Ok((from, to))
    }

    pub fn resolve_calendar(
        &self,
        variant: Option<CalendarVariant>,
        path: Option<&Path>,
    ) -> Result<FixedDateCalendar> {
        match path {
            Some(path) => {
                debug!("Loading calendar from {}", path.display());
                FixedDateCalendar::from_path(path)
            }
            None => variant.unwrap_or(self.settings.calendar_variant).load(),
        }
    }

    pub fn export(&self, dataset: &Dataset, request: &ExportRequest, out: &mut dyn Write) -> Result<()> {
        let compression = request
            .compression
            .as_deref()
            .unwrap_or(&self.settings.compression);
        let writer = ParquetWriter::new().with_compression(compression)?;
        let output = request
            .output
            .clone()
            .unwrap_or_else(|| generate_default_export_filename(request.table.name()));

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match request.table {
            ExportTable::Dataset => writer.write_records(dataset.records(), &output)?,
            ExportTable::History => {
                let date = request
                    .date
                    .or_else(|| last_date(dataset))
                    .ok_or_else(|| ProcessingError::MissingData("dataset is empty".to_string()))?;
                match HistoricalComparator::new().stats(dataset, date.month(), date.day()) {
                    Ok(stats) => writer.write_records(&stats.history, &output)?,
                    Err(e) if e.is_no_data() => return no_data(out, self.format, &e),
                    Err(e) => return Err(e),
                }
            }
            ExportTable::Exam => {
                let calendar = self.resolve_calendar(request.variant, request.calendar.as_deref())?;
                let entries = FixedDateAnnotator::new().annotate(&calendar, dataset);
                writer.write_fixed_date_entries(&entries, &output)?;
            }
            ExportTable::Yearly => {
                let records: Vec<&TemperatureRecord> = dataset.records().iter().collect();
                writer.write_yearly_aggregates(&yearly_aggregates(&records), &output)?;
            }
        }

        let file_info = writer.get_file_info(&output)?;
        info!("Exported {} table to {}", request.table.name(), output.display());

        let value = json!({
            "table": request.table.name(),
            "path": output.display().to_string(),
            "total_rows": file_info.total_rows,
            "row_groups": file_info.row_groups,
            "file_size": file_info.file_size,
        });
        emit(out, self.format, &value, || {
            format!("Wrote {}\n{}", output.display(), file_info.summary())
        })
    }
}

fn last_date(dataset: &Dataset) -> Option<NaiveDate> {
    dataset.date_range().map(|(_, last)| last)
}

/// Write `value` as pretty JSON, or the text rendering.
pub fn emit<T, F>(out: &mut dyn Write, format: OutputFormat, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => writeln!(out, "{}", text())?,
    }
    Ok(())
}

/// Report an empty result without failing the run.
fn no_data(out: &mut dyn Write, format: OutputFormat, error: &ProcessingError) -> Result<()> {
    debug!("Nothing to show: {}", error);
    let value = json!({ "status": "no_data", "message": error.to_string() });
    emit(out, format, &value, || error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for year in 2000..2005 {
            let avg = (year - 2000) as f64;
            records.push(TemperatureRecord::new(
                NaiveDate::from_ymd_opt(year, 11, 14).unwrap(),
                Some(avg),
                Some(avg - 4.0),
                Some(avg + 4.0),
            ));
        }
        Dataset::new(records)
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_compare_defaults_to_last_date() {
        let settings = Settings::default();
        let views = Views::new(&settings, OutputFormat::Text);

        let text = render(|out| views.compare(&dataset(), None, false, out));

        assert!(text.starts_with("2004-11-14 compared with 11-14 in 5 records"));
    }

    #[test]
    fn test_compare_missing_date_is_a_message() {
        let settings = Settings::default();
        let views = Views::new(&settings, OutputFormat::Json);
        let date = NaiveDate::from_ymd_opt(2003, 1, 1);

        let text = render(|out| views.compare(&dataset(), date, false, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["status"], "no_data");
        assert_eq!(value["message"], "No data for 2003-01-01");
    }

    #[test]
    fn test_compare_json_carries_percentile() {
        let settings = Settings::default();
        let views = Views::new(&settings, OutputFormat::Json);
        let date = NaiveDate::from_ymd_opt(2002, 11, 14);

        let text = render(|out| views.compare(&dataset(), date, true, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["fields"][0]["percentile"], 40.0);
        assert_eq!(value["fields"][0]["band"], "near_normal");
    }

    #[test]
    fn test_explore_range_is_clamped() {
        let mut settings = Settings::default();
        let views = Views::new(&settings, OutputFormat::Text);
        assert_eq!(views.explore_range(&dataset(), None, None).unwrap(), (2000, 2004));
        assert_eq!(views.explore_range(&dataset(), Some(2001), Some(2002)).unwrap(), (2001, 2002));
        assert!(views.explore_range(&dataset(), Some(2003), Some(2001)).is_err());

        settings.explore_start_year = 2010;
        let views = Views::new(&settings, OutputFormat::Text);
        assert_eq!(views.explore_range(&dataset(), None, None).unwrap(), (2004, 2004));
    }

    #[test]
    fn test_exam_with_bundled_calendar() {
        let settings = Settings::default();
        let views = Views::new(&settings, OutputFormat::Text);
        let calendar = views.resolve_calendar(None, None).unwrap();
        assert_eq!(calendar.entries.first().map(|e| e.label.as_str()), Some("1994"));

        // None of the bundled exam days fall on 11-14 in 2000..=2004.
        let text = render(|out| views.exam(&dataset(), &calendar, TemperatureField::Average, None, out));
        assert!(text.contains("no entries fall inside the dataset"));
    }

    #[test]
    fn test_export_history_table() {
        let settings = Settings::default();
        let views = Views::new(&settings, OutputFormat::Text);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("history.parquet");
        let request = ExportRequest {
            table: ExportTable::History,
            date: NaiveDate::from_ymd_opt(2001, 11, 14),
            output: Some(output.clone()),
            compression: Some("zstd".to_string()),
            variant: None,
            calendar: None,
        };

        let text = render(|out| views.export(&dataset(), &request, out));

        assert!(output.exists());
        assert!(text.contains("Total rows: 5"));
    }
}
