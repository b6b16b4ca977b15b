use chrono::NaiveDate;
use kma_daycompare::analyzers::{
    DayComparison, Explorer, FixedDateAnnotator, FixedDateReport, HistoricalComparator,
    TemperatureBand,
};
use kma_daycompare::cli::{ExportRequest, ExportTable, OutputFormat, Views};
use kma_daycompare::models::{Dataset, FixedDateCalendar, TemperatureField};
use kma_daycompare::processors::DatasetCache;
use kma_daycompare::readers::KmaReader;
use kma_daycompare::settings::Settings;
use kma_daycompare::writers::ParquetWriter;
use kma_daycompare::ProcessingError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const METADATA: &str = "[검색조건]
자료구분 : 일
자료형태 : 기본
지역/지점 : 서울
기간 : 19950101~20241231
,
,";

/// A KMA-style export: seven metadata lines, a Korean header and five years
/// of mid-November days.
fn write_kma_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "{}", METADATA).unwrap();
    writeln!(file, "날짜,지점,평균기온(℃),최저기온(℃),최고기온(℃)").unwrap();

    let nov13 = [-2.0, 1.0, 3.0, -1.0, 0.5];
    for (i, avg) in nov13.iter().enumerate() {
        let year = 2020 + i as i32;
        writeln!(file, "\t{}-11-13,108,{},{},{}", year, avg, avg - 4.0, avg + 5.0).unwrap();
        writeln!(file, "\t{}-11-14,108,{},{},{}", year, avg + 1.0, avg - 3.0, avg + 6.0).unwrap();
    }
    // Malformed rows: bad date dropped, bad temperature kept as missing.
    writeln!(file, "2021-13-45,108,1.0,0.0,2.0").unwrap();
    writeln!(file, "2022-11-15,108,,1.0,9.0").unwrap();
    file.flush().unwrap();
    file
}

fn load(file: &NamedTempFile) -> Dataset {
    KmaReader::new().read_dataset(file.path()).expect("load dataset")
}

#[test]
fn test_load_kma_file() {
    let file = write_kma_file();
    let dataset = load(&file);

    assert_eq!(dataset.len(), 11);
    assert_eq!(dataset.dropped_rows(), 1);
    assert_eq!(
        dataset.date_range(),
        Some((
            NaiveDate::from_ymd_opt(2020, 11, 13).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 14).unwrap()
        ))
    );

    let partial = dataset.find(NaiveDate::from_ymd_opt(2022, 11, 15).unwrap()).unwrap();
    assert_eq!(partial.avg_temp, None);
    assert_eq!(partial.max_temp, Some(9.0));
}

#[test]
fn test_nov_13_percentile() {
    let file = write_kma_file();
    let dataset = load(&file);
    let comparator = HistoricalComparator::new();

    let percentile = comparator
        .percentile(&dataset, 11, 13, 1.0, TemperatureField::Average)
        .unwrap();
    assert_eq!(percentile, 60.0);

    let stats = comparator.stats(&dataset, 11, 13).unwrap();
    assert_eq!(stats.count, 5);
    assert_eq!(stats.year_range, (2020, 2024));
    assert_eq!(stats.mean(TemperatureField::Average), Some(0.3));
}

#[test]
fn test_empty_distribution_is_not_found() {
    let file = write_kma_file();
    let dataset = load(&file);
    let comparator = HistoricalComparator::new();

    let stats = comparator.stats(&dataset, 2, 29);
    assert!(matches!(
        stats,
        Err(ProcessingError::InsufficientHistory { month: 2, day: 29 })
    ));
    assert!(comparator
        .percentile(&dataset, 2, 29, 0.0, TemperatureField::Average)
        .unwrap_err()
        .is_no_data());
    assert_eq!(
        stats.unwrap_err().to_string(),
        "Not enough data for 02-29"
    );
}

#[test]
fn test_day_comparison() {
    let file = write_kma_file();
    let dataset = load(&file);
    let date = NaiveDate::from_ymd_opt(2022, 11, 13).unwrap();

    let comparison = DayComparison::compare(&HistoricalComparator::new(), &dataset, date).unwrap();
    let avg = comparison.field(TemperatureField::Average).unwrap();

    assert_eq!(avg.value, 3.0);
    assert_eq!(avg.percentile, 80.0);
    assert_eq!(avg.band, TemperatureBand::SomewhatWarm);
    assert!(avg.deviation > 0.0);
    assert_eq!(comparison.rank.map(|r| r.rank), Some(1));

    let outside = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let result = DayComparison::compare(&HistoricalComparator::new(), &dataset, outside);
    assert!(matches!(result, Err(ProcessingError::NoData { .. })));
}

#[test]
fn test_exam_calendar_drops_unmatched_entries() {
    let file = write_kma_file();
    let dataset = load(&file);
    let calendar = FixedDateCalendar::from_json_str(
        r#"{
            "name": "test-days",
            "version": 2,
            "entries": [
                {"label": "2020", "date": "2020-11-13"},
                {"label": "2021", "date": "2021-11-14"},
                {"label": "1999", "date": "1999-11-18"},
                {"label": "2022", "date": "2022-11-13"},
                {"label": "2025", "date": "2025-11-13", "note": "not loaded yet"}
            ]
        }"#,
    )
    .unwrap();

    let entries = FixedDateAnnotator::new().annotate(&calendar, &dataset);

    assert_eq!(entries.len(), calendar.len() - 2);
    let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["2020", "2021", "2022"]);

    // 2020-11-13 holds the lowest of five Nov 13 values.
    assert_eq!(entries[0].percentile, Some(0.0));
    assert_eq!(entries[0].band(), Some(TemperatureBand::RecordCold));

    let report = FixedDateReport::build(
        &FixedDateAnnotator::new(),
        &calendar,
        &dataset,
        TemperatureField::Average,
        5,
    );
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.coldest.as_ref().map(|e| e.label.as_str()), Some("2020"));
    assert_eq!(report.summary.warmest.as_ref().map(|e| e.label.as_str()), Some("2022"));
    assert_eq!(report.coldest.len(), 1);
    assert_eq!(report.warmest.len(), 1);
}

#[test]
fn test_bundled_calendars_load() {
    use kma_daycompare::models::CalendarVariant;

    let exam_year = CalendarVariant::ExamYear.load().unwrap();
    let academic_year = CalendarVariant::AcademicYear.load().unwrap();

    assert_eq!(exam_year.entries.first().map(|e| e.label.as_str()), Some("1994"));
    assert_eq!(academic_year.entries.last().map(|e| e.label.as_str()), Some("2026"));
    assert_eq!(
        academic_year.entries.first().map(|e| e.date),
        NaiveDate::from_ymd_opt(1993, 11, 16)
    );
}

#[test]
fn test_explore_range() {
    let file = write_kma_file();
    let dataset = load(&file);

    let report = Explorer::new().with_extremes(3).explore(&dataset, 2021, 2023).unwrap();

    assert_eq!(report.yearly.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2021, 2022, 2023]);
    assert_eq!(report.monthly.len(), 1);
    assert_eq!(report.coldest_days.len(), 3);
    assert_eq!(report.warmest_days[0].avg_temp, Some(4.0));
    assert!(report.trend.is_some());
}

#[test]
fn test_parquet_export_row_counts() {
    let file = write_kma_file();
    let dataset = load(&file);
    let temp_dir = TempDir::new().unwrap();
    let writer = ParquetWriter::new();

    let output_path = temp_dir.path().join("dataset.parquet");
    writer.write_records(dataset.records(), &output_path).unwrap();
    assert_eq!(writer.get_file_info(&output_path).unwrap().total_rows, 11);

    let settings = Settings::default();
    let views = Views::new(&settings, OutputFormat::Json);
    let yearly_path = temp_dir.path().join("yearly.parquet");
    let request = ExportRequest {
        table: ExportTable::Yearly,
        date: None,
        output: Some(yearly_path.clone()),
        compression: None,
        variant: None,
        calendar: None,
    };
    let mut out = Vec::new();
    views.export(&dataset, &request, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["table"], "yearly");
    assert_eq!(value["total_rows"], 5);
}

#[test]
fn test_cache_serves_unchanged_file() {
    let file = write_kma_file();
    let reader = KmaReader::new();
    let mut cache = DatasetCache::new();

    let first = cache.load_file(file.path(), &reader).unwrap();
    let second = cache.load_file(file.path(), &reader).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));
}

#[test]
fn test_missing_input_file_is_fatal() {
    let result = KmaReader::new().read_dataset(std::path::Path::new("does/not/exist.csv"));
    assert!(matches!(result, Err(ProcessingError::InputFile { .. })));
}
