use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, TemperatureRecord};
use crate::utils::constants::{
    DEFAULT_DATE_FORMAT, DEFAULT_METADATA_LINES, POSITIONAL_AVG_COLUMN, POSITIONAL_DATE_COLUMN,
    POSITIONAL_MAX_COLUMN, POSITIONAL_MIN_COLUMN,
};
use chrono::NaiveDate;
use csv::StringRecord;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads KMA daily temperature exports: a block of metadata lines, a header
/// row, then `date, station, avg, min, max` rows.
pub struct KmaReader {
    metadata_lines: usize,
    date_format: String,
}

/// Column positions of the fields the core needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub avg: usize,
    pub min: usize,
    pub max: usize,
}

impl ColumnMap {
    pub fn positional() -> Self {
        Self {
            date: POSITIONAL_DATE_COLUMN,
            avg: POSITIONAL_AVG_COLUMN,
            min: POSITIONAL_MIN_COLUMN,
            max: POSITIONAL_MAX_COLUMN,
        }
    }

    /// Resolve columns from a header row. Returns `None` unless all four
    /// fields are found.
    pub fn from_header(header: &StringRecord) -> Option<Self> {
        let mut date = None;
        let mut avg = None;
        let mut min = None;
        let mut max = None;

        for (idx, name) in header.iter().enumerate() {
            match normalize_header(name).as_str() {
                "날짜" | "일시" | "date" | "tm" => date = date.or(Some(idx)),
                "평균기온" | "avg" | "avg_temp" | "avgtemp" | "ta" => avg = avg.or(Some(idx)),
                "최저기온" | "min" | "min_temp" | "mintemp" => min = min.or(Some(idx)),
                "최고기온" | "max" | "max_temp" | "maxtemp" => max = max.or(Some(idx)),
                _ => {}
            }
        }

        Some(Self {
            date: date?,
            avg: avg?,
            min: min?,
            max: max?,
        })
    }
}

/// Trim a header cell, drop a trailing parenthesized unit such as `(℃)`,
/// and lowercase it.
fn normalize_header(name: &str) -> String {
    let trimmed = name.trim().trim_start_matches('\u{feff}');
    let without_unit = match trimmed.find('(') {
        Some(pos) if trimmed.ends_with(')') => &trimmed[..pos],
        _ => trimmed,
    };
    without_unit.trim().to_lowercase()
}

/// Decode input bytes as UTF-8, falling back to EUC-KR (CP949).
pub fn decode_text(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Some(text) = encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
    {
        return Ok(text);
    }

    warn!("Input is not valid UTF-8, retrying as EUC-KR");
    encoding_rs::EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(ProcessingError::Encoding)
}

/// Everything after the first `count` lines.
fn skip_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

fn parse_temperature(field: Option<&str>) -> Option<f64> {
    field
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl KmaReader {
    pub fn new() -> Self {
        Self {
            metadata_lines: DEFAULT_METADATA_LINES,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_metadata_lines(mut self, metadata_lines: usize) -> Self {
        self.metadata_lines = metadata_lines;
        self
    }

    pub fn with_date_format(mut self, date_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self
    }

    /// Read a dataset from a file on disk
    pub fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        let bytes = std::fs::read(path).map_err(|source| ProcessingError::InputFile {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Read {} bytes from {}", bytes.len(), path.display());
        self.read_bytes(&bytes)
    }

    /// Read a dataset from raw file contents (either supported encoding)
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Dataset> {
        let text = decode_text(bytes)?;
        self.read_text(&text)
    }

    pub fn read_text(&self, text: &str) -> Result<Dataset> {
        let body = skip_lines(text, self.metadata_lines);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let mut columns = None;
        let mut records = Vec::new();
        let mut dropped = 0;

        for row_result in reader.records() {
            let row = row_result?;

            if row.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let map = match columns {
                Some(map) => map,
                None => {
                    let map = self.resolve_columns(&row);
                    columns = Some(map);
                    // A header row has no parseable date and is consumed here.
                    if self.parse_date(row.get(map.date)).is_none() {
                        continue;
                    }
                    map
                }
            };

            match self.parse_row(&row, map) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        if records.is_empty() {
            return Err(ProcessingError::MissingData(
                "no rows with a parseable date".to_string(),
            ));
        }

        if dropped > 0 {
            warn!("Dropped {} rows with unparseable dates", dropped);
        }
        info!("Loaded {} daily records", records.len());

        Ok(Dataset::new(records).with_dropped_rows(dropped))
    }

    fn resolve_columns(&self, first_row: &StringRecord) -> ColumnMap {
        match ColumnMap::from_header(first_row) {
            Some(map) => {
                debug!("Resolved columns from header: {:?}", map);
                map
            }
            None => {
                debug!("Header not recognized, using positional columns");
                ColumnMap::positional()
            }
        }
    }

    fn parse_date(&self, field: Option<&str>) -> Option<NaiveDate> {
        field.and_then(|s| NaiveDate::parse_from_str(s.trim(), &self.date_format).ok())
    }

    /// Parse one data row. `None` means the date was unusable; unusable
    /// temperatures become missing values instead.
    fn parse_row(&self, row: &StringRecord, columns: ColumnMap) -> Option<TemperatureRecord> {
        let date = self.parse_date(row.get(columns.date))?;

        Some(TemperatureRecord::new(
            date,
            parse_temperature(row.get(columns.avg)),
            parse_temperature(row.get(columns.min)),
            parse_temperature(row.get(columns.max)),
        ))
    }
}

impl Default for KmaReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const METADATA: &str = "[검색조건]\n자료구분 : 일\n자료형태 : 기본\n지역/지점 : 서울\n기간 : 19070101~20250110\n\n\n";

    fn kma_text(rows: &[&str]) -> String {
        let mut text = String::from(METADATA);
        text.push_str("날짜,지점,평균기온(℃),최저기온(℃),최고기온(℃)\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" 평균기온(℃) "), "평균기온");
        assert_eq!(normalize_header("Date"), "date");
        assert_eq!(normalize_header("\u{feff}날짜"), "날짜");
    }

    #[test]
    fn test_skip_lines() {
        assert_eq!(skip_lines("a\nb\nc", 2), "c");
        assert_eq!(skip_lines("a\nb", 5), "");
        assert_eq!(skip_lines("a\nb", 0), "a\nb");
    }

    #[test]
    fn test_read_kma_text() -> Result<()> {
        let text = kma_text(&[
            "\t1907-10-01,108,13.5,7.9,20.7",
            "\t1907-10-02,108,16.2,7.9,22.0",
        ]);

        let dataset = KmaReader::new().read_text(&text)?;

        assert_eq!(dataset.len(), 2);
        let first = &dataset.records()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(1907, 10, 1).unwrap());
        assert_eq!(first.avg_temp, Some(13.5));
        assert_eq!(first.min_temp, Some(7.9));
        assert_eq!(first.max_temp, Some(20.7));
        Ok(())
    }

    #[test]
    fn test_malformed_rows_are_coerced_or_dropped() -> Result<()> {
        let text = kma_text(&[
            "1950-06-25,108,,,",
            "not-a-date,108,1.0,0.0,2.0",
            "1950-06-26,108,abc,20.1,29.9",
            "",
        ]);

        let dataset = KmaReader::new().read_text(&text)?;

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dropped_rows(), 1);
        assert!(dataset.records()[0].avg_temp.is_none());
        assert!(dataset.records()[0].max_temp.is_none());
        assert!(dataset.records()[1].avg_temp.is_none());
        assert_eq!(dataset.records()[1].min_temp, Some(20.1));
        Ok(())
    }

    #[test]
    fn test_headerless_input_uses_positions() -> Result<()> {
        let text = format!("{}2000-01-01,108,-3.1,-7.0,1.2\n", METADATA);

        let dataset = KmaReader::new().read_text(&text)?;

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].avg_temp, Some(-3.1));
        Ok(())
    }

    #[test]
    fn test_reordered_header_columns() -> Result<()> {
        let text = "date,max_temp,min_temp,avg_temp,station\n2000-01-01,5.0,-5.0,0.5,108\n";

        let dataset = KmaReader::new().with_metadata_lines(0).read_text(text)?;

        let record = &dataset.records()[0];
        assert_eq!(record.avg_temp, Some(0.5));
        assert_eq!(record.min_temp, Some(-5.0));
        assert_eq!(record.max_temp, Some(5.0));
        Ok(())
    }

    #[test]
    fn test_euc_kr_fallback() -> Result<()> {
        let text = kma_text(&["2024-11-14,108,12.4,8.3,17.5"]);
        let (encoded, _, had_errors) = encoding_rs::EUC_KR.encode(&text);
        assert!(!had_errors);
        assert!(std::str::from_utf8(&encoded).is_err());

        let dataset = KmaReader::new().read_bytes(&encoded)?;

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].avg_temp, Some(12.4));
        Ok(())
    }

    #[test]
    fn test_read_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "{}", kma_text(&["2024-11-14,108,12.4,8.3,17.5"]))?;

        let dataset = KmaReader::new().read_dataset(temp_file.path())?;
        assert_eq!(dataset.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_and_empty_inputs_fail() {
        let reader = KmaReader::new();

        let missing = reader.read_dataset(Path::new("does/not/exist.csv"));
        assert!(matches!(missing, Err(ProcessingError::InputFile { .. })));

        let empty = reader.read_text(&kma_text(&[]));
        assert!(matches!(empty, Err(ProcessingError::MissingData(_))));
    }
}
