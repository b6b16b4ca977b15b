use crate::analyzers::{FixedDateEntry, YearlyAggregate};
use crate::error::{ProcessingError, Result};
use crate::models::TemperatureRecord;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Days since 1970-01-01, the Arrow `Date32` encoding.
fn date32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    date.signed_duration_since(epoch).num_days() as i32
}

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write daily records (a whole dataset or a same-day history)
    pub fn write_records(&self, records: &[TemperatureRecord], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("avg_temp", DataType::Float64, true),
            Field::new("min_temp", DataType::Float64, true),
            Field::new("max_temp", DataType::Float64, true),
        ]));

        let dates: Vec<i32> = records.iter().map(|r| date32(r.date)).collect();
        let years: Vec<i32> = records.iter().map(|r| r.year()).collect();
        let avg_temps: Vec<Option<f64>> = records.iter().map(|r| r.avg_temp).collect();
        let min_temps: Vec<Option<f64>> = records.iter().map(|r| r.min_temp).collect();
        let max_temps: Vec<Option<f64>> = records.iter().map(|r| r.max_temp).collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(dates)),
                Arc::new(Int32Array::from(years)),
                Arc::new(Float64Array::from(avg_temps)),
                Arc::new(Float64Array::from(min_temps)),
                Arc::new(Float64Array::from(max_temps)),
            ],
        )?;

        self.write_batch(schema, batch, path)
    }

    /// Write the annotated fixed-date table
    pub fn write_fixed_date_entries(&self, entries: &[FixedDateEntry], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("label", DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
            Field::new("avg_temp", DataType::Float64, true),
            Field::new("min_temp", DataType::Float64, true),
            Field::new("max_temp", DataType::Float64, true),
            Field::new("historical_mean", DataType::Float64, true),
            Field::new("deviation", DataType::Float64, true),
            Field::new("percentile", DataType::Float64, true),
            Field::new("band", DataType::Utf8, true),
        ]));

        let labels: Vec<String> = entries.iter().map(|e| e.label.clone()).collect();
        let dates: Vec<i32> = entries.iter().map(|e| date32(e.date)).collect();
        let column = |f: fn(&FixedDateEntry) -> Option<f64>| -> ArrayRef {
            Arc::new(Float64Array::from(entries.iter().map(f).collect::<Vec<_>>()))
        };
        let bands: Vec<Option<&str>> = entries
            .iter()
            .map(|e| e.band().map(|b| b.description()))
            .collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(labels)),
                Arc::new(Date32Array::from(dates)),
                column(|e| e.avg_temp),
                column(|e| e.min_temp),
                column(|e| e.max_temp),
                column(|e| e.historical_mean),
                column(|e| e.deviation),
                column(|e| e.percentile),
                Arc::new(StringArray::from(bands)),
            ],
        )?;

        self.write_batch(schema, batch, path)
    }

    /// Write yearly aggregates
    pub fn write_yearly_aggregates(&self, yearly: &[YearlyAggregate], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("avg_temp", DataType::Float64, true),
            Field::new("min_temp", DataType::Float64, true),
            Field::new("max_temp", DataType::Float64, true),
            Field::new("days", DataType::UInt64, false),
        ]));

        let years: Vec<i32> = yearly.iter().map(|y| y.year).collect();
        let avg_temps: Vec<Option<f64>> = yearly.iter().map(|y| y.avg_temp).collect();
        let min_temps: Vec<Option<f64>> = yearly.iter().map(|y| y.min_temp).collect();
        let max_temps: Vec<Option<f64>> = yearly.iter().map(|y| y.max_temp).collect();
        let days: Vec<u64> = yearly.iter().map(|y| y.days as u64).collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(years)),
                Arc::new(Float64Array::from(avg_temps)),
                Arc::new(Float64Array::from(min_temps)),
                Arc::new(Float64Array::from(max_temps)),
                Arc::new(UInt64Array::from(days)),
            ],
        )?;

        self.write_batch(schema, batch, path)
    }

    fn write_batch(&self, schema: Arc<Schema>, batch: RecordBatch, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        info!("Wrote {} rows to {}", batch.num_rows(), path.display());
        Ok(())
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::NamedTempFile;

    fn records() -> Vec<TemperatureRecord> {
        vec![
            TemperatureRecord::new(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap(), Some(-3.5), Some(-8.0), Some(1.0)),
            TemperatureRecord::new(NaiveDate::from_ymd_opt(2024, 11, 14).unwrap(), None, Some(8.3), Some(17.5)),
        ]
    }

    #[test]
    fn test_date32_encoding() {
        assert_eq!(date32(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(date32(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(date32(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
    }

    #[test]
    fn test_write_records_round_trip() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_records(&records(), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 2);

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(temp_file.path())?)?.build()?;
        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<_, _>>()?;
        let avg = batches[0]
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("avg_temp column");
        assert_eq!(avg.value(0), -3.5);
        assert!(avg.is_null(1));

        let dates = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<Date32Array>()
            .expect("date column");
        assert_eq!(dates.value(0), 1);
        Ok(())
    }

    #[test]
    fn test_row_group_size() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(1);
        let temp_file = NamedTempFile::new()?;

        writer.write_records(&records(), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.row_groups, 2);
        assert!(info.summary().contains("Total rows: 2"));
        Ok(())
    }

    #[test]
    fn test_write_fixed_date_entries() -> Result<()> {
        let writer = ParquetWriter::new().with_compression("zstd")?;
        let temp_file = NamedTempFile::new()?;
        let entries = vec![FixedDateEntry {
            label: "2024".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 14).unwrap(),
            avg_temp: Some(12.4),
            min_temp: Some(8.3),
            max_temp: Some(17.5),
            historical_mean: Some(8.0),
            deviation: Some(4.4),
            percentile: Some(97.0),
        }];

        writer.write_fixed_date_entries(&entries, temp_file.path())?;

        assert_eq!(writer.get_file_info(temp_file.path())?.total_rows, 1);
        Ok(())
    }

    #[test]
    fn test_write_yearly_aggregates() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let yearly = vec![
            YearlyAggregate { year: 2000, avg_temp: Some(12.0), min_temp: Some(8.0), max_temp: Some(17.0), days: 366 },
            YearlyAggregate { year: 2001, avg_temp: None, min_temp: None, max_temp: None, days: 0 },
        ];

        writer.write_yearly_aggregates(&yearly, temp_file.path())?;

        assert_eq!(writer.get_file_info(temp_file.path())?.total_rows, 2);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;
            let result = writer.write_records(&records(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-ish").is_err());
        Ok(())
    }
}
