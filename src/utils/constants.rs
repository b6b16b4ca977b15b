/// Input format
pub const DEFAULT_METADATA_LINES: usize = 7;
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_INPUT_FILE: &str = "ta_20260109154427.csv";

/// Positional column layout used when the header row is not recognized:
/// date, station, avg, min, max.
pub const POSITIONAL_DATE_COLUMN: usize = 0;
pub const POSITIONAL_AVG_COLUMN: usize = 2;
pub const POSITIONAL_MIN_COLUMN: usize = 3;
pub const POSITIONAL_MAX_COLUMN: usize = 4;

/// Temperature constraints
pub const MIN_VALID_TEMP: f64 = -50.0;
pub const MAX_VALID_TEMP: f64 = 50.0;

/// Fixed-date reporting
pub const DEFAULT_TOP_N: usize = 5;
pub const COLD_POOL_MAX_PERCENTILE: f64 = 20.0;
pub const WARM_POOL_MIN_PERCENTILE: f64 = 80.0;
pub const COLDER_THAN_NORMAL_MAX_PERCENTILE: f64 = 30.0;

/// Exploration defaults
pub const DEFAULT_EXPLORE_START_YEAR: i32 = 1970;
pub const DEFAULT_EXTREMES_N: usize = 10;

/// Configuration sources
pub const CONFIG_FILE_STEM: &str = "kma-daycompare";
pub const ENV_PREFIX: &str = "KMA";

/// Parquet output
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
