use crate::error::Result;
use crate::models::CalendarVariant;
use crate::readers::KmaReader;
use crate::utils::constants::{
    COMPRESSION_SNAPPY, CONFIG_FILE_STEM, DEFAULT_DATE_FORMAT, DEFAULT_EXPLORE_START_YEAR,
    DEFAULT_EXTREMES_N, DEFAULT_INPUT_FILE, DEFAULT_METADATA_LINES, DEFAULT_TOP_N, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Runtime settings: built-in defaults, then an optional TOML file, then
/// `KMA_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// Lines before the header row in the input file
    #[validate(range(max = 1000))]
    pub metadata_lines: usize,

    #[validate(length(min = 2))]
    pub date_format: String,

    /// Used when no `--input` is given
    pub default_input: PathBuf,

    #[validate(range(min = 1, max = 9999))]
    pub explore_start_year: i32,

    #[validate(range(min = 1, max = 100))]
    pub top_n: usize,

    #[validate(range(min = 1, max = 1000))]
    pub extremes_n: usize,

    pub calendar_variant: CalendarVariant,

    #[validate(length(min = 1))]
    pub compression: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metadata_lines: DEFAULT_METADATA_LINES,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            default_input: PathBuf::from(DEFAULT_INPUT_FILE),
            explore_start_year: DEFAULT_EXPLORE_START_YEAR,
            top_n: DEFAULT_TOP_N,
            extremes_n: DEFAULT_EXTREMES_N,
            calendar_variant: CalendarVariant::ExamYear,
            compression: COMPRESSION_SNAPPY.to_string(),
        }
    }
}

impl Settings {
    /// Load settings. An explicit `config_path` must exist; otherwise
    /// `kma-daycompare.toml` in the working directory is used if present.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("metadata_lines", defaults.metadata_lines as i64)?
            .set_default("date_format", defaults.date_format.clone())?
            .set_default(
                "default_input",
                defaults.default_input.to_string_lossy().to_string(),
            )?
            .set_default("explore_start_year", defaults.explore_start_year as i64)?
            .set_default("top_n", defaults.top_n as i64)?
            .set_default("extremes_n", defaults.extremes_n as i64)?
            .set_default("calendar_variant", defaults.calendar_variant.name())?
            .set_default("compression", defaults.compression.clone())?;

        builder = match config_path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(CONFIG_FILE_STEM).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);

        Ok(settings)
    }

    pub fn reader(&self) -> KmaReader {
        KmaReader::new()
            .with_metadata_lines(self.metadata_lines)
            .with_date_format(&self.date_format)
    }
}
