use crate::models::{CalendarVariant, TemperatureField};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kma-daycompare")]
#[command(about = "Compare a day's temperature with every other year on the same calendar day")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "KMA daily temperature CSV [default: from settings]")]
    pub input: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTable {
    /// Every loaded record
    Dataset,
    /// Same-day history of one date
    History,
    /// Annotated fixed-date entries
    Exam,
    /// Yearly aggregates
    Yearly,
}

impl ExportTable {
    pub fn name(&self) -> &'static str {
        match self {
            ExportTable::Dataset => "dataset",
            ExportTable::History => "history",
            ExportTable::Exam => "exam",
            ExportTable::Yearly => "yearly",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record count, date range and data quality of the input file
    Summary,

    /// Compare one date with the same month and day in every other year
    Compare {
        #[arg(short, long, help = "Date to compare (YYYY-MM-DD) [default: last date in the file]")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Also print the year-by-year history")]
        history: bool,
    },

    /// Annotate the exam-day calendar with temperatures and percentiles
    Exam {
        #[arg(long, help = "Bundled calendar [default: from settings]")]
        variant: Option<CalendarVariant>,

        #[arg(long, conflicts_with = "variant", help = "Calendar JSON file")]
        calendar: Option<PathBuf>,

        #[arg(long, default_value = "avg", help = "Field for coldest/warmest: avg, min or max")]
        field: TemperatureField,

        #[arg(long, help = "Entries in each top list [default: from settings]")]
        top: Option<usize>,
    },

    /// Yearly and monthly means, trend and extreme days over a year range
    Explore {
        #[arg(long, help = "First year [default: from settings, clamped to the data]")]
        from: Option<i32>,

        #[arg(long, help = "Last year [default: last year in the file]")]
        to: Option<i32>,

        #[arg(long, help = "Number of coldest and warmest days [default: from settings]")]
        extremes: Option<usize>,
    },

    /// Write a derived table to Parquet
    Export {
        #[arg(short, long, value_enum)]
        table: ExportTable,

        #[arg(short, long, help = "Date for the history table [default: last date in the file]")]
        date: Option<NaiveDate>,

        #[arg(
            short,
            long,
            help = "Output Parquet file path [default: output/kma-{table}-{YYMMDD}.parquet]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, help = "snappy, gzip, lz4, zstd or none [default: from settings]")]
        compression: Option<String>,

        #[arg(long, help = "Bundled calendar for the exam table")]
        variant: Option<CalendarVariant>,

        #[arg(long, conflicts_with = "variant", help = "Calendar JSON file for the exam table")]
        calendar: Option<PathBuf>,
    },

    /// Keep the dataset loaded and answer queries from stdin
    Interactive,
}
