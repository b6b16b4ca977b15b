use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default export path: output/kma-{table}-{YYMMDD}.parquet
pub fn generate_default_export_filename(table: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    let filename = format!(
        "kma-{}-{:02}{:02}{:02}.parquet",
        table,
        year,
        now.month(),
        now.day()
    );
    PathBuf::from("output").join(filename)
}
