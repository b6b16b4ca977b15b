use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::cli::session::Session;
use crate::cli::views::{ExportRequest, Views};
use crate::error::Result;
use crate::models::Dataset;
use crate::processors::DatasetCache;
use crate::settings::Settings;
use crate::utils::progress::ProgressReporter;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref())?;
    let input = resolve_input(cli.input.clone(), &settings);
    let views = Views::new(&settings, cli.format);
    let mut cache = DatasetCache::new();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Commands::Interactive = cli.command {
        let mut session = Session::open(input, &settings, cli.format, cache)?;
        let stdin = io::stdin();
        return session.run(stdin.lock(), &mut out);
    }

    let silent = cli.format == OutputFormat::Json;
    let dataset = load_dataset(&mut cache, &input, &settings, silent)?;

    match cli.command {
        Commands::Summary => views.summary(&dataset, &mut out)?,

        Commands::Compare { date, history } => views.compare(&dataset, date, history, &mut out)?,

        Commands::Exam {
            variant,
            calendar,
            field,
            top,
        } => {
            let calendar = views.resolve_calendar(variant, calendar.as_deref())?;
            views.exam(&dataset, &calendar, field, top, &mut out)?;
        }

        Commands::Explore { from, to, extremes } => {
            views.explore(&dataset, from, to, extremes, &mut out)?
        }

        Commands::Export {
            table,
            date,
            output,
            compression,
            variant,
            calendar,
        } => {
            let request = ExportRequest {
                table,
                date,
                output,
                compression,
                variant,
                calendar,
            };
            views.export(&dataset, &request, &mut out)?;
        }

        Commands::Interactive => {}
    }

    out.flush()?;
    Ok(())
}

/// Load `path` through the cache, with a spinner unless `silent`.
pub fn load_dataset(
    cache: &mut DatasetCache,
    path: &Path,
    settings: &Settings,
    silent: bool,
) -> Result<Arc<Dataset>> {
    let progress = ProgressReporter::new_spinner(&format!("Loading {}...", path.display()), silent);

    let dataset = cache.load_file(path, &settings.reader())?;

    progress.finish_with_message(&format!("Loaded {} records", dataset.len()));
    info!("Loaded {} records from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// `--verbose` forces debug; otherwise `RUST_LOG`, falling back to warn.
/// Logs go to stderr, or to `log_file` without colors.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // A subscriber may already be installed when run is called twice in one
    // process; keep the first one.
    let _ = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };

    Ok(())
}

/// Resolve the input path the same way `run` does.
pub fn resolve_input(cli_input: Option<PathBuf>, settings: &Settings) -> PathBuf {
    cli_input.unwrap_or_else(|| settings.default_input.clone())
}
