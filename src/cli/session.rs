use crate::cli::args::OutputFormat;
use crate::cli::views::Views;
use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, TemperatureField};
use crate::processors::DatasetCache;
use crate::readers::KmaReader;
use crate::settings::Settings;
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

const HELP: &str = "Commands:
  compare [YYYY-MM-DD]   compare a date with its same-day history
  history [YYYY-MM-DD]   same, with the year-by-year table
  exam [avg|min|max]     annotate the exam-day calendar
  explore [FROM TO]      yearly/monthly means, trend and extremes
  summary                dataset overview
  reload                 re-read the input file if it changed
  help                   this message
  quit                   leave the session";

/// Whether the session keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A dataset kept in memory between queries read line by line.
pub struct Session<'a> {
    input: PathBuf,
    reader: KmaReader,
    cache: DatasetCache,
    views: Views<'a>,
    dataset: Arc<Dataset>,
}

impl<'a> Session<'a> {
    /// Load `input` through `cache`; a missing or unreadable file fails here.
    pub fn open(
        input: PathBuf,
        settings: &'a Settings,
        format: OutputFormat,
        mut cache: DatasetCache,
    ) -> Result<Self> {
        let reader = settings.reader();
        let dataset = cache.load_file(&input, &reader)?;

        Ok(Self {
            input,
            reader,
            cache,
            views: Views::new(settings, format),
            dataset,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Answer commands until `quit` or end of input. Command errors are
    /// printed and the session goes on.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        if self.views.format() == OutputFormat::Text {
            writeln!(
                out,
                "Loaded {} records from {}. Type 'help' for commands.",
                self.dataset.len(),
                self.input.display()
            )?;
        }

        for line in input.lines() {
            let line = line?;
            match self.execute(&line, &mut *out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
            out.flush()?;
        }

        Ok(())
    }

    pub fn execute(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(command) => command.to_lowercase(),
            None => return Ok(Flow::Continue),
        };
        let args: Vec<&str> = words.collect();
        debug!("Session command '{}' {:?}", command, args);

        match command.as_str() {
            "compare" | "history" => {
                let date = args.first().map(|s| parse_date(s)).transpose()?;
                self.views
                    .compare(&self.dataset, date, command == "history", out)?;
            }
            "exam" => {
                let field = match args.first() {
                    Some(s) => s.parse::<TemperatureField>().map_err(ProcessingError::InvalidFormat)?,
                    None => TemperatureField::Average,
                };
                let calendar = self.views.resolve_calendar(None, None)?;
                self.views.exam(&self.dataset, &calendar, field, None, out)?;
            }
            "explore" => {
                let (from, to) = match args.as_slice() {
                    [] => (None, None),
                    [from, to] => (Some(parse_year(from)?), Some(parse_year(to)?)),
                    _ => {
                        return Err(ProcessingError::InvalidFormat(
                            "usage: explore [FROM TO]".to_string(),
                        ))
                    }
                };
                self.views.explore(&self.dataset, from, to, None, out)?;
            }
            "summary" => self.views.summary(&self.dataset, out)?,
            "reload" => self.reload(out)?,
            "help" => writeln!(out, "{}", HELP)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => {
                warn!("Unknown session command '{}'", other);
                writeln!(out, "Unknown command '{}'. Type 'help' for commands.", other)?;
            }
        }

        Ok(Flow::Continue)
    }

    fn reload(&mut self, out: &mut dyn Write) -> Result<()> {
        let misses = self.cache.misses();
        self.dataset = self.cache.load_file(&self.input, &self.reader)?;

        if self.cache.misses() > misses {
            writeln!(out, "Reloaded {} records", self.dataset.len())?;
        } else {
            writeln!(out, "Input unchanged, {} records", self.dataset.len())?;
        }
        Ok(())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
}

fn parse_year(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| ProcessingError::InvalidFormat(format!("not a year: {}", s)))
}
