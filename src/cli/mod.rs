pub mod args;
pub mod commands;
pub mod session;
pub mod views;

pub use args::{Cli, Commands, ExportTable, OutputFormat};
pub use commands::run;
pub use session::{Flow, Session};
pub use views::{ExportRequest, Views};
