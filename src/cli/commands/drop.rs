//! Drop command implementation

use super::{load_job, load_settings, write_statements};
use crate::cli::error::CliError;
use crate::sink::SinkKind;
use std::path::Path;

/// Handle the drop command
pub fn handle_drop(input: &str, settings_dir: &Path, sink: Option<SinkKind>) -> Result<(), CliError> {
    let job = load_job(input)?;
    let settings = load_settings(settings_dir, sink, None)?;
    let statements = settings
        .generator()?
        .generate_drop_operations(&job.ingest_mode, &job.datasets())?;
    let mut out = String::new();
    write_statements(&mut out, "drop", &statements);
    print!("{}", out);
    Ok(())
}
