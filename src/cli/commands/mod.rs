//! CLI command implementations

pub mod drop;
pub mod evolve;
pub mod generate;
pub mod validate;

use crate::cli::error::CliError;
use crate::config::{GeneratorSettings, JobConfig};
use crate::models::CaseConversion;
use crate::sink::SinkKind;
use std::io::Read;
use std::path::{Path, PathBuf};

/// How generated SQL is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Statements terminated by `;`, grouped under comment headers
    #[default]
    Text,
    /// The generator results serialized as JSON
    Json,
}

/// Load input content from file or stdin
pub(crate) fn load_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::IoError(format!("Failed to read stdin: {}", e)))?;
        Ok(content)
    } else {
        let path = PathBuf::from(input);
        if !path.exists() {
            return Err(CliError::FileNotFound(path));
        }
        std::fs::read_to_string(&path).map_err(|e| CliError::FileReadError(path, e.to_string()))
    }
}

pub(crate) fn load_job(input: &str) -> Result<JobConfig, CliError> {
    let content = load_input(input)?;
    Ok(JobConfig::parse(&content)?)
}

/// Settings from the directory's config file, with command line flags applied last
pub(crate) fn load_settings(
    dir: &Path,
    sink: Option<SinkKind>,
    case_conversion: Option<CaseConversion>,
) -> Result<GeneratorSettings, CliError> {
    let mut settings = GeneratorSettings::load(dir)?;
    if let Some(sink) = sink {
        settings.sink = sink;
    }
    if let Some(case_conversion) = case_conversion {
        settings.case_conversion = case_conversion;
    }
    Ok(settings)
}

pub(crate) fn write_statements(out: &mut String, header: &str, statements: &[String]) {
    if statements.is_empty() {
        return;
    }
    out.push_str(&format!("-- {}\n", header));
    for statement in statements {
        out.push_str(statement);
        out.push_str(";\n");
    }
}
