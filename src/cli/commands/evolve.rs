//! Evolve command implementation

use super::{load_job, load_settings, write_statements};
use crate::cli::error::CliError;
use crate::sink::SinkKind;
use std::path::Path;

/// Handle the evolve command
pub fn handle_evolve(input: &str, settings_dir: &Path, sink: Option<SinkKind>) -> Result<(), CliError> {
    print!("{}", evolve(input, settings_dir, sink)?);
    Ok(())
}

/// ALTER statements bringing main in line with staging, followed by the evolved main as YAML
pub fn evolve(input: &str, settings_dir: &Path, sink: Option<SinkKind>) -> Result<String, CliError> {
    let job = load_job(input)?;
    let mut settings = load_settings(settings_dir, sink, None)?;
    settings.enable_schema_evolution = true;

    let result = settings
        .generator()?
        .generate_operations(&job.ingest_mode, &job.datasets())?;

    let mut out = String::new();
    write_statements(&mut out, "schema evolution", &result.schema_evolution_sql);
    if let Some(dataset) = &result.schema_evolution_dataset {
        let yaml = serde_yaml::to_string(dataset)
            .map_err(|e| CliError::SerializationError(e.to_string()))?;
        out.push_str("-- evolved main dataset\n");
        for line in yaml.lines() {
            out.push_str(&format!("-- {}\n", line));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_evolve_adds_staging_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.yaml");
        std::fs::write(
            &path,
            r#"
main:
  name: main
  columns:
    - { name: id, dataType: INTEGER, primaryKey: true }
staging:
  name: staging
  columns:
    - { name: id, dataType: INTEGER, primaryKey: true }
    - { name: amount, dataType: DOUBLE }
ingestMode:
  type: appendOnly
"#,
        )
        .unwrap();

        let out = evolve(&path.display().to_string(), dir.path(), Some(SinkKind::Ansi)).unwrap();
        assert!(out.starts_with("-- schema evolution\nALTER TABLE main ADD COLUMN \"amount\" DOUBLE;\n"));
        assert!(out.contains("-- - name: amount"));
    }
}
