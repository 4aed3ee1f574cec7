//! Job and generator configuration files
//!
//! A job is a YAML document naming the datasets, the ingest mode and any
//! data split ranges for one ingestion. Generator settings (sink, case
//! conversion, planner knobs) live in an optional `.ingest-planner.toml`
//! next to the jobs and can be overridden from the environment.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generator::RelationalGenerator;
use crate::models::{
    CaseConversion, DataSplitRange, Dataset, Datasets, IngestMode, MetadataDataset,
};
use crate::planner::PlannerOptions;
use crate::sink::SinkKind;

/// Default settings filename
pub const CONFIG_FILENAME: &str = ".ingest-planner.toml";

/// Environment variable selecting the sink
pub const ENV_SINK: &str = "INGEST_PLANNER_SINK";

/// Environment variable selecting the identifier case conversion
pub const ENV_CASE_CONVERSION: &str = "INGEST_PLANNER_CASE_CONVERSION";

/// Environment variable toggling statistics queries
pub const ENV_COLLECT_STATISTICS: &str = "INGEST_PLANNER_COLLECT_STATISTICS";

/// Environment variable toggling staging cleanup
pub const ENV_CLEANUP_STAGING: &str = "INGEST_PLANNER_CLEANUP_STAGING";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One ingestion described in YAML
///
/// ```yaml
/// main:
///   name: main
///   columns:
///     - { name: id, dataType: INTEGER, primaryKey: true }
/// staging:
///   name: staging
///   columns:
///     - { name: id, dataType: INTEGER, primaryKey: true }
/// ingestMode:
///   type: appendOnly
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    pub main: Dataset,
    pub staging: Dataset,
    #[serde(default)]
    pub metadata: MetadataDataset,
    pub ingest_mode: IngestMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_splits: Vec<DataSplitRange>,
}

impl JobConfig {
    /// Parse a job from YAML
    ///
    /// The ingest mode is deserialized through its builder, so missing or
    /// inconsistent attributes fail with the builder's error.
    pub fn parse(content: &str) -> Result<Self> {
        let job: JobConfig = serde_yaml::from_str(content).context("Failed to parse job YAML")?;
        for range in &job.data_splits {
            if range.lower > range.upper {
                bail!(
                    "Invalid data split range [{}, {}]: lower bound exceeds upper bound",
                    range.lower,
                    range.upper
                );
            }
        }
        Ok(job)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid job file {}", path.display()))
    }

    pub fn datasets(&self) -> Datasets {
        Datasets::new(self.main.clone(), self.staging.clone()).with_metadata(self.metadata.clone())
    }
}

/// Settings applied to every job run from a directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorSettings {
    pub sink: SinkKind,
    pub case_conversion: CaseConversion,
    pub cleanup_staging_data: bool,
    pub collect_statistics: bool,
    pub enable_schema_evolution: bool,
    pub create_staging_dataset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_start_timestamp_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_end_timestamp_pattern: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD HH:MM:SS`; the current time when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_timestamp: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            case_conversion: CaseConversion::default(),
            cleanup_staging_data: true,
            collect_statistics: false,
            enable_schema_evolution: false,
            create_staging_dataset: false,
            batch_id_pattern: None,
            batch_start_timestamp_pattern: None,
            batch_end_timestamp_pattern: None,
            execution_timestamp: None,
        }
    }
}

impl GeneratorSettings {
    /// Load `.ingest-planner.toml` from `dir`, falling back to defaults,
    /// then apply environment overrides
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILENAME);
        let mut settings = if path.exists() {
            debug!(path = %path.display(), "Loading generator settings");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("Invalid settings in {}", path.display()))?
        } else {
            Self::default()
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse settings TOML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(sink) = lookup(ENV_SINK) {
            self.sink = sink
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {}", ENV_SINK))?;
        }
        if let Some(case) = lookup(ENV_CASE_CONVERSION) {
            self.case_conversion = case
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {}", ENV_CASE_CONVERSION))?;
        }
        if let Some(flag) = lookup(ENV_COLLECT_STATISTICS) {
            self.collect_statistics = parse_flag(ENV_COLLECT_STATISTICS, &flag)?;
        }
        if let Some(flag) = lookup(ENV_CLEANUP_STAGING) {
            self.cleanup_staging_data = parse_flag(ENV_CLEANUP_STAGING, &flag)?;
        }
        Ok(())
    }

    pub fn planner_options(&self) -> Result<PlannerOptions> {
        let mut options = PlannerOptions::default()
            .with_cleanup_staging_data(self.cleanup_staging_data)
            .with_collect_statistics(self.collect_statistics)
            .with_create_staging_dataset(self.create_staging_dataset);
        if let Some(timestamp) = &self.execution_timestamp {
            options = options.with_execution_timestamp(parse_timestamp(timestamp)?);
        }
        if let Some(pattern) = &self.batch_id_pattern {
            options = options.with_batch_id_pattern(pattern.as_str());
        }
        if let Some(pattern) = &self.batch_start_timestamp_pattern {
            options = options.with_batch_start_timestamp_pattern(pattern.as_str());
        }
        if let Some(pattern) = &self.batch_end_timestamp_pattern {
            options = options.with_batch_end_timestamp_pattern(pattern.as_str());
        }
        Ok(options)
    }

    pub fn generator(&self) -> Result<RelationalGenerator> {
        Ok(RelationalGenerator::new(self.sink)
            .with_case_conversion(self.case_conversion)
            .with_options(self.planner_options()?)
            .with_schema_evolution(self.enable_schema_evolution))
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Invalid {}: expected a boolean, got '{}'", name, other),
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid execution timestamp '{}'", value))
}
