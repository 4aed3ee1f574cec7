//! Generate command implementation

use super::{OutputFormat, load_job, load_settings, write_statements};
use crate::cli::error::CliError;
use crate::generator::GeneratorResult;
use crate::models::CaseConversion;
use crate::sink::SinkKind;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the generate command
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub input: String,
    pub settings_dir: PathBuf,
    pub sink: Option<SinkKind>,
    pub case_conversion: Option<CaseConversion>,
    pub statistics: bool,
    pub no_cleanup: bool,
    pub schema_evolution: bool,
    pub empty_batch: bool,
    pub format: OutputFormat,
}

/// Handle the generate command
pub fn handle_generate(args: &GenerateArgs) -> Result<(), CliError> {
    print!("{}", generate(args)?);
    Ok(())
}

pub fn generate(args: &GenerateArgs) -> Result<String, CliError> {
    let job = load_job(&args.input)?;
    let mut settings = load_settings(&args.settings_dir, args.sink, args.case_conversion)?;
    if args.statistics {
        settings.collect_statistics = true;
    }
    if args.no_cleanup {
        settings.cleanup_staging_data = false;
    }
    if args.schema_evolution {
        settings.enable_schema_evolution = true;
    }

    let generator = settings.generator()?;
    let datasets = job.datasets();
    let results = if args.empty_batch {
        vec![generator.generate_operations_for_empty_batch(&job.ingest_mode, &datasets)?]
    } else if job.data_splits.is_empty() {
        vec![generator.generate_operations(&job.ingest_mode, &datasets)?]
    } else {
        generator.generate_operations_with_data_splits(
            &job.ingest_mode,
            &datasets,
            &job.data_splits,
        )?
    };
    info!(
        mode = job.ingest_mode.name(),
        sink = %settings.sink,
        batches = results.len(),
        "Generated ingestion SQL"
    );

    match args.format {
        OutputFormat::Text => Ok(format_text(&results)),
        OutputFormat::Json => serde_json::to_string_pretty(&results)
            .map(|json| json + "\n")
            .map_err(|e| CliError::SerializationError(e.to_string())),
    }
}

fn format_text(results: &[GeneratorResult]) -> String {
    let mut out = String::new();
    for (index, result) in results.iter().enumerate() {
        if results.len() > 1 {
            out.push_str(&format!("-- batch {}\n", index + 1));
        }
        write_statements(&mut out, "pre actions", &result.pre_actions_sql);
        write_statements(&mut out, "schema evolution", &result.schema_evolution_sql);
        for (name, sql) in &result.pre_ingest_statistics_sql {
            write_statements(&mut out, &format!("statistic {}", name), std::slice::from_ref(sql));
        }
        write_statements(&mut out, "ingest", &result.ingest_sql);
        for (name, sql) in &result.post_ingest_statistics_sql {
            write_statements(&mut out, &format!("statistic {}", name), std::slice::from_ref(sql));
        }
        write_statements(&mut out, "metadata", &result.metadata_ingest_sql);
        write_statements(&mut out, "post actions", &result.post_actions_sql);
    }
    out
}
