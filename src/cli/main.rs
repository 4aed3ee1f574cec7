//! CLI binary entry point for ingest-planner

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use ingest_planner::cli::commands::OutputFormat;
#[cfg(feature = "cli")]
use ingest_planner::cli::commands::drop::handle_drop;
#[cfg(feature = "cli")]
use ingest_planner::cli::commands::evolve::handle_evolve;
#[cfg(feature = "cli")]
use ingest_planner::cli::commands::generate::{GenerateArgs, handle_generate};
#[cfg(feature = "cli")]
use ingest_planner::cli::commands::validate::handle_validate;
#[cfg(feature = "cli")]
use ingest_planner::models::CaseConversion;
#[cfg(feature = "cli")]
use ingest_planner::sink::SinkKind;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "ingest-planner")]
#[command(about = "Plan and render batch ingestion SQL")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding .ingest-planner.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Generate the SQL for one batch of a job
    Generate {
        /// Job file path or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Target sink
        #[arg(short, long, value_enum)]
        sink: Option<SinkArg>,
        /// Identifier case conversion
        #[arg(long, value_enum)]
        case: Option<CaseArg>,
        /// Emit statistics queries
        #[arg(long)]
        statistics: bool,
        /// Keep staging rows after ingestion
        #[arg(long)]
        no_cleanup: bool,
        /// Evolve the main schema to match staging first
        #[arg(long)]
        schema_evolution: bool,
        /// Generate for a batch in which nothing was staged
        #[arg(long)]
        empty_batch: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
    },
    /// Check a job's datasets against its ingest mode
    Validate {
        /// Job file path or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Show the schema changes staging would make to main
    Evolve {
        /// Job file path or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Target sink
        #[arg(short, long, value_enum)]
        sink: Option<SinkArg>,
    },
    /// Generate DROP statements for every table a job creates
    Drop {
        /// Job file path or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Target sink
        #[arg(short, long, value_enum)]
        sink: Option<SinkArg>,
    },
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum SinkArg {
    Ansi,
    H2,
    Memsql,
    Bigquery,
    Snowflake,
}

#[cfg(feature = "cli")]
impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Ansi => SinkKind::Ansi,
            SinkArg::H2 => SinkKind::H2,
            SinkArg::Memsql => SinkKind::Memsql,
            SinkArg::Bigquery => SinkKind::Bigquery,
            SinkArg::Snowflake => SinkKind::Snowflake,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum CaseArg {
    None,
    Upper,
    Lower,
}

#[cfg(feature = "cli")]
impl From<CaseArg> for CaseConversion {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::None => CaseConversion::None,
            CaseArg::Upper => CaseConversion::ToUpper,
            CaseArg::Lower => CaseConversion::ToLower,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            input,
            sink,
            case,
            statistics,
            no_cleanup,
            schema_evolution,
            empty_batch,
            format,
        } => {
            let args = GenerateArgs {
                input,
                settings_dir: cli.config_dir,
                sink: sink.map(Into::into),
                case_conversion: case.map(Into::into),
                statistics,
                no_cleanup,
                schema_evolution,
                empty_batch,
                format: match format {
                    FormatArg::Text => OutputFormat::Text,
                    FormatArg::Json => OutputFormat::Json,
                },
            };
            handle_generate(&args)
        }
        Commands::Validate { input } => handle_validate(&input),
        Commands::Evolve { input, sink } => {
            handle_evolve(&input, &cli.config_dir, sink.map(Into::into))
        }
        Commands::Drop { input, sink } => handle_drop(&input, &cli.config_dir, sink.map(Into::into)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
