//! Command line interface helpers shared by the `ingest-planner` binary

pub mod commands;
pub mod error;

pub use error::CliError;
