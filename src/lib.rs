//! Ingest Planner - batch ingestion SQL for relational sinks
//!
//! Provides:
//! - Dataset and ingest mode models (append-only, nontemporal, unitemporal, bitemporal)
//! - Validation of ingest modes against dataset schemas
//! - A planner producing dialect-neutral logical plans
//! - Sinks and a renderer turning plans into SQL for each dialect
//! - Schema evolution of the main dataset
//! - Job and generator configuration files

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logical_plan;
pub mod models;
pub mod planner;
pub mod render;
pub mod schema_evolution;
pub mod sink;
pub mod validation;

// Re-export commonly used types
pub use config::{GeneratorSettings, JobConfig};
pub use error::{ConfigurationError, IngestError, SchemaError, UnsupportedOperationError};
pub use generator::{GeneratorResult, RelationalGenerator};
pub use logical_plan::LogicalPlan;
pub use planner::{IngestPlans, Planner, PlannerOptions};
pub use render::SqlRenderer;
pub use schema_evolution::{SchemaEvolution, SchemaEvolutionResult};
pub use sink::{Capability, Sink, SinkKind};
pub use validation::{IdentifierError, IngestModeValidator};

// Re-export models
pub use models::enums::*;
pub use models::{Column, DataSplitRange, Dataset, Datasets, IngestMode, MetadataDataset};
