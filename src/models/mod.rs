//! Models module
//!
//! Pure data describing what is ingested (datasets and columns) and how
//! (ingest modes and their strategies).

pub mod column;
pub mod dataset;
pub mod enums;
pub mod ingest_mode;
pub mod strategies;

pub use column::Column;
pub use dataset::{
    DataSplitRange, Dataset, Datasets, FilterValue, MAIN_ALIAS, MetadataDataset, STAGING_ALIAS,
    StagingFilter,
};
pub use enums::*;
pub use ingest_mode::{
    AppendOnly, BitemporalDelta, BitemporalSnapshot, IngestMode, NontemporalDelta,
    NontemporalSnapshot, UnitemporalDelta, UnitemporalSnapshot,
};
pub use strategies::{
    Auditing, Deduplication, DeleteIndicator, MaxVersion, MergeStrategy, OptimizationFilter,
    TransactionMilestoning, ValidityDerivation, ValidityMilestoning, VersionResolver,
};
