//! `nadlan-core` — listing normalization and analysis engine.
//!
//! Pure engine crate: turns inconsistent positional CSV scrapes into a
//! canonical listing table, derives numeric metrics from localized text,
//! and runs duplicate and below-average-price analyses. No CLI or
//! terminal concerns.

pub mod analyze;
pub mod classify;
pub mod config;
pub mod display;
pub mod duplicates;
pub mod error;
pub mod extract;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod schema;

pub use config::{ListingKind, Metric, RunConfig, Source};
pub use error::CoreError;
pub use model::{ListingCollection, RawTable, Table};
pub use pipeline::{load_and_run, load_or_empty, run, AnalysisReport};
