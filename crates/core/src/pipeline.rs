//! Fixed-order batch pipeline: each stage consumes one fully materialized
//! immutable value and produces the next. The active schema strategy
//! travels inside the `RunConfig`, never as a global.

use std::path::Path;

use serde::Serialize;

use crate::analyze::{area_stats, below_average, summary_stats};
use crate::config::RunConfig;
use crate::duplicates::{find_same_address, find_same_street, StreetNameMode};
use crate::error::CoreError;
use crate::extract::extract_metrics;
use crate::load::load_table;
use crate::model::{
    AddressGroupRow, AreaStatsRow, BelowAverageReport, ListingCollection, RawTable, StreetGroupRow,
    SummaryStats, Table,
};
use crate::schema::normalize;

/// raw table → normalized collection.
pub fn run(config: &RunConfig, raw: &RawTable) -> Result<ListingCollection, CoreError> {
    if raw.is_empty() {
        return Ok(ListingCollection::empty());
    }

    let table = Table::from_raw(raw);
    let (table, fields) = normalize(table, config.source, config.kind, config.sample_rows)?;
    let metrics = extract_metrics(&table, &fields);

    Ok(ListingCollection {
        table,
        fields,
        metrics,
    })
}

/// Load the configured file (relative paths resolve against `base_dir`)
/// and run the pipeline.
pub fn load_and_run(config: &RunConfig, base_dir: &Path) -> Result<ListingCollection, CoreError> {
    let raw = load_table(&base_dir.join(&config.file), config.has_header)?;
    run(config, &raw)
}

/// Boundary recovery for embedding contexts: a file that cannot be read
/// or parsed degrades to an empty collection plus a human-readable
/// message instead of aborting the session. Schema errors still surface:
/// the file loaded fine, no mapping table applied, and guessing is worse
/// than failing.
pub fn load_or_empty(
    config: &RunConfig,
    base_dir: &Path,
) -> Result<(ListingCollection, Option<String>), CoreError> {
    match load_and_run(config, base_dir) {
        Ok(collection) => Ok((collection, None)),
        Err(err @ CoreError::UnrecognizedSchema { .. }) => Err(err),
        Err(err) => Ok((
            ListingCollection::empty(),
            Some(format!("could not load {}: {err}", config.file)),
        )),
    }
}

// ---------------------------------------------------------------------------
// Full analysis report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub name: String,
    pub source: crate::config::Source,
    pub kind: crate::config::ListingKind,
    pub metric: crate::config::Metric,
    pub engine_version: String,
}

/// Everything one run produces, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub meta: RunMeta,
    pub stats: SummaryStats,
    pub below_average: BelowAverageReport,
    pub same_address: Vec<AddressGroupRow>,
    pub same_street: Vec<StreetGroupRow>,
    pub areas: Vec<AreaStatsRow>,
}

/// Run every analysis over an already-normalized collection. All
/// detectors and rankings degrade to empty results on an empty
/// collection.
pub fn analyze(config: &RunConfig, collection: &ListingCollection) -> AnalysisReport {
    let metric = config.metric();
    AnalysisReport {
        meta: RunMeta {
            name: config.name.clone(),
            source: config.source,
            kind: config.kind,
            metric,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        stats: summary_stats(collection, metric),
        below_average: below_average(collection, metric),
        same_address: find_same_address(collection),
        same_street: find_same_street(collection, StreetNameMode::for_kind(config.kind)),
        areas: area_stats(collection, metric),
    }
}
