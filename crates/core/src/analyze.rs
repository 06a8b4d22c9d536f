//! Comparative analysis: below-average ranking, per-area aggregates, and
//! scalar summary statistics over the active metric.

use std::collections::BTreeMap;

use crate::config::Metric;
use crate::model::{AreaStatsRow, BelowAverageReport, BelowAverageRow, ListingCollection, SummaryStats};

/// The active metric value of one listing, if it could be derived.
pub fn metric_value(collection: &ListingCollection, row: usize, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Price => collection.metrics[row].price.map(|p| p as f64),
        Metric::PricePerMeter => collection.metrics[row].price_per_meter,
    }
}

/// Mean over non-missing values only; `None` when nothing is available.
pub fn metric_mean(collection: &ListingCollection, metric: Metric) -> Option<f64> {
    let values: Vec<f64> = (0..collection.len())
        .filter_map(|r| metric_value(collection, r, metric))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Rank listings strictly below the mean of the chosen metric, most
/// below-average first. Listings at or above the mean (and listings with
/// a missing value) are omitted entirely, never zero-filled.
pub fn below_average(collection: &ListingCollection, metric: Metric) -> BelowAverageReport {
    let mean = match metric_mean(collection, metric) {
        Some(m) => m,
        None => {
            return BelowAverageReport {
                mean: None,
                rows: Vec::new(),
            }
        }
    };

    let mut rows: Vec<BelowAverageRow> = (0..collection.len())
        .filter_map(|r| {
            let value = metric_value(collection, r, metric)?;
            let difference = value - mean;
            if difference >= 0.0 {
                return None;
            }
            let percentage = difference / mean * 100.0;
            Some(BelowAverageRow {
                address: collection.address(r).map(|s| s.to_string()),
                value,
                difference: round2(difference),
                percentage: format!("{percentage:.1}%"),
                link: collection.link(r).map(|s| s.to_string()),
            })
        })
        .collect();

    rows.sort_by(|a, b| a.difference.total_cmp(&b.difference));

    BelowAverageReport {
        mean: Some(mean),
        rows,
    }
}

/// The area segment of an address: the part after the last comma, or the
/// whole address when it has no comma.
fn area_of(address: &str) -> String {
    match address.rsplit_once(',') {
        Some((_, area)) => area.trim().to_string(),
        None => address.trim().to_string(),
    }
}

/// Per-area mean/min/max/count of the active metric, rounded to 2
/// decimals. Rows with a missing address or metric value contribute
/// nothing; an area only appears once it has at least one value.
pub fn area_stats(collection: &ListingCollection, metric: Metric) -> Vec<AreaStatsRow> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for r in 0..collection.len() {
        let area = match collection.address(r) {
            Some(a) => area_of(a),
            None => continue,
        };
        if area.is_empty() {
            continue;
        }
        if let Some(value) = metric_value(collection, r, metric) {
            groups.entry(area).or_default().push(value);
        }
    }

    groups
        .into_iter()
        .map(|(area, values)| {
            let count = values.len();
            let sum: f64 = values.iter().sum();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            AreaStatsRow {
                area,
                mean: round2(sum / count as f64),
                min: round2(min),
                max: round2(max),
                count,
            }
        })
        .collect()
}

/// Scalar aggregates: listing count, min/max/mean of the active metric,
/// and how many rows carry a price-change note.
pub fn summary_stats(collection: &ListingCollection, metric: Metric) -> SummaryStats {
    let values: Vec<f64> = (0..collection.len())
        .filter_map(|r| metric_value(collection, r, metric))
        .collect();

    let (min, max, mean) = if values.is_empty() {
        (None, None, None)
    } else {
        (
            Some(values.iter().cloned().fold(f64::INFINITY, f64::min)),
            Some(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
            Some(values.iter().sum::<f64>() / values.len() as f64),
        )
    };

    let price_changes = (0..collection.len())
        .filter(|&r| {
            collection
                .price_change(r)
                .map(|v| v.trim() != "0")
                .unwrap_or(false)
        })
        .count();

    SummaryStats {
        listings: collection.len(),
        min,
        max,
        mean,
        price_changes,
    }
}
