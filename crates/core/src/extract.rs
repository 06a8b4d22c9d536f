//! Numeric metric extraction from noisy localized listing text.
//!
//! Every parse failure is local: the value becomes `None` and the row
//! proceeds. Nothing here errors.

use regex::Regex;

use crate::model::{FieldMap, Indicator, ListingMetrics, Table};

/// Extraction strategies for size and rooms, compiled once per run.
pub struct MetricExtractor {
    size_re: Regex,
    rooms_re: Regex,
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricExtractor {
    pub fn new() -> Self {
        MetricExtractor {
            // Number immediately preceding a square-meter token. The
            // scrapes write the unit as מ"ר, מ״ר (gershayim) or מטר.
            size_re: Regex::new(r#"(\d+)\s*(?:מ"ר|מ״ר|מטר)"#).unwrap(),
            // Number (optionally decimal) immediately preceding the
            // rooms unit word.
            rooms_re: Regex::new(r"(\d+(?:\.\d+)?)\s*חדרים").unwrap(),
        }
    }

    /// Price from a dedicated column: digit characters only, concatenated.
    pub fn price(&self, text: &str) -> Option<i64> {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }

    /// Size from a dedicated column: digits and a single decimal point.
    pub fn size_dedicated(&self, text: &str) -> Option<f64> {
        decimal_text(text).and_then(|s| s.parse().ok())
    }

    /// Size embedded in free text: first number before a square-meter token.
    pub fn size_embedded(&self, text: &str) -> Option<f64> {
        self.size_re
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Rooms from a dedicated column, same stripping as size.
    pub fn rooms_dedicated(&self, text: &str) -> Option<f64> {
        decimal_text(text).and_then(|s| s.parse().ok())
    }

    /// Rooms embedded in free text: first number before the rooms word.
    pub fn rooms_embedded(&self, text: &str) -> Option<f64> {
        self.rooms_re
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Keep digits and decimal points; when several points survive, keep only
/// the last one (scrapes occasionally glue thousands separators in).
fn decimal_text(text: &str) -> Option<String> {
    let mut kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let points = kept.matches('.').count();
    if points > 1 {
        let mut removed = 0;
        kept = kept
            .chars()
            .filter(|c| {
                if *c == '.' && removed < points - 1 {
                    removed += 1;
                    false
                } else {
                    true
                }
            })
            .collect();
    }

    if kept.is_empty() || kept == "." {
        None
    } else {
        Some(kept)
    }
}

/// price / size, only when both are present and size is positive.
/// Never zero, never infinite, never an error.
pub fn price_per_meter(price: Option<i64>, size: Option<f64>) -> Option<f64> {
    match (price, size) {
        (Some(p), Some(s)) if s > 0.0 => Some(p as f64 / s),
        _ => None,
    }
}

/// A size/rooms combination analysts flag as under-priced potential:
/// strictly inside (60, 75) with 2 rooms, or strictly inside (75, 90)
/// with 2 or 3 rooms. Boundary values and missing metrics are regular.
pub fn size_rooms_indicator(size: Option<f64>, rooms: Option<f64>) -> Indicator {
    let (size, rooms) = match (size, rooms) {
        (Some(s), Some(r)) => (s, r),
        _ => return Indicator::Regular,
    };

    let band_one = size > 60.0 && size < 75.0 && rooms == 2.0;
    let band_two = size > 75.0 && size < 90.0 && (rooms == 2.0 || rooms == 3.0);

    if band_one || band_two {
        Indicator::Optimal
    } else {
        Indicator::Regular
    }
}

/// Derive per-row metrics for a normalized table. Dedicated columns win;
/// sources without them fall back to embedded extraction from the details
/// blob.
pub fn extract_metrics(table: &Table, fields: &FieldMap) -> Vec<ListingMetrics> {
    let ex = MetricExtractor::new();
    let rows = table.row_count();
    let mut metrics = Vec::with_capacity(rows);

    for r in 0..rows {
        let cell = |col: Option<usize>| col.and_then(|c| table.cell(r, c));

        let price = cell(fields.price).and_then(|t| ex.price(t));

        let size = match fields.size {
            Some(_) => cell(fields.size).and_then(|t| ex.size_dedicated(t)),
            None => cell(fields.details).and_then(|t| ex.size_embedded(t)),
        };

        let rooms = match fields.rooms {
            Some(_) => cell(fields.rooms).and_then(|t| ex.rooms_dedicated(t)),
            None => cell(fields.details).and_then(|t| ex.rooms_embedded(t)),
        };

        metrics.push(ListingMetrics {
            price,
            size,
            rooms,
            price_per_meter: price_per_meter(price, size),
            indicator: size_rooms_indicator(size, rooms),
        });
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_strips_everything_but_digits() {
        let ex = MetricExtractor::new();
        assert_eq!(ex.price("1,250,000 ₪"), Some(1_250_000));
        assert_eq!(ex.price("₪ 4,500"), Some(4500));
        assert_eq!(ex.price("לא צוין"), None);
        assert_eq!(ex.price(""), None);
    }

    #[test]
    fn size_dedicated_parses_decimals() {
        let ex = MetricExtractor::new();
        assert_eq!(ex.size_dedicated("80 מ\"ר"), Some(80.0));
        assert_eq!(ex.size_dedicated("85.5"), Some(85.5));
        assert_eq!(ex.size_dedicated("אין"), None);
    }

    #[test]
    fn repeated_decimal_points_collapse_to_last() {
        let ex = MetricExtractor::new();
        // "1.2.5" keeps the final point: 12.5
        assert_eq!(ex.rooms_dedicated("1.2.5"), Some(12.5));
        assert_eq!(ex.size_dedicated("..7"), Some(0.7));
    }

    #[test]
    fn embedded_size_first_match_wins() {
        let ex = MetricExtractor::new();
        assert_eq!(ex.size_embedded("3 חדרים, קומה 2, 80 מ\"ר"), Some(80.0));
        assert_eq!(ex.size_embedded("120 מ״ר מרפסת 14 מ״ר"), Some(120.0));
        assert_eq!(ex.size_embedded("3 חדרים בלבד"), None);
    }

    #[test]
    fn embedded_rooms() {
        let ex = MetricExtractor::new();
        assert_eq!(ex.rooms_embedded("3.5 חדרים, 90 מ\"ר"), Some(3.5));
        assert_eq!(ex.rooms_embedded("קומה 4"), None);
    }

    #[test]
    fn price_per_meter_contract() {
        let ex = MetricExtractor::new();
        let price = ex.price("1,250,000 ₪");
        let size = ex.size_dedicated("80 מ\"ר");
        assert_eq!(price, Some(1_250_000));
        assert_eq!(size, Some(80.0));
        assert_eq!(price_per_meter(price, size), Some(15625.0));
    }

    #[test]
    fn price_per_meter_missing_or_zero_size() {
        assert_eq!(price_per_meter(Some(1_000_000), None), None);
        assert_eq!(price_per_meter(Some(1_000_000), Some(0.0)), None);
        assert_eq!(price_per_meter(None, Some(80.0)), None);
    }

    #[test]
    fn indicator_bands_are_strict() {
        use Indicator::*;
        assert_eq!(size_rooms_indicator(Some(70.0), Some(2.0)), Optimal);
        assert_eq!(size_rooms_indicator(Some(75.0), Some(2.0)), Regular);
        assert_eq!(size_rooms_indicator(Some(80.0), Some(3.0)), Optimal);
        assert_eq!(size_rooms_indicator(Some(50.0), Some(2.0)), Regular);
        assert_eq!(size_rooms_indicator(Some(60.0), Some(2.0)), Regular);
        assert_eq!(size_rooms_indicator(Some(90.0), Some(3.0)), Regular);
        assert_eq!(size_rooms_indicator(Some(70.0), Some(3.0)), Regular);
        assert_eq!(size_rooms_indicator(None, Some(2.0)), Regular);
        assert_eq!(size_rooms_indicator(Some(70.0), None), Regular);
    }
}
