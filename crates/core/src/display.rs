//! Display projection for the presentation layer.
//!
//! The core does not render anything; it hands consumers an ordered list
//! of the canonical fields actually present, a human-readable label per
//! field, and a per-row highlight flag for the optimal indicator. Absent
//! fields are silently omitted, never an error.

use crate::config::{ListingKind, Source};
use crate::error::CoreError;
use crate::model::{Indicator, ListingCollection};

/// Derived fields that exist on metrics rather than as table columns.
const FIELD_PRICE_PER_METER: &str = "price_per_meter";
const FIELD_INDICATOR: &str = "size_rooms_indicator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub name: String,
    pub label: String,
}

/// Display order per source and kind, mirroring what analysts expect to
/// see for each scrape family. Only fields present in the collection are
/// returned.
pub fn display_fields(
    collection: &ListingCollection,
    source: Source,
    kind: ListingKind,
) -> Vec<DisplayField> {
    let candidates: &[&str] = match (source, kind) {
        (Source::Madlan, ListingKind::Sale) => &[
            "link",
            "address",
            "rooms",
            "floor",
            "size",
            "price",
            "project_name",
            "exclusive",
            FIELD_PRICE_PER_METER,
            "developer_link",
            FIELD_INDICATOR,
        ],
        (Source::Madlan, ListingKind::Rental) => &[
            "link",
            "address",
            "price",
            "floor",
            "size",
            "developer_link",
            "exclusive",
            "price_change",
            "price_change_2",
        ],
        (Source::Yad2, ListingKind::Sale) => &[
            "link",
            "publisher",
            "price",
            // The details blob carries one of these three names.
            "rooms",
            "floor",
            "size",
            "address",
            "additional_info_1",
            "additional_info_2",
            "additional_info_3",
            "price_change",
            FIELD_PRICE_PER_METER,
            FIELD_INDICATOR,
        ],
        (Source::Yad2, ListingKind::Rental) => &[
            "link",
            "address",
            "price",
            "rooms",
            "floor",
            "size",
            "price_change",
            "additional_info_1",
            "additional_info_2",
        ],
    };

    candidates
        .iter()
        .filter(|name| is_present(collection, name))
        .map(|name| DisplayField {
            name: (*name).to_string(),
            label: label(name),
        })
        .collect()
}

fn is_present(collection: &ListingCollection, name: &str) -> bool {
    match name {
        FIELD_PRICE_PER_METER | FIELD_INDICATOR => !collection.is_empty(),
        _ => collection.table.column_index(name).is_some(),
    }
}

/// Human-readable (Hebrew) label for a canonical field name.
pub fn label(name: &str) -> String {
    let fixed = match name {
        "link" => "לינק",
        "address" => "כתובת",
        "rooms" => "חדרים",
        "floor" => "קומה",
        "size" => "גודל",
        "price" => "מחיר",
        "project_name" => "שם הפרוייקט",
        "exclusive" => "בלעדיות",
        "publisher" => "מפרסם",
        "developer_link" => "לינק יזם",
        "price_change" => "שינויי מחיר",
        FIELD_PRICE_PER_METER => "מחיר למטר",
        FIELD_INDICATOR => "פוטנציאל השבחה",
        _ => "",
    };
    if !fixed.is_empty() {
        return fixed.to_string();
    }
    if let Some(n) = name.strip_prefix("additional_info_") {
        return format!("מידע נוסף {n}");
    }
    if let Some(n) = name.strip_prefix("price_change_") {
        return format!("שינויי מחיר {n}");
    }
    name.to_string()
}

/// Per-row highlight flag for the optimal indicator. Rendering style is
/// the presentation layer's business.
pub fn optimal_flags(collection: &ListingCollection) -> Vec<bool> {
    collection
        .metrics
        .iter()
        .map(|m| m.indicator == Indicator::Optimal)
        .collect()
}

/// Project the collection onto the display fields as rows of text cells,
/// missing values rendered empty.
pub fn project(collection: &ListingCollection, fields: &[DisplayField]) -> Vec<Vec<String>> {
    (0..collection.len())
        .map(|r| {
            fields
                .iter()
                .map(|f| match f.name.as_str() {
                    FIELD_PRICE_PER_METER => collection.metrics[r]
                        .price_per_meter
                        .map(|v| format!("{v:.2}"))
                        .unwrap_or_default(),
                    FIELD_INDICATOR => collection.metrics[r].indicator.to_string(),
                    name => collection
                        .table
                        .column_index(name)
                        .and_then(|c| collection.table.cell(r, c))
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .collect()
}

/// Serialize headers + rows as CSV text, the exportable form of every
/// tabular analysis result.
pub fn to_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers)
        .map_err(|e| CoreError::Csv(e.to_string()))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| CoreError::Csv(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, FieldMap, ListingMetrics, Table};

    fn collection() -> ListingCollection {
        ListingCollection {
            table: Table {
                columns: vec![
                    Column {
                        name: "link".into(),
                        cells: vec![Some("https://madlan.co.il/listings/1".into())],
                    },
                    Column {
                        name: "address".into(),
                        cells: vec![Some("הרצל 5, תל אביב".into())],
                    },
                    Column {
                        name: "price".into(),
                        cells: vec![Some("1,250,000 ₪".into())],
                    },
                ],
            },
            fields: FieldMap {
                link: Some(0),
                address: Some(1),
                price: Some(2),
                ..FieldMap::default()
            },
            metrics: vec![ListingMetrics {
                price: Some(1_250_000),
                size: Some(80.0),
                rooms: Some(2.0),
                price_per_meter: Some(15625.0),
                indicator: Indicator::Optimal,
            }],
        }
    }

    #[test]
    fn absent_fields_silently_omitted() {
        let c = collection();
        let fields = display_fields(&c, Source::Madlan, ListingKind::Sale);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["link", "address", "price", "price_per_meter", "size_rooms_indicator"]
        );
    }

    #[test]
    fn yad2_blob_named_floor_or_size_still_displays() {
        let mut c = collection();
        c.table.columns.push(Column {
            name: "floor".into(),
            cells: vec![Some("קומה 2, 80 מ\"ר".into())],
        });
        let fields = display_fields(&c, Source::Yad2, ListingKind::Sale);
        assert!(fields.iter().any(|f| f.name == "floor"));

        c.table.columns.last_mut().unwrap().name = "size".into();
        let fields = display_fields(&c, Source::Yad2, ListingKind::Rental);
        assert!(fields.iter().any(|f| f.name == "size"));
    }

    #[test]
    fn labels_cover_suffix_fields() {
        assert_eq!(label("price"), "מחיר");
        assert_eq!(label("additional_info_2"), "מידע נוסף 2");
        assert_eq!(label("price_change_2"), "שינויי מחיר 2");
    }

    #[test]
    fn projection_renders_derived_fields() {
        let c = collection();
        let fields = display_fields(&c, Source::Madlan, ListingKind::Sale);
        let rows = project(&c, &fields);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains(&"15625.00".to_string()));
        assert!(rows[0].contains(&"optimal".to_string()));
    }

    #[test]
    fn optimal_flag_per_row() {
        let c = collection();
        assert_eq!(optimal_flags(&c), vec![true]);
    }

    #[test]
    fn csv_round_trips_headers_and_rows() {
        let csv = to_csv(
            &["a".into(), "b".into()],
            &[vec!["1".into(), "x,y".into()]],
        )
        .unwrap();
        assert!(csv.starts_with("a,b\n"));
        assert!(csv.contains("\"x,y\""));
    }

    #[test]
    fn empty_collection_has_no_display_fields() {
        let c = ListingCollection::empty();
        let fields = display_fields(&c, Source::Yad2, ListingKind::Sale);
        assert!(fields.is_empty());
    }
}
