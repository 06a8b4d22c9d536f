//! Schema normalization: raw positional columns → canonical named columns.
//!
//! Two paths produce the same shape:
//! - signature-based (Madlan): the raw column count selects an enumerated
//!   position → name layout; unknown counts are an error, never a guess;
//! - content-based (Yad2): every column goes through the classifier and
//!   gets a suffix-disambiguated canonical name.
//!
//! Both paths drop sequential-identical columns (scrape artifacts such as
//! repeated badges), then filter rows: all-empty rows, project-aggregate
//! rows (link contains "projects"), exact duplicates, and for Yad2
//! rentals the commercial listings.

use std::collections::HashSet;

use regex::Regex;

use crate::classify::{assign_canonical_names, classify_columns, column_sample};
use crate::config::{ListingKind, Source};
use crate::error::CoreError;
use crate::model::{FieldMap, Table};

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// One known positional layout: column names in order plus the
/// known-noise columns to drop right after mapping.
pub struct Signature {
    pub names: &'static [&'static str],
    pub drop: &'static [&'static str],
}

// The 9-column sale export named two positions "price_change" in the
// upstream scraper; the second occurrence takes the numeric suffix the
// classifier would have assigned, keeping column names unique.
const MADLAN_SALE_9: Signature = Signature {
    names: &[
        "link", "price", "rooms", "floor", "size", "address", "price_change", "price_change_2",
        "exclusive",
    ],
    drop: &[],
};

const MADLAN_SALE_12: Signature = Signature {
    names: &[
        "link", "image_src", "address", "rooms", "floor", "floor_info", "size", "area", "price",
        "developer_link", "developer_image", "exclusive",
    ],
    drop: &["floor_info", "developer_image", "area"],
};

const MADLAN_SALE_13: Signature = Signature {
    names: &[
        "link", "image_src", "address", "rooms", "floor", "floor_info", "size", "area", "price",
        "developer_link", "developer_image", "project_name", "exclusive",
    ],
    drop: &["floor_info", "developer_image", "area"],
};

const MADLAN_SALE_14: Signature = Signature {
    names: &[
        "link", "image_src", "address", "rooms", "floor", "floor_info", "size", "area", "price",
        "developer_link", "developer_image", "info", "project_name", "exclusive",
    ],
    drop: &["floor_info", "developer_image", "area", "info"],
};

const MADLAN_RENTAL_12: Signature = Signature {
    names: &[
        "link", "image_src", "address", "rooms", "floor", "floor_info", "size", "area", "price",
        "developer_link", "image", "exclusive",
    ],
    drop: &["area", "image_src", "image", "floor_info"],
};

const MADLAN_RENTAL_13: Signature = Signature {
    names: &[
        "link", "image_src", "address", "rooms", "floor", "floor_info", "size", "area", "price",
        "developer_link", "image", "exclusive", "project_name",
    ],
    drop: &["area", "image_src", "image", "floor_info", "project_name"],
};

const MADLAN_RENTAL_16: Signature = Signature {
    names: &[
        "link", "delete_1", "image_src", "address", "rooms", "floor", "floor_info", "size",
        "area", "price", "developer_link", "image", "exclusive", "delete_2", "price_change",
        "price_change_2",
    ],
    drop: &["delete_1", "delete_2", "area", "image_src", "image", "floor_info"],
};

/// Look up the positional layout for a raw column count.
pub fn lookup_signature(kind: ListingKind, columns: usize) -> Result<&'static Signature, CoreError> {
    let sig = match (kind, columns) {
        (ListingKind::Sale, 9) => &MADLAN_SALE_9,
        (ListingKind::Sale, 12) => &MADLAN_SALE_12,
        (ListingKind::Sale, 13) => &MADLAN_SALE_13,
        (ListingKind::Sale, 14) => &MADLAN_SALE_14,
        (ListingKind::Rental, 12) => &MADLAN_RENTAL_12,
        (ListingKind::Rental, 13) => &MADLAN_RENTAL_13,
        (ListingKind::Rental, 16) => &MADLAN_RENTAL_16,
        _ => return Err(CoreError::UnrecognizedSchema { kind, columns }),
    };
    Ok(sig)
}

// ---------------------------------------------------------------------------
// Column dropping
// ---------------------------------------------------------------------------

/// Drop sequential-identical columns: the first value is present and every
/// sampled row after it carries the same value. Such columns are repeated
/// badges/icons from the scrape, not signal. Idempotent: surviving columns
/// are untouched, so a second pass drops nothing.
pub fn drop_constant_columns(table: Table, sample_rows: usize) -> Table {
    let columns = table
        .columns
        .into_iter()
        .filter(|col| {
            let first = match col.cells.first().and_then(|c| c.as_deref()) {
                Some(v) => v,
                // All-missing head: keep, the classifier's fallback owns it.
                None => return true,
            };
            !col.cells
                .iter()
                .take(sample_rows)
                .skip(1)
                .all(|c| c.as_deref() == Some(first))
        })
        .collect();
    Table { columns }
}

fn drop_columns_by_name(table: Table, names: &[&str]) -> Table {
    let columns = table
        .columns
        .into_iter()
        .filter(|c| !names.contains(&c.name.as_str()))
        .collect();
    Table { columns }
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

fn retain_rows(table: Table, keep: &[bool]) -> Table {
    let columns = table
        .columns
        .into_iter()
        .map(|mut col| {
            let mut it = keep.iter();
            col.cells.retain(|_| *it.next().unwrap_or(&true));
            col
        })
        .collect();
    Table { columns }
}

/// Drop all-empty rows, rows whose link is a project aggregate, and exact
/// duplicate rows (first occurrence wins). Optionally drop rows whose
/// details text marks a commercial listing.
fn filter_rows(table: Table, link_col: Option<usize>, commercial_col: Option<usize>) -> Table {
    let rows = table.row_count();
    let commercial_re = Regex::new("מסחרי|משרד").unwrap();
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    let mut keep = Vec::with_capacity(rows);

    for r in 0..rows {
        let row = table.row(r);

        if row.iter().all(|c| c.is_none()) {
            keep.push(false);
            continue;
        }

        if let Some(link) = link_col.and_then(|c| table.cell(r, c)) {
            if link.to_lowercase().contains("projects") {
                keep.push(false);
                continue;
            }
        }

        if let Some(details) = commercial_col.and_then(|c| table.cell(r, c)) {
            if commercial_re.is_match(details) {
                keep.push(false);
                continue;
            }
        }

        keep.push(seen.insert(row));
    }

    retain_rows(table, &keep)
}

// ---------------------------------------------------------------------------
// Normalization paths
// ---------------------------------------------------------------------------

/// Signature path: positional mapping selected by the raw column count.
/// The mapping is applied before any column is dropped so positions never
/// shift; constant-column dropping then works on named columns.
pub fn normalize_by_signature(
    mut table: Table,
    kind: ListingKind,
    sample_rows: usize,
) -> Result<(Table, FieldMap), CoreError> {
    let sig = lookup_signature(kind, table.column_count())?;

    for (col, name) in table.columns.iter_mut().zip(sig.names) {
        col.name = (*name).to_string();
    }

    let table = drop_columns_by_name(table, sig.drop);
    let table = drop_constant_columns(table, sample_rows);
    let link_col = table.column_index("link");
    let table = filter_rows(table, link_col, None);

    let fields = build_field_map(&table, Source::Madlan);
    Ok((table, fields))
}

/// Content path: classify all columns, rename with suffix counters, then
/// drop the canonical columns known to be scrape noise for this kind.
pub fn normalize_by_content(
    table: Table,
    source: Source,
    kind: ListingKind,
    sample_rows: usize,
) -> (Table, FieldMap) {
    let mut table = drop_constant_columns(table, sample_rows);

    let types = classify_columns(&table, source, sample_rows);
    let names = assign_canonical_names(&types);
    for (col, name) in table.columns.iter_mut().zip(names) {
        col.name = name;
    }

    let table = match kind {
        ListingKind::Sale => drop_columns_by_name(table, &["image_src", "where"]),
        ListingKind::Rental => table,
    };

    let fields = build_field_map(&table, source);
    let commercial_col = match kind {
        ListingKind::Rental => fields.details,
        ListingKind::Sale => None,
    };
    let table = filter_rows(table, fields.link, commercial_col);

    // Indices survive row filtering but column drops happened before the map.
    let fields = build_field_map(&table, source);
    (table, fields)
}

/// Normalize a raw table for the given source and kind.
pub fn normalize(
    table: Table,
    source: Source,
    kind: ListingKind,
    sample_rows: usize,
) -> Result<(Table, FieldMap), CoreError> {
    match source {
        Source::Madlan => normalize_by_signature(table, kind, sample_rows),
        Source::Yad2 => Ok(normalize_by_content(table, source, kind, sample_rows)),
    }
}

// ---------------------------------------------------------------------------
// Field map
// ---------------------------------------------------------------------------

/// Canonical field → column index, by exact name. Madlan carries dedicated
/// size/rooms columns; Yad2 packs both into the details blob the classifier
/// filed under its most specific metric name.
pub fn build_field_map(table: &Table, source: Source) -> FieldMap {
    let idx = |name: &str| table.column_index(name);

    let mut fields = FieldMap {
        link: idx("link"),
        address: idx("address"),
        price: idx("price"),
        price_change: idx("price_change"),
        ..FieldMap::default()
    };

    match source {
        Source::Madlan => {
            fields.size = idx("size");
            fields.rooms = idx("rooms");
        }
        Source::Yad2 => {
            // The blob takes whichever metric name the classifier's
            // cascade resolved it to: rooms, floor, or size.
            fields.details = idx("rooms")
                .or_else(|| idx("floor"))
                .or_else(|| idx("size"));
        }
    }

    fields
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
