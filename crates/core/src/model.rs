use serde::Serialize;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// One scraped table exactly as read from disk: row-major, positional,
/// no column semantics yet. Empty cells are kept as empty strings here;
/// they become `None` when the table goes column-major.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Widest row wins; scrape output is ragged.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A named column of optional text cells.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Option<String>>,
}

/// Column-major working table. Every column has the same length.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Column-major view of a raw table, short rows padded with `None`.
    /// Names are positional placeholders until classification runs.
    pub fn from_raw(raw: &RawTable) -> Table {
        let width = raw.column_count();
        let mut columns: Vec<Column> = (0..width)
            .map(|i| Column {
                name: format!("col_{i}"),
                cells: Vec::with_capacity(raw.rows.len()),
            })
            .collect();

        for row in &raw.rows {
            for (i, col) in columns.iter_mut().enumerate() {
                let cell = row.get(i).map(|s| s.trim()).filter(|s| !s.is_empty());
                col.cells.push(cell.map(|s| s.to_string()));
            }
        }

        Table { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Exact-name lookup. Canonical names are assigned once during
    /// normalization; nothing downstream searches by substring.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.columns
            .get(col)
            .and_then(|c| c.cells.get(row))
            .and_then(|v| v.as_deref())
    }

    /// One row as owned cells, in column order.
    pub fn row(&self, row: usize) -> Vec<Option<String>> {
        self.columns
            .iter()
            .map(|c| c.cells.get(row).cloned().flatten())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Column semantics
// ---------------------------------------------------------------------------

/// Closed taxonomy of column meanings. Every raw column gets exactly one;
/// anything the rules cannot place lands in `AdditionalInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticColumnType {
    Link,
    DeveloperLink,
    ImageSrc,
    Address,
    Rooms,
    Floor,
    Size,
    Price,
    PriceChange,
    ProjectName,
    Exclusive,
    Publisher,
    Where,
    AdditionalInfo,
}

impl SemanticColumnType {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::DeveloperLink => "developer_link",
            Self::ImageSrc => "image_src",
            Self::Address => "address",
            Self::Rooms => "rooms",
            Self::Floor => "floor",
            Self::Size => "size",
            Self::Price => "price",
            Self::PriceChange => "price_change",
            Self::ProjectName => "project_name",
            Self::Exclusive => "exclusive",
            Self::Publisher => "publisher",
            Self::Where => "where",
            Self::AdditionalInfo => "additional_info",
        }
    }
}

impl std::fmt::Display for SemanticColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

// ---------------------------------------------------------------------------
// Field map
// ---------------------------------------------------------------------------

/// Canonical field → column index, built once during normalization.
/// `details` is the free-text blob some sources pack rooms/floor/size
/// into; embedded extraction reads from it when no dedicated column
/// exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMap {
    pub link: Option<usize>,
    pub address: Option<usize>,
    pub price: Option<usize>,
    pub price_change: Option<usize>,
    pub size: Option<usize>,
    pub rooms: Option<usize>,
    pub details: Option<usize>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Optimal,
    Regular,
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Regular => write!(f, "regular"),
        }
    }
}

/// Numeric metrics derived from one listing's raw text, parsed once.
/// `price_per_meter` is `Some` iff price and size are both present and
/// size is positive.
#[derive(Debug, Clone, Serialize)]
pub struct ListingMetrics {
    pub price: Option<i64>,
    pub size: Option<f64>,
    pub rooms: Option<f64>,
    pub price_per_meter: Option<f64>,
    pub indicator: Indicator,
}

/// The normalized dataset one analysis run works over: the canonical
/// string table, the field map into it, and per-row derived metrics
/// (same order and length as the table rows).
#[derive(Debug, Clone)]
pub struct ListingCollection {
    pub table: Table,
    pub fields: FieldMap,
    pub metrics: Vec<ListingMetrics>,
}

impl ListingCollection {
    pub fn empty() -> Self {
        ListingCollection {
            table: Table::default(),
            fields: FieldMap::default(),
            metrics: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn link(&self, row: usize) -> Option<&str> {
        self.fields.link.and_then(|c| self.table.cell(row, c))
    }

    pub fn address(&self, row: usize) -> Option<&str> {
        self.fields.address.and_then(|c| self.table.cell(row, c))
    }

    pub fn price_change(&self, row: usize) -> Option<&str> {
        self.fields.price_change.and_then(|c| self.table.cell(row, c))
    }
}

// ---------------------------------------------------------------------------
// Analysis outputs
// ---------------------------------------------------------------------------

/// One member of a same-address group.
#[derive(Debug, Clone, Serialize)]
pub struct AddressGroupRow {
    pub address: String,
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

/// One member of a same-street group.
#[derive(Debug, Clone, Serialize)]
pub struct StreetGroupRow {
    pub street: String,
    pub address: String,
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

/// One listing strictly below the mean of the active metric.
#[derive(Debug, Clone, Serialize)]
pub struct BelowAverageRow {
    pub address: Option<String>,
    pub value: f64,
    /// value − mean, rounded to 2 decimals. Always negative.
    pub difference: f64,
    /// difference / mean · 100, rounded to 1 decimal, e.g. "-12.5%".
    pub percentage: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BelowAverageReport {
    /// Mean over non-missing metric values; `None` when no row has one.
    pub mean: Option<f64>,
    pub rows: Vec<BelowAverageRow>,
}

/// Per-area aggregate of the active metric (rental analysis).
#[derive(Debug, Clone, Serialize)]
pub struct AreaStatsRow {
    pub area: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Scalar aggregates over a collection for the active metric.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub listings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Rows with a non-empty price-change cell.
    pub price_changes: usize,
}
