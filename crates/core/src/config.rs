use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Rows inspected when sampling a column, both for content classification
/// and for sequential-identical-column detection. Enough to see past
/// sparse cells in real exports; override via `sample_rows`.
pub const DEFAULT_SAMPLE_ROWS: usize = 20;

// ---------------------------------------------------------------------------
// Top-level run config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub file: String,
    pub source: Source,
    pub kind: ListingKind,
    /// Active price metric. Defaults per kind: sale compares price per
    /// meter, rental compares raw rent.
    #[serde(default)]
    pub metric: Option<Metric>,
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    /// Scrapes usually carry a junk header row; it is discarded, never
    /// used for naming.
    #[serde(default = "default_true")]
    pub has_header: bool,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Source / kind / metric
// ---------------------------------------------------------------------------

/// Which listing site produced the export. Madlan exports are mapped by
/// column-count signature; Yad2 exports are classified by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Madlan,
    Yad2,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Madlan => write!(f, "madlan"),
            Self::Yad2 => write!(f, "yad2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Sale,
    Rental,
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sale => write!(f, "sale"),
            Self::Rental => write!(f, "rental"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Price,
    PricePerMeter,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Price => write!(f, "price"),
            Self::PricePerMeter => write!(f, "price_per_meter"),
        }
    }
}

impl ListingKind {
    /// The comparison metric analysts use by default for this kind.
    pub fn default_metric(&self) -> Metric {
        match self {
            Self::Sale => Metric::PricePerMeter,
            Self::Rental => Metric::Price,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, CoreError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.file.is_empty() {
            return Err(CoreError::ConfigValidation("file must not be empty".into()));
        }
        if self.sample_rows == 0 {
            return Err(CoreError::ConfigValidation(
                "sample_rows must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Active metric: explicit choice, or the kind's default.
    pub fn metric(&self) -> Metric {
        self.metric.unwrap_or_else(|| self.kind.default_metric())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
