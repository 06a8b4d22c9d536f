use std::fmt;

use crate::config::ListingKind;

#[derive(Debug)]
pub enum CoreError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad source/kind/metric combination, etc.).
    ConfigValidation(String),
    /// The raw column count matches no enumerated layout for this source.
    /// Distinct from a parse failure: the file read fine, but no positional
    /// mapping table applies and guessing is not allowed.
    UnrecognizedSchema { kind: ListingKind, columns: usize },
    /// CSV read/decode error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnrecognizedSchema { kind, columns } => {
                write!(f, "unsupported schema: no known {kind} layout has {columns} columns")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
