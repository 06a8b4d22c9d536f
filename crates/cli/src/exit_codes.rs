//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! | Code | Description                                        |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args, invalid config)         |
//! | 3    | Unsupported schema (unknown column-count layout)   |
//! | 4    | Load failure (file unreadable or CSV unparseable)  |

use nadlan_core::CoreError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid or unreadable config.
pub const EXIT_USAGE: u8 = 2;

/// The input has a column count no mapping table covers.
pub const EXIT_SCHEMA: u8 = 3;

/// The input file could not be read or parsed as CSV.
pub const EXIT_LOAD: u8 = 4;

/// Map an engine error to its exit code.
pub fn core_exit_code(err: &CoreError) -> u8 {
    match err {
        CoreError::ConfigParse(_) | CoreError::ConfigValidation(_) => EXIT_USAGE,
        CoreError::UnrecognizedSchema { .. } => EXIT_SCHEMA,
        CoreError::Io(_) | CoreError::Csv(_) => EXIT_LOAD,
    }
}
