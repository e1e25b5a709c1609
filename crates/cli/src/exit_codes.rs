//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts and CI gates rely
//! on them, so changing one is a breaking change.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Run completed, every record Correct                |
//! | 1    | Run completed, discrepancies or missing rows found |
//! | 2    | Usage error (bad arguments, malformed flag value)  |
//! | 3    | Mapping failure (no identifier column)             |
//! | 4    | Input error (unreadable, unsupported, or empty)    |
//! | 5    | Config error (TOML parse or validation)            |

use bomtally_core::ReconcileError;

/// Success - the run completed and every record is Correct.
pub const EXIT_SUCCESS: u8 = 0;

/// The run completed but found discrepancies or missing records.
/// Like `diff(1)`, exit 1 means "the sources differ."
pub const EXIT_FINDINGS: u8 = 1;

/// Usage error - bad arguments, malformed flag values.
pub const EXIT_USAGE: u8 = 2;

/// Critical mapping failure - a source has no identifier column.
pub const EXIT_MAPPING: u8 = 3;

/// Input error - unreadable file, unsupported format, or empty table.
pub const EXIT_INPUT: u8 = 4;

/// Config error - TOML parse failure or out-of-range threshold.
pub const EXIT_CONFIG: u8 = 5;

/// Map an engine error to its exit code.
pub fn reconcile_exit_code(err: &ReconcileError) -> u8 {
    match err {
        ReconcileError::ConfigParse(_) | ReconcileError::ConfigValidation(_) => EXIT_CONFIG,
        ReconcileError::MappingFailed { .. } => EXIT_MAPPING,
        ReconcileError::EmptyInput { .. }
        | ReconcileError::UnsupportedFormat { .. }
        | ReconcileError::Io(_) => EXIT_INPUT,
        // Correction rejections only reach the CLI through bad flag values.
        ReconcileError::UnknownIdentifier { .. }
        | ReconcileError::SideAbsent { .. }
        | ReconcileError::AmbiguousRecord { .. }
        | ReconcileError::UncorrectableRole { .. } => EXIT_USAGE,
    }
}
