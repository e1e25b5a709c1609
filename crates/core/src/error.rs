use std::fmt;

use crate::model::{Role, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, empty alias list, etc.).
    ConfigValidation(String),
    /// A required role could not be mapped onto any column.
    MappingFailed { source: String, role: Role },
    /// Input table has no header or no data rows.
    EmptyInput { source: String },
    /// File extension is not one of the supported formats.
    UnsupportedFormat { path: String },
    /// Correction references an identifier not in the result set.
    UnknownIdentifier { identifier: String },
    /// Correction targets a side with no row for that identifier.
    SideAbsent { identifier: String, side: Side },
    /// Correction targets a record with conflicting duplicate rows.
    AmbiguousRecord { identifier: String },
    /// Correction targets a role that cannot be edited in place.
    UncorrectableRole { role: Role },
    /// IO error (file read, file write, etc.).
    Io(String),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MappingFailed { source, role } => {
                write!(f, "critical mapping failure: source '{source}' has no column for role '{role}'")
            }
            Self::EmptyInput { source } => {
                write!(f, "source '{source}' is empty: no header or no data rows")
            }
            Self::UnsupportedFormat { path } => {
                write!(f, "unsupported input format: '{path}'")
            }
            Self::UnknownIdentifier { identifier } => {
                write!(f, "no record with identifier '{identifier}'")
            }
            Self::SideAbsent { identifier, side } => {
                write!(f, "record '{identifier}' has no row on side {side}")
            }
            Self::AmbiguousRecord { identifier } => {
                write!(f, "record '{identifier}' has conflicting duplicate rows; fix the source data and re-run")
            }
            Self::UncorrectableRole { role } => {
                write!(f, "role '{role}' cannot be corrected in place; reload and re-run instead")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconcileError {}
