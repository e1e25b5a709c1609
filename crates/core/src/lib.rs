//! `bomtally-core`: the two-way BOM reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns classified
//! records. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod model;
pub mod normalize;
pub mod result;
pub mod similarity;

pub use config::{AliasTable, ReconcileConfig, Thresholds, UnitTable};
pub use engine::reconcile;
pub use error::ReconcileError;
pub use mapper::{infer_columns, map_columns};
pub use model::{
    ColumnMapping, ConfidenceBand, FieldMatch, FieldResults, FieldValue, NormalizedRow, RawTable,
    ReconRecord, Role, RoleMatch, Side, Status, StatusSummary,
};
pub use normalize::normalize_table;
pub use result::{Correction, CorrectionRequest, ResultSet};
