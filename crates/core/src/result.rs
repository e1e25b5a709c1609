use serde::Serialize;

use crate::config::ReconcileConfig;
use crate::engine;
use crate::error::ReconcileError;
use crate::model::{FieldValue, NormalizedRow, ReconRecord, Role, Side, Status, StatusSummary};
use crate::normalize;

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

/// A user edit to one source value on one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionRequest {
    pub identifier: String,
    pub side: Side,
    pub role: Role,
    pub value: String,
}

/// An applied correction, kept as the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub identifier: String,
    pub side: Side,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// The engine's output: records in ascending identifier order plus the
/// per-status summary. Read-only apart from `apply_correction`, which
/// re-evaluates exactly one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub records: Vec<ReconRecord>,
    pub summary: StatusSummary,
    pub corrections: Vec<Correction>,
    #[serde(skip)]
    config: ReconcileConfig,
}

impl ResultSet {
    pub(crate) fn new(records: Vec<ReconRecord>, config: ReconcileConfig) -> Self {
        let summary = compute_summary(&records);
        Self { records, summary, corrections: Vec::new(), config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Records with any status other than `Correct`.
    pub fn problems(&self) -> impl Iterator<Item = &ReconRecord> {
        self.records.iter().filter(|r| r.status != Status::Correct)
    }

    /// Records are sorted by identifier, so lookup is a binary search.
    pub fn record(&self, identifier: &str) -> Option<&ReconRecord> {
        self.records
            .binary_search_by(|r| r.identifier.as_str().cmp(identifier))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Apply one user correction: swap in the new value, re-run the field
    /// comparison for that record only, refresh the summary. Logged on
    /// success; the result set is untouched on error.
    pub fn apply_correction(
        &mut self,
        request: CorrectionRequest,
    ) -> Result<&ReconRecord, ReconcileError> {
        if request.role == Role::Identifier {
            return Err(ReconcileError::UncorrectableRole { role: request.role });
        }

        let idx = self
            .records
            .binary_search_by(|r| r.identifier.as_str().cmp(request.identifier.as_str()))
            .map_err(|_| ReconcileError::UnknownIdentifier {
                identifier: request.identifier.clone(),
            })?;

        let record = &mut self.records[idx];
        let duplicates = match request.side {
            Side::A => record.duplicates_a,
            Side::B => record.duplicates_b,
        };
        if duplicates.is_some() {
            return Err(ReconcileError::AmbiguousRecord { identifier: request.identifier });
        }
        let row = match request.side {
            Side::A => record.a.as_mut(),
            Side::B => record.b.as_mut(),
        };
        let Some(row) = row else {
            return Err(ReconcileError::SideAbsent {
                identifier: request.identifier,
                side: request.side,
            });
        };

        let previous = apply_to_row(row, request.role, &request.value, &self.config);

        let (fields, status, issues) = engine::evaluate(
            record.a.as_ref(),
            record.b.as_ref(),
            record.duplicates_a,
            record.duplicates_b,
            &self.config.thresholds,
        );
        record.fields = fields;
        record.status = status;
        record.issues = issues;
        record.corrected = true;

        self.corrections.push(Correction {
            identifier: request.identifier,
            side: request.side,
            role: request.role,
            previous,
            value: request.value,
        });
        self.summary = compute_summary(&self.records);
        Ok(&self.records[idx])
    }
}

/// Swap in the new raw value for one role, returning the previous raw text.
fn apply_to_row(
    row: &mut NormalizedRow,
    role: Role,
    value: &str,
    config: &ReconcileConfig,
) -> Option<String> {
    match role {
        Role::Quantity => {
            let previous = row.raw_quantity.replace(value.to_string());
            match normalize::parse_quantity(value) {
                Some(n) => {
                    row.quantity = FieldValue::Number(n);
                    row.quantity_parse_failure = None;
                }
                None => {
                    row.quantity = FieldValue::Absent;
                    row.quantity_parse_failure = if value.trim().is_empty() {
                        None
                    } else {
                        Some(value.trim().to_string())
                    };
                }
            }
            previous
        }
        Role::Unit => {
            let previous = row.raw_unit.replace(value.to_string());
            row.unit = normalize::normalize_unit(value, &config.units);
            previous
        }
        Role::Description => {
            let previous = row.raw_description.replace(value.to_string());
            let normalized = normalize::normalize_description(value);
            row.description = if normalized.is_empty() {
                FieldValue::Absent
            } else {
                FieldValue::Text(normalized)
            };
            previous
        }
        // Rejected before this point.
        Role::Identifier => None,
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

pub(crate) fn compute_summary(records: &[ReconRecord]) -> StatusSummary {
    let mut correct = 0;
    let mut discrepancy = 0;
    let mut missing_in_a = 0;
    let mut missing_in_b = 0;
    for record in records {
        match record.status {
            Status::Correct => correct += 1,
            Status::Discrepancy => discrepancy += 1,
            Status::MissingInA => missing_in_a += 1,
            Status::MissingInB => missing_in_b += 1,
        }
    }
    let total = records.len();
    StatusSummary {
        total,
        correct,
        discrepancy,
        missing_in_a,
        missing_in_b,
        pct_correct: percent(correct, total),
        pct_problem: percent(total - correct, total),
    }
}

/// Percentage rounded to one decimal, 0.0 for an empty set.
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
