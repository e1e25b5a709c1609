use std::collections::{BTreeMap, BTreeSet};

use crate::config::{ReconcileConfig, Thresholds};
use crate::model::{FieldMatch, FieldResults, NormalizedRow, ReconRecord, Status};
use crate::result::ResultSet;
use crate::similarity;

/// Denominator floor for the relative quantity comparison, so equal zero
/// quantities compare clean instead of dividing by zero.
const QUANTITY_EPSILON: f64 = 1e-9;

/// Outer-join both sides on identifier and classify every record.
///
/// Single pass, no hidden state: identical inputs produce identical result
/// sets, with records in ascending identifier order.
pub fn reconcile(a: &[NormalizedRow], b: &[NormalizedRow], config: &ReconcileConfig) -> ResultSet {
    let a_index = index_rows(a);
    let b_index = index_rows(b);

    let mut keys: BTreeSet<&str> = BTreeSet::new();
    keys.extend(a_index.keys());
    keys.extend(b_index.keys());

    let mut records = Vec::with_capacity(keys.len());
    for key in keys {
        let (row_a, duplicates_a) = match resolve_group(a_index.get(key)) {
            Group::Missing => (None, None),
            Group::Clean(row) => (Some(row), None),
            Group::Conflict(n) => (None, Some(n)),
        };
        let (row_b, duplicates_b) = match resolve_group(b_index.get(key)) {
            Group::Missing => (None, None),
            Group::Clean(row) => (Some(row), None),
            Group::Conflict(n) => (None, Some(n)),
        };

        let (fields, status, issues) =
            evaluate(row_a, row_b, duplicates_a, duplicates_b, &config.thresholds);

        records.push(ReconRecord {
            identifier: key.to_string(),
            a: row_a.cloned(),
            b: row_b.cloned(),
            duplicates_a,
            duplicates_b,
            fields,
            status,
            issues,
            corrected: false,
        });
    }

    ResultSet::new(records, config.clone())
}

fn index_rows(rows: &[NormalizedRow]) -> BTreeMap<&str, Vec<&NormalizedRow>> {
    let mut index: BTreeMap<&str, Vec<&NormalizedRow>> = BTreeMap::new();
    for row in rows {
        index.entry(row.identifier.as_str()).or_default().push(row);
    }
    index
}

/// One side's rows for an identifier after duplicate-group resolution.
/// Identical rows merge to the first; rows that disagree on any field are a
/// conflict and never reduce to a representative.
enum Group<'a> {
    Missing,
    Clean(&'a NormalizedRow),
    Conflict(usize),
}

fn resolve_group<'a>(rows: Option<&Vec<&'a NormalizedRow>>) -> Group<'a> {
    match rows {
        None => Group::Missing,
        Some(rows) => {
            let first = rows[0];
            if rows.iter().all(|r| r.same_fields(first)) {
                Group::Clean(first)
            } else {
                Group::Conflict(rows.len())
            }
        }
    }
}

/// Classify one record. Shared by the batch run and the single-record
/// re-evaluation after a correction.
pub(crate) fn evaluate(
    a: Option<&NormalizedRow>,
    b: Option<&NormalizedRow>,
    duplicates_a: Option<usize>,
    duplicates_b: Option<usize>,
    thresholds: &Thresholds,
) -> (FieldResults, Status, String) {
    let mut issues: Vec<String> = Vec::new();

    if let Some(n) = duplicates_a {
        issues.push(format!("duplicate identifier with conflicting data in A ({n} rows)"));
    }
    if let Some(n) = duplicates_b {
        issues.push(format!("duplicate identifier with conflicting data in B ({n} rows)"));
    }

    let (fields, status) = if duplicates_a.is_some() || duplicates_b.is_some() {
        if a.is_none() && duplicates_a.is_none() {
            issues.push("Missing in A".to_string());
        }
        if b.is_none() && duplicates_b.is_none() {
            issues.push("Missing in B".to_string());
        }
        (FieldResults::not_applicable(), Status::Discrepancy)
    } else {
        match (a, b) {
            (Some(row_a), Some(row_b)) => {
                let (fields, mut field_issues) = compare_fields(row_a, row_b, thresholds);
                issues.append(&mut field_issues);
                let status = if fields.any_mismatch() {
                    Status::Discrepancy
                } else {
                    Status::Correct
                };
                (fields, status)
            }
            (Some(_), None) => {
                issues.push("Missing in B".to_string());
                (FieldResults::not_applicable(), Status::MissingInB)
            }
            (None, _) => {
                issues.push("Missing in A".to_string());
                (FieldResults::not_applicable(), Status::MissingInA)
            }
        }
    };

    for (row, side) in [(a, "A"), (b, "B")] {
        if let Some(raw) = row.and_then(|r| r.quantity_parse_failure.as_ref()) {
            issues.push(format!("Quantity in {side} unparsable: '{raw}'"));
        }
    }

    (fields, status, issues.join("; "))
}

/// Field-by-field comparison of one clean pair, with an issue phrase per
/// mismatch.
pub(crate) fn compare_fields(
    a: &NormalizedRow,
    b: &NormalizedRow,
    thresholds: &Thresholds,
) -> (FieldResults, Vec<String>) {
    let mut issues = Vec::new();

    let quantity = match (a.quantity.as_number(), b.quantity.as_number()) {
        (Some(qa), Some(qb)) => {
            if quantities_match(qa, qb, thresholds.quantity_tolerance) {
                FieldMatch::Match
            } else {
                issues.push(format!("Quantity differs: {qa} vs {qb}"));
                FieldMatch::Mismatch
            }
        }
        _ => FieldMatch::NotApplicable,
    };

    let unit = match (a.unit.unit_token(), b.unit.unit_token()) {
        (Some(ua), Some(ub)) => {
            if ua == ub {
                FieldMatch::Match
            } else {
                issues.push(format!("Unit differs: {ua} vs {ub}"));
                FieldMatch::Mismatch
            }
        }
        _ => FieldMatch::NotApplicable,
    };

    let description = match (a.description.as_text(), b.description.as_text()) {
        (Some(da), Some(db)) => {
            let score = similarity::ratio(da, db);
            if score >= thresholds.description_similarity {
                FieldMatch::Match
            } else {
                issues.push(format!(
                    "Description similarity {:.0}% < {:.0}%",
                    score * 100.0,
                    thresholds.description_similarity * 100.0
                ));
                FieldMatch::Mismatch
            }
        }
        _ => FieldMatch::NotApplicable,
    };

    (FieldResults { quantity, unit, description }, issues)
}

/// Relative comparison with an inclusive boundary. The epsilon term keeps
/// human-decimal boundaries (exactly 1% apart at tolerance 0.01) inclusive
/// under IEEE-754 rounding.
fn quantities_match(qa: f64, qb: f64, tolerance: f64) -> bool {
    let delta = (qa - qb).abs();
    let scale = qa.abs().max(qb.abs()).max(QUANTITY_EPSILON);
    delta / scale <= tolerance + f64::EPSILON * 16.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
