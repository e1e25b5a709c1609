use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A loaded table: header row plus data rows, every cell as exact text.
/// Loaders must never coerce identifier cells through numeric parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Cell text at (row, column), empty string for ragged or out-of-range
    /// positions.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Semantic roles + sides
// ---------------------------------------------------------------------------

/// The semantic slot a source column plays in the reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Identifier,
    Quantity,
    Unit,
    Description,
}

impl Role {
    /// Declaration order doubles as the tie-break order during mapping.
    pub const ALL: [Role; 4] = [Role::Identifier, Role::Quantity, Role::Unit, Role::Description];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Quantity => "quantity",
            Self::Unit => "unit",
            Self::Description => "description",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        match name.trim().to_ascii_lowercase().as_str() {
            "identifier" => Some(Self::Identifier),
            "quantity" => Some(Self::Quantity),
            "unit" => Some(Self::Unit),
            "description" => Some(Self::Description),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which of the two sources a row or correction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub const HIGH: f64 = 0.85;
    pub const MEDIUM: f64 = 0.70;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH {
            Self::High
        } else if score >= Self::MEDIUM {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The column chosen for one role, with the score that chose it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleMatch {
    pub column: usize,
    pub header: String,
    pub confidence: f64,
    pub band: ConfidenceBand,
}

/// Role-to-column assignment for one source table.
///
/// Mapped roles point at distinct columns. Built by the mapper; only a user
/// override mutates it afterwards, and the override keeps the bijection by
/// dropping any previous claim on the same column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub source: String,
    roles: BTreeMap<Role, RoleMatch>,
}

impl ColumnMapping {
    pub fn new(source: &str) -> Self {
        Self { source: source.to_string(), roles: BTreeMap::new() }
    }

    pub fn get(&self, role: Role) -> Option<&RoleMatch> {
        self.roles.get(&role)
    }

    pub fn column_of(&self, role: Role) -> Option<usize> {
        self.roles.get(&role).map(|m| m.column)
    }

    pub fn is_mapped(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleMatch)> {
        self.roles.iter().map(|(role, m)| (*role, m))
    }

    /// Record an inferred match. Used by the mapper, which has already
    /// resolved column claims.
    pub(crate) fn insert(&mut self, role: Role, m: RoleMatch) {
        self.roles.insert(role, m);
    }

    /// User override: claim `column` for `role` at full confidence, dropping
    /// any other role's claim on that column.
    pub fn assign(&mut self, role: Role, column: usize, header: &str) {
        self.roles.retain(|r, m| *r == role || m.column != column);
        self.roles.insert(
            role,
            RoleMatch {
                column,
                header: header.to_string(),
                confidence: 1.0,
                band: ConfidenceBand::High,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Normalized values
// ---------------------------------------------------------------------------

/// A cell after per-role normalization. Loosely-typed input cells become one
/// of these instead of being coerced in place; quantity parse failures become
/// `Absent`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Absent,
    Number(f64),
    Text(String),
    /// Unit token after synonym lookup. `canonical` is false when the raw
    /// token was not in the synonym table and passed through unchanged.
    Unit { token: String, canonical: bool },
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn unit_token(&self) -> Option<&str> {
        match self {
            Self::Unit { token, .. } => Some(token),
            _ => None,
        }
    }
}

/// One row reduced to its semantic fields, with the original cell text kept
/// for display and a back-reference to the raw row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub identifier: String,
    pub quantity: FieldValue,
    pub unit: FieldValue,
    pub description: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_description: Option<String>,
    /// Raw quantity text that failed numeric parsing, kept for the issue note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_parse_failure: Option<String>,
    pub row_index: usize,
}

impl NormalizedRow {
    /// Field-identity check for duplicate-group merging: same normalized
    /// quantity, unit and description. Raw text and row position may differ.
    pub fn same_fields(&self, other: &Self) -> bool {
        self.quantity == other.quantity
            && self.unit == other.unit
            && self.description == other.description
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMatch {
    Match,
    Mismatch,
    NotApplicable,
}

impl FieldMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::NotApplicable => "not_applicable",
        }
    }
}

impl std::fmt::Display for FieldMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-field comparison outcome for a paired record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldResults {
    pub quantity: FieldMatch,
    pub unit: FieldMatch,
    pub description: FieldMatch,
}

impl FieldResults {
    pub fn not_applicable() -> Self {
        Self {
            quantity: FieldMatch::NotApplicable,
            unit: FieldMatch::NotApplicable,
            description: FieldMatch::NotApplicable,
        }
    }

    pub fn any_mismatch(&self) -> bool {
        self.quantity == FieldMatch::Mismatch
            || self.unit == FieldMatch::Mismatch
            || self.description == FieldMatch::Mismatch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Correct,
    Discrepancy,
    MissingInA,
    MissingInB,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Discrepancy => "discrepancy",
            Self::MissingInA => "missing_in_a",
            Self::MissingInB => "missing_in_b",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reconciliation outcome per distinct identifier across both sources.
///
/// A side is `None` when the identifier is missing there, and also when that
/// side holds conflicting duplicate rows (`duplicates_*` carries the row
/// count); conflicting rows are surfaced, never reduced to a representative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconRecord {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<NormalizedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<NormalizedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates_a: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates_b: Option<usize>,
    pub fields: FieldResults,
    pub status: Status,
    pub issues: String,
    pub corrected: bool,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-status counts plus the percentages reports lead with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub correct: usize,
    pub discrepancy: usize,
    pub missing_in_a: usize,
    pub missing_in_b: usize,
    /// Percent of records with status `Correct`, one decimal.
    pub pct_correct: f64,
    /// Percent of records with any other status, one decimal.
    pub pct_problem: f64,
}
