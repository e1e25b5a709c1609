use crate::config::UnitTable;
use crate::model::{ColumnMapping, FieldValue, NormalizedRow, RawTable, Role};

/// Trim surrounding whitespace, nothing else. Identifiers never pass through
/// numeric parsing: "00123" stays "00123".
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_string()
}

/// Lenient decimal parse: trims, strips thousands separators, rejects
/// non-finite values. Empty or unparsable input is None, never zero.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Unit token after synonym lookup. Unrecognized tokens pass through
/// upper-cased with `canonical: false`.
pub fn normalize_unit(raw: &str, units: &UnitTable) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Absent;
    }
    match units.canonical_for(trimmed) {
        Some(canonical) => FieldValue::Unit {
            token: canonical.to_string(),
            canonical: true,
        },
        None => FieldValue::Unit {
            token: trimmed.to_uppercase(),
            canonical: false,
        },
    }
}

/// Lower-case and collapse whitespace runs to single spaces. Comparison form
/// only; the original text stays on the row for display.
pub fn normalize_description(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize one data row. None when the identifier cell is blank: such rows
/// cannot join and are skipped (counted by `normalize_table`).
pub fn normalize_row(
    table: &RawTable,
    row: usize,
    mapping: &ColumnMapping,
    units: &UnitTable,
) -> Option<NormalizedRow> {
    let ident_col = mapping.column_of(Role::Identifier)?;
    let identifier = normalize_identifier(table.cell(row, ident_col));
    if identifier.is_empty() {
        return None;
    }

    let mut quantity = FieldValue::Absent;
    let mut raw_quantity = None;
    let mut quantity_parse_failure = None;
    if let Some(col) = mapping.column_of(Role::Quantity) {
        let raw = table.cell(row, col);
        raw_quantity = Some(raw.to_string());
        match parse_quantity(raw) {
            Some(n) => quantity = FieldValue::Number(n),
            None => {
                if !raw.trim().is_empty() {
                    quantity_parse_failure = Some(raw.trim().to_string());
                }
            }
        }
    }

    let mut unit = FieldValue::Absent;
    let mut raw_unit = None;
    if let Some(col) = mapping.column_of(Role::Unit) {
        let raw = table.cell(row, col);
        raw_unit = Some(raw.to_string());
        unit = normalize_unit(raw, units);
    }

    let mut description = FieldValue::Absent;
    let mut raw_description = None;
    if let Some(col) = mapping.column_of(Role::Description) {
        let raw = table.cell(row, col);
        raw_description = Some(raw.to_string());
        let normalized = normalize_description(raw);
        if !normalized.is_empty() {
            description = FieldValue::Text(normalized);
        }
    }

    Some(NormalizedRow {
        identifier,
        quantity,
        unit,
        description,
        raw_quantity,
        raw_unit,
        raw_description,
        quantity_parse_failure,
        row_index: row,
    })
}

/// Normalize every data row of a table. Returns the rows plus the count of
/// rows dropped for a blank identifier.
pub fn normalize_table(
    table: &RawTable,
    mapping: &ColumnMapping,
    units: &UnitTable,
) -> (Vec<NormalizedRow>, usize) {
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut skipped = 0;
    for row in 0..table.rows.len() {
        match normalize_row(table, row, mapping, units) {
            Some(normalized) => rows.push(normalized),
            None => skipped += 1,
        }
    }
    (rows, skipped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
