// Workbook import (XLSX/XLSM/XLS/ODS) via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use bomtally_core::{RawTable, ReconcileError};

use crate::load::LoadStats;

/// Load one worksheet as a raw table. `sheet` picks by name; default is the
/// first sheet in the workbook.
pub fn import(
    path: &Path,
    sheet: Option<&str>,
) -> Result<(RawTable, LoadStats), ReconcileError> {
    let source = path.display().to_string();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ReconcileError::Io(format!("{source}: {e}")))?;

    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                ReconcileError::Io(format!(
                    "{source}: no sheet named '{wanted}' (sheets: {})",
                    names.join(", ")
                ))
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| ReconcileError::EmptyInput { source: source.clone() })?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ReconcileError::Io(format!("{source}: {e}")))?;

    // First non-blank row is the header, as with CSV.
    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut skipped_blank = 0usize;

    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            skipped_blank += 1;
            continue;
        }
        match &mut headers {
            None => headers = Some(cells),
            Some(_) => rows.push(cells),
        }
    }

    let Some(headers) = headers else {
        return Err(ReconcileError::EmptyInput { source });
    };
    if rows.is_empty() {
        return Err(ReconcileError::EmptyInput { source });
    }

    let stats = LoadStats {
        source,
        rows: rows.len(),
        skipped_blank,
        encoding_fallback: false,
        sheet: Some(name),
    };
    Ok((RawTable::new(headers, rows), stats))
}

/// Cell to text. Whole floats print without decimals so numeric part numbers
/// read back the way they were typed.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => {
            if *b {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
