// Reconciliation report export - formatted workbook plus CSV extracts

use std::path::Path;

use chrono::Local;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook, Worksheet,
};

use bomtally_core::{NormalizedRow, ReconRecord, ReconcileError, ResultSet, Status};

/// Display names for the two sides, e.g. "ERP" and "Layout".
#[derive(Debug, Clone)]
pub struct SideLabels {
    pub a: String,
    pub b: String,
}

impl Default for SideLabels {
    fn default() -> Self {
        Self { a: "A".to_string(), b: "B".to_string() }
    }
}

impl SideLabels {
    pub fn new(a: &str, b: &str) -> Self {
        Self { a: a.to_string(), b: b.to_string() }
    }
}

// Fill colors keyed by status; headers are dark blue with white text.
const HEADER_BG: u32 = 0x1E40AF;
const CORRECT_BG: u32 = 0xD1FAE5;
const DISCREPANCY_BG: u32 = 0xFEF3C7;
const MISSING_BG: u32 = 0xFEE2E2;

const RECORD_COLUMN_WIDTHS: [f64; 12] =
    [18.0, 12.0, 12.0, 10.0, 10.0, 40.0, 40.0, 12.0, 12.0, 12.0, 16.0, 50.0];

// ---------------------------------------------------------------------------
// Workbook report
// ---------------------------------------------------------------------------

/// Write the full reconciliation report: a summary sheet, every record, and
/// a problems-only sheet, with rows colored by status.
pub fn write_report_xlsx(
    results: &ResultSet,
    labels: &SideLabels,
    path: &Path,
) -> Result<(), ReconcileError> {
    let mut workbook = XlsxWorkbook::new();

    write_summary_sheet(workbook.add_worksheet(), results, labels)?;

    let all: Vec<&ReconRecord> = results.records.iter().collect();
    write_records_sheet(workbook.add_worksheet(), "All Records", &all, labels)?;

    let problems: Vec<&ReconRecord> = results.problems().collect();
    write_records_sheet(workbook.add_worksheet(), "Problems", &problems, labels)?;

    workbook
        .save(path)
        .map_err(|e| ReconcileError::Io(format!("failed to save report: {e}")))?;
    Ok(())
}

fn write_summary_sheet(
    worksheet: &mut Worksheet,
    results: &ResultSet,
    labels: &SideLabels,
) -> Result<(), ReconcileError> {
    worksheet.set_name("Summary").map_err(xlsx_err)?;

    let title = Format::new()
        .set_bold()
        .set_font_size(14.0)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BG))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    worksheet
        .merge_range(0, 0, 0, 1, "BOM Reconciliation Report", &title)
        .map_err(xlsx_err)?;
    worksheet.set_row_height(0, 24.0).map_err(xlsx_err)?;

    let info = Format::new().set_bold();
    let generated = Local::now().format("%Y-%m-%d %H:%M").to_string();
    worksheet.write_string(1, 0, "Generated").map_err(xlsx_err)?;
    worksheet.write_string_with_format(1, 1, &generated, &info).map_err(xlsx_err)?;
    worksheet.write_string(2, 0, "Sources").map_err(xlsx_err)?;
    worksheet
        .write_string_with_format(2, 1, &format!("{} vs {}", labels.a, labels.b), &info)
        .map_err(xlsx_err)?;

    let s = &results.summary;
    let t = &results.config().thresholds;
    let lines: [(String, f64, Option<Format>); 10] = [
        ("Total records".to_string(), s.total as f64, None),
        ("Correct".to_string(), s.correct as f64, Some(status_format(Status::Correct))),
        (
            "Discrepancies".to_string(),
            s.discrepancy as f64,
            Some(status_format(Status::Discrepancy)),
        ),
        (
            format!("Missing in {}", labels.a),
            s.missing_in_a as f64,
            Some(status_format(Status::MissingInA)),
        ),
        (
            format!("Missing in {}", labels.b),
            s.missing_in_b as f64,
            Some(status_format(Status::MissingInB)),
        ),
        ("Correct %".to_string(), s.pct_correct, None),
        ("Problem %".to_string(), s.pct_problem, None),
        ("Column similarity threshold".to_string(), t.similarity, None),
        ("Quantity tolerance".to_string(), t.quantity_tolerance, None),
        ("Description similarity threshold".to_string(), t.description_similarity, None),
    ];

    for (i, (label, value, fmt)) in lines.iter().enumerate() {
        let row = 4 + i as u32;
        worksheet.write_string(row, 0, label).map_err(xlsx_err)?;
        match fmt {
            Some(fmt) => worksheet.write_number_with_format(row, 1, *value, fmt).map_err(xlsx_err)?,
            None => worksheet.write_number(row, 1, *value).map_err(xlsx_err)?,
        };
    }

    worksheet.set_column_width(0, 24.0).map_err(xlsx_err)?;
    worksheet.set_column_width(1, 18.0).map_err(xlsx_err)?;
    Ok(())
}

fn write_records_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    records: &[&ReconRecord],
    labels: &SideLabels,
) -> Result<(), ReconcileError> {
    worksheet.set_name(name).map_err(xlsx_err)?;

    let header = header_format();
    for (col, title) in record_columns(labels).iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, title, &header)
            .map_err(xlsx_err)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        let fmt = status_format(record.status);
        for (col, text) in record_cells(record, labels).iter().enumerate() {
            worksheet
                .write_string_with_format(row, col as u16, text, &fmt)
                .map_err(xlsx_err)?;
        }
    }

    worksheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    if !records.is_empty() {
        worksheet
            .autofilter(0, 0, records.len() as u32, 11)
            .map_err(xlsx_err)?;
    }
    for (col, width) in RECORD_COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width).map_err(xlsx_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV extracts
// ---------------------------------------------------------------------------

/// Problems-only CSV for triage in a spreadsheet or shell pipeline.
pub fn write_problems_csv(
    results: &ResultSet,
    labels: &SideLabels,
    path: &Path,
) -> Result<(), ReconcileError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ReconcileError::Io(e.to_string()))?;
    writer
        .write_record(&record_columns(labels))
        .map_err(|e| ReconcileError::Io(e.to_string()))?;
    for record in results.problems() {
        writer
            .write_record(&record_cells(record, labels))
            .map_err(|e| ReconcileError::Io(e.to_string()))?;
    }
    writer.flush().map_err(|e| ReconcileError::Io(e.to_string()))?;
    Ok(())
}

/// Two-column metric/value CSV with stable keys for scripted consumers.
pub fn write_summary_csv(results: &ResultSet, path: &Path) -> Result<(), ReconcileError> {
    let s = &results.summary;
    let rows = [
        ("total", s.total.to_string()),
        ("correct", s.correct.to_string()),
        ("discrepancy", s.discrepancy.to_string()),
        ("missing_in_a", s.missing_in_a.to_string()),
        ("missing_in_b", s.missing_in_b.to_string()),
        ("pct_correct", format!("{}", s.pct_correct)),
        ("pct_problem", format!("{}", s.pct_problem)),
    ];

    let mut writer = csv::Writer::from_path(path).map_err(|e| ReconcileError::Io(e.to_string()))?;
    writer
        .write_record(["metric", "value"])
        .map_err(|e| ReconcileError::Io(e.to_string()))?;
    for (metric, value) in &rows {
        writer
            .write_record([*metric, value.as_str()])
            .map_err(|e| ReconcileError::Io(e.to_string()))?;
    }
    writer.flush().map_err(|e| ReconcileError::Io(e.to_string()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared cell rendering
// ---------------------------------------------------------------------------

pub(crate) fn record_columns(labels: &SideLabels) -> [String; 12] {
    [
        "Part Number".to_string(),
        format!("{} Qty", labels.a),
        format!("{} Qty", labels.b),
        format!("{} Unit", labels.a),
        format!("{} Unit", labels.b),
        format!("{} Description", labels.a),
        format!("{} Description", labels.b),
        "Qty Result".to_string(),
        "Unit Result".to_string(),
        "Desc Result".to_string(),
        "Status".to_string(),
        "Issues".to_string(),
    ]
}

pub(crate) fn record_cells(record: &ReconRecord, labels: &SideLabels) -> [String; 12] {
    [
        record.identifier.clone(),
        raw_cell(record.a.as_ref(), |r| r.raw_quantity.as_deref()),
        raw_cell(record.b.as_ref(), |r| r.raw_quantity.as_deref()),
        raw_cell(record.a.as_ref(), |r| r.raw_unit.as_deref()),
        raw_cell(record.b.as_ref(), |r| r.raw_unit.as_deref()),
        raw_cell(record.a.as_ref(), |r| r.raw_description.as_deref()),
        raw_cell(record.b.as_ref(), |r| r.raw_description.as_deref()),
        record.fields.quantity.as_str().to_string(),
        record.fields.unit.as_str().to_string(),
        record.fields.description.as_str().to_string(),
        status_text(record.status, labels),
        record.issues.clone(),
    ]
}

fn raw_cell(
    row: Option<&NormalizedRow>,
    pick: impl Fn(&NormalizedRow) -> Option<&str>,
) -> String {
    row.and_then(pick).map(str::trim).unwrap_or_default().to_string()
}

pub(crate) fn status_text(status: Status, labels: &SideLabels) -> String {
    match status {
        Status::Correct => "Correct".to_string(),
        Status::Discrepancy => "Discrepancy".to_string(),
        Status::MissingInA => format!("Missing in {}", labels.a),
        Status::MissingInB => format!("Missing in {}", labels.b),
    }
}

pub(crate) fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BG))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Top)
}

fn status_format(status: Status) -> Format {
    let bg = match status {
        Status::Correct => CORRECT_BG,
        Status::Discrepancy => DISCREPANCY_BG,
        Status::MissingInA | Status::MissingInB => MISSING_BG,
    };
    Format::new()
        .set_background_color(Color::RGB(bg))
        .set_border(FormatBorder::Thin)
}

pub(crate) fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> ReconcileError {
    ReconcileError::Io(e.to_string())
}
