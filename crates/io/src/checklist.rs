// Floor-check checklist export - print-ready workbook for physical counts

use std::path::Path;

use chrono::Local;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook, Worksheet,
};

use bomtally_core::{NormalizedRow, ReconRecord, ReconcileError, ResultSet};

use crate::report::{status_text, xlsx_err, SideLabels};

const TITLE_BG: u32 = 0x1E40AF;
const HEADER_BG: u32 = 0x3B82F6;
const INPUT_BG: u32 = 0xF0F9FF;

const COLUMN_WIDTHS: [f64; 10] =
    [6.0, 8.0, 18.0, 45.0, 12.0, 12.0, 10.0, 18.0, 15.0, 30.0];

const HEADER_ROW: u32 = 4;

/// Write the floor-check workbook: one row per part to verify physically,
/// with blank count/notes cells and a signature block. Problem records only
/// unless `include_all` is set.
pub fn write_checklist_xlsx(
    results: &ResultSet,
    labels: &SideLabels,
    path: &Path,
    include_all: bool,
) -> Result<(), ReconcileError> {
    let records: Vec<&ReconRecord> = if include_all {
        results.records.iter().collect()
    } else {
        results.problems().collect()
    };

    let mut workbook = XlsxWorkbook::new();
    write_checklist_sheet(workbook.add_worksheet(), &records, labels)?;
    write_instructions_sheet(workbook.add_worksheet())?;

    workbook
        .save(path)
        .map_err(|e| ReconcileError::Io(format!("failed to save checklist: {e}")))?;
    Ok(())
}

fn write_checklist_sheet(
    worksheet: &mut Worksheet,
    records: &[&ReconRecord],
    labels: &SideLabels,
) -> Result<(), ReconcileError> {
    worksheet.set_name("Floor Check").map_err(xlsx_err)?;

    // Print setup: landscape A4, one page wide
    worksheet.set_landscape();
    worksheet.set_paper_size(9);
    worksheet.set_print_fit_to_pages(1, 0);

    let title = Format::new()
        .set_bold()
        .set_font_size(16.0)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(TITLE_BG))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    worksheet
        .merge_range(
            0,
            0,
            0,
            9,
            &format!("FLOOR CHECK - BOM RECONCILIATION ({} vs {})", labels.a, labels.b),
            &title,
        )
        .map_err(xlsx_err)?;
    worksheet.set_row_height(0, 25.0).map_err(xlsx_err)?;

    let info = Format::new().set_bold().set_font_size(10.0);
    let generated = Local::now().format("%Y-%m-%d %H:%M").to_string();
    worksheet
        .write_string_with_format(1, 0, &format!("Generated: {generated}"), &info)
        .map_err(xlsx_err)?;
    worksheet
        .write_string_with_format(2, 0, &format!("Items to check: {}", records.len()), &info)
        .map_err(xlsx_err)?;

    let header = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_font_size(10.0)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BG))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::Top);
    let titles = [
        "No.".to_string(),
        "Done".to_string(),
        "Part Number".to_string(),
        "Description".to_string(),
        format!("{} Qty", labels.a),
        format!("{} Qty", labels.b),
        "Unit".to_string(),
        "Status".to_string(),
        "Counted Qty".to_string(),
        "Notes".to_string(),
    ];
    for (col, text) in titles.iter().enumerate() {
        worksheet
            .write_string_with_format(HEADER_ROW, col as u16, text, &header)
            .map_err(xlsx_err)?;
    }
    worksheet.set_row_height(HEADER_ROW, 30.0).map_err(xlsx_err)?;
    worksheet.set_freeze_panes(HEADER_ROW + 1, 0).map_err(xlsx_err)?;

    let cell = Format::new()
        .set_border(FormatBorder::Thin)
        .set_text_wrap()
        .set_align(FormatAlign::VerticalCenter);
    let number = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let checkbox = Format::new()
        .set_border(FormatBorder::Thin)
        .set_font_size(14.0)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let input = Format::new()
        .set_border(FormatBorder::Thin)
        .set_background_color(Color::RGB(INPUT_BG))
        .set_align(FormatAlign::VerticalCenter);

    for (i, record) in records.iter().enumerate() {
        let row = HEADER_ROW + 1 + i as u32;
        worksheet
            .write_number_with_format(row, 0, (i + 1) as f64, &number)
            .map_err(xlsx_err)?;
        worksheet.write_string_with_format(row, 1, "\u{2610}", &checkbox).map_err(xlsx_err)?;
        worksheet
            .write_string_with_format(row, 2, &record.identifier, &cell)
            .map_err(xlsx_err)?;
        worksheet
            .write_string_with_format(
                row,
                3,
                &first_filled(record, |r| r.raw_description.as_deref()),
                &cell,
            )
            .map_err(xlsx_err)?;
        worksheet
            .write_string_with_format(row, 4, &side_raw(record.a.as_ref()), &cell)
            .map_err(xlsx_err)?;
        worksheet
            .write_string_with_format(row, 5, &side_raw(record.b.as_ref()), &cell)
            .map_err(xlsx_err)?;
        worksheet
            .write_string_with_format(
                row,
                6,
                &first_filled(record, |r| r.raw_unit.as_deref()),
                &cell,
            )
            .map_err(xlsx_err)?;
        worksheet
            .write_string_with_format(row, 7, &status_text(record.status, labels), &cell)
            .map_err(xlsx_err)?;
        worksheet.write_string_with_format(row, 8, "", &input).map_err(xlsx_err)?;
        worksheet.write_string_with_format(row, 9, "", &cell).map_err(xlsx_err)?;
    }

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width).map_err(xlsx_err)?;
    }

    // Signature block a few rows under the table
    let signature = Format::new().set_border_top(FormatBorder::Thin).set_align(FormatAlign::Center);
    let last_row = HEADER_ROW + records.len() as u32 + 4;
    worksheet.write_string_with_format(last_row, 2, "Counted by", &signature).map_err(xlsx_err)?;
    worksheet.write_string_with_format(last_row, 5, "Reviewed by", &signature).map_err(xlsx_err)?;
    worksheet.write_string_with_format(last_row, 8, "Date", &signature).map_err(xlsx_err)?;

    Ok(())
}

fn write_instructions_sheet(worksheet: &mut Worksheet) -> Result<(), ReconcileError> {
    worksheet.set_name("Instructions").map_err(xlsx_err)?;
    worksheet.set_column_width(0, 80.0).map_err(xlsx_err)?;

    let title = Format::new()
        .set_bold()
        .set_font_size(14.0)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(TITLE_BG));
    worksheet.write_string_with_format(0, 0, "INSTRUCTIONS", &title).map_err(xlsx_err)?;

    let lines = [
        "1. Physically verify each part number listed on the Floor Check sheet.",
        "2. Write the quantity actually found in the \"Counted Qty\" column.",
        "3. Tick the \"Done\" box once the part is verified.",
        "4. Note damage, location problems or substitutions under \"Notes\".",
        "5. Sign the bottom of the sheet when the count is complete.",
    ];
    for (i, line) in lines.iter().enumerate() {
        worksheet.write_string(i as u32 + 2, 0, *line).map_err(xlsx_err)?;
    }
    Ok(())
}

/// Raw quantity text for one side, empty when the side is absent.
fn side_raw(row: Option<&NormalizedRow>) -> String {
    row.and_then(|r| r.raw_quantity.as_deref())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// First non-blank value across sides A then B.
fn first_filled(
    record: &ReconRecord,
    pick: impl Fn(&NormalizedRow) -> Option<&str>,
) -> String {
    for side in [record.a.as_ref(), record.b.as_ref()].into_iter().flatten() {
        if let Some(text) = pick(side) {
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Reader};
    use tempfile::tempdir;

    use bomtally_core::{
        map_columns, normalize_table, reconcile, AliasTable, RawTable, ReconcileConfig, UnitTable,
    };

    fn source(rows: &[[&str; 4]]) -> Vec<NormalizedRow> {
        let table = RawTable::new(
            vec!["Part Number".into(), "Quantity".into(), "Unit".into(), "Description".into()],
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        );
        let mapping = map_columns(&table, &AliasTable::default(), 0.70, "test").unwrap();
        normalize_table(&table, &mapping, &UnitTable::default()).0
    }

    fn mixed_results() -> ResultSet {
        let a = source(&[
            ["00123", "20", "PC", "Bolt M6"],
            ["00456", "5", "KG", "Grease"],
        ]);
        let b = source(&[["00123", "20", "PC", "Bolt M6"]]);
        reconcile(&a, &b, &ReconcileConfig::default())
    }

    fn sheet_text(path: &Path, sheet: &str) -> String {
        let mut workbook = open_workbook_auto(path).unwrap();
        let range = workbook.worksheet_range(sheet).unwrap();
        range
            .rows()
            .flatten()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }

    #[test]
    fn checklist_lists_problem_parts_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checklist.xlsx");

        write_checklist_xlsx(&mixed_results(), &SideLabels::default(), &path, false).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names().to_vec(), vec!["Floor Check", "Instructions"]);
        drop(workbook);

        let text = sheet_text(&path, "Floor Check");
        assert!(text.contains("00456"), "problem part missing from checklist");
        assert!(!text.contains("00123"), "correct part should stay off the checklist");
        assert!(text.contains("Counted Qty"));
        assert!(text.contains("Missing in B"));
        assert!(text.contains("Items to check: 1"));
        assert!(text.contains("Counted by"));
    }

    #[test]
    fn include_all_adds_correct_parts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checklist.xlsx");

        write_checklist_xlsx(&mixed_results(), &SideLabels::default(), &path, true).unwrap();

        let text = sheet_text(&path, "Floor Check");
        assert!(text.contains("00123"));
        assert!(text.contains("00456"));
        assert!(text.contains("Items to check: 2"));
    }

    #[test]
    fn description_falls_back_across_sides() {
        let a = source(&[["00456", "5", "KG", ""]]);
        let b = source(&[["00456", "7", "KG", "Grease tube"]]);
        let rs = reconcile(&a, &b, &ReconcileConfig::default());

        let dir = tempdir().unwrap();
        let path = dir.path().join("checklist.xlsx");
        write_checklist_xlsx(&rs, &SideLabels::default(), &path, false).unwrap();

        let text = sheet_text(&path, "Floor Check");
        assert!(text.contains("Grease tube"), "B-side description should fill the gap");
    }

    #[test]
    fn instructions_sheet_is_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checklist.xlsx");

        write_checklist_xlsx(&mixed_results(), &SideLabels::default(), &path, false).unwrap();

        let text = sheet_text(&path, "Instructions");
        assert!(text.contains("INSTRUCTIONS"));
        assert!(text.contains("Counted Qty"));
    }
}
