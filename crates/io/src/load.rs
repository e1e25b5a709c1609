// Input format detection and dispatch

use std::path::Path;

use bomtally_core::{RawTable, ReconcileError};

/// How a path will be read, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Delimited text; delimiter sniffed unless forced.
    Csv,
    /// Tab-separated text.
    Tsv,
    /// Excel or OpenDocument workbook.
    Workbook,
}

/// Per-source load knobs, straight from the CLI flags.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Workbook sheet to read. Default is the first sheet.
    pub sheet: Option<String>,
    /// Forced delimiter for delimited text.
    pub delimiter: Option<u8>,
}

/// What the loader actually did, for the run summary.
#[derive(Debug, Clone)]
pub struct LoadStats {
    pub source: String,
    pub rows: usize,
    pub skipped_blank: usize,
    /// True when the bytes were not UTF-8 and Windows-1252 was used instead.
    pub encoding_fallback: bool,
    /// Sheet name, for workbook sources.
    pub sheet: Option<String>,
}

pub fn detect_format(path: &Path) -> Result<InputFormat, ReconcileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => Ok(InputFormat::Csv),
        "tsv" => Ok(InputFormat::Tsv),
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(InputFormat::Workbook),
        _ => Err(ReconcileError::UnsupportedFormat { path: path.display().to_string() }),
    }
}

/// Load one BOM export from disk into a raw table.
pub fn load_table(
    path: &Path,
    options: &LoadOptions,
) -> Result<(RawTable, LoadStats), ReconcileError> {
    match detect_format(path)? {
        InputFormat::Csv => crate::csv::import(path, options.delimiter),
        InputFormat::Tsv => crate::csv::import(path, options.delimiter.or(Some(b'\t'))),
        InputFormat::Workbook => crate::xlsx::import(path, options.sheet.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_picks_the_loader() {
        assert_eq!(detect_format(Path::new("a.csv")).unwrap(), InputFormat::Csv);
        assert_eq!(detect_format(Path::new("a.txt")).unwrap(), InputFormat::Csv);
        assert_eq!(detect_format(Path::new("a.tsv")).unwrap(), InputFormat::Tsv);
        assert_eq!(detect_format(Path::new("a.xlsx")).unwrap(), InputFormat::Workbook);
        assert_eq!(detect_format(Path::new("a.xlsm")).unwrap(), InputFormat::Workbook);
        assert_eq!(detect_format(Path::new("a.xls")).unwrap(), InputFormat::Workbook);
        assert_eq!(detect_format(Path::new("a.ods")).unwrap(), InputFormat::Workbook);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(detect_format(Path::new("BOM.CSV")).unwrap(), InputFormat::Csv);
        assert_eq!(detect_format(Path::new("BOM.XLSX")).unwrap(), InputFormat::Workbook);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = detect_format(Path::new("report.pdf")).unwrap_err();
        assert!(matches!(err, ReconcileError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("report.pdf"));

        assert!(detect_format(Path::new("noextension")).is_err());
    }
}
