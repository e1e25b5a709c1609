// CSV/TSV import

use std::io::Read;
use std::path::Path;

use bomtally_core::{RawTable, ReconcileError};

use crate::load::LoadStats;

/// Load a delimited text file. `delimiter` forces the separator; otherwise
/// it is sniffed from the first lines.
pub fn import(
    path: &Path,
    delimiter: Option<u8>,
) -> Result<(RawTable, LoadStats), ReconcileError> {
    let (content, encoding_fallback) = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    let (table, mut stats) = import_from_string(&content, delimiter, path)?;
    stats.encoding_fallback = encoding_fallback;
    Ok((table, stats))
}

/// Detect the most likely field delimiter by checking consistency across the
/// first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line.
/// The delimiter that produces the most consistent field count (>1 field)
/// wins. BOM exports arrive as any of the four depending on the ERP locale.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &candidate in &[b'\t', b';', b',', b'|'] {
        let counts: Vec<usize> = sample.iter().map(|l| field_count(l, candidate)).collect();

        // Must produce >1 field on the first line to be viable
        let first = counts.first().copied().unwrap_or(0);
        if first <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count.
        // Higher field count breaks ties.
        let consistent = counts.iter().filter(|&&c| c == first).count() as u64;
        let score = consistent * first as u64;
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

/// Fields in one line under a candidate delimiter, quote-aware.
fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read a file as UTF-8, falling back to Windows-1252 for legacy ERP exports.
/// Returns the text and whether the fallback fired.
pub fn read_file_as_utf8(path: &Path) -> Result<(String, bool), ReconcileError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| ReconcileError::Io(format!("{}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ReconcileError::Io(format!("{}: {e}", path.display())))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok((s, false)),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok((decoded.into_owned(), true))
        }
    }
}

fn import_from_string(
    content: &str,
    delimiter: u8,
    path: &Path,
) -> Result<(RawTable, LoadStats), ReconcileError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    // First non-blank record is the header; the rest are data. Rows may be
    // ragged, the mapper only reads mapped columns.
    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut skipped_blank = 0usize;

    for result in reader.records() {
        let record = result.map_err(|e| ReconcileError::Io(format!("{}: {e}", path.display())))?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            skipped_blank += 1;
            continue;
        }
        match &mut headers {
            None => headers = Some(cells),
            Some(_) => rows.push(cells),
        }
    }

    let source = path.display().to_string();
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
        sheet: None,
    };
    Ok((RawTable::new(headers, rows), stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sniff_semicolon_delimiter() {
        let content = "Part Number;Quantity;Unit\n00123;20;PC\n00456;5;KG\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniff_comma_delimiter() {
        let content = "Part Number,Quantity,Unit\n00123,20,PC\n00456,5,KG\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn sniff_tab_delimiter() {
        let content = "Part Number\tQuantity\tUnit\n00123\t20\tPC\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn sniff_pipe_delimiter() {
        let content = "Part Number|Quantity|Unit\n00123|20|PC\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn sniff_semicolon_with_commas_in_values() {
        // Semicolon delimiter but commas appear inside quoted fields
        let content =
            "Part;Description;Qty\n00123;\"Bolt, hex, M6\";20\n00456;\"Washer, 12mm\";5\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn semicolon_import_end_to_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "Part Number;Quantity;Unit\n00123;20;PC\n00456;5;KG\n").unwrap();

        let (table, stats) = import(&path, None).unwrap();
        assert_eq!(table.headers, vec!["Part Number", "Quantity", "Unit"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 0), "00123");
        assert_eq!(table.cell(1, 2), "KG");
        assert_eq!(stats.rows, 2);
        assert!(!stats.encoding_fallback);
    }

    #[test]
    fn forced_delimiter_overrides_sniffing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        fs::write(&path, "Part Number|Quantity\n00123|20\n").unwrap();

        let (table, _) = import(&path, Some(b'|')).unwrap();
        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.cell(0, 1), "20");
    }

    #[test]
    fn windows_1252_bytes_are_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        // 0xF3 = o-acute, 0xF1 = n-tilde in Windows-1252; invalid as UTF-8
        fs::write(&path, b"Part Number,Descripci\xF3n\n00123,Pe\xF1a 5mm\n".as_slice()).unwrap();

        let (table, stats) = import(&path, None).unwrap();
        assert_eq!(table.headers[1], "Descripción");
        assert_eq!(table.cell(0, 1), "Peña 5mm");
        assert!(stats.encoding_fallback);
    }

    #[test]
    fn blank_lines_are_skipped_and_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        fs::write(&path, "Part Number,Quantity\n00123,20\n,\n00456,5\n").unwrap();

        let (table, stats) = import(&path, None).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(stats.skipped_blank, 1);
    }

    #[test]
    fn header_only_file_is_empty_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("header.csv");
        fs::write(&path, "Part Number,Quantity,Unit\n").unwrap();

        let err = import(&path, None).unwrap_err();
        assert!(matches!(err, ReconcileError::EmptyInput { .. }));
    }

    #[test]
    fn empty_file_is_empty_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let err = import(&path, None).unwrap_err();
        assert!(matches!(err, ReconcileError::EmptyInput { .. }));
    }

    #[test]
    fn ragged_rows_survive_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "Part Number,Quantity,Unit\n00123,20\n00456,5,KG,extra\n").unwrap();

        let (table, _) = import(&path, None).unwrap();
        assert_eq!(table.rows.len(), 2);
        // Short row reads as empty past its end
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(1, 2), "KG");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = import(Path::new("/nonexistent/bom.csv"), None).unwrap_err();
        assert!(matches!(err, ReconcileError::Io(_)));
    }
}
