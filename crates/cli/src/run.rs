//! `bomtally run`: load two sources, reconcile, report.

use std::path::{Path, PathBuf};

use serde::Serialize;

use bomtally_core::{
    infer_columns, normalize_table, reconcile, ColumnMapping, RawTable, ReconRecord,
    ReconcileConfig, ReconcileError, ResultSet, Role, StatusSummary,
};
use bomtally_io::{
    load_table, write_checklist_xlsx, write_problems_csv, write_report_xlsx, write_summary_csv,
    LoadOptions, LoadStats, SideLabels,
};

use crate::exit_codes::EXIT_FINDINGS;
use crate::CliError;

/// How many issue lines the stderr summary previews.
const ISSUE_PREVIEW: usize = 5;

#[allow(clippy::too_many_arguments)]
pub fn cmd_run(
    file_a: PathBuf,
    file_b: PathBuf,
    config: Option<PathBuf>,
    sheet_a: Option<String>,
    sheet_b: Option<String>,
    delimiter_a: Option<char>,
    delimiter_b: Option<char>,
    assign_a: Vec<String>,
    assign_b: Vec<String>,
    label_a: Option<String>,
    label_b: Option<String>,
    json: bool,
    report: Option<PathBuf>,
    problems: Option<PathBuf>,
    summary_csv: Option<PathBuf>,
    checklist: Option<PathBuf>,
    checklist_all: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let label_a = label_a.unwrap_or_else(|| source_label(&file_a));
    let label_b = label_b.unwrap_or_else(|| source_label(&file_b));

    let (table_a, stats_a) = load_source(&file_a, sheet_a, delimiter_a, "--delimiter-a")?;
    let (table_b, stats_b) = load_source(&file_b, sheet_b, delimiter_b, "--delimiter-b")?;

    let mapping_a = build_mapping(&table_a, &config, &label_a, &assign_a, "--assign-a")?;
    let mapping_b = build_mapping(&table_b, &config, &label_b, &assign_b, "--assign-b")?;

    let (rows_a, no_ident_a) = normalize_table(&table_a, &mapping_a, &config.units);
    let (rows_b, no_ident_b) = normalize_table(&table_b, &mapping_b, &config.units);

    let results = reconcile(&rows_a, &rows_b, &config);
    let labels = SideLabels::new(&label_a, &label_b);

    if !quiet {
        eprintln!("{}", source_note(&label_a, &stats_a, no_ident_a));
        eprintln!("{}", source_note(&label_b, &stats_b, no_ident_b));
        print_mapping(&label_a, &mapping_a);
        print_mapping(&label_b, &mapping_b);
        print_outcome(&results, &labels);
    }

    if let Some(path) = &report {
        write_report_xlsx(&results, &labels, path).map_err(CliError::engine)?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }
    if let Some(path) = &problems {
        write_problems_csv(&results, &labels, path).map_err(CliError::engine)?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }
    if let Some(path) = &summary_csv {
        write_summary_csv(&results, path).map_err(CliError::engine)?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }
    if let Some(path) = &checklist {
        write_checklist_xlsx(&results, &labels, path, checklist_all).map_err(CliError::engine)?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if json {
        let report = RunReport {
            engine_version: env!("CARGO_PKG_VERSION"),
            run_at: chrono::Utc::now().to_rfc3339(),
            source_a: SourceReport::new(&label_a, &stats_a, no_ident_a),
            source_b: SourceReport::new(&label_b, &stats_b, no_ident_b),
            mapping_a: &mapping_a,
            mapping_b: &mapping_b,
            summary: &results.summary,
            records: &results.records,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::input(format!("JSON serialization error: {}", e)))?;
        println!("{}", out);
    }

    if results.summary.correct == results.summary.total {
        Ok(())
    } else {
        // Findings were already reported; exit 1 without an error line.
        Err(CliError { code: EXIT_FINDINGS, message: String::new(), hint: None })
    }
}

// ---------------------------------------------------------------------------
// Shared pipeline steps (also used by `bomtally map`)
// ---------------------------------------------------------------------------

pub(crate) fn load_config(path: Option<&Path>) -> Result<ReconcileConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconcileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read {}: {}", path.display(), e)))?;
    ReconcileConfig::from_toml(&text).map_err(CliError::engine)
}

pub(crate) fn load_source(
    path: &Path,
    sheet: Option<String>,
    delimiter: Option<char>,
    flag: &str,
) -> Result<(RawTable, LoadStats), CliError> {
    let delimiter = delimiter.map(|c| delimiter_byte(c, flag)).transpose()?;
    let options = LoadOptions { sheet, delimiter };
    load_table(path, &options).map_err(CliError::engine)
}

pub(crate) fn source_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn delimiter_byte(c: char, flag: &str) -> Result<u8, CliError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(CliError::usage(format!(
            "{} must be a single ASCII character, got '{}'",
            flag, c
        )))
    }
}

/// Infer the mapping, layer `--assign` overrides on top, then require the
/// identifier role. Overrides supersede inference, so they can rescue a
/// source whose identifier column no alias matches.
pub(crate) fn build_mapping(
    table: &RawTable,
    config: &ReconcileConfig,
    source: &str,
    assignments: &[String],
    flag: &str,
) -> Result<ColumnMapping, CliError> {
    let mut mapping = infer_columns(table, &config.aliases, config.thresholds.similarity, source)
        .map_err(CliError::engine)?;

    for spec in assignments {
        let (role, column_spec) = parse_assignment(spec, flag)?;
        let column = resolve_column(table, &column_spec).ok_or_else(|| {
            CliError::usage(format!("{} '{}': no column '{}'", flag, spec, column_spec))
                .with_hint(format!("available columns: {}", table.headers.join(", ")))
        })?;
        mapping.assign(role, column, &table.headers[column]);
    }

    if !mapping.is_mapped(Role::Identifier) {
        return Err(CliError::engine(ReconcileError::MappingFailed {
            source: source.to_string(),
            role: Role::Identifier,
        }));
    }
    Ok(mapping)
}

/// Split a `role=column` override into its parts.
fn parse_assignment(spec: &str, flag: &str) -> Result<(Role, String), CliError> {
    let Some((role_part, column_part)) = spec.split_once('=') else {
        return Err(CliError::usage(format!(
            "{} expects role=column, got '{}'",
            flag, spec
        )));
    };
    let Some(role) = Role::from_name(role_part) else {
        return Err(CliError::usage(format!(
            "{} '{}': unknown role '{}'",
            flag,
            spec,
            role_part.trim()
        ))
        .with_hint("roles: identifier, quantity, unit, description"));
    };
    let column = column_part.trim();
    if column.is_empty() {
        return Err(CliError::usage(format!("{} '{}': empty column", flag, spec)));
    }
    Ok((role, column.to_string()))
}

/// Match a column spec against the headers (case-insensitive, trimmed),
/// falling back to a 1-indexed column number. A header wins over a number,
/// so a column literally named "2" stays addressable by name.
fn resolve_column(table: &RawTable, wanted: &str) -> Option<usize> {
    let needle = wanted.trim().to_lowercase();
    if let Some(idx) = table.headers.iter().position(|h| h.trim().to_lowercase() == needle) {
        return Some(idx);
    }
    match wanted.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= table.headers.len() => Some(n - 1),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Human summary (stderr)
// ---------------------------------------------------------------------------

fn source_note(label: &str, stats: &LoadStats, no_identifier: usize) -> String {
    let mut notes = Vec::new();
    if stats.skipped_blank > 0 {
        notes.push(format!("{} blank skipped", stats.skipped_blank));
    }
    if no_identifier > 0 {
        notes.push(format!("{} without identifier", no_identifier));
    }
    if let Some(sheet) = &stats.sheet {
        notes.push(format!("sheet '{}'", sheet));
    }
    if stats.encoding_fallback {
        notes.push("windows-1252".to_string());
    }
    if notes.is_empty() {
        format!("{}: {} rows", label, stats.rows)
    } else {
        format!("{}: {} rows ({})", label, stats.rows, notes.join(", "))
    }
}

fn print_mapping(label: &str, mapping: &ColumnMapping) {
    eprintln!("mapping for {}:", label);
    for line in mapping_lines(mapping) {
        eprintln!("  {}", line);
    }
}

/// One formatted line per role, in role order, for human mapping output.
/// Columns are shown 1-indexed to match the `--assign` syntax.
pub(crate) fn mapping_lines(mapping: &ColumnMapping) -> Vec<String> {
    Role::ALL
        .iter()
        .map(|&role| match mapping.get(role) {
            Some(m) => format!(
                "{:<11} <- '{}' (column {}, {} {:.2})",
                role.as_str(),
                m.header,
                m.column + 1,
                m.band,
                m.confidence
            ),
            None => format!("{:<11} unmapped", role.as_str()),
        })
        .collect()
}

fn print_outcome(results: &ResultSet, labels: &SideLabels) {
    let s = &results.summary;
    eprintln!(
        "{} records: {} correct ({:.1}%), {} discrepancies, {} missing in {}, {} missing in {}",
        s.total,
        s.correct,
        s.pct_correct,
        s.discrepancy,
        s.missing_in_a,
        labels.a,
        s.missing_in_b,
        labels.b,
    );

    let problems: Vec<&ReconRecord> = results.problems().collect();
    for record in problems.iter().take(ISSUE_PREVIEW) {
        eprintln!("  {}: {}", record.identifier, record.issues);
    }
    if problems.len() > ISSUE_PREVIEW {
        eprintln!(
            "  ... {} more (use --problems or --report for the full list)",
            problems.len() - ISSUE_PREVIEW
        );
    }
}

// ---------------------------------------------------------------------------
// JSON report (stdout)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunReport<'a> {
    engine_version: &'static str,
    run_at: String,
    source_a: SourceReport,
    source_b: SourceReport,
    mapping_a: &'a ColumnMapping,
    mapping_b: &'a ColumnMapping,
    summary: &'a StatusSummary,
    records: &'a [ReconRecord],
}

#[derive(Serialize)]
struct SourceReport {
    label: String,
    path: String,
    rows: usize,
    skipped_blank_lines: usize,
    skipped_no_identifier: usize,
    encoding_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet: Option<String>,
}

impl SourceReport {
    fn new(label: &str, stats: &LoadStats, skipped_no_identifier: usize) -> Self {
        Self {
            label: label.to_string(),
            path: stats.source.clone(),
            rows: stats.rows,
            skipped_blank_lines: stats.skipped_blank,
            skipped_no_identifier,
            encoding_fallback: stats.encoding_fallback,
            sheet: stats.sheet.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
