// bomtally CLI - headless two-way BOM reconciliation

mod exit_codes;
mod map;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bomtally_core::{ReconcileConfig, ReconcileError};
use exit_codes::{reconcile_exit_code, EXIT_CONFIG, EXIT_INPUT, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "bomtally")]
#[command(about = "Two-way BOM reconciliation: compare an ERP export against a layout count")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile two BOM exports (exit 0 = all correct, exit 1 = findings)
    #[command(after_help = "\
Exit code 1 indicates findings: quantity, unit, or description discrepancies, \
or records present on only one side. All findings are reported before exit.

Columns are matched to roles (identifier, quantity, unit, description) by
fuzzy header comparison against a built-in alias dictionary. Use --assign-a
or --assign-b to pin a role to a column when inference picks wrong.

Examples:
  bomtally run erp.xlsx layout.csv
  bomtally run erp.xlsx layout.csv --sheet-a BOM --label-a SAP --label-b Floor
  bomtally run a.csv b.csv --json | jq .summary
  bomtally run a.csv b.csv --report recon.xlsx --checklist floorcheck.xlsx
  bomtally run a.csv b.csv --assign-a 'quantity=Qty per unit' --delimiter-b ';'")]
    Run {
        /// First source (side A): CSV, TSV, or Excel
        file_a: PathBuf,

        /// Second source (side B): CSV, TSV, or Excel
        file_b: PathBuf,

        /// TOML config file (thresholds, aliases, unit synonyms)
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,

        /// Worksheet name for side A (default: first sheet)
        #[arg(long, value_name = "NAME")]
        sheet_a: Option<String>,

        /// Worksheet name for side B (default: first sheet)
        #[arg(long, value_name = "NAME")]
        sheet_b: Option<String>,

        /// CSV delimiter for side A (default: sniffed)
        #[arg(long, value_name = "CHAR")]
        delimiter_a: Option<char>,

        /// CSV delimiter for side B (default: sniffed)
        #[arg(long, value_name = "CHAR")]
        delimiter_b: Option<char>,

        /// Pin a role to a column on side A: role=header or role=1-indexed
        /// column number. Repeatable.
        #[arg(long, value_name = "ROLE=COLUMN")]
        assign_a: Vec<String>,

        /// Pin a role to a column on side B. Repeatable.
        #[arg(long, value_name = "ROLE=COLUMN")]
        assign_b: Vec<String>,

        /// Display label for side A (default: file stem)
        #[arg(long, value_name = "LABEL")]
        label_a: Option<String>,

        /// Display label for side B (default: file stem)
        #[arg(long, value_name = "LABEL")]
        label_b: Option<String>,

        /// Print the full machine-readable report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write a styled XLSX report (Summary / All Records / Problems)
        #[arg(long, value_name = "XLSX")]
        report: Option<PathBuf>,

        /// Write problem records as CSV
        #[arg(long, value_name = "CSV")]
        problems: Option<PathBuf>,

        /// Write the status summary as CSV
        #[arg(long, value_name = "CSV")]
        summary_csv: Option<PathBuf>,

        /// Write a printable floor-check checklist XLSX
        #[arg(long, value_name = "XLSX")]
        checklist: Option<PathBuf>,

        /// Include Correct records in the checklist, not only problems
        #[arg(long)]
        checklist_all: bool,

        /// Suppress the stderr summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show the inferred column mapping for one source without reconciling
    #[command(after_help = "\
Exits 3 when no column maps to the identifier role.

Examples:
  bomtally map erp.xlsx
  bomtally map erp.xlsx --sheet BOM
  bomtally map layout.csv --json")]
    Map {
        /// Source file: CSV, TSV, or Excel
        file: PathBuf,

        /// TOML config file (aliases, similarity threshold)
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,

        /// Worksheet name (default: first sheet)
        #[arg(long, value_name = "NAME")]
        sheet: Option<String>,

        /// CSV delimiter (default: sniffed)
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<char>,

        /// Print the mapping as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a config file and print the effective settings
    #[command(after_help = "\
Examples:
  bomtally validate bomtally.toml")]
    Validate {
        /// TOML config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            file_a,
            file_b,
            config,
            sheet_a,
            sheet_b,
            delimiter_a,
            delimiter_b,
            assign_a,
            assign_b,
            label_a,
            label_b,
            json,
            report,
            problems,
            summary_csv,
            checklist,
            checklist_all,
            quiet,
        } => run::cmd_run(
            file_a, file_b, config, sheet_a, sheet_b, delimiter_a, delimiter_b, assign_a,
            assign_b, label_a, label_b, json, report, problems, summary_csv, checklist,
            checklist_all, quiet,
        ),
        Commands::Map { file, config, sheet, delimiter, json } => {
            map::cmd_map(file, config, sheet, delimiter, json)
        }
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    /// Create an error from an engine error with the proper exit code.
    pub fn engine(err: ReconcileError) -> Self {
        let code = reconcile_exit_code(&err);
        let hint = match &err {
            ReconcileError::MappingFailed { .. } => {
                Some("pin the column manually with --assign-a/--assign-b 'role=column'".to_string())
            }
            ReconcileError::UnsupportedFormat { .. } => {
                Some("supported inputs: .csv, .tsv, .txt, .xlsx, .xlsm, .xls, .ods".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&config_path).map_err(|e| {
        CliError::config(format!("cannot read {}: {}", config_path.display(), e))
    })?;
    let config = ReconcileConfig::from_toml(&text).map_err(CliError::engine)?;

    let t = &config.thresholds;
    let a = &config.aliases;
    let spellings: usize = config.units.0.values().map(|v| v.len()).sum();
    eprintln!(
        "valid: similarity {:.2}, quantity tolerance {:.2}, description similarity {:.2}",
        t.similarity, t.quantity_tolerance, t.description_similarity
    );
    eprintln!(
        "aliases: {} identifier, {} quantity, {} unit, {} description",
        a.identifier.len(),
        a.quantity.len(),
        a.unit.len(),
        a.description.len()
    );
    eprintln!(
        "units: {} canonical token(s), {} accepted spelling(s)",
        config.units.0.len(),
        spellings
    );
    Ok(())
}
