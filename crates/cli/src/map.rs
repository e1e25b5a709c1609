//! `bomtally map`: preview the role-to-column mapping for one source.

use std::path::PathBuf;

use bomtally_core::map_columns;

use crate::run::{load_config, load_source, mapping_lines, source_label};
use crate::CliError;

pub fn cmd_map(
    file: PathBuf,
    config: Option<PathBuf>,
    sheet: Option<String>,
    delimiter: Option<char>,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let (table, stats) = load_source(&file, sheet, delimiter, "--delimiter")?;
    let source = source_label(&file);

    let mapping = map_columns(&table, &config.aliases, config.thresholds.similarity, &source)
        .map_err(CliError::engine)?;

    if json {
        let out = serde_json::to_string_pretty(&mapping)
            .map_err(|e| CliError::input(format!("JSON serialization error: {}", e)))?;
        println!("{}", out);
    } else {
        println!("{} ({} rows)", stats.source, stats.rows);
        for line in mapping_lines(&mapping) {
            println!("  {}", line);
        }
    }
    Ok(())
}
