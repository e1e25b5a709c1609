use crate::config::AliasTable;
use crate::error::ReconcileError;
use crate::model::{ColumnMapping, ConfidenceBand, RawTable, Role, RoleMatch};
use crate::similarity;

/// Infer which column plays each semantic role for one source table.
///
/// Pure function of its inputs. Every role takes the best-scoring column at
/// or above `threshold`; higher-scoring roles claim columns first, so mapped
/// roles always land on distinct columns. The identifier role is required
/// and mapping fails without it; the other roles are simply left unmapped
/// when nothing scores high enough.
pub fn map_columns(
    table: &RawTable,
    aliases: &AliasTable,
    threshold: f64,
    source: &str,
) -> Result<ColumnMapping, ReconcileError> {
    let mapping = infer_columns(table, aliases, threshold, source)?;
    if !mapping.is_mapped(Role::Identifier) {
        return Err(ReconcileError::MappingFailed {
            source: source.to_string(),
            role: Role::Identifier,
        });
    }
    Ok(mapping)
}

/// Inference half of [`map_columns`]: returns whatever roles scored, without
/// requiring the identifier. Callers that accept manual overrides apply them
/// on top and enforce the identifier requirement themselves.
pub fn infer_columns(
    table: &RawTable,
    aliases: &AliasTable,
    threshold: f64,
    source: &str,
) -> Result<ColumnMapping, ReconcileError> {
    if table.headers.is_empty() {
        return Err(ReconcileError::EmptyInput {
            source: source.to_string(),
        });
    }

    let headers_norm: Vec<String> = table
        .headers
        .iter()
        .map(|h| similarity::normalize_header(h))
        .collect();

    let mut candidates: Vec<(Role, Vec<(usize, f64)>)> = Role::ALL
        .iter()
        .map(|&role| (role, role_candidates(&headers_norm, aliases.for_role(role))))
        .collect();

    // Higher-scoring roles claim first. The sort is stable, so roles with
    // equal top scores keep their declaration order (identifier wins).
    candidates.sort_by(|a, b| top_score(&b.1).total_cmp(&top_score(&a.1)));

    let mut claimed = vec![false; table.headers.len()];
    let mut mapping = ColumnMapping::new(source);

    for (role, cands) in &candidates {
        let chosen = cands
            .iter()
            .find(|(idx, score)| *score >= threshold && !claimed[*idx]);
        if let Some(&(idx, score)) = chosen {
            claimed[idx] = true;
            mapping.insert(
                *role,
                RoleMatch {
                    column: idx,
                    header: table.headers[idx].clone(),
                    confidence: score,
                    band: ConfidenceBand::from_score(score),
                },
            );
        }
    }

    Ok(mapping)
}

/// Candidate columns for one role, best first (score descending, then
/// first-seen column index so ties are reproducible).
fn role_candidates(headers_norm: &[String], aliases: &[String]) -> Vec<(usize, f64)> {
    let aliases_norm: Vec<String> = aliases
        .iter()
        .map(|a| similarity::normalize_header(a))
        .filter(|a| !a.is_empty())
        .collect();

    let mut out = Vec::new();
    for (idx, header) in headers_norm.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let mut best = 0.0f64;
        for alias in &aliases_norm {
            let score = alias_score(header, alias);
            if score > best {
                best = score;
            }
        }
        out.push((idx, best));
    }
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    out
}

/// Score one normalized header against one normalized alias: exact 1.0,
/// containment 0.9, otherwise the edit-distance ratio.
fn alias_score(header: &str, alias: &str) -> f64 {
    if header == alias {
        return 1.0;
    }
    if header.contains(alias) || alias.contains(header) {
        return 0.9;
    }
    similarity::ratio(header, alias)
}

fn top_score(cands: &[(usize, f64)]) -> f64 {
    cands.first().map(|c| c.1).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AliasTable;

    fn table(headers: &[&str]) -> RawTable {
        RawTable::new(headers.iter().map(|h| h.to_string()).collect(), vec![])
    }

    fn map(headers: &[&str]) -> Result<ColumnMapping, ReconcileError> {
        map_columns(&table(headers), &AliasTable::default(), 0.70, "test")
    }

    #[test]
    fn erp_style_headers_map_directly() {
        let m = map(&["Component number", "Component quantity", "Component UoM"]).unwrap();
        assert_eq!(m.column_of(Role::Identifier), Some(0));
        assert_eq!(m.column_of(Role::Quantity), Some(1));
        assert_eq!(m.column_of(Role::Unit), Some(2));
        assert!(!m.is_mapped(Role::Description));
        assert_eq!(m.get(Role::Identifier).unwrap().confidence, 1.0);
    }

    #[test]
    fn material_no_and_sku_both_map_high() {
        let a = map(&["Material No.", "Quantity", "Unit", "Description"]).unwrap();
        let ident = a.get(Role::Identifier).unwrap();
        assert_eq!(ident.header, "Material No.");
        assert!(ident.confidence >= 0.85);
        assert_eq!(ident.band, ConfidenceBand::High);

        let b = map(&["SKU", "Qty", "UM", "Desc"]).unwrap();
        let ident = b.get(Role::Identifier).unwrap();
        assert_eq!(ident.header, "SKU");
        assert!(ident.confidence >= 0.85);
    }

    #[test]
    fn identifier_unmappable_is_fatal() {
        let err = map(&["Thingamajig", "Widget Count"]).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::MappingFailed { role: Role::Identifier, .. }
        ));
        assert!(err.to_string().contains("identifier"));
    }

    #[test]
    fn empty_header_row_is_empty_input() {
        let err = map(&[]).unwrap_err();
        assert!(matches!(err, ReconcileError::EmptyInput { .. }));
    }

    #[test]
    fn infer_keeps_partial_results_when_identifier_is_missing() {
        let m = infer_columns(
            &table(&["Thingamajig", "Qty", "Unit"]),
            &AliasTable::default(),
            0.70,
            "test",
        )
        .unwrap();
        assert!(!m.is_mapped(Role::Identifier));
        assert_eq!(m.column_of(Role::Quantity), Some(1));
        assert_eq!(m.column_of(Role::Unit), Some(2));
    }

    #[test]
    fn higher_scoring_role_keeps_the_column() {
        // "Material" scores 1.0 for identifier and 0.9 (containment against
        // "Material description") for description; identifier keeps it and
        // description has no other candidate above threshold.
        let m = map(&["Material", "Qty", "Unit"]).unwrap();
        assert_eq!(m.column_of(Role::Identifier), Some(0));
        assert_eq!(m.column_of(Role::Quantity), Some(1));
        assert_eq!(m.column_of(Role::Unit), Some(2));
        assert!(!m.is_mapped(Role::Description));
    }

    #[test]
    fn mapped_roles_use_distinct_columns() {
        let m = map(&["Material", "Material description", "Qty", "UM"]).unwrap();
        let mut columns: Vec<usize> = m.iter().map(|(_, rm)| rm.column).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), m.iter().count());
        assert_eq!(m.column_of(Role::Identifier), Some(0));
        assert_eq!(m.column_of(Role::Description), Some(1));
    }

    #[test]
    fn tie_goes_to_first_seen_column() {
        // Both headers score 1.0 for the unit role via different aliases.
        let m = map(&["Part Number", "Unit", "Unit Of Measure"]).unwrap();
        assert_eq!(m.column_of(Role::Unit), Some(1));
    }

    #[test]
    fn fuzzy_match_lands_in_medium_band() {
        let m = map(&["Part Nbr", "Qty"]).unwrap();
        let ident = m.get(Role::Identifier).unwrap();
        assert!(ident.confidence >= 0.70 && ident.confidence < 0.85);
        assert_eq!(ident.band, ConfidenceBand::Medium);
    }

    #[test]
    fn below_threshold_roles_stay_unmapped() {
        let m = map(&["Part Number", "Qty", "Remarks"]).unwrap();
        assert!(!m.is_mapped(Role::Unit));
        assert!(!m.is_mapped(Role::Description));
    }

    #[test]
    fn blank_headers_never_match() {
        let m = map(&["", "Part Number", ""]).unwrap();
        assert_eq!(m.column_of(Role::Identifier), Some(1));
    }
}
