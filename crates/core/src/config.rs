use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconcileError;
use crate::model::Role;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine configuration. Every section is optional in TOML; missing fields
/// fall back to the built-in defaults, so an empty string parses to the
/// default config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub thresholds: Thresholds,
    pub aliases: AliasTable,
    pub units: UnitTable,
}

impl ReconcileConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconcileError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|e| ReconcileError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        self.thresholds.validate()?;

        if self.aliases.for_role(Role::Identifier).is_empty() {
            return Err(ReconcileError::ConfigValidation(
                "aliases.identifier must not be empty".into(),
            ));
        }

        self.units.validate()
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum column-name similarity for a role to be mapped, in (0, 1].
    pub similarity: f64,
    /// Relative quantity tolerance, in [0, 1]. 0.01 allows a 1% deviation.
    pub quantity_tolerance: f64,
    /// Minimum description similarity to count as a match, in (0, 1].
    pub description_similarity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            similarity: 0.70,
            quantity_tolerance: 0.01,
            description_similarity: 0.80,
        }
    }
}

impl Thresholds {
    fn validate(&self) -> Result<(), ReconcileError> {
        if !(self.similarity > 0.0 && self.similarity <= 1.0) {
            return Err(ReconcileError::ConfigValidation(format!(
                "thresholds.similarity must be in (0, 1], got {}",
                self.similarity
            )));
        }
        if !(0.0..=1.0).contains(&self.quantity_tolerance) {
            return Err(ReconcileError::ConfigValidation(format!(
                "thresholds.quantity_tolerance must be in [0, 1], got {}",
                self.quantity_tolerance
            )));
        }
        if !(self.description_similarity > 0.0 && self.description_similarity <= 1.0) {
            return Err(ReconcileError::ConfigValidation(format!(
                "thresholds.description_similarity must be in (0, 1], got {}",
                self.description_similarity
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Role aliases
// ---------------------------------------------------------------------------

/// Known header spellings per semantic role. Matching is case-insensitive
/// and punctuation-normalized, so entries here are display spellings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub identifier: Vec<String>,
    pub quantity: Vec<String>,
    pub unit: Vec<String>,
    pub description: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            identifier: strings(&[
                "Part Number",
                "Material No.",
                "Component number",
                "ERP Part Number",
                "SKU",
                "Material",
                "Item Number",
                "Part No.",
            ]),
            quantity: strings(&["Quantity", "Component quantity", "Qty", "Amount"]),
            unit: strings(&[
                "Unit",
                "Unit Of Measure",
                "Component UoM",
                "UoM",
                "UM",
                "Measure",
            ]),
            description: strings(&[
                "Description",
                "Material description",
                "Item description",
                "Desc",
            ]),
        }
    }
}

impl AliasTable {
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Identifier => &self.identifier,
            Role::Quantity => &self.quantity,
            Role::Unit => &self.unit,
            Role::Description => &self.description,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Unit synonyms
// ---------------------------------------------------------------------------

/// Canonical unit token to accepted spellings. Lookup is case-insensitive
/// on trimmed tokens; the canonical key matches itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct UnitTable(pub BTreeMap<String, Vec<String>>);

impl Default for UnitTable {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        let entries: [(&str, &[&str]); 10] = [
            ("PC", &["PCS", "PC", "PIECE", "PIECES", "PZA", "PZAS", "PIEZA", "PIEZAS"]),
            ("KG", &["KG", "KGS", "KILO", "KILOS", "KILOGRAM", "KILOGRAMS"]),
            ("M", &["M", "MT", "MTS", "METER", "METERS", "METRO", "METROS"]),
            ("L", &["L", "LT", "LTS", "LITER", "LITERS", "LITRO", "LITROS"]),
            ("G", &["G", "GR", "GRS", "GRAM", "GRAMS", "GRAMO", "GRAMOS"]),
            ("CM", &["CM", "CMS", "CENTIMETER", "CENTIMETERS"]),
            ("MM", &["MM", "MMS", "MILLIMETER", "MILLIMETERS"]),
            ("FT", &["FT", "FEET", "FOOT", "PIE", "PIES"]),
            ("IN", &["IN", "INCH", "INCHES", "PULGADA", "PULGADAS"]),
            ("LB", &["LB", "LBS", "POUND", "POUNDS", "LIBRA", "LIBRAS"]),
        ];
        for (canonical, spellings) in entries {
            map.insert(canonical.to_string(), strings(spellings));
        }
        Self(map)
    }
}

impl UnitTable {
    /// Canonical token for a raw unit spelling, if recognized.
    pub fn canonical_for(&self, token: &str) -> Option<&str> {
        let wanted = token.trim().to_uppercase();
        if wanted.is_empty() {
            return None;
        }
        for (canonical, spellings) in &self.0 {
            if canonical.to_uppercase() == wanted
                || spellings.iter().any(|s| s.trim().to_uppercase() == wanted)
            {
                return Some(canonical);
            }
        }
        None
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for (canonical, spellings) in &self.0 {
            if spellings.is_empty() {
                return Err(ReconcileError::ConfigValidation(format!(
                    "units.{canonical} has no spellings"
                )));
            }
            for spelling in spellings {
                let key = spelling.trim().to_uppercase();
                if let Some(other) = seen.get(&key) {
                    if *other != canonical.as_str() {
                        return Err(ReconcileError::ConfigValidation(format!(
                            "unit spelling '{spelling}' is claimed by both '{other}' and '{canonical}'"
                        )));
                    }
                }
                seen.insert(key, canonical);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_parses_to_defaults() {
        let config = ReconcileConfig::from_toml("").unwrap();
        assert_eq!(config.thresholds.similarity, 0.70);
        assert_eq!(config.thresholds.quantity_tolerance, 0.01);
        assert_eq!(config.thresholds.description_similarity, 0.80);
        assert!(!config.aliases.identifier.is_empty());
        assert_eq!(config.units.canonical_for("PCS"), Some("PC"));
    }

    #[test]
    fn parse_full_override() {
        let input = r#"
[thresholds]
similarity = 0.6
quantity_tolerance = 0.05
description_similarity = 0.9

[aliases]
identifier = ["Artikelnummer"]
quantity = ["Menge"]
unit = ["Einheit"]
description = ["Bezeichnung"]

[units]
PCS = ["PCS", "PC", "STK"]
"#;
        let config = ReconcileConfig::from_toml(input).unwrap();
        assert_eq!(config.thresholds.similarity, 0.6);
        assert_eq!(config.thresholds.quantity_tolerance, 0.05);
        assert_eq!(config.aliases.identifier, vec!["Artikelnummer"]);
        assert_eq!(config.units.canonical_for("STK"), Some("PCS"));
        // Override replaces the whole table; default synonyms are gone
        assert_eq!(config.units.canonical_for("KG"), None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let input = r#"
[thresholds]
quantity_tolerance = 0.02
"#;
        let config = ReconcileConfig::from_toml(input).unwrap();
        assert_eq!(config.thresholds.quantity_tolerance, 0.02);
        assert_eq!(config.thresholds.similarity, 0.70);
        assert_eq!(config.units.canonical_for("pieza"), Some("PC"));
    }

    #[test]
    fn reject_out_of_range_similarity() {
        let err = ReconcileConfig::from_toml("[thresholds]\nsimilarity = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("thresholds.similarity"));
        let err = ReconcileConfig::from_toml("[thresholds]\nsimilarity = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("thresholds.similarity"));
    }

    #[test]
    fn reject_negative_tolerance() {
        let err =
            ReconcileConfig::from_toml("[thresholds]\nquantity_tolerance = -0.1\n").unwrap_err();
        assert!(err.to_string().contains("quantity_tolerance"));
    }

    #[test]
    fn reject_empty_identifier_aliases() {
        let err = ReconcileConfig::from_toml("[aliases]\nidentifier = []\n").unwrap_err();
        assert!(err.to_string().contains("aliases.identifier"));
    }

    #[test]
    fn reject_spelling_claimed_twice() {
        let input = r#"
[units]
PC = ["PCS"]
PIECE = ["PCS"]
"#;
        let err = ReconcileConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'PCS'"));
    }

    #[test]
    fn reject_malformed_toml() {
        let err = ReconcileConfig::from_toml("[thresholds\nsimilarity = 0.7").unwrap_err();
        assert!(matches!(err, ReconcileError::ConfigParse(_)));
    }

    #[test]
    fn unit_lookup_is_case_insensitive_and_trimmed() {
        let units = UnitTable::default();
        assert_eq!(units.canonical_for(" pcs "), Some("PC"));
        assert_eq!(units.canonical_for("Piezas"), Some("PC"));
        assert_eq!(units.canonical_for("kilograms"), Some("KG"));
        assert_eq!(units.canonical_for("bogus"), None);
        assert_eq!(units.canonical_for(""), None);
    }
}
