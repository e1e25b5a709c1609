use strsim::normalized_levenshtein;

/// Lower-case a column header and reduce punctuation/whitespace runs to
/// single spaces, so "Material No." and "material no" compare equal.
pub fn normalize_header(s: &str) -> String {
    let lowered = s.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized edit-distance similarity in [0, 1]; 1.0 is an exact match.
/// Inputs are expected to be normalized already (headers via
/// `normalize_header`, descriptions via the value normalizer).
pub fn ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    normalized_levenshtein(a, b).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_header("Material No."), "material no");
        assert_eq!(normalize_header("  ERP  Part_Number "), "erp part number");
        assert_eq!(normalize_header("Component UoM"), "component uom");
        assert_eq!(normalize_header("SKU"), "sku");
    }

    #[test]
    fn header_normalization_handles_non_ascii() {
        assert_eq!(normalize_header("Descripción"), "descripción");
    }

    #[test]
    fn ratio_exact_is_one() {
        assert_eq!(ratio("part number", "part number"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn ratio_disjoint_is_low() {
        assert_eq!(ratio("abc", ""), 0.0);
        assert!(ratio("quantity", "xyzw") < 0.3);
    }

    #[test]
    fn ratio_is_edit_distance_based() {
        // distance 3 over max length 7
        let r = ratio("kitten", "sitting");
        assert!((r - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn ratio_orders_by_closeness() {
        let near = ratio("part number", "part numbers");
        let far = ratio("part number", "unit of measure");
        assert!(near > 0.85);
        assert!(near > far);
    }
}
