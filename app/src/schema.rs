// ==============================================================================
// schema.rs - Feature Schema
// ==============================================================================
// Description: Fixed, ordered feature schema consumed by the classifiers
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Column order is the feature vector layout the classifiers were trained on.
// Never reorder these without retraining the model bundle.
// ==============================================================================

/// Child genotype column (numeric, passed through unencoded)
pub const CHILD_GENOTYPE: &str = "Child_Genotype";

/// Required input columns, in feature vector order
pub const FEATURE_COLUMNS: [&str; 9] = [
    "Father_Gene",
    "Father_Variant",
    "Father_Pathogenicity",
    "Father_Inheritance",
    "Mother_Gene",
    "Mother_Variant",
    "Mother_Pathogenicity",
    "Mother_Inheritance",
    CHILD_GENOTYPE,
];

/// Width of every feature vector
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Position of `column` in the feature vector, if it is a schema column
pub fn feature_index(column: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|c| *c == column)
}

pub fn is_feature_column(column: &str) -> bool {
    feature_index(column).is_some()
}

/// Required columns absent from `headers`, in schema order
pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    FEATURE_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.as_ref() == **required))
        .map(|c| c.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("Father_Gene"), Some(0));
        assert_eq!(feature_index("Child_Genotype"), Some(8));
        assert_eq!(feature_index("father_gene"), None); // Case-sensitive
    }

    #[test]
    fn test_missing_columns_none() {
        let mut headers: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        headers.push("Notes".to_string());
        assert!(missing_columns(&headers).is_empty());
    }

    #[test]
    fn test_missing_columns_in_schema_order() {
        let headers = ["Child_Genotype", "Father_Gene", "Mother_Gene"];
        let missing = missing_columns(&headers);

        assert_eq!(missing.len(), 6);
        assert_eq!(missing[0], "Father_Variant");
        assert_eq!(missing[5], "Mother_Inheritance");
        assert!(!missing.contains(&"Father_Gene".to_string()));
    }
}
