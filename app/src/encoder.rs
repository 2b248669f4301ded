// ==============================================================================
// encoder.rs - Safe Categorical Encoding
// ==============================================================================
// Description: Maps categorical cell values to the codes the classifiers expect
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   Given a column's registered categories [c0, c1, ..., cN]:
//   - value == ci (string form)   → i
//   - value not registered        → fallback code (per UnseenCategoryPolicy)
//   - no registered categories    → 0
//   Encoding never fails: one anomalous cell must not abort the batch.
// ==============================================================================

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::table::Cell;

/// Errors building an encoder from artifact data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncoderError {
    #[error("{counts} frequency counts supplied for {classes} categories")]
    CountMismatch { classes: usize, counts: usize },
}

/// Replacement strategy for category values absent from training data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnseenCategoryPolicy {
    /// Code of the first registered category
    #[default]
    FirstCategory,
    /// Code of the category seen most often during training
    /// (encoders without frequencies use the first category)
    MostFrequent,
}

impl UnseenCategoryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnseenCategoryPolicy::FirstCategory => "first",
            UnseenCategoryPolicy::MostFrequent => "most-frequent",
        }
    }
}

impl fmt::Display for UnseenCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnseenCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first-category" => Ok(UnseenCategoryPolicy::FirstCategory),
            "most-frequent" | "most_frequent" | "mode" => Ok(UnseenCategoryPolicy::MostFrequent),
            other => Err(format!(
                "unknown unseen category policy '{}' (expected 'first' or 'most-frequent')",
                other
            )),
        }
    }
}

/// Result of looking up one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Registered category
    Known(u32),
    /// Unseen value replaced by the fallback code
    Fallback(u32),
    /// Encoder has no categories
    Malformed,
}

impl Encoding {
    pub fn code(self) -> u32 {
        match self {
            Encoding::Known(code) | Encoding::Fallback(code) => code,
            Encoding::Malformed => 0,
        }
    }

    pub fn is_substitution(self) -> bool {
        !matches!(self, Encoding::Known(_))
    }
}

/// Label encoding table for one feature column
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    classes: Vec<String>,
    codes: HashMap<String, u32>,
    counts: Option<Vec<u64>>,
    fallback: u32,
}

impl CategoryEncoder {
    /// Build an encoder; each category's code is its position in `classes`
    pub fn new(classes: Vec<String>) -> Self {
        let mut codes = HashMap::with_capacity(classes.len());
        for (idx, class) in classes.iter().enumerate() {
            // First registration wins for duplicated labels
            codes.entry(class.clone()).or_insert(idx as u32);
        }

        Self {
            classes,
            codes,
            counts: None,
            fallback: 0,
        }
    }

    /// Build an encoder carrying per-category training frequencies
    pub fn with_counts(classes: Vec<String>, counts: Vec<u64>) -> Result<Self, EncoderError> {
        if classes.len() != counts.len() {
            return Err(EncoderError::CountMismatch {
                classes: classes.len(),
                counts: counts.len(),
            });
        }

        let mut encoder = Self::new(classes);
        encoder.counts = Some(counts);
        Ok(encoder)
    }

    /// Resolve the fallback code for `policy`
    pub fn with_policy(mut self, policy: UnseenCategoryPolicy) -> Self {
        self.fallback = match (policy, &self.counts) {
            (UnseenCategoryPolicy::MostFrequent, Some(counts)) => counts
                .iter()
                .enumerate()
                // max_by_key keeps the last maximum; reverse so ties go to the lower code
                .rev()
                .max_by_key(|(_, count)| **count)
                .map(|(idx, _)| idx as u32)
                .unwrap_or(0),
            _ => 0,
        };
        self
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Number of labels registered more than once
    pub fn duplicate_count(&self) -> usize {
        self.classes.len() - self.codes.len()
    }

    pub fn fallback_code(&self) -> u32 {
        self.fallback
    }

    /// Look up a value, reporting whether a substitution happened
    pub fn classify(&self, value: &str) -> Encoding {
        if self.classes.is_empty() {
            return Encoding::Malformed;
        }

        match self.codes.get(value) {
            Some(code) => Encoding::Known(*code),
            None => Encoding::Fallback(self.fallback),
        }
    }

    /// Encode a value; never fails
    pub fn encode(&self, value: &str) -> u32 {
        self.classify(value).code()
    }

    /// Encode a typed cell by its string form
    pub fn encode_cell(&self, cell: &Cell) -> Encoding {
        self.classify(&cell.category_form())
    }
}

/// Per-column encoders for the feature schema
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoders {
    encoders: HashMap<String, CategoryEncoder>,
    policy: UnseenCategoryPolicy,
}

impl FeatureEncoders {
    pub fn new(encoders: HashMap<String, CategoryEncoder>, policy: UnseenCategoryPolicy) -> Self {
        let encoders = encoders
            .into_iter()
            .map(|(column, encoder)| (column, encoder.with_policy(policy)))
            .collect();

        Self { encoders, policy }
    }

    pub fn policy(&self) -> UnseenCategoryPolicy {
        self.policy
    }

    pub fn get(&self, column: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(column)
    }

    pub fn has_encoder(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Encode `value` for `column`
    ///
    /// Returns `None` when the column has no encoder (numeric pass-through).
    pub fn encode(&self, column: &str, value: &Cell) -> Option<u32> {
        self.get(column).map(|encoder| encoder.encode_cell(value).code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genes() -> CategoryEncoder {
        CategoryEncoder::new(vec![
            "BRCA1".to_string(),
            "BRCA2".to_string(),
            "CFTR".to_string(),
            "HBB".to_string(),
        ])
    }

    #[test]
    fn test_known_values() {
        let encoder = genes();
        assert_eq!(encoder.encode("BRCA1"), 0);
        assert_eq!(encoder.encode("CFTR"), 2);
        assert_eq!(encoder.encode("HBB"), 3);
    }

    #[test]
    fn test_encoding_is_stable() {
        let encoder = genes();
        let first = encoder.encode("BRCA2");
        for _ in 0..10 {
            assert_eq!(encoder.encode("BRCA2"), first);
        }
    }

    #[test]
    fn test_unseen_value_uses_first_category() {
        let encoder = genes();
        assert_eq!(encoder.classify("UNKNOWN_GENE_XYZ"), Encoding::Fallback(0));
        assert_eq!(encoder.encode("brca1"), 0); // Case-sensitive match
        assert_eq!(encoder.encode(""), 0);
    }

    #[test]
    fn test_malformed_encoder_returns_zero() {
        let encoder = CategoryEncoder::new(Vec::new());
        assert_eq!(encoder.classify("BRCA1"), Encoding::Malformed);
        assert_eq!(encoder.encode("BRCA1"), 0);
    }

    #[test]
    fn test_numeric_cells_match_string_labels() {
        let encoder = CategoryEncoder::new(vec!["0".to_string(), "1".to_string(), "2".to_string()]);

        assert_eq!(encoder.encode_cell(&Cell::Integer(2)), Encoding::Known(2));
        // "1.0" is not a registered label
        assert_eq!(encoder.encode_cell(&Cell::Float(1.0)), Encoding::Fallback(0));
    }

    #[test]
    fn test_most_frequent_policy() {
        let encoder = CategoryEncoder::with_counts(
            vec!["Benign".to_string(), "Pathogenic".to_string(), "VUS".to_string()],
            vec![5, 40, 40],
        )
        .unwrap()
        .with_policy(UnseenCategoryPolicy::MostFrequent);

        // Ties resolve to the lower code
        assert_eq!(encoder.fallback_code(), 1);
        assert_eq!(encoder.classify("Unknown"), Encoding::Fallback(1));
        assert_eq!(encoder.encode("Benign"), 0);
    }

    #[test]
    fn test_most_frequent_without_counts() {
        let encoder = genes().with_policy(UnseenCategoryPolicy::MostFrequent);
        assert_eq!(encoder.fallback_code(), 0);
    }

    #[test]
    fn test_count_mismatch() {
        let result = CategoryEncoder::with_counts(vec!["A".to_string()], vec![1, 2]);
        assert_eq!(
            result.unwrap_err(),
            EncoderError::CountMismatch {
                classes: 1,
                counts: 2
            }
        );
    }

    #[test]
    fn test_duplicate_labels_keep_first_code() {
        let encoder = CategoryEncoder::new(vec!["A".to_string(), "B".to_string(), "A".to_string()]);
        assert_eq!(encoder.encode("A"), 0);
        assert_eq!(encoder.duplicate_count(), 1);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "first".parse::<UnseenCategoryPolicy>().unwrap(),
            UnseenCategoryPolicy::FirstCategory
        );
        assert_eq!(
            "Most-Frequent".parse::<UnseenCategoryPolicy>().unwrap(),
            UnseenCategoryPolicy::MostFrequent
        );
        assert!("sentinel".parse::<UnseenCategoryPolicy>().is_err());
        assert_eq!(UnseenCategoryPolicy::MostFrequent.to_string(), "most-frequent");
        for policy in [UnseenCategoryPolicy::FirstCategory, UnseenCategoryPolicy::MostFrequent] {
            assert_eq!(policy.as_str().parse::<UnseenCategoryPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_feature_encoders_pass_through() {
        let mut map = HashMap::new();
        map.insert("Father_Gene".to_string(), genes());
        let encoders = FeatureEncoders::new(map, UnseenCategoryPolicy::FirstCategory);

        assert_eq!(
            encoders.encode("Father_Gene", &Cell::Text("HBB".to_string())),
            Some(3)
        );
        assert_eq!(encoders.encode("Child_Genotype", &Cell::Integer(1)), None);
        assert!(encoders.has_encoder("Father_Gene"));
        assert_eq!(encoders.len(), 1);
    }
}
