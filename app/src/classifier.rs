// ==============================================================================
// classifier.rs - Feature Matrix and Tree Ensemble Classifier
// ==============================================================================
// Description: Opaque class-id predictors over fixed-width feature vectors
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Tree format (flat node array, root at index 0):
//   {"split": {"feature": 0, "threshold": 0.5, "left": 1, "right": 2}}
//   {"leaf":  {"value": [3.0, 1.0]}}
// Samples go left when x[feature] <= threshold. Children always point forward,
// so traversal terminates. The ensemble averages each tree's normalized leaf
// distribution and predicts the argmax (lowest class id on ties).
// ==============================================================================

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by classifiers, at load or predict time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Feature vector width mismatch: expected {expected}, got {found}")]
    FeatureWidth { expected: usize, found: usize },

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Row-major, dense matrix of encoded features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_features: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn with_capacity(n_features: usize, n_rows: usize) -> Self {
        Self {
            n_features,
            values: Vec::with_capacity(n_features * n_rows),
        }
    }

    /// Append one feature vector
    pub fn push_row(&mut self, row: &[f64]) -> Result<(), ClassifierError> {
        if row.len() != self.n_features {
            return Err(ClassifierError::FeatureWidth {
                expected: self.n_features,
                found: row.len(),
            });
        }
        self.values.extend_from_slice(row);
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_rows(&self) -> usize {
        if self.n_features == 0 {
            0
        } else {
            self.values.len() / self.n_features
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.values.chunks_exact(self.n_features.max(1))
    }
}

/// A trained model mapping feature vectors to class ids
///
/// Implementations must be read-only after construction: one instance serves
/// every concurrent request.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Expected feature vector width
    fn n_features(&self) -> usize;

    /// Number of classes the model can emit (ids are `0..n_classes`)
    fn n_classes(&self) -> usize;

    /// One class id per matrix row, in row order
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u32>, ClassifierError>;
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Decision tree stored as a flat node array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} (model has {})",
                            idx, feature, n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", idx));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} class weights (expected {})",
                            idx,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!("leaf {} has a negative or non-finite weight", idx));
                    }
                }
            }
        }

        Ok(())
    }

    /// Leaf distribution reached by `row`
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

#[derive(Deserialize)]
struct RawEnsemble {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

/// Averaging ensemble of decision trees (random forest style)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEnsemble")]
pub struct TreeEnsemble {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl TryFrom<RawEnsemble> for TreeEnsemble {
    type Error = ClassifierError;

    fn try_from(raw: RawEnsemble) -> Result<Self, Self::Error> {
        Self::new(raw.n_features, raw.n_classes, raw.trees)
    }
}

impl TreeEnsemble {
    /// Build a validated ensemble
    pub fn new(
        n_features: usize,
        n_classes: usize,
        trees: Vec<DecisionTree>,
    ) -> Result<Self, ClassifierError> {
        if n_classes == 0 {
            return Err(ClassifierError::InvalidModel("model has no classes".to_string()));
        }
        if trees.is_empty() {
            return Err(ClassifierError::InvalidModel("model has no trees".to_string()));
        }

        for (idx, tree) in trees.iter().enumerate() {
            tree.validate(n_features, n_classes)
                .map_err(|e| ClassifierError::InvalidModel(format!("tree {}: {}", idx, e)))?;
        }

        Ok(Self {
            n_features,
            n_classes,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean class distribution over all trees
    pub fn predict_proba_row(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];

        for tree in &self.trees {
            let leaf = tree.leaf(row);
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, v) in proba.iter_mut().zip(leaf) {
                    *p += v / total;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }

    fn predict_row(&self, row: &[f64]) -> u32 {
        let proba = self.predict_proba_row(row);
        let mut best = 0;
        for (idx, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = idx;
            }
        }
        best as u32
    }
}

impl Classifier for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u32>, ClassifierError> {
        if features.n_features() != self.n_features {
            return Err(ClassifierError::FeatureWidth {
                expected: self.n_features,
                found: features.n_features(),
            });
        }

        Ok(features.rows().map(|row| self.predict_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: &[f64]) -> TreeNode {
        TreeNode::Leaf {
            value: value.to_vec(),
        }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        let mut m = FeatureMatrix::with_capacity(2, rows.len());
        for row in rows {
            m.push_row(row).unwrap();
        }
        m
    }

    #[test]
    fn test_single_tree_routing() {
        let tree = DecisionTree::new(vec![
            split(0, 0.5, 1, 2),
            leaf(&[10.0, 0.0]),
            leaf(&[0.0, 4.0]),
        ]);
        let model = TreeEnsemble::new(2, 2, vec![tree]).unwrap();

        let predictions = model.predict(&matrix(&[[0.0, 9.0], [0.5, 9.0], [1.0, 9.0]])).unwrap();
        assert_eq!(predictions, vec![0, 0, 1]); // 0.5 <= 0.5 goes left
    }

    #[test]
    fn test_ensemble_averages_normalized_leaves() {
        // Tree 1 strongly favors class 0 with large raw counts,
        // trees 2 and 3 favor class 1 with small counts
        let t1 = DecisionTree::new(vec![leaf(&[100.0, 0.0])]);
        let t2 = DecisionTree::new(vec![leaf(&[0.0, 1.0])]);
        let t3 = DecisionTree::new(vec![leaf(&[0.2, 0.8])]);
        let model = TreeEnsemble::new(2, 2, vec![t1, t2, t3]).unwrap();

        let proba = model.predict_proba_row(&[0.0, 0.0]);
        assert!((proba[0] - 0.4).abs() < 1e-12);
        assert!((proba[1] - 0.6).abs() < 1e-12);
        assert_eq!(model.predict(&matrix(&[[0.0, 0.0]])).unwrap(), vec![1]);
    }

    #[test]
    fn test_tie_goes_to_lower_class() {
        let model = TreeEnsemble::new(
            2,
            3,
            vec![DecisionTree::new(vec![leaf(&[0.0, 1.0, 1.0])])],
        )
        .unwrap();
        assert_eq!(model.predict(&matrix(&[[0.0, 0.0]])).unwrap(), vec![1]);
    }

    #[test]
    fn test_empty_matrix() {
        let model = TreeEnsemble::new(2, 2, vec![DecisionTree::new(vec![leaf(&[1.0, 0.0])])]).unwrap();
        let empty = FeatureMatrix::with_capacity(2, 0);
        assert_eq!(empty.n_rows(), 0);
        assert!(model.predict(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_feature_width_mismatch() {
        let model = TreeEnsemble::new(3, 2, vec![DecisionTree::new(vec![leaf(&[1.0, 0.0])])]).unwrap();
        let result = model.predict(&matrix(&[[0.0, 0.0]]));
        assert_eq!(
            result.unwrap_err(),
            ClassifierError::FeatureWidth {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_push_row_width_checked() {
        let mut m = FeatureMatrix::with_capacity(2, 1);
        assert!(m.push_row(&[1.0, 2.0, 3.0]).is_err());
        m.push_row(&[1.0, 2.0]).unwrap();
        assert_eq!(m.n_rows(), 1);
        assert_eq!(m.rows().next(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = DecisionTree::new(vec![leaf(&[1.0, 0.0]), split(0, 0.5, 0, 0)]);
        let result = TreeEnsemble::new(2, 2, vec![tree]);
        assert!(matches!(result, Err(ClassifierError::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_wrong_leaf_width() {
        let tree = DecisionTree::new(vec![leaf(&[1.0, 0.0, 0.0])]);
        assert!(TreeEnsemble::new(2, 2, vec![tree]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let tree = DecisionTree::new(vec![split(5, 0.5, 1, 2), leaf(&[1.0, 0.0]), leaf(&[0.0, 1.0])]);
        assert!(TreeEnsemble::new(2, 2, vec![tree]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "n_features": 2,
            "n_classes": 2,
            "trees": [{"nodes": [
                {"split": {"feature": 1, "threshold": 1.5, "left": 1, "right": 2}},
                {"leaf": {"value": [1.0, 0.0]}},
                {"leaf": {"value": [0.0, 1.0]}}
            ]}]
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();
        assert_eq!(model.n_trees(), 1);
        assert_eq!(model.predict(&matrix(&[[0.0, 2.0]])).unwrap(), vec![1]);

        let invalid = r#"{"n_features": 2, "n_classes": 2, "trees": []}"#;
        let err = serde_json::from_str::<TreeEnsemble>(invalid).unwrap_err();
        assert!(err.to_string().contains("no trees"));
    }
}
