// ==============================================================================
// decoder.rs - Target Label Decoding
// ==============================================================================
// Description: Maps predicted class ids back to their training label strings
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("{target} class id {class_id} is outside the {size} known labels")]
    UnknownClass {
        target: String,
        class_id: u32,
        size: usize,
    },
}

/// Inverse label mapping for one classifier output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct TargetDecoder {
    target: String,
    labels: Vec<String>,
}

impl From<Vec<String>> for TargetDecoder {
    fn from(labels: Vec<String>) -> Self {
        Self::new("target", labels)
    }
}

impl TargetDecoder {
    pub fn new(target: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            target: target.into(),
            labels,
        }
    }

    /// Rename the target this decoder serves (used in error messages)
    pub fn named(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn decode(&self, class_id: u32) -> Result<&str, DecodeError> {
        self.labels
            .get(class_id as usize)
            .map(String::as_str)
            .ok_or_else(|| DecodeError::UnknownClass {
                target: self.target.clone(),
                class_id,
                size: self.labels.len(),
            })
    }

    /// Decode a batch of ids, failing on the first unknown id
    pub fn decode_all(&self, class_ids: &[u32]) -> Result<Vec<String>, DecodeError> {
        class_ids
            .iter()
            .map(|id| self.decode(*id).map(str::to_string))
            .collect()
    }
}
