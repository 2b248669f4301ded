// ==============================================================================
// artifacts.rs - Model Bundle Loading
// ==============================================================================
// Description: Loads and validates the versioned model/encoder artifact bundle
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Bundle layout (JSON, format_version 1):
//   feature_encoders        - per-column category lists
//                             ["A", "B"] or {"classes": [...], "counts": [...]}
//   target_encoder_disease  - disease labels, indexed by class id
//   target_encoder_risk     - risk labels, indexed by class id
//   model_disease           - tree ensemble (see classifier.rs)
//   model_risk              - tree ensemble
// The bundle is read once at start and never mutated afterwards.
// ==============================================================================

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::classifier::{Classifier, TreeEnsemble};
use crate::decoder::TargetDecoder;
use crate::encoder::{CategoryEncoder, EncoderError, FeatureEncoders, UnseenCategoryPolicy};
use crate::schema::{self, FEATURE_COUNT};
use crate::table::Cell;

/// Supported bundle format
pub const BUNDLE_FORMAT_VERSION: u64 = 1;

/// Errors that can occur while loading the model bundle
#[derive(Error, Debug)]
pub enum ArtifactLoadError {
    #[error("Failed to read model bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model bundle: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported model bundle format version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u64 },

    #[error("Feature encoder registered for unknown column '{0}'")]
    UnknownEncoderColumn(String),

    #[error("Invalid feature encoder for '{column}': {source}")]
    Encoder {
        column: String,
        #[source]
        source: EncoderError,
    },

    #[error("{component} model expects {found} features (schema has {expected})")]
    FeatureCount {
        component: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{component} model emits {classes} classes but its decoder has {labels} labels")]
    DecoderSize {
        component: &'static str,
        classes: usize,
        labels: usize,
    },
}

/// Category label as stored in the bundle (training data may hold numbers)
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLabel {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl StoredLabel {
    fn into_category(self) -> String {
        match self {
            StoredLabel::Text(s) => s,
            StoredLabel::Integer(v) => Cell::Integer(v).category_form().into_owned(),
            StoredLabel::Float(v) => Cell::Float(v).category_form().into_owned(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEncoder {
    Classes(Vec<StoredLabel>),
    Detailed {
        classes: Vec<StoredLabel>,
        #[serde(default)]
        counts: Option<Vec<u64>>,
    },
}

impl StoredEncoder {
    fn build(self) -> Result<CategoryEncoder, EncoderError> {
        let to_strings = |labels: Vec<StoredLabel>| -> Vec<String> {
            labels.into_iter().map(StoredLabel::into_category).collect()
        };

        match self {
            StoredEncoder::Classes(classes) => Ok(CategoryEncoder::new(to_strings(classes))),
            StoredEncoder::Detailed {
                classes,
                counts: None,
            } => Ok(CategoryEncoder::new(to_strings(classes))),
            StoredEncoder::Detailed {
                classes,
                counts: Some(counts),
            } => CategoryEncoder::with_counts(to_strings(classes), counts),
        }
    }
}

#[derive(Deserialize)]
struct BundleFile {
    format_version: u64,
    feature_encoders: HashMap<String, StoredEncoder>,
    target_encoder_disease: TargetDecoder,
    target_encoder_risk: TargetDecoder,
    model_disease: TreeEnsemble,
    model_risk: TreeEnsemble,
}

/// Loaded, validated model artifacts shared by every request
#[derive(Debug)]
pub struct ModelBundle {
    format_version: u64,
    encoders: FeatureEncoders,
    disease_model: Box<dyn Classifier>,
    disease_decoder: TargetDecoder,
    risk_model: Box<dyn Classifier>,
    risk_decoder: TargetDecoder,
}

impl ModelBundle {
    /// Assemble a bundle from its components, checking they fit together
    pub fn new(
        encoders: FeatureEncoders,
        disease_model: Box<dyn Classifier>,
        disease_decoder: TargetDecoder,
        risk_model: Box<dyn Classifier>,
        risk_decoder: TargetDecoder,
    ) -> Result<Self, ArtifactLoadError> {
        if let Some(column) = encoders.columns().find(|c| !schema::is_feature_column(c)) {
            return Err(ArtifactLoadError::UnknownEncoderColumn(column.to_string()));
        }

        for (component, model, decoder) in [
            ("disease", &disease_model, &disease_decoder),
            ("risk", &risk_model, &risk_decoder),
        ] {
            if model.n_features() != FEATURE_COUNT {
                return Err(ArtifactLoadError::FeatureCount {
                    component,
                    expected: FEATURE_COUNT,
                    found: model.n_features(),
                });
            }
            if decoder.len() < model.n_classes() {
                return Err(ArtifactLoadError::DecoderSize {
                    component,
                    classes: model.n_classes(),
                    labels: decoder.len(),
                });
            }
        }

        for column in schema::FEATURE_COLUMNS {
            match encoders.get(column) {
                Some(encoder) if encoder.is_empty() => {
                    warn!(column, "Feature encoder has no categories, all values encode to 0");
                }
                Some(encoder) if encoder.duplicate_count() > 0 => {
                    warn!(
                        column,
                        duplicates = encoder.duplicate_count(),
                        "Feature encoder has duplicated labels"
                    );
                }
                Some(_) => {}
                None => info!(column, "No feature encoder, column passes through as numeric"),
            }
        }

        Ok(Self {
            format_version: BUNDLE_FORMAT_VERSION,
            encoders,
            disease_model,
            disease_decoder: disease_decoder.named("disease"),
            risk_model,
            risk_decoder: risk_decoder.named("risk"),
        })
    }

    /// Load a bundle from disk
    pub fn load(
        path: impl AsRef<Path>,
        policy: UnseenCategoryPolicy,
    ) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        info!(path = %path.display(), policy = %policy, "Loading model bundle");

        let bytes = std::fs::read(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_slice(&bytes, policy)
    }

    /// Parse a bundle from its JSON bytes
    pub fn from_json_slice(
        bytes: &[u8],
        policy: UnseenCategoryPolicy,
    ) -> Result<Self, ArtifactLoadError> {
        // Check the version before the layout so old bundles get a clear error
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if let Some(found) = value.get("format_version").and_then(|v| v.as_u64()) {
            if found != BUNDLE_FORMAT_VERSION {
                return Err(ArtifactLoadError::UnsupportedVersion {
                    found,
                    expected: BUNDLE_FORMAT_VERSION,
                });
            }
        }

        let file: BundleFile = serde_json::from_value(value)?;

        let mut encoders = HashMap::with_capacity(file.feature_encoders.len());
        for (column, stored) in file.feature_encoders {
            let encoder = stored
                .build()
                .map_err(|source| ArtifactLoadError::Encoder {
                    column: column.clone(),
                    source,
                })?;
            encoders.insert(column, encoder);
        }

        info!(
            format_version = file.format_version,
            encoders = encoders.len(),
            disease_trees = file.model_disease.n_trees(),
            risk_trees = file.model_risk.n_trees(),
            disease_labels = file.target_encoder_disease.len(),
            risk_labels = file.target_encoder_risk.len(),
            "Model bundle parsed"
        );

        Self::new(
            FeatureEncoders::new(encoders, policy),
            Box::new(file.model_disease),
            file.target_encoder_disease,
            Box::new(file.model_risk),
            file.target_encoder_risk,
        )
    }

    pub fn format_version(&self) -> u64 {
        self.format_version
    }

    pub fn encoders(&self) -> &FeatureEncoders {
        &self.encoders
    }

    pub fn disease_model(&self) -> &dyn Classifier {
        self.disease_model.as_ref()
    }

    pub fn disease_decoder(&self) -> &TargetDecoder {
        &self.disease_decoder
    }

    pub fn risk_model(&self) -> &dyn Classifier {
        self.risk_model.as_ref()
    }

    pub fn risk_decoder(&self) -> &TargetDecoder {
        &self.risk_decoder
    }
}
