//! Tree Ensemble Classifier
//!
//! A small, deterministic random forest for binary classification:
//! Gini-impurity trees grown on bootstrap samples, with a per-split random
//! feature subset, averaged into an up-probability.

mod ensemble;
mod tree;

pub use ensemble::RandomForest;
pub use tree::ClassificationTree;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForestError {
    #[error("Dataset has no samples")]
    EmptyDataset,

    #[error("Dataset has no features")]
    NoFeatures,

    #[error("Row {row} has {found} features, expected {expected}")]
    RaggedFeatures {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Feature and label counts differ: {features} rows, {labels} labels")]
    LabelCountMismatch { features: usize, labels: usize },

    #[error("Non-finite feature value in row {0}")]
    NonFiniteFeature(usize),

    #[error("Model has not been fitted")]
    NotFitted,
}

/// Labelled feature table for binary classification
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Vec<f64>>,
    labels: Vec<bool>,
}

impl Dataset {
    /// Build a validated dataset; every row must have the same, finite width
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<bool>) -> Result<Self, ForestError> {
        if features.len() != labels.len() {
            return Err(ForestError::LabelCountMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        let first = features.first().ok_or(ForestError::EmptyDataset)?;
        let width = first.len();
        if width == 0 {
            return Err(ForestError::NoFeatures);
        }

        for (row, values) in features.iter().enumerate() {
            if values.len() != width {
                return Err(ForestError::RaggedFeatures {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ForestError::NonFiniteFeature(row));
            }
        }

        Ok(Self { features, labels })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    /// Number of samples labelled `true`
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }

    /// Whether both classes are present
    pub fn has_both_classes(&self) -> bool {
        let positives = self.positives();
        positives > 0 && positives < self.n_samples()
    }
}

/// Gini impurity of a binary label set with `positives` of `total` true
pub(crate) fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
