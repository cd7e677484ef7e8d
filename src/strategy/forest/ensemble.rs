//! Random forest ensemble

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::tree::{ClassificationTree, TreeLimits};
use super::{Dataset, ForestError};
use crate::strategy::params::ForestConfig;

/// Bagged ensemble of classification trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<ClassificationTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Train the forest. Tree `i` draws its bootstrap sample and feature
    /// subsets from a generator seeded with `seed + i`, so fitting is
    /// reproducible for a fixed seed.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), ForestError> {
        let n_samples = dataset.n_samples();
        let n_features = dataset.n_features();
        if n_samples == 0 {
            return Err(ForestError::EmptyDataset);
        }

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features);

        let limits = TreeLimits {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features,
        };

        let all: Vec<usize> = (0..n_samples).collect();
        self.trees = (0..self.config.n_trees)
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    all.clone()
                };
                ClassificationTree::grow(dataset, &sample, limits, &mut rng)
            })
            .collect();
        self.n_features = n_features;

        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean up-probability across trees
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, ForestError> {
        if !self.is_fitted() {
            return Err(ForestError::NotFitted);
        }
        if features.len() != self.n_features {
            return Err(ForestError::RaggedFeatures {
                row: 0,
                expected: self.n_features,
                found: features.len(),
            });
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(ForestError::NonFiniteFeature(0));
        }

        let total: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        Ok(total / self.trees.len() as f64)
    }

    /// Up class only when the mean probability is strictly above one half
    pub fn predict(&self, features: &[f64]) -> Result<bool, ForestError> {
        Ok(self.predict_proba(features)? > 0.5)
    }

    /// Share of `dataset` rows whose label the forest reproduces
    pub fn accuracy(&self, dataset: &Dataset) -> Result<f64, ForestError> {
        if dataset.n_samples() == 0 {
            return Err(ForestError::EmptyDataset);
        }
        let mut correct = 0usize;
        for (row, &label) in dataset.features().iter().zip(dataset.labels()) {
            if self.predict(row)? == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / dataset.n_samples() as f64)
    }
}
