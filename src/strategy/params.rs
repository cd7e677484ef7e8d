//! Strategy Parameters
//!
//! Configuration structs for the regime classifier and the direction predictor.
//! Defaults reproduce the reference behavior: 5-period rolling volatility,
//! 1% / 3% regime cut-offs, a 100-tree ensemble with seed 42.

use serde::{Deserialize, Serialize};

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub predictor: PredictorConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.classifier.validate()?;
        self.predictor.validate()?;
        Ok(())
    }
}

/// Volatility regime classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum non-missing closes before a regime is reported
    pub min_observations: usize,
    /// Number of returns in each rolling standard deviation
    pub volatility_window: usize,
    /// Volatility strictly below this is stable
    pub stable_below: f64,
    /// Volatility strictly above this is chaotic
    pub chaotic_above: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_observations: 10,
            volatility_window: 5,
            stable_below: 0.01,
            chaotic_above: 0.03,
        }
    }
}

impl ClassifierConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.volatility_window = window;
        self
    }

    pub fn with_thresholds(mut self, stable_below: f64, chaotic_above: f64) -> Self {
        self.stable_below = stable_below;
        self.chaotic_above = chaotic_above;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.volatility_window < 2 {
            return Err(ParamsError::InvalidWindow(self.volatility_window));
        }
        // Window returns need window + 1 closes
        if self.min_observations <= self.volatility_window {
            return Err(ParamsError::InvalidMinObservations {
                min_observations: self.min_observations,
                window: self.volatility_window,
            });
        }
        if !(self.stable_below > 0.0
            && self.stable_below.is_finite()
            && self.chaotic_above.is_finite()
            && self.stable_below <= self.chaotic_above)
        {
            return Err(ParamsError::InvalidThresholds {
                stable_below: self.stable_below,
                chaotic_above: self.chaotic_above,
            });
        }
        Ok(())
    }
}

/// Direction predictor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Minimum labelled rows needed to fit
    pub min_rows: usize,
    /// Tree ensemble settings
    pub forest: ForestConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_rows: 20,
            forest: ForestConfig::default(),
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.min_rows < 2 {
            return Err(ParamsError::InvalidMinRows(self.min_rows));
        }
        self.forest.validate()
    }
}

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (unlimited if None)
    pub max_depth: Option<usize>,
    /// Minimum samples to split a node
    pub min_samples_split: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (ceil(sqrt(n)) if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling per tree
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.n_trees == 0 {
            return Err(ParamsError::InvalidForest("n_trees must be >= 1".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(ParamsError::InvalidForest(format!(
                "min_samples_split must be >= 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ParamsError::InvalidForest("min_samples_leaf must be >= 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(ParamsError::InvalidForest("max_depth must be >= 1".to_string()));
        }
        if self.max_features == Some(0) {
            return Err(ParamsError::InvalidForest("max_features must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid volatility window: {0} (minimum 2)")]
    InvalidWindow(usize),
    #[error("Invalid min_observations: {min_observations} (must exceed window {window})")]
    InvalidMinObservations { min_observations: usize, window: usize },
    #[error("Invalid regime thresholds: stable_below={stable_below}, chaotic_above={chaotic_above}")]
    InvalidThresholds { stable_below: f64, chaotic_above: f64 },
    #[error("Invalid min_rows: {0} (minimum 2)")]
    InvalidMinRows(usize),
    #[error("Invalid forest settings: {0}")]
    InvalidForest(String),
}
