//! Volatility Regime Classifier
//!
//! Labels the market by the most recent rolling standard deviation of
//! percentage returns:
//! - vol < stable_below          => Stable
//! - vol > chaotic_above         => Chaotic
//! - otherwise (bounds included) => Transitional
//!
//! Missing closes are dropped before returns are taken. Too little history or
//! a degenerate volatility yields `Regime::Undefined`.

use thiserror::Error;

use super::params::ClassifierConfig;
use super::volatility::{pct_returns, rolling_std};
use crate::domain::{PriceSeries, Regime};
use crate::ports::RegimeClassifier;

/// Why a series could not be given a regime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Insufficient observations: have {have}, need {need}")]
    InsufficientObservations { have: usize, need: usize },

    #[error("No complete volatility window")]
    EmptyVolatility,

    #[error("Latest volatility is not a finite number: {0}")]
    NonFiniteVolatility(f64),
}

/// Rolling-volatility regime classifier
#[derive(Debug, Clone, Default)]
pub struct VolatilityRegimeClassifier {
    config: ClassifierConfig,
}

impl VolatilityRegimeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Latest rolling volatility of the series' valid closes
    pub fn latest_volatility(&self, series: &PriceSeries) -> Result<f64, ClassifyError> {
        let closes = series.valid_closes();
        if closes.len() < self.config.min_observations {
            return Err(ClassifyError::InsufficientObservations {
                have: closes.len(),
                need: self.config.min_observations,
            });
        }

        let returns = pct_returns(&closes);
        let vol = rolling_std(&returns, self.config.volatility_window)
            .last()
            .copied()
            .ok_or(ClassifyError::EmptyVolatility)?;

        if !vol.is_finite() {
            return Err(ClassifyError::NonFiniteVolatility(vol));
        }
        Ok(vol)
    }

    /// Classify, reporting why a regime could not be determined
    pub fn try_classify(&self, series: &PriceSeries) -> Result<Regime, ClassifyError> {
        self.latest_volatility(series)
            .map(|vol| self.classify_volatility(vol))
    }

    /// Map a volatility value onto a regime using the configured cut-offs
    pub fn classify_volatility(&self, vol: f64) -> Regime {
        if !vol.is_finite() {
            Regime::Undefined
        } else if vol < self.config.stable_below {
            Regime::Stable
        } else if vol > self.config.chaotic_above {
            Regime::Chaotic
        } else {
            Regime::Transitional
        }
    }
}

impl RegimeClassifier for VolatilityRegimeClassifier {
    fn classify_regime(&self, series: &PriceSeries) -> Regime {
        match self.try_classify(series) {
            Ok(regime) => regime,
            Err(e) => {
                tracing::debug!("Regime undefined: {}", e);
                Regime::Undefined
            }
        }
    }
}
