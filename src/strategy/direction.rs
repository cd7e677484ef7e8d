//! Direction Predictor
//!
//! Forecasts whether the next period's return is positive from the closing
//! price alone. Each call builds a fresh training table from the series and
//! fits a new forest; no model state survives between calls.
//!
//! Training row `t` pairs feature `close[t]` with label `ret[t+1] > 0`, where
//! `ret[t] = close[t] / close[t-1] - 1`. Rows with any undefined piece are
//! dropped, which removes the first row (no return) and the last (no future
//! return). The prediction is made for the final observation's close.

use thiserror::Error;

use super::forest::{Dataset, ForestError, RandomForest};
use super::params::PredictorConfig;
use super::volatility::pct_returns;
use crate::domain::{Decision, Direction, PriceSeries};
use crate::ports::{DirectionPredictor, Prediction};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Insufficient training rows: have {have}, need {need}")]
    InsufficientRows { have: usize, need: usize },

    #[error("Training labels contain a single class")]
    SingleClass,

    #[error("Latest close is missing")]
    MissingLatestFeature,

    #[error("Model fit failed: {0}")]
    Fit(#[from] ForestError),
}

/// Successful forecast with model diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionForecast {
    pub direction: Direction,
    /// Mean up-probability across trees
    pub probability_up: f64,
    /// In-sample accuracy on the training table
    pub training_accuracy: f64,
    pub training_rows: usize,
}

/// Labelled (close -> next return is positive) table
pub fn training_table(closes: &[f64]) -> (Vec<Vec<f64>>, Vec<bool>) {
    let returns = pct_returns(closes);
    let mut features = Vec::new();
    let mut labels = Vec::new();

    // returns[k] is the return into closes[k + 1]
    for t in 1..closes.len().saturating_sub(1) {
        let close = closes[t];
        let ret = returns[t - 1];
        let next_ret = returns[t];
        if close.is_finite() && ret.is_finite() && next_ret.is_finite() {
            features.push(vec![close]);
            labels.push(next_ret > 0.0);
        }
    }

    (features, labels)
}

/// Random-forest next-direction predictor
#[derive(Debug, Clone, Default)]
pub struct ForestDirectionPredictor {
    config: PredictorConfig,
}

impl ForestDirectionPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    /// Fit on the series and forecast the next direction with diagnostics
    pub fn try_forecast(&self, series: &PriceSeries) -> Result<DirectionForecast, PredictError> {
        let closes = series.closes();
        let (features, labels) = training_table(&closes);

        if labels.len() < self.config.min_rows {
            return Err(PredictError::InsufficientRows {
                have: labels.len(),
                need: self.config.min_rows,
            });
        }

        let dataset = Dataset::new(features, labels)?;
        if !dataset.has_both_classes() {
            return Err(PredictError::SingleClass);
        }

        let latest = closes
            .last()
            .copied()
            .filter(|c| c.is_finite())
            .ok_or(PredictError::MissingLatestFeature)?;

        let mut forest = RandomForest::new(self.config.forest.clone());
        forest.fit(&dataset)?;
        tracing::trace!("Fitted {} trees on {} rows", forest.n_trees(), dataset.n_samples());

        let probability_up = forest.predict_proba(&[latest])?;
        let training_accuracy = forest.accuracy(&dataset)?;

        Ok(DirectionForecast {
            direction: Direction::from_class(probability_up > 0.5),
            probability_up,
            training_accuracy,
            training_rows: dataset.n_samples(),
        })
    }

    pub fn try_predict(&self, series: &PriceSeries) -> Result<Direction, PredictError> {
        self.try_forecast(series).map(|f| f.direction)
    }
}

impl DirectionPredictor for ForestDirectionPredictor {
    fn predict_direction(&self, series: &PriceSeries) -> Decision {
        self.forecast(series).decision
    }

    fn forecast(&self, series: &PriceSeries) -> Prediction {
        match self.try_forecast(series) {
            Ok(forecast) => Prediction {
                decision: forecast.direction.into(),
                accuracy: Some(forecast.training_accuracy),
            },
            Err(e) => {
                tracing::debug!("Prediction undefined: {}", e);
                Decision::Undefined.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::params::ForestConfig;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), closes).unwrap()
    }

    fn alternating(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 100.5 }).collect()
    }

    fn predictor() -> ForestDirectionPredictor {
        ForestDirectionPredictor::new(PredictorConfig {
            forest: ForestConfig::default().with_trees(25),
            ..PredictorConfig::default()
        })
    }

    #[test]
    fn test_training_table_drops_ends() {
        let (features, labels) = training_table(&[10.0, 11.0, 10.5, 12.0]);
        assert_eq!(features, vec![vec![11.0], vec![10.5]]);
        assert_eq!(labels, vec![false, true]);
    }

    #[test]
    fn test_training_table_skips_missing() {
        let (features, _) = training_table(&[10.0, 11.0, f64::NAN, 12.0, 13.0, 12.5]);
        // Rows touching the gap lose a return or a label
        assert_eq!(features, vec![vec![13.0]]);
    }

    #[test]
    fn test_predicts_buy_after_low_close() {
        // Low closes are always followed by a rise
        let s = series(&alternating(22));
        assert_eq!(s.last_close(), Some(100.5));
        assert_eq!(predictor().predict_direction(&s), Decision::Sell);

        let s = series(&alternating(23));
        assert_eq!(s.last_close(), Some(100.0));
        assert_eq!(predictor().predict_direction(&s), Decision::Buy);
    }

    #[test]
    fn test_forecast_diagnostics() {
        let forecast = predictor().try_forecast(&series(&alternating(23))).unwrap();
        assert_eq!(forecast.direction, Direction::Buy);
        assert_eq!(forecast.training_rows, 21);
        assert_eq!(forecast.training_accuracy, 1.0);
        assert!(forecast.probability_up > 0.5);
    }

    #[test]
    fn test_forecast_carries_accuracy() {
        let prediction = predictor().forecast(&series(&alternating(23)));
        assert_eq!(prediction, Prediction { decision: Decision::Buy, accuracy: Some(1.0) });

        let prediction = predictor().forecast(&series(&alternating(21)));
        assert_eq!(prediction, Prediction::from(Decision::Undefined));
    }

    #[test]
    fn test_nineteen_rows_is_undefined() {
        let s = series(&alternating(21));
        assert_eq!(
            predictor().try_predict(&s),
            Err(PredictError::InsufficientRows { have: 19, need: 20 })
        );
        assert_eq!(predictor().predict_direction(&s), Decision::Undefined);
    }

    #[test]
    fn test_single_class_is_undefined() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(predictor().try_predict(&series(&rising)), Err(PredictError::SingleClass));

        let flat = [100.0; 30];
        assert_eq!(predictor().predict_direction(&series(&flat)), Decision::Undefined);
    }

    #[test]
    fn test_missing_latest_close_is_undefined() {
        let mut closes = alternating(25);
        closes.push(f64::NAN);
        assert_eq!(
            predictor().try_predict(&series(&closes)),
            Err(PredictError::MissingLatestFeature)
        );
    }

    #[test]
    fn test_prediction_is_reproducible() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 37) % 17) as f64 * 0.1)
            .collect();
        let s = series(&closes);
        let first = predictor().try_forecast(&s);
        let second = predictor().try_forecast(&s);
        assert_eq!(first, second);
    }
}
