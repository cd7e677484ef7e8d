use crate::domain::{Decision, PriceSeries, Regime};

/// Maps a price series to its current volatility regime.
///
/// Never fails: degenerate or malformed input yields `Regime::Undefined`.
#[cfg_attr(test, mockall::automock)]
pub trait RegimeClassifier {
    fn classify_regime(&self, series: &PriceSeries) -> Regime;
}

/// Predictor output for one round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub decision: Decision,
    /// In-sample accuracy of the model behind a directional decision
    pub accuracy: Option<f64>,
}

impl From<Decision> for Prediction {
    fn from(decision: Decision) -> Self {
        Self { decision, accuracy: None }
    }
}

/// Forecasts the next-period direction from a price series.
///
/// Returns `Decision::Buy`, `Decision::Sell`, or `Decision::Undefined` when no
/// usable signal can be produced.
#[cfg_attr(test, mockall::automock)]
pub trait DirectionPredictor {
    fn predict_direction(&self, series: &PriceSeries) -> Decision;

    /// Decision together with the accuracy of the model that produced it,
    /// from a single fit
    fn forecast(&self, series: &PriceSeries) -> Prediction {
        self.predict_direction(series).into()
    }
}
