//! Strategy Layer - Volatility Regimes and Direction Forecasting
//!
//! Implements the two inputs of the decision engine:
//! - Rolling volatility of percentage returns over a short window
//! - Threshold classification into stable / transitional / chaotic regimes
//! - A seeded random forest forecasting the sign of the next return
//!
//! Both components degrade to `UNDEFINED` instead of failing when the
//! history is too short or degenerate.

pub mod params;
pub mod volatility;
pub mod regime_classifier;
pub mod forest;
pub mod direction;

pub use params::{ClassifierConfig, EngineConfig, ForestConfig, ParamsError, PredictorConfig};
pub use regime_classifier::{ClassifyError, VolatilityRegimeClassifier};
pub use forest::{Dataset, ForestError, RandomForest};
pub use direction::{DirectionForecast, ForestDirectionPredictor, PredictError};
