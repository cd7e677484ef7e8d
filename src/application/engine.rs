//! Decision Engine
//!
//! One round of the tactical state machine for a single instrument:
//! classify the regime, consult the predictor only in a stable regime, then
//! reconcile the forecast with the stored position.
//!
//! Reconciliation against the prior record:
//! - OPEN and forecast equals the stored decision => nothing emitted
//! - OPEN and forecast is SELL                    => emit CLOSE, position CLOSED
//! - anything else                                => emit forecast, position OPEN
//!
//! The stored decision is sticky: it only changes when something is emitted.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::{Decision, Direction, InstrumentRecord, PositionStatus, PriceSeries, Regime};
use crate::ports::{DirectionPredictor, Prediction, RegimeClassifier};

/// What happened in one round, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A fresh BUY or SELL recommendation opened a position
    Entered(Direction),
    /// A SELL against an open position closed it
    Closed,
    /// The forecast repeats the recommendation already acted on
    Maintained(Direction),
    /// Regime is transitional or chaotic; predictor not consulted
    Suspended(Regime),
    /// Not enough history to determine a regime
    InsufficientHistory,
    /// Stable regime but the predictor had no usable signal
    NoSignal,
}

impl RoundOutcome {
    pub fn is_action(&self) -> bool {
        matches!(self, RoundOutcome::Entered(_) | RoundOutcome::Closed)
    }
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundOutcome::Entered(d) => write!(f, "new recommendation: {}", Decision::from(*d)),
            RoundOutcome::Closed => write!(f, "reversal: close position"),
            RoundOutcome::Maintained(d) => {
                write!(f, "recommendation maintained: {} (position already open)", Decision::from(*d))
            }
            RoundOutcome::Suspended(regime) => write!(f, "regime {} - prediction suspended", regime),
            RoundOutcome::InsufficientHistory => write!(f, "insufficient history - regime undefined"),
            RoundOutcome::NoSignal => write!(f, "no usable prediction"),
        }
    }
}

/// Result of advancing one instrument by one round
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub record: InstrumentRecord,
    /// Decision emitted this round, if any
    pub emitted: Option<Decision>,
    pub position_changed: bool,
    pub regime: Regime,
    /// Raw predictor output, when it was consulted
    pub prediction: Option<Prediction>,
    pub outcome: RoundOutcome,
}

struct Resolution {
    emitted: Option<Decision>,
    position: PositionStatus,
    outcome: RoundOutcome,
}

/// Apply the reversal/persistence rule to a directional forecast
fn resolve(direction: Direction, position: PositionStatus, last: Option<Decision>) -> Resolution {
    let decision = Decision::from(direction);

    if position.is_open() && last == Some(decision) {
        return Resolution {
            emitted: None,
            position,
            outcome: RoundOutcome::Maintained(direction),
        };
    }

    match (position, direction) {
        (PositionStatus::Open, Direction::Sell) => Resolution {
            emitted: Some(Decision::Close),
            position: PositionStatus::Closed,
            outcome: RoundOutcome::Closed,
        },
        // Re-entry against an open position keeps it open
        (PositionStatus::Open, Direction::Buy) | (PositionStatus::Closed, _) => Resolution {
            emitted: Some(decision),
            position: PositionStatus::Open,
            outcome: RoundOutcome::Entered(direction),
        },
    }
}

/// Round a price to cent precision
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Stateless engine over a regime classifier and a direction predictor
#[derive(Debug, Clone)]
pub struct DecisionEngine<C, P> {
    classifier: C,
    predictor: P,
}

impl<C: RegimeClassifier, P: DirectionPredictor> DecisionEngine<C, P> {
    pub fn new(classifier: C, predictor: P) -> Self {
        Self { classifier, predictor }
    }

    /// Run one round. A missing `prior` is treated as a closed position with
    /// no decision ever emitted.
    pub fn advance(
        &self,
        instrument: &str,
        series: &PriceSeries,
        prior: Option<&InstrumentRecord>,
        as_of: NaiveDate,
    ) -> Advance {
        let prior_position = prior.map(|r| r.position).unwrap_or_default();
        let prior_decision = prior.and_then(|r| r.last_decision);

        let regime = self.classifier.classify_regime(series);

        let (prediction, resolution) = match regime {
            Regime::Stable => {
                let prediction = self.predictor.forecast(series);
                let resolution = match prediction.decision {
                    Decision::Buy => resolve(Direction::Buy, prior_position, prior_decision),
                    Decision::Sell => resolve(Direction::Sell, prior_position, prior_decision),
                    Decision::Close | Decision::Hold | Decision::Undefined => Resolution {
                        emitted: None,
                        position: prior_position,
                        outcome: RoundOutcome::NoSignal,
                    },
                };
                (Some(prediction), resolution)
            }
            Regime::Transitional | Regime::Chaotic => (
                None,
                Resolution {
                    emitted: None,
                    position: prior_position,
                    outcome: RoundOutcome::Suspended(regime),
                },
            ),
            Regime::Undefined => (
                None,
                Resolution {
                    emitted: None,
                    position: prior_position,
                    outcome: RoundOutcome::InsufficientHistory,
                },
            ),
        };

        // Callers reject series without a usable close; fall back to the stored price
        let last_price = series
            .last_close()
            .map(round_price)
            .or_else(|| prior.map(|r| r.last_price))
            .unwrap_or_default();

        let record = InstrumentRecord {
            last_date: as_of,
            last_regime: regime,
            last_decision: resolution.emitted.or(prior_decision),
            last_price,
            position: resolution.position,
        };

        match resolution.emitted {
            Some(decision) => tracing::info!(
                "{}: {} ({} -> {})",
                instrument,
                decision,
                prior_position,
                resolution.position
            ),
            None => tracing::debug!("{}: {}", instrument, resolution.outcome),
        }

        Advance {
            record,
            emitted: resolution.emitted,
            position_changed: resolution.position != prior_position,
            regime,
            prediction,
            outcome: resolution.outcome,
        }
    }
}
