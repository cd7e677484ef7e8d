//! Analysis Service
//!
//! Drives one full round per instrument: fetch the price history, load the
//! tactical memory, advance the decision engine and persist the whole memory.
//! An instrument without usable data is reported and leaves the store untouched.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::engine::{DecisionEngine, RoundOutcome};
use crate::domain::signal::sticky_decision;
use crate::domain::{Decision, PersistError, PositionStatus, Regime};
use crate::ports::{DirectionPredictor, MarketDataError, PriceSource, RegimeClassifier, StateStore};

/// Volume lookback for the liquidity diagnostic
const VOLUME_LOOKBACK: usize = 30;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No usable price data for {instrument}: {source}")]
    DataUnavailable {
        instrument: String,
        #[source]
        source: MarketDataError,
    },

    #[error("Failed to persist tactical memory: {0}")]
    Persistence(#[from] PersistError),
}

/// Outcome of analyzing one instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub instrument: String,
    pub date: NaiveDate,
    pub price: f64,
    pub regime: Regime,
    /// Decision emitted this round
    pub emitted: Option<Decision>,
    /// Decision stored after this round (sticky)
    #[serde(serialize_with = "sticky_decision::serialize")]
    pub last_decision: Option<Decision>,
    pub position: PositionStatus,
    pub position_changed: bool,
    #[serde(serialize_with = "serialize_display")]
    pub outcome: RoundOutcome,
    /// In-sample accuracy of the model behind a directional forecast
    pub predictability: Option<f64>,
    /// Mean traded volume over the recent lookback
    pub average_volume: Option<f64>,
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Per-instrument analysis over a price source and a state store
pub struct AnalysisService<S, M, C, P> {
    source: S,
    store: M,
    engine: DecisionEngine<C, P>,
}

impl<S, M, C, P> AnalysisService<S, M, C, P>
where
    S: PriceSource,
    M: StateStore,
    C: RegimeClassifier,
    P: DirectionPredictor,
{
    pub fn new(source: S, store: M, engine: DecisionEngine<C, P>) -> Self {
        Self { source, store, engine }
    }

    /// Analyze one instrument and persist its updated record
    pub fn analyze(&self, instrument: &str, as_of: NaiveDate) -> Result<AnalysisReport, AnalysisError> {
        let series = self
            .source
            .fetch_series(instrument)
            .map_err(|source| AnalysisError::DataUnavailable {
                instrument: instrument.to_string(),
                source,
            })?;

        if series.last_close().is_none() {
            return Err(AnalysisError::DataUnavailable {
                instrument: instrument.to_string(),
                source: MarketDataError::Empty(instrument.to_string()),
            });
        }

        let mut memory = self.store.load();
        let advance = self.engine.advance(instrument, &series, memory.get(instrument), as_of);

        let predictability = advance.prediction.and_then(|p| p.accuracy);

        let record = advance.record;
        let report = AnalysisReport {
            instrument: instrument.to_string(),
            date: record.last_date,
            price: record.last_price,
            regime: advance.regime,
            emitted: advance.emitted,
            last_decision: record.last_decision,
            position: record.position,
            position_changed: advance.position_changed,
            outcome: advance.outcome,
            predictability,
            average_volume: series.average_volume(VOLUME_LOOKBACK),
        };

        memory.upsert(instrument, record);
        self.store.save(&memory)?;

        Ok(report)
    }

    /// Analyze instruments in order; one failure does not stop the rest
    pub fn analyze_many<I>(&self, instruments: I, as_of: NaiveDate) -> Vec<(String, Result<AnalysisReport, AnalysisError>)>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        instruments
            .into_iter()
            .map(|instrument| {
                let instrument = instrument.as_ref();
                let result = self.analyze(instrument, as_of);
                if let Err(e) = &result {
                    tracing::warn!("Analysis failed for {}: {}", instrument, e);
                }
                (instrument.to_string(), result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InstrumentRecord, PricePoint, PriceSeries, TacticalMemory};
    use crate::ports::mocks::{InMemoryStateStore, MockPriceSource};
    use crate::ports::Prediction;
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::strategy::{ForestConfig, ForestDirectionPredictor, PredictorConfig, VolatilityRegimeClassifier};

    type Service = AnalysisService<MockPriceSource, InMemoryStateStore, VolatilityRegimeClassifier, ForestDirectionPredictor>;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    /// Low closes are followed by rises, so a low final close forecasts BUY
    fn alternating(n: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 100.5 }).collect();
        PriceSeries::from_closes(day(1), &closes).unwrap()
    }

    fn service(source: MockPriceSource, store: InMemoryStateStore) -> Service {
        let predictor = ForestDirectionPredictor::new(PredictorConfig {
            forest: ForestConfig::default().with_trees(20),
            ..PredictorConfig::default()
        });
        let engine = DecisionEngine::new(VolatilityRegimeClassifier::default(), predictor);
        AnalysisService::new(source, store, engine)
    }

    #[test]
    fn test_analyze_emits_and_persists() {
        let source = MockPriceSource::new().with_series("WEGE3.SA", alternating(23));
        let store = InMemoryStateStore::new();
        let svc = service(source, store.clone());

        let report = svc.analyze("WEGE3.SA", day(28)).unwrap();
        assert_eq!(report.regime, Regime::Stable);
        assert_eq!(report.emitted, Some(Decision::Buy));
        assert_eq!(report.position, PositionStatus::Open);
        assert!(report.position_changed);
        assert_eq!(report.price, 100.0);
        assert_eq!(report.predictability, Some(1.0));
        assert_eq!(report.average_volume, None);

        let stored = store.snapshot();
        let record = stored.get("WEGE3.SA").unwrap();
        assert_eq!(record.last_decision, Some(Decision::Buy));
        assert_eq!(record.last_date, day(28));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_second_run_maintains() {
        let source = MockPriceSource::new().with_series("X", alternating(23));
        let store = InMemoryStateStore::new();
        let svc = service(source, store.clone());

        svc.analyze("X", day(28)).unwrap();
        let second = svc.analyze("X", day(29)).unwrap();
        assert_eq!(second.emitted, None);
        assert_eq!(second.outcome, RoundOutcome::Maintained(crate::domain::Direction::Buy));
        assert_eq!(store.snapshot().get("X").unwrap().last_date, day(29));
        assert_eq!(store.save_count(), 2);
    }

    #[test]
    fn test_missing_data_writes_nothing() {
        let store = InMemoryStateStore::new();
        let svc = service(MockPriceSource::new(), store.clone());

        let err = svc.analyze("NOPE", day(28)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::DataUnavailable { source: MarketDataError::NotFound(_), .. }
        ));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_series_without_closes_is_unavailable() {
        let points = (1..=3).map(|d| PricePoint::new(day(d), f64::NAN)).collect();
        let source = MockPriceSource::new().with_series("GAP", PriceSeries::new(points).unwrap());
        let store = InMemoryStateStore::new();
        let svc = service(source, store.clone());

        let err = svc.analyze("GAP", day(28)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::DataUnavailable { source: MarketDataError::Empty(_), .. }
        ));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_save_failure_propagates() {
        let source = MockPriceSource::new().with_series("X", alternating(23));
        let svc = service(source, InMemoryStateStore::new().failing());

        let err = svc.analyze("X", day(28)).unwrap_err();
        assert!(matches!(err, AnalysisError::Persistence(_)));
    }

    #[test]
    fn test_short_history_is_reported_not_raised() {
        let source = MockPriceSource::new().with_series("NEW", alternating(9));
        let mut memory = TacticalMemory::new();
        memory.upsert(
            "NEW",
            InstrumentRecord {
                last_date: day(1),
                last_regime: Regime::Stable,
                last_decision: Some(Decision::Sell),
                last_price: 99.0,
                position: PositionStatus::Open,
            },
        );
        let store = InMemoryStateStore::new().with_memory(memory);
        let svc = service(source, store.clone());

        let report = svc.analyze("NEW", day(28)).unwrap();
        assert_eq!(report.regime, Regime::Undefined);
        assert_eq!(report.outcome, RoundOutcome::InsufficientHistory);
        assert_eq!(report.last_decision, Some(Decision::Sell));
        assert_eq!(report.predictability, None);
        assert_eq!(store.snapshot().get("NEW").unwrap().last_regime, Regime::Undefined);
    }

    #[test]
    fn test_analyze_many_continues_past_failures() {
        let source = MockPriceSource::new()
            .with_series("A", alternating(23))
            .with_series("C", alternating(12));
        let store = InMemoryStateStore::new();
        let svc = service(source.clone(), store.clone());

        let results = svc.analyze_many(["A", "B", "C"], day(28));
        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(source.get_calls(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_report_serializes_labels() {
        let source = MockPriceSource::new().with_series("X", alternating(23));
        let svc = service(source, InMemoryStateStore::new());
        let report = svc.analyze("X", day(28)).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["regime"], "Estável");
        assert_eq!(json["emitted"], "BUY");
        assert_eq!(json["last_decision"], "BUY");
        assert_eq!(json["position"], "Aberta");
        assert_eq!(json["outcome"], "new recommendation: BUY");
        assert_eq!(json["date"], "2024-05-28");
    }

    /// Forest predictor that counts how many times it is asked to fit
    struct CountingPredictor {
        inner: ForestDirectionPredictor,
        fits: Rc<Cell<usize>>,
    }

    impl DirectionPredictor for CountingPredictor {
        fn predict_direction(&self, series: &PriceSeries) -> Decision {
            self.forecast(series).decision
        }

        fn forecast(&self, series: &PriceSeries) -> Prediction {
            self.fits.set(self.fits.get() + 1);
            self.inner.forecast(series)
        }
    }

    #[test]
    fn test_directional_round_fits_once() {
        let fits = Rc::new(Cell::new(0));
        let predictor = CountingPredictor {
            inner: ForestDirectionPredictor::new(PredictorConfig {
                forest: ForestConfig::default().with_trees(20),
                ..PredictorConfig::default()
            }),
            fits: Rc::clone(&fits),
        };
        let svc = AnalysisService::new(
            MockPriceSource::new().with_series("X", alternating(23)),
            InMemoryStateStore::new(),
            DecisionEngine::new(VolatilityRegimeClassifier::default(), predictor),
        );

        let report = svc.analyze("X", day(28)).unwrap();
        assert_eq!(report.emitted, Some(Decision::Buy));
        assert_eq!(report.predictability, Some(1.0));
        assert_eq!(fits.get(), 1);
    }
}
