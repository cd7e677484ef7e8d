//! Fractalis - Volatility regime gate with tactical signal memory
//!
//! Classifies each instrument's recent volatility regime, forecasts the next
//! move with a random forest only when the regime is stable, and reconciles
//! the forecast with a persisted per-instrument memory so an acted-on signal
//! is not repeated.
//!
//! # Modules
//!
//! - `domain`: Core types (PriceSeries, Regime, Decision, TacticalMemory, JsonStateStore)
//! - `ports`: Trait abstractions (PriceSource, StateStore, RegimeClassifier, DirectionPredictor)
//! - `strategy`: Volatility classifier and random-forest direction predictor
//! - `application`: Decision engine and analysis service
//! - `adapters`: CSV prices, watchlist, export and CLI
//! - `config`: Configuration loading and validation

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod application;
pub mod adapters;
pub mod config;
