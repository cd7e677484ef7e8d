//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Price history retrieval
//! - Tactical memory persistence
//! - Regime classification and direction prediction

pub mod market_data;
pub mod state_store;
pub mod strategy;
pub mod mocks;

pub use market_data::{MarketDataError, PriceSource};
pub use state_store::StateStore;
pub use strategy::{DirectionPredictor, Prediction, RegimeClassifier};
