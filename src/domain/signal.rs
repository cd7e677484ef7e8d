use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{deserialize_label, LabelError};

/// Recommendation produced for an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "CLOSE")]
    Close,
    #[serde(rename = "HOLD")]
    Hold,
    /// The predictor could not produce a usable signal
    #[serde(rename = "UNDEFINED")]
    Undefined,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Close => "CLOSE",
            Decision::Hold => "HOLD",
            Decision::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "COMPRAR" => Ok(Decision::Buy),
            "SELL" | "VENDER" => Ok(Decision::Sell),
            "CLOSE" | "FECHAR" => Ok(Decision::Close),
            "HOLD" | "MANTER" => Ok(Decision::Hold),
            "UNDEFINED" | "INDEFINIDO" => Ok(Decision::Undefined),
            _ => Err(LabelError::Decision(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

/// Next-period direction forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Class 1 (next return positive) maps to Buy
    pub fn from_class(up: bool) -> Self {
        if up {
            Direction::Buy
        } else {
            Direction::Sell
        }
    }
}

impl From<Direction> for Decision {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Buy => Decision::Buy,
            Direction::Sell => Decision::Sell,
        }
    }
}

/// Serde adapter for a sticky decision that may never have been set.
/// `None` is stored as the `"N/A"` sentinel.
pub mod sticky_decision {
    use super::Decision;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const NOT_AVAILABLE: &str = "N/A";

    pub fn serialize<S: Serializer>(value: &Option<Decision>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(decision) => serializer.serialize_str(decision.as_str()),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decision>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") | Some(NOT_AVAILABLE) => Ok(None),
            Some(label) => label
                .parse::<Decision>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
