use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{deserialize_label, LabelError};

/// Whether the tracked recommendation currently has an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PositionStatus {
    #[serde(rename = "Aberta")]
    Open,
    #[default]
    #[serde(rename = "Fechada")]
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "Aberta",
            PositionStatus::Closed => "Fechada",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PositionStatus::Open)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aberta" | "open" => Ok(PositionStatus::Open),
            "fechada" | "closed" => Ok(PositionStatus::Closed),
            _ => Err(LabelError::Position(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for PositionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}
