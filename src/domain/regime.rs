use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{deserialize_label, LabelError};

/// Volatility regime of an instrument.
///
/// `Undefined` is a normal outcome meaning "not enough information", distinct
/// from a failed computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Regime {
    #[serde(rename = "Estável")]
    Stable,
    #[serde(rename = "Transição")]
    Transitional,
    #[serde(rename = "Caótico")]
    Chaotic,
    #[serde(rename = "Indefinido")]
    Undefined,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Stable => "Estável",
            Regime::Transitional => "Transição",
            Regime::Chaotic => "Caótico",
            Regime::Undefined => "Indefinido",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "estável" | "estavel" | "stable" => Ok(Regime::Stable),
            "transição" | "transicao" | "transitional" => Ok(Regime::Transitional),
            "caótico" | "caotico" | "chaotic" => Ok(Regime::Chaotic),
            "indefinido" | "undefined" | "dados insuficientes" => Ok(Regime::Undefined),
            _ => Err(LabelError::Regime(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Regime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}
