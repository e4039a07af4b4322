//! Ionic species identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// An element in a given ionisation state (1 = neutral)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Species {
    pub element: String,
    pub ion: u8,
}

impl Species {
    pub fn new(element: impl Into<String>, ion: u8) -> Self {
        Self {
            element: element.into(),
            ion,
        }
    }

    /// Neutral hydrogen
    pub fn hydrogen() -> Self {
        Self::new("H", 1)
    }

    /// Singly ionised silicon, the usual low-ion tracer
    pub fn silicon_ii() -> Self {
        Self::new("Si", 2)
    }

    /// Compact label used in column names, e.g. `Si2`
    pub fn label(&self) -> String {
        format!("{}{}", self.element, self.ion)
    }
}

impl Default for Species {
    fn default() -> Self {
        Self::silicon_ii()
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.element, self.ion)
    }
}

impl FromStr for Species {
    type Err = AnalysisError;

    /// Parse a label such as `Si2` or `H1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| AnalysisError::Config(format!("species '{}' has no ion number", s)))?;
        let (element, ion) = s.split_at(split);
        if element.is_empty() || !element.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AnalysisError::Config(format!(
                "species '{}' has an invalid element",
                s
            )));
        }
        let ion = ion
            .parse::<u8>()
            .ok()
            .filter(|&i| i > 0)
            .ok_or_else(|| AnalysisError::Config(format!("species '{}' has an invalid ion", s)))?;
        Ok(Self::new(element, ion))
    }
}
