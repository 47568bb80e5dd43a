use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AndepedError, Result};

/// Residual extraction strategy, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Mode I: decompose the whole buffer on every timestep.
    #[serde(rename = "I")]
    Recomputed,
    /// Mode II: subtract a pattern decomposed once before streaming.
    #[serde(rename = "II")]
    Precomputed,
}

impl FromStr for Mode {
    type Err = AndepedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "I" | "i" | "1" | "recomputed" => Ok(Mode::Recomputed),
            "II" | "ii" | "2" | "precomputed" => Ok(Mode::Precomputed),
            other => Err(AndepedError::InvalidParameter(format!("unknown mode '{other}'"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Recomputed => f.write_str("I"),
            Mode::Precomputed => f.write_str("II"),
        }
    }
}

/// Parameters chosen by offline preparation and consumed by one streaming run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Number of trailing residual values handed to the detector side (`L`).
    pub length_budget: usize,
    /// Decomposition bandwidth constraint.
    pub alpha: f64,
    /// Number of decomposition modes.
    pub mode_count: usize,
    /// Buffer length used in recomputed mode (`l_vmd`).
    pub decomposition_horizon: usize,
    /// Where the precomputed mode pattern came from, if any.
    pub mode_pattern_reference: Option<String>,
    pub input_min: f64,
    pub input_max: f64,
}

impl RunParameters {
    /// Buffer capacity for the given mode.
    pub fn buffer_capacity(&self, mode: Mode) -> Result<usize> {
        let capacity = match mode {
            Mode::Recomputed => self.decomposition_horizon,
            Mode::Precomputed => self.length_budget,
        };
        if capacity == 0 {
            return Err(AndepedError::InvalidParameter(format!(
                "buffer capacity for mode {mode} must be positive"
            )));
        }
        Ok(capacity)
    }

    pub fn validate(&self, mode: Mode) -> Result<()> {
        self.buffer_capacity(mode)?;
        if self.length_budget == 0 {
            return Err(AndepedError::InvalidParameter(
                "length budget L must be positive".into(),
            ));
        }
        if mode == Mode::Recomputed {
            if self.mode_count == 0 {
                return Err(AndepedError::InvalidParameter(
                    "mode count k must be positive".into(),
                ));
            }
            if !self.alpha.is_finite() || self.alpha <= 0.0 {
                return Err(AndepedError::InvalidParameter(format!(
                    "alpha must be positive and finite, got {}",
                    self.alpha
                )));
            }
        }
        if self.input_min > self.input_max {
            return Err(AndepedError::InvalidParameter(format!(
                "input_min {} exceeds input_max {}",
                self.input_min, self.input_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RunParameters {
        RunParameters {
            length_budget: 200,
            alpha: 100.0,
            mode_count: 4,
            decomposition_horizon: 500,
            mode_pattern_reference: None,
            input_min: 0.0,
            input_max: 10.0,
        }
    }

    #[test]
    fn mode_parses_roman_numerals() {
        assert_eq!("I".parse::<Mode>().unwrap(), Mode::Recomputed);
        assert_eq!("II".parse::<Mode>().unwrap(), Mode::Precomputed);
        assert!("III".parse::<Mode>().is_err());
    }

    #[test]
    fn capacity_depends_on_mode() {
        let p = params();
        assert_eq!(p.buffer_capacity(Mode::Recomputed).unwrap(), 500);
        assert_eq!(p.buffer_capacity(Mode::Precomputed).unwrap(), 200);
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut p = params();
        p.decomposition_horizon = 0;
        assert!(p.validate(Mode::Recomputed).is_err());
        assert!(p.validate(Mode::Precomputed).is_ok());
    }

    #[test]
    fn mode_serializes_as_roman_numeral() {
        let json = serde_json::to_string(&Mode::Precomputed).unwrap();
        assert_eq!(json, "\"II\"");
    }
}
