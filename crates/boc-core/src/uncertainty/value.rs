use crate::error::{BocError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the `uncertainty` magnitude of an [`UncertaintyValue`] is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyKind {
    /// `± u` in the value's own units.
    Absolute,
    /// Fraction of `|value|`.
    Relative,
    /// One standard deviation.
    StandardDeviation,
    /// Half-width of a confidence interval.
    ConfidenceInterval,
}

impl fmt::Display for UncertaintyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UncertaintyKind::Absolute => "absolute",
            UncertaintyKind::Relative => "relative",
            UncertaintyKind::StandardDeviation => "std",
            UncertaintyKind::ConfidenceInterval => "ci",
        };
        f.write_str(name)
    }
}

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// A measured quantity with an attached error term.
///
/// The uncertainty is never negative; construction rejects negative and NaN
/// magnitudes so every value in circulation satisfies that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyValue {
    value: f64,
    uncertainty: f64,
    kind: UncertaintyKind,
    confidence_level: f64,
}

impl UncertaintyValue {
    pub fn new(value: f64, uncertainty: f64, kind: UncertaintyKind) -> Result<Self> {
        if uncertainty.is_nan() || uncertainty < 0.0 {
            return Err(BocError::value(format!(
                "Uncertainty cannot be negative (got {})",
                uncertainty
            )));
        }
        if value.is_nan() {
            return Err(BocError::value("Value cannot be NaN"));
        }

        Ok(Self {
            value,
            uncertainty,
            kind,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        })
    }

    pub fn absolute_value(value: f64, uncertainty: f64) -> Result<Self> {
        Self::new(value, uncertainty, UncertaintyKind::Absolute)
    }

    /// An exact quantity.
    pub fn exact(value: f64) -> Self {
        Self {
            value,
            uncertainty: 0.0,
            kind: UncertaintyKind::Absolute,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }

    pub fn with_confidence_level(mut self, level: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&level) || level == 0.0 {
            return Err(BocError::value(format!(
                "Confidence level must be in (0, 1], got {}",
                level
            )));
        }
        self.confidence_level = level;
        Ok(self)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn uncertainty(&self) -> f64 {
        self.uncertainty
    }

    pub fn kind(&self) -> UncertaintyKind {
        self.kind
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Uncertainty in the value's own units. Standard deviations are widened to ~95% (2σ).
    pub fn absolute(&self) -> f64 {
        match self.kind {
            UncertaintyKind::Absolute | UncertaintyKind::ConfidenceInterval => self.uncertainty,
            UncertaintyKind::Relative => self.value.abs() * self.uncertainty,
            UncertaintyKind::StandardDeviation => 2.0 * self.uncertainty,
        }
    }

    /// Uncertainty as a fraction of `|value|`; infinite for a zero value with non-zero error.
    pub fn relative(&self) -> f64 {
        let absolute = self.absolute();
        if self.value == 0.0 {
            if absolute > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            absolute / self.value.abs()
        }
    }

    pub fn std_dev(&self) -> f64 {
        match self.kind {
            UncertaintyKind::StandardDeviation => self.uncertainty,
            UncertaintyKind::ConfidenceInterval => self.uncertainty / 2.0,
            UncertaintyKind::Absolute | UncertaintyKind::Relative => self.absolute() / 2.0,
        }
    }
}

impl fmt::Display for UncertaintyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {}", self.value, self.absolute())
    }
}
