//! Confidence decay curves.

use crate::error::{BocError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DECAY_RATE: f64 = 0.1;
pub const DEFAULT_DECAY_PERIOD: Duration = Duration::from_secs(3600);

/// Caller-supplied decay function: `(confidence, rate, elapsed_periods) -> confidence`.
pub trait DecayStrategy: Send + Sync {
    fn decay(&self, confidence: f64, rate: f64, periods: f64) -> f64;
}

impl<F> DecayStrategy for F
where
    F: Fn(f64, f64, f64) -> f64 + Send + Sync,
{
    fn decay(&self, confidence: f64, rate: f64, periods: f64) -> f64 {
        self(confidence, rate, periods)
    }
}

/// Slot for a [`DecayStrategy`]. Strategies are not serializable; a
/// deserialized custom curve has an empty slot and decays exponentially.
#[derive(Clone, Default)]
pub struct CustomDecay(Option<Arc<dyn DecayStrategy>>);

impl CustomDecay {
    pub fn new(strategy: impl DecayStrategy + 'static) -> Self {
        Self(Some(Arc::new(strategy)))
    }

    pub fn strategy(&self) -> Option<&dyn DecayStrategy> {
        self.0.as_deref()
    }
}

impl fmt::Debug for CustomDecay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("CustomDecay(<strategy>)"),
            None => f.write_str("CustomDecay(None)"),
        }
    }
}

impl PartialEq for CustomDecay {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Serialize for CustomDecay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

impl<'de> Deserialize<'de> for CustomDecay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(CustomDecay(None))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayCurve {
    /// `max(0, C − r·t)`
    Linear,
    /// `C·e^(−r·t)`
    #[default]
    Exponential,
    /// `C / (1 + r·ln(1 + t))`
    Logarithmic,
    /// `C·r^⌊t⌋`
    Step,
    Custom(CustomDecay),
}

impl DecayCurve {
    pub fn custom(strategy: impl DecayStrategy + 'static) -> Self {
        DecayCurve::Custom(CustomDecay::new(strategy))
    }

    /// Project `confidence` forward by `periods` decay periods. Unclamped.
    pub fn apply(&self, confidence: f64, rate: f64, periods: f64) -> f64 {
        match self {
            DecayCurve::Linear => (confidence - rate * periods).max(0.0),
            DecayCurve::Exponential => confidence * (-rate * periods).exp(),
            DecayCurve::Logarithmic => confidence / (1.0 + rate * periods.ln_1p()),
            DecayCurve::Step => confidence * rate.powf(periods.floor()),
            DecayCurve::Custom(custom) => match custom.strategy() {
                Some(strategy) => strategy.decay(confidence, rate, periods),
                None => DecayCurve::Exponential.apply(confidence, rate, periods),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecayCurve::Linear => "linear",
            DecayCurve::Exponential => "exponential",
            DecayCurve::Logarithmic => "logarithmic",
            DecayCurve::Step => "step",
            DecayCurve::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for DecayCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DecayCurve {
    type Err = BocError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(DecayCurve::Linear),
            "exponential" => Ok(DecayCurve::Exponential),
            "logarithmic" => Ok(DecayCurve::Logarithmic),
            "step" => Ok(DecayCurve::Step),
            "custom" => Ok(DecayCurve::Custom(CustomDecay::default())),
            other => Err(BocError::value(format!("Unknown decay curve '{}'", other))),
        }
    }
}

/// Curve, rate and period of a belief's decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecaySettings {
    pub curve: DecayCurve,
    pub rate: f64,
    #[serde(with = "humantime_serde")]
    pub period: Duration,
}

impl DecaySettings {
    /// Fails on a zero period or a negative (or non-finite) rate.
    pub fn new(curve: DecayCurve, rate: f64, period: Duration) -> Result<Self> {
        let settings = Self {
            curve,
            rate,
            period,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            return Err(BocError::value("Decay period must be greater than zero"));
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(BocError::value(format!(
                "Decay rate must be a non-negative number, got {}",
                self.rate
            )));
        }
        Ok(())
    }
}

impl Default for DecaySettings {
    fn default() -> Self {
        Self {
            curve: DecayCurve::Exponential,
            rate: DEFAULT_DECAY_RATE,
            period: DEFAULT_DECAY_PERIOD,
        }
    }
}
