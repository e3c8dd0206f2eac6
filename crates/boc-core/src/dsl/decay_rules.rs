//! Free-text decay and period descriptions.
//!
//! `"exponential decay at 0.2"` and `"2 days"` are matched against ordered
//! rule tables by case-insensitive substring search. The first rule that
//! matches wins, so table order decides inputs that mention several keywords
//! (`"linear then exponential"` is exponential).

use crate::belief::{DecayCurve, DEFAULT_DECAY_PERIOD, DEFAULT_DECAY_RATE};
use crate::error::{BocError, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

pub const CURVE_RULES: &[(&str, DecayCurve)] = &[
    ("exponential", DecayCurve::Exponential),
    ("linear", DecayCurve::Linear),
    ("logarithmic", DecayCurve::Logarithmic),
    ("step", DecayCurve::Step),
];

/// Unit keyword and its length in seconds.
pub const PERIOD_RULES: &[(&str, u64)] = &[("day", 86_400), ("hour", 3_600), ("minute", 60)];

const DEFAULT_PERIOD_COUNT: f64 = 1.0;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+\.?\d*)").expect("valid number pattern"))
}

/// First unsigned number embedded in `text`.
pub fn first_number(text: &str) -> Option<f64> {
    number_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Curve and rate named by a decay description.
///
/// Unmatched or missing text means exponential decay at the default rate.
pub fn mine_decay_spec(text: Option<&str>) -> (DecayCurve, f64) {
    let Some(text) = text else {
        return (DecayCurve::Exponential, DEFAULT_DECAY_RATE);
    };
    let lowered = text.to_lowercase();

    CURVE_RULES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, curve)| (curve.clone(), first_number(text).unwrap_or(DEFAULT_DECAY_RATE)))
        .unwrap_or((DecayCurve::Exponential, DEFAULT_DECAY_RATE))
}

/// Period named by a description such as `"2 days"` or `"every 30 minutes"`.
///
/// Unmatched or missing text means one hour. A count too large for a
/// [`Duration`] is a value error.
pub fn mine_period(text: Option<&str>) -> Result<Duration> {
    let Some(text) = text else {
        return Ok(DEFAULT_DECAY_PERIOD);
    };
    let lowered = text.to_lowercase();

    let Some((_, seconds)) = PERIOD_RULES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
    else {
        return Ok(DEFAULT_DECAY_PERIOD);
    };

    let count = first_number(text).unwrap_or(DEFAULT_PERIOD_COUNT);
    Duration::try_from_secs_f64(count * *seconds as f64)
        .map_err(|_| BocError::value(format!("Decay period '{}' is out of range", text)))
}
