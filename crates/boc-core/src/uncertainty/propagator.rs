//! First-order propagation of uncertainty through arithmetic.
//!
//! Inputs are treated as independent, so error terms combine in quadrature.

use super::value::{UncertaintyKind, UncertaintyValue};
use crate::error::{BocError, Result};
use serde::{Deserialize, Serialize};

/// Exponent of [`UncertaintyPropagator::power`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Exponent {
    Exact(f64),
    Uncertain(UncertaintyValue),
}

impl From<f64> for Exponent {
    fn from(value: f64) -> Self {
        Exponent::Exact(value)
    }
}

impl From<UncertaintyValue> for Exponent {
    fn from(value: UncertaintyValue) -> Self {
        Exponent::Uncertain(value)
    }
}

pub struct UncertaintyPropagator;

impl UncertaintyPropagator {
    /// `a + b`; standard deviations add in quadrature.
    pub fn add(a: &UncertaintyValue, b: &UncertaintyValue) -> Result<UncertaintyValue> {
        UncertaintyValue::new(
            a.value() + b.value(),
            a.std_dev().hypot(b.std_dev()),
            UncertaintyKind::StandardDeviation,
        )
    }

    /// `a - b`; standard deviations add in quadrature.
    pub fn subtract(a: &UncertaintyValue, b: &UncertaintyValue) -> Result<UncertaintyValue> {
        UncertaintyValue::new(
            a.value() - b.value(),
            a.std_dev().hypot(b.std_dev()),
            UncertaintyKind::StandardDeviation,
        )
    }

    /// `a * b`; relative uncertainties add in quadrature.
    pub fn multiply(a: &UncertaintyValue, b: &UncertaintyValue) -> Result<UncertaintyValue> {
        let result = a.value() * b.value();
        // |ab|·√(rel_a² + rel_b²), expanded so zero-valued operands stay finite
        let uncertainty = (b.value() * a.absolute()).hypot(a.value() * b.absolute());
        UncertaintyValue::new(result, uncertainty, UncertaintyKind::Absolute)
    }

    /// `a / b`; relative uncertainties add in quadrature. Fails on a zero divisor.
    pub fn divide(a: &UncertaintyValue, b: &UncertaintyValue) -> Result<UncertaintyValue> {
        if b.value() == 0.0 {
            return Err(BocError::value(
                "Division by zero in uncertain value calculation",
            ));
        }

        let result = a.value() / b.value();
        let uncertainty = (a.absolute() / b.value())
            .hypot(a.value() * b.absolute() / (b.value() * b.value()));
        UncertaintyValue::new(result, uncertainty.abs(), UncertaintyKind::Absolute)
    }

    /// `base ^ exponent`.
    ///
    /// An uncertain exponent goes through `exp(n·ln x)` and therefore needs a
    /// positive base.
    pub fn power(base: &UncertaintyValue, exponent: impl Into<Exponent>) -> Result<UncertaintyValue> {
        match exponent.into() {
            Exponent::Exact(n) => {
                if base.value() < 0.0 && n.fract() != 0.0 {
                    return Err(BocError::value(format!(
                        "Cannot raise negative value {} to fractional power {}",
                        base.value(),
                        n
                    )));
                }

                let result = base.value().powf(n);
                // |n·x^(n-1)|·σx, which is |result|·|n|·rel_x away from zero
                let uncertainty = if base.absolute() == 0.0 || n == 0.0 {
                    0.0
                } else {
                    (n * base.value().abs().powf(n - 1.0)).abs() * base.absolute()
                };
                UncertaintyValue::new(result, uncertainty, UncertaintyKind::Absolute)
            }
            Exponent::Uncertain(exponent) => {
                if base.value() <= 0.0 {
                    return Err(BocError::value(
                        "Cannot take logarithm of non-positive number",
                    ));
                }

                let n = exponent.value();
                let result = base.value().powf(n);
                let ln_x = base.value().abs().ln();
                let relative = (n * base.relative())
                    .hypot(ln_x * exponent.absolute() / base.value());
                UncertaintyValue::new(result, result.abs() * relative, UncertaintyKind::Absolute)
            }
        }
    }

    pub fn sqrt(value: &UncertaintyValue) -> Result<UncertaintyValue> {
        Self::power(value, 0.5)
    }

    /// `e^x`; the absolute error scales with the result.
    pub fn exp(value: &UncertaintyValue) -> Result<UncertaintyValue> {
        let result = value.value().exp();
        UncertaintyValue::new(result, result * value.absolute(), UncertaintyKind::Absolute)
    }

    /// `ln x`; the absolute error of the result is the relative error of `x`.
    pub fn log(value: &UncertaintyValue) -> Result<UncertaintyValue> {
        if value.value() <= 0.0 {
            return Err(BocError::value(
                "Cannot take logarithm of non-positive number",
            ));
        }

        UncertaintyValue::new(value.value().ln(), value.relative(), UncertaintyKind::Absolute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(value: f64, uncertainty: f64) -> UncertaintyValue {
        UncertaintyValue::absolute_value(value, uncertainty).unwrap()
    }

    #[test]
    fn test_add_combines_std_devs() {
        let sum = UncertaintyPropagator::add(&abs(10.0, 0.5), &abs(5.0, 0.2)).unwrap();

        assert_eq!(sum.value(), 15.0);
        assert_eq!(sum.kind(), UncertaintyKind::StandardDeviation);
        let expected = (0.25f64.powi(2) + 0.1f64.powi(2)).sqrt();
        assert!((sum.uncertainty() - expected).abs() < 1e-12);
        assert!((sum.uncertainty() - 0.2693).abs() < 1e-4);
    }

    #[test]
    fn test_subtract() {
        let diff = UncertaintyPropagator::subtract(&abs(10.0, 0.5), &abs(5.0, 0.2)).unwrap();
        assert_eq!(diff.value(), 5.0);
        assert!((diff.std_dev() - 0.2693).abs() < 1e-4);
    }

    #[test]
    fn test_multiply_matches_relative_quadrature() {
        let a = abs(10.0, 0.5);
        let b = abs(5.0, 0.2);
        let product = UncertaintyPropagator::multiply(&a, &b).unwrap();

        let expected = 50.0 * (a.relative().powi(2) + b.relative().powi(2)).sqrt();
        assert_eq!(product.value(), 50.0);
        assert!((product.uncertainty() - expected).abs() < 1e-9);
        assert_eq!(product.kind(), UncertaintyKind::Absolute);
    }

    #[test]
    fn test_multiply_by_uncertain_zero_is_finite() {
        let product = UncertaintyPropagator::multiply(&abs(0.0, 1.0), &abs(5.0, 0.0)).unwrap();
        assert_eq!(product.value(), 0.0);
        assert!((product.uncertainty() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_divide() {
        let a = abs(10.0, 0.5);
        let b = abs(5.0, 0.2);
        let quotient = UncertaintyPropagator::divide(&a, &b).unwrap();

        let expected = 2.0 * (a.relative().powi(2) + b.relative().powi(2)).sqrt();
        assert_eq!(quotient.value(), 2.0);
        assert!((quotient.uncertainty() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_divide_by_zero_fails() {
        let err = UncertaintyPropagator::divide(&abs(1.0, 0.1), &abs(0.0, 0.1)).unwrap_err();
        assert!(matches!(err, BocError::Value(_)));
    }

    #[test]
    fn test_power_exact_exponent() {
        let squared = UncertaintyPropagator::power(&abs(3.0, 0.1), 2.0).unwrap();
        assert_eq!(squared.value(), 9.0);
        // |result| · |n| · rel
        assert!((squared.uncertainty() - 9.0 * 2.0 * (0.1 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_sqrt() {
        let root = UncertaintyPropagator::sqrt(&abs(25.0, 0.5)).unwrap();
        assert_eq!(root.value(), 5.0);
        assert!((root.uncertainty() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_power_uncertain_exponent() {
        let base = abs(2.0, 0.1);
        let exponent = abs(3.0, 0.2);
        let result = UncertaintyPropagator::power(&base, exponent).unwrap();

        let relative = ((3.0 * 0.05f64).powi(2) + (2.0f64.ln() * 0.2 / 2.0).powi(2)).sqrt();
        assert_eq!(result.value(), 8.0);
        assert!((result.uncertainty() - 8.0 * relative).abs() < 1e-9);
    }

    #[test]
    fn test_power_uncertain_exponent_needs_positive_base() {
        assert!(UncertaintyPropagator::power(&abs(0.0, 0.1), abs(2.0, 0.1)).is_err());
        assert!(UncertaintyPropagator::power(&abs(-2.0, 0.1), abs(2.0, 0.1)).is_err());
    }

    #[test]
    fn test_negative_base_fractional_power_fails() {
        assert!(UncertaintyPropagator::sqrt(&abs(-4.0, 0.1)).is_err());
        assert!(UncertaintyPropagator::power(&abs(-2.0, 0.1), 3.0).is_ok());
    }

    #[test]
    fn test_exp_and_log() {
        let e = UncertaintyPropagator::exp(&abs(1.0, 0.1)).unwrap();
        assert!((e.value() - std::f64::consts::E).abs() < 1e-12);
        assert!((e.uncertainty() - std::f64::consts::E * 0.1).abs() < 1e-12);

        let ln = UncertaintyPropagator::log(&abs(10.0, 0.5)).unwrap();
        assert!((ln.value() - 10f64.ln()).abs() < 1e-12);
        assert!((ln.uncertainty() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_log_of_non_positive_fails() {
        assert!(UncertaintyPropagator::log(&abs(-1.0, 0.1)).is_err());
        assert!(UncertaintyPropagator::log(&abs(0.0, 0.1)).is_err());
    }
}
