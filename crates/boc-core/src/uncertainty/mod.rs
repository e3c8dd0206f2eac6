//! Uncertainty engine
//!
//! Values with attached error terms, propagation through arithmetic, and a
//! small text front-end for literals and single-operator formulas.

pub mod parser;
pub mod propagator;
pub mod value;

pub use parser::{evaluate_formula, parse_uncertainty_literal, split_target, FormulaOperator};
pub use propagator::{Exponent, UncertaintyPropagator};
pub use value::{UncertaintyKind, UncertaintyValue};
