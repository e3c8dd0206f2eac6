//! Text front-end of the uncertainty engine: `"V ± U"` literals and
//! single-operator formulas.

use super::propagator::{Exponent, UncertaintyPropagator};
use super::value::UncertaintyValue;
use crate::error::{BocError, Result};
use std::collections::HashMap;

/// Binary operators understood by [`evaluate_formula`], in the order they are searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

const OPERATOR_TABLE: &[(char, FormulaOperator)] = &[
    ('+', FormulaOperator::Add),
    ('-', FormulaOperator::Subtract),
    ('*', FormulaOperator::Multiply),
    ('/', FormulaOperator::Divide),
    ('^', FormulaOperator::Power),
];

/// Parse `"22.5 ± 0.1"` (absolute) or a plain number (exact).
pub fn parse_uncertainty_literal(text: &str) -> Result<UncertaintyValue> {
    let text = text.trim();

    if let Some((value, uncertainty)) = text.split_once('±') {
        let value = parse_number(value, text)?;
        let uncertainty = parse_number(uncertainty, text)?;
        return UncertaintyValue::absolute_value(value, uncertainty);
    }

    Ok(UncertaintyValue::exact(parse_number(text, text)?))
}

fn parse_number(part: &str, whole: &str) -> Result<f64> {
    part.trim().parse::<f64>().map_err(|_| {
        BocError::value(format!("Cannot parse uncertainty expression: {}", whole))
    })
}

/// Split an optional `target =` prefix off a formula.
pub fn split_target(formula: &str) -> (Option<&str>, &str) {
    match formula.split_once('=') {
        Some((target, expression)) if !target.trim().is_empty() => {
            (Some(target.trim()), expression.trim())
        }
        _ => (None, formula.trim()),
    }
}

/// Evaluate `a <op> b` against named inputs.
///
/// Only one operator is supported: the first operator of the table present in
/// the expression splits it at its first occurrence, so `a + b + c` fails on
/// the unknown operand `b + c`. There is no precedence and no grouping.
pub fn evaluate_formula(
    formula: &str,
    inputs: &HashMap<String, UncertaintyValue>,
) -> Result<UncertaintyValue> {
    let (_, expression) = split_target(formula);

    let split = OPERATOR_TABLE
        .iter()
        .find_map(|(symbol, operator)| {
            expression
                .split_once(*symbol)
                .map(|(left, right)| (*operator, left.trim(), right.trim()))
        });

    let Some((operator, left, right)) = split else {
        return lookup(expression, inputs, formula).copied();
    };

    let left = lookup(left, inputs, formula)?;
    match operator {
        FormulaOperator::Add => UncertaintyPropagator::add(left, lookup(right, inputs, formula)?),
        FormulaOperator::Subtract => {
            UncertaintyPropagator::subtract(left, lookup(right, inputs, formula)?)
        }
        FormulaOperator::Multiply => {
            UncertaintyPropagator::multiply(left, lookup(right, inputs, formula)?)
        }
        FormulaOperator::Divide => {
            UncertaintyPropagator::divide(left, lookup(right, inputs, formula)?)
        }
        FormulaOperator::Power => {
            let exponent = match right.parse::<f64>() {
                Ok(n) => Exponent::Exact(n),
                Err(_) => Exponent::Uncertain(*lookup(right, inputs, formula)?),
            };
            UncertaintyPropagator::power(left, exponent)
        }
    }
}

fn lookup<'a>(
    name: &str,
    inputs: &'a HashMap<String, UncertaintyValue>,
    formula: &str,
) -> Result<&'a UncertaintyValue> {
    inputs.get(name).ok_or_else(|| {
        BocError::Formula(format!(
            "Cannot evaluate formula '{}': unknown operand '{}'",
            formula, name
        ))
    })
}
