//! `boc calc` subcommand: evaluate one formula over inputs given on the command line.

use anyhow::{bail, Context, Result};
use boc_core::uncertainty::{evaluate_formula, parse_uncertainty_literal, split_target};
use boc_core::UncertaintyValue;
use std::collections::HashMap;

pub fn run(formula: &str, inputs: &[String], json: bool) -> Result<()> {
    let inputs = inputs
        .iter()
        .map(|raw| parse_input(raw))
        .collect::<Result<HashMap<_, _>>>()?;

    let value = evaluate_formula(formula, &inputs)
        .with_context(|| format!("failed to evaluate '{}'", formula))?;
    let target = split_target(formula).0;

    if json {
        let report = serde_json::json!({
            "target": target,
            "value": value,
            "relative": value.relative(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match target {
            Some(target) => println!("{} = {}", target, value),
            None => println!("{}", value),
        }
    }
    Ok(())
}

/// `NAME=V±U`, `NAME=V+/-U` or `NAME=V`
pub(crate) fn parse_input(raw: &str) -> Result<(String, UncertaintyValue)> {
    let Some((name, literal)) = raw.split_once('=') else {
        bail!("input '{}' must look like NAME=V±U", raw);
    };

    let name = name.trim();
    if name.is_empty() {
        bail!("input '{}' has no name", raw);
    }

    let value = parse_uncertainty_literal(&literal.replace("+/-", "±"))
        .with_context(|| format!("invalid value for input '{}'", name))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_forms() {
        let (name, value) = parse_input("load=12.5 ± 0.5").unwrap();
        assert_eq!(name, "load");
        assert_eq!(value.value(), 12.5);
        assert_eq!(value.uncertainty(), 0.5);

        let (_, value) = parse_input("load = 3+/-0.2").unwrap();
        assert_eq!(value.uncertainty(), 0.2);

        let (_, value) = parse_input("scale=2").unwrap();
        assert_eq!(value.uncertainty(), 0.0);
    }

    #[test]
    fn test_parse_input_rejects_malformed() {
        assert!(parse_input("12.5").is_err());
        assert!(parse_input("=1").is_err());
        assert!(parse_input("x=abc").is_err());
        assert!(parse_input("x=1 ± -0.5").is_err());
    }

    #[test]
    fn test_run_unknown_operand_fails() {
        let inputs = vec!["a=1 ± 0.1".to_string()];
        assert!(run("a + missing", &inputs, false).is_err());
        assert!(run("total = a * a", &inputs, true).is_ok());
    }
}
