//! `boc run` subcommand: interpret a program and report the resulting state.

use super::read_source;
use anyhow::{Context, Result};
use boc_core::{BocConfig, Interpreter, StatementOutcome, UncertaintyValue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
pub(crate) struct RunReport {
    pub outcomes: Vec<StatementOutcome>,
    pub beliefs: BTreeMap<String, BeliefReport>,
    pub bindings: BTreeMap<String, UncertaintyValue>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BeliefReport {
    pub confidence: f64,
    pub curve: String,
    pub rate: f64,
    pub evidence: usize,
}

pub fn run(path: &Path, config: BocConfig, json: bool) -> Result<()> {
    let source = read_source(path)?;
    let report = execute(&source, config)
        .with_context(|| format!("failed to run {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

pub(crate) fn execute(source: &str, config: BocConfig) -> Result<RunReport> {
    let mut interpreter = Interpreter::new(config);
    let outcomes = interpreter.run_source(source)?;

    let beliefs = interpreter
        .store()
        .snapshot()
        .into_iter()
        .map(|(name, belief)| {
            let report = BeliefReport {
                confidence: belief.current_confidence,
                curve: belief.decay.curve.to_string(),
                rate: belief.decay.rate,
                evidence: belief.evidence_history.len(),
            };
            (name, report)
        })
        .collect();

    let bindings = interpreter
        .bindings()
        .iter()
        .map(|(name, value)| (name.clone(), *value))
        .collect();

    Ok(RunReport {
        outcomes,
        beliefs,
        bindings,
    })
}

fn render(report: &RunReport) -> String {
    let mut out = format!("Executed {} statement(s)\n", report.outcomes.len());

    if !report.beliefs.is_empty() {
        out.push_str("\nBeliefs:\n");
        for (name, belief) in &report.beliefs {
            out.push_str(&format!(
                "  {}: {:.4} ({} decay, rate {}, {} evidence)\n",
                name, belief.confidence, belief.curve, belief.rate, belief.evidence
            ));
        }
    }

    if !report.bindings.is_empty() {
        out.push_str("\nBindings:\n");
        for (name, value) in &report.bindings {
            out.push_str(&format!("  {} = {}\n", name, value));
        }
    }

    out
}
