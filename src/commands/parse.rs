//! `boc parse` subcommand: syntax check plus a one-line summary per statement.

use super::read_source;
use anyhow::{Context, Result};
use boc_core::dsl::{Expression, Program, Statement};
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let program =
        boc_core::parse(&source).with_context(|| format!("failed to parse {}", path.display()))?;

    print!("{}", summarize(&program, &path.display().to_string()));
    Ok(())
}

pub(crate) fn summarize(program: &Program, label: &str) -> String {
    let mut out = format!("{}: {} statement(s)\n", label, program.statements.len());

    for (i, statement) in program.statements.iter().enumerate() {
        let start = &statement.span().start;
        out.push_str(&format!(
            "  [{}] {} at {}:{}",
            i + 1,
            statement.kind_name(),
            start.line,
            start.column
        ));
        if let Some(detail) = detail(statement) {
            out.push_str(&format!(" ({})", detail));
        }
        out.push('\n');
    }

    out
}

fn detail(statement: &Statement) -> Option<String> {
    match statement {
        Statement::Belief(belief) => belief
            .block
            .get("fact")
            .and_then(Expression::as_text)
            .map(|fact| format!("fact: {}", fact)),
        Statement::Intent(intent) => intent.action.as_ref().map(|a| format!("to_perform: {}", a)),
        Statement::CalculateWithUncertainty(calc) => calc
            .analysis
            .as_ref()
            .map(|a| format!("formula: {}", a.formula)),
        Statement::UpdateBelief(update) => Some(format!(
            "{} -> {}",
            update.belief_name, update.new_confidence
        )),
        Statement::ConfidenceDecay(decay) => Some(format!(
            "{}: {} {}",
            decay.belief_name, decay.curve, decay.rate
        )),
        Statement::AgentCoordination(coordination) => {
            Some(format!("{} participant(s)", coordination.participants.len()))
        }
        Statement::Assignment(assignment) => {
            Some(format!("{} = {}", assignment.key, assignment.value))
        }
        _ => None,
    }
}
