//! Interpreter for parsed BOC programs
//!
//! Routes belief statements into a [`BeliefStore`] and uncertain quantities
//! into the uncertainty engine. Statements with no runtime meaning are
//! recorded and otherwise left alone.

use crate::belief::{BeliefStore, DecaySettings};
use crate::config::BocConfig;
use crate::dsl::ast::*;
use crate::dsl::decay_rules::mine_decay_spec;
use crate::dsl::lexer::Lexer;
use crate::dsl::parser::Parser;
use crate::error::{BocError, Result};
use crate::uncertainty::{evaluate_formula, parse_uncertainty_literal, split_target, UncertaintyValue};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Block keys of a `belief` statement that are not copied into metadata
const BELIEF_RESERVED_KEYS: [&str; 2] = ["fact", "certainty_decay"];

/// What executing one statement did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatementOutcome {
    BeliefCreated {
        name: String,
        confidence: f64,
    },
    BeliefUpdated {
        name: String,
        applied: bool,
        confidence: Option<f64>,
    },
    DecayConfigured {
        name: String,
        applied: bool,
    },
    Bound {
        name: String,
        value: UncertaintyValue,
    },
    Calculated {
        target: Option<String>,
        value: UncertaintyValue,
    },
    Recorded {
        kind: &'static str,
    },
}

/// Executes statements against a belief store and a table of uncertain bindings
#[derive(Debug, Default)]
pub struct Interpreter {
    store: BeliefStore,
    bindings: HashMap<String, UncertaintyValue>,
    config: BocConfig,
}

impl Interpreter {
    pub fn new(config: BocConfig) -> Self {
        Self {
            store: BeliefStore::new(),
            bindings: HashMap::new(),
            config,
        }
    }

    /// Use an existing store, e.g. one with a frozen clock
    pub fn with_store(config: BocConfig, store: BeliefStore) -> Self {
        Self {
            store,
            bindings: HashMap::new(),
            config,
        }
    }

    pub fn store(&self) -> &BeliefStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BeliefStore {
        &mut self.store
    }

    pub fn bindings(&self) -> &HashMap<String, UncertaintyValue> {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&UncertaintyValue> {
        self.bindings.get(name)
    }

    pub fn config(&self) -> &BocConfig {
        &self.config
    }

    /// Lex, parse and execute `source`. Syntax errors abort before anything runs.
    pub fn run_source(&mut self, source: &str) -> Result<Vec<StatementOutcome>> {
        let lexer = Lexer::new(source);
        let mut parser = Parser::with_clock(lexer, self.store.clock().clone())?;
        let program = parser.parse_program()?;
        self.execute(&program)
    }

    /// Execute statements in order, stopping at the first failure
    pub fn execute(&mut self, program: &Program) -> Result<Vec<StatementOutcome>> {
        info!(statements = program.statements.len(), "Executing program");

        program
            .statements
            .iter()
            .map(|statement| self.execute_statement(statement))
            .collect()
    }

    pub fn execute_statement(&mut self, statement: &Statement) -> Result<StatementOutcome> {
        let outcome = match statement {
            Statement::Belief(belief) => self.execute_belief(belief)?,
            Statement::UpdateBelief(update) => self.execute_update(update)?,
            Statement::ConfidenceDecay(decay) => self.execute_decay(decay)?,
            Statement::Assignment(assignment) => self.execute_assignment(assignment)?,
            Statement::CalculateWithUncertainty(calc) => self.execute_calculation(calc)?,
            other => StatementOutcome::Recorded {
                kind: other.kind_name(),
            },
        };

        debug!(
            kind = statement.kind_name(),
            line = statement.span().start.line,
            ?outcome,
            "Executed statement"
        );
        Ok(outcome)
    }

    fn execute_belief(&mut self, belief: &BlockStatement) -> Result<StatementOutcome> {
        let block = &belief.block;
        let confidence = block.attribute("confidence").and_then(Expression::as_number);
        let fact = block.get("fact").and_then(Expression::as_string_literal);

        let (Some(confidence), Some(fact)) = (confidence, fact) else {
            return Ok(StatementOutcome::Recorded { kind: "belief" });
        };

        let mut decay = self.config.default_decay();
        if let Some(spec) = block.get("certainty_decay").and_then(Expression::as_string_literal) {
            let (curve, rate) = mine_decay_spec(Some(spec));
            decay.curve = curve;
            decay.rate = rate;
        }

        let metadata: BTreeMap<String, String> = block
            .key_values()
            .filter(|(key, _)| !BELIEF_RESERVED_KEYS.contains(key))
            .filter_map(|(key, value)| {
                value
                    .as_string_literal()
                    .map(|text| (key.to_string(), text.to_string()))
            })
            .collect();

        self.store.create(fact, confidence, decay, metadata)?;
        info!(belief = %fact, confidence, "Belief created");

        Ok(StatementOutcome::BeliefCreated {
            name: fact.to_string(),
            confidence,
        })
    }

    fn execute_update(&mut self, update: &UpdateBeliefStatement) -> Result<StatementOutcome> {
        let confidence = update.new_confidence.as_number().ok_or_else(|| {
            BocError::Evaluation(format!(
                "update_belief {} expects a numeric confidence, found {}",
                update.belief_name, update.new_confidence
            ))
        })?;

        let applied = self
            .store
            .update(&update.belief_name, confidence, Some(update.evidence.clone()))?;

        Ok(StatementOutcome::BeliefUpdated {
            name: update.belief_name.clone(),
            applied,
            confidence: self.store.get_current_confidence(&update.belief_name),
        })
    }

    fn execute_decay(&mut self, decay: &ConfidenceDecayStatement) -> Result<StatementOutcome> {
        let settings = DecaySettings::new(decay.curve.clone(), decay.rate, decay.period)?;
        let applied = self.store.configure_decay(&decay.belief_name, settings)?;

        Ok(StatementOutcome::DecayConfigured {
            name: decay.belief_name.clone(),
            applied,
        })
    }

    fn execute_assignment(&mut self, assignment: &AssignmentStatement) -> Result<StatementOutcome> {
        match uncertain_value(&assignment.value)? {
            Some(value) => {
                self.bindings.insert(assignment.key.clone(), value);
                Ok(StatementOutcome::Bound {
                    name: assignment.key.clone(),
                    value,
                })
            }
            None => Ok(StatementOutcome::Recorded { kind: "assignment" }),
        }
    }

    fn execute_calculation(&mut self, calc: &CalculationStatement) -> Result<StatementOutcome> {
        let Some(formula) = calc.block.get("formula").and_then(Expression::as_string_literal) else {
            return Ok(StatementOutcome::Recorded {
                kind: "calculate_with_uncertainty",
            });
        };

        let mut inputs = self.bindings.clone();
        if let Some(declared) = calc
            .block
            .get("input_uncertainties")
            .and_then(Expression::as_object)
        {
            for property in &declared.properties {
                if let Some(value) = uncertain_value(&property.value)? {
                    inputs.insert(property.key.clone(), value);
                }
            }
        }

        let value = evaluate_formula(formula, &inputs)?;
        let target = split_target(formula).0.map(str::to_string);
        if let Some(target) = &target {
            self.bindings.insert(target.clone(), value);
        }
        info!(formula = %formula, result = %value, "Calculated with uncertainty");

        Ok(StatementOutcome::Calculated { target, value })
    }
}

/// An uncertain quantity with a base value, if `expression` denotes one.
///
/// Bare `±u` literals and strings without a base value are not quantities.
fn uncertain_value(expression: &Expression) -> Result<Option<UncertaintyValue>> {
    match expression {
        Expression::Uncertainty(UncertaintyLiteral {
            value: Some(value),
            uncertainty,
        }) => UncertaintyValue::absolute_value(*value, *uncertainty).map(Some),
        Expression::Literal(Literal::Number(n)) => Ok(Some(UncertaintyValue::exact(*n))),
        Expression::Literal(Literal::String(text))
            if text.contains('±') && !text.trim_start().starts_with('±') =>
        {
            parse_uncertainty_literal(text).map(Some)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::DecayCurve;
    use crate::determinism::Clock;
    use chrono::{Duration, Utc};

    fn interpreter() -> Interpreter {
        let store = BeliefStore::with_clock(Clock::frozen_at(Utc::now()));
        Interpreter::with_store(BocConfig::default(), store)
    }

    #[test]
    fn test_belief_creates_store_record() {
        let mut interp = interpreter();
        let outcomes = interp
            .run_source(
                r#"
                belief confidence=0.85 {
                    fact: "temperature_is_high"
                    certainty_decay: "linear 0.05"
                    location: "server_room"
                    reading: 31
                }
                "#,
            )
            .unwrap();

        assert_eq!(
            outcomes,
            vec![StatementOutcome::BeliefCreated {
                name: "temperature_is_high".to_string(),
                confidence: 0.85
            }]
        );

        let belief = interp.store().get("temperature_is_high").unwrap();
        assert_eq!(belief.decay.curve, DecayCurve::Linear);
        assert_eq!(belief.decay.rate, 0.05);
        assert_eq!(belief.metadata.get("location").map(String::as_str), Some("server_room"));
        assert!(!belief.metadata.contains_key("reading"));
        assert!(!belief.metadata.contains_key("fact"));
    }

    #[test]
    fn test_belief_uses_config_defaults() {
        let mut config = BocConfig::default();
        config.decay.curve = DecayCurve::Step;
        config.decay.rate = 0.5;
        let mut interp = Interpreter::with_store(config, BeliefStore::with_clock(Clock::frozen_at(Utc::now())));

        interp
            .run_source(r#"belief confidence=0.6 { fact: "door_open" }"#)
            .unwrap();

        let belief = interp.store().get("door_open").unwrap();
        assert_eq!(belief.decay.curve, DecayCurve::Step);
        assert_eq!(belief.decay.rate, 0.5);
    }

    #[test]
    fn test_belief_without_fact_is_recorded() {
        let mut interp = interpreter();
        let outcomes = interp.run_source("belief { note: \"hello\" }").unwrap();
        assert_eq!(outcomes, vec![StatementOutcome::Recorded { kind: "belief" }]);
        assert!(interp.store().is_empty());
    }

    #[test]
    fn test_belief_out_of_range_confidence_fails() {
        let mut interp = interpreter();
        let err = interp
            .run_source(r#"belief confidence=1.5 { fact: "impossible" }"#)
            .unwrap_err();
        assert!(matches!(err, BocError::Value(_)));
    }

    #[test]
    fn test_update_and_decay_statements() {
        let mut interp = interpreter();
        interp
            .run_source(
                r#"
                belief confidence=0.4 { fact: "server_is_healthy" }
                confidence_decay server_is_healthy("linear 0.05") period: "1 hour"
                update_belief server_is_healthy(0.8) evidence: "monitoring_system"
                "#,
            )
            .unwrap();

        let belief = interp.store().get("server_is_healthy").unwrap();
        assert_eq!(belief.decay.curve, DecayCurve::Linear);
        // neutral evidence, weight 0.8 → even split of 0.4 and 0.8
        assert!((belief.current_confidence - 0.6).abs() < 1e-9);
        assert_eq!(belief.evidence_history[0].source, "monitoring_system");

        interp.store_mut().clock_mut().advance(Duration::hours(2));
        let decayed = interp.store().get_current_confidence("server_is_healthy").unwrap();
        assert!((decayed - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_update_unknown_belief_is_soft() {
        let mut interp = interpreter();
        let outcomes = interp.run_source("update_belief ghost(0.5)").unwrap();
        assert_eq!(
            outcomes,
            vec![StatementOutcome::BeliefUpdated {
                name: "ghost".to_string(),
                applied: false,
                confidence: None
            }]
        );
    }

    #[test]
    fn test_update_with_non_numeric_confidence_fails() {
        let mut interp = interpreter();
        let err = interp.run_source("update_belief b(high)").unwrap_err();
        assert!(matches!(err, BocError::Evaluation(_)));
    }

    #[test]
    fn test_update_out_of_range_is_not_clamped() {
        let mut interp = interpreter();
        interp.run_source(r#"belief confidence=0.5 { fact: "b" }"#).unwrap();
        let err = interp.run_source("update_belief b(1.2)").unwrap_err();
        assert!(matches!(err, BocError::Value(_)));
        assert_eq!(interp.store().get("b").unwrap().current_confidence, 0.5);
    }

    #[test]
    fn test_zero_period_decay_fails() {
        let mut interp = interpreter();
        interp.run_source(r#"belief confidence=0.5 { fact: "b" }"#).unwrap();
        let err = interp
            .run_source(r#"confidence_decay b("linear") period: "0 hours""#)
            .unwrap_err();
        assert!(matches!(err, BocError::Value(_)));
    }

    #[test]
    fn test_assignments_bind_uncertain_values() {
        let mut interp = interpreter();
        let outcomes = interp
            .run_source(
                r#"
                x = 10 ± 0.5
                y = "5 ± 0.2"
                n = 3
                label = "not a quantity"
                margin = ±0.1
                "#,
            )
            .unwrap();

        assert_eq!(outcomes.len(), 5);
        assert_eq!(interp.binding("x").unwrap().absolute(), 0.5);
        assert_eq!(interp.binding("y").unwrap().value(), 5.0);
        assert_eq!(interp.binding("n").unwrap().uncertainty(), 0.0);
        assert!(interp.binding("label").is_none());
        assert!(interp.binding("margin").is_none());
        assert_eq!(outcomes[3], StatementOutcome::Recorded { kind: "assignment" });
    }

    #[test]
    fn test_calculation_binds_target() {
        let mut interp = interpreter();
        interp
            .run_source(
                r#"
                x = 10 ± 0.5
                calculate_with_uncertainty {
                    formula: "total = x + y"
                    input_uncertainties: { y: 5 ± 0.2, bias: ±0.3 }
                }
                doubled_total = 2
                calculate_with_uncertainty { formula: "scaled = total * doubled_total" }
                "#,
            )
            .unwrap();

        let total = interp.binding("total").unwrap();
        assert_eq!(total.value(), 15.0);
        assert!((total.uncertainty() - 0.2693).abs() < 1e-4);
        assert_eq!(interp.binding("scaled").unwrap().value(), 30.0);
    }

    #[test]
    fn test_calculation_with_unknown_operand_fails() {
        let mut interp = interpreter();
        let err = interp
            .run_source(r#"calculate_with_uncertainty { formula: "a / b" }"#)
            .unwrap_err();
        assert!(matches!(err, BocError::Formula(_)));
    }

    #[test]
    fn test_other_statements_are_recorded() {
        let mut interp = interpreter();
        let outcomes = interp
            .run_source(
                r#"
                intent to_perform: "scale_up" { replicas: 3 }
                provenance { source: "sensor" }
                "#,
            )
            .unwrap();

        assert_eq!(
            outcomes,
            vec![
                StatementOutcome::Recorded { kind: "intent" },
                StatementOutcome::Recorded { kind: "provenance" },
            ]
        );
    }

    #[test]
    fn test_syntax_error_runs_nothing() {
        let mut interp = interpreter();
        let err = interp
            .run_source(r#"belief confidence=0.5 { fact: "b" } shared_state {"#)
            .unwrap_err();
        assert!(err.is_syntax_error());
        assert!(interp.store().is_empty());
    }
}
