pub mod belief;
pub mod config;
pub mod determinism;
pub mod dsl;
pub mod error;
pub mod uncertainty;

pub use belief::{BeliefState, BeliefStore, DecayCurve, DecaySettings, Evidence, EvidenceKind};
pub use config::{BocConfig, ConfigError};
pub use determinism::Clock;
pub use dsl::{parse, Interpreter, Lexer, Parser, Program, Statement, StatementOutcome};
pub use error::{BocError, Result};
pub use uncertainty::{
    evaluate_formula, parse_uncertainty_literal, UncertaintyKind, UncertaintyPropagator,
    UncertaintyValue,
};
