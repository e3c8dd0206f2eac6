//! Abstract Syntax Tree definitions for the BOC language

use crate::belief::{DecayCurve, Evidence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Source location information for error reporting and debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Span of source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

/// Root AST node representing a complete program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// Top-level statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Belief(BlockStatement),
    ReasoningContext(BlockStatement),
    Intent(IntentStatement),
    SharedState(BlockStatement),
    SelfCapability(BlockStatement),
    CalculateWithUncertainty(CalculationStatement),
    StructuredKnowledge(BlockStatement),
    UpdateBelief(UpdateBeliefStatement),
    ConfidenceDecay(ConfidenceDecayStatement),
    AgentCoordination(AgentCoordinationStatement),
    Provenance(ProvenanceStatement),
    Assignment(AssignmentStatement),
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Belief(_) => "belief",
            Statement::ReasoningContext(_) => "reasoning_context",
            Statement::Intent(_) => "intent",
            Statement::SharedState(_) => "shared_state",
            Statement::SelfCapability(_) => "self_capability",
            Statement::CalculateWithUncertainty(_) => "calculate_with_uncertainty",
            Statement::StructuredKnowledge(_) => "structured_knowledge",
            Statement::UpdateBelief(_) => "update_belief",
            Statement::ConfidenceDecay(_) => "confidence_decay",
            Statement::AgentCoordination(_) => "agent_coordination",
            Statement::Provenance(_) => "provenance",
            Statement::Assignment(_) => "assignment",
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Statement::Belief(s)
            | Statement::ReasoningContext(s)
            | Statement::SharedState(s)
            | Statement::SelfCapability(s)
            | Statement::StructuredKnowledge(s) => &s.span,
            Statement::Intent(s) => &s.span,
            Statement::CalculateWithUncertainty(s) => &s.span,
            Statement::UpdateBelief(s) => &s.span,
            Statement::ConfidenceDecay(s) => &s.span,
            Statement::AgentCoordination(s) => &s.span,
            Statement::Provenance(s) => &s.span,
            Statement::Assignment(s) => &s.span,
        }
    }

    /// The `{ ... }` body, for statements that have one.
    pub fn block(&self) -> Option<&Block> {
        match self {
            Statement::Belief(s)
            | Statement::ReasoningContext(s)
            | Statement::SharedState(s)
            | Statement::SelfCapability(s)
            | Statement::StructuredKnowledge(s) => Some(&s.block),
            Statement::Intent(s) => Some(&s.block),
            Statement::CalculateWithUncertainty(s) => Some(&s.block),
            Statement::AgentCoordination(s) => Some(&s.block),
            Statement::Provenance(s) => Some(&s.block),
            Statement::UpdateBelief(_) | Statement::ConfidenceDecay(_) | Statement::Assignment(_) => {
                None
            }
        }
    }
}

/// Attribute prefix plus braced body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub attributes: BTreeMap<String, Expression>,
    pub entries: Vec<BlockEntry>,
}

impl Block {
    /// Value of the last `key: value` entry named `key`.
    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.entries.iter().rev().find_map(|entry| match entry {
            BlockEntry::KeyValue { key: k, value } if k == key => Some(value),
            _ => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Expression> {
        self.attributes.get(name)
    }

    pub fn key_values(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.entries.iter().filter_map(|entry| match entry {
            BlockEntry::KeyValue { key, value } => Some((key.as_str(), value)),
            BlockEntry::Expression(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockEntry {
    KeyValue { key: String, value: Expression },
    Expression(Expression),
}

/// Statement that is nothing more than a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatement {
    pub block: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentStatement {
    /// Expression after `to_perform:`
    pub action: Option<Expression>,
    pub block: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStatement {
    pub block: Block,
    pub analysis: Option<UncertaintyAnalysis>,
    pub span: Span,
}

/// Formula plus the uncertain inputs it is evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyAnalysis {
    pub formula: String,
    pub inputs: Vec<ObjectProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBeliefStatement {
    pub belief_name: String,
    pub new_confidence: Expression,
    pub evidence_source: Option<Expression>,
    pub evidence: Evidence,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceDecayStatement {
    pub belief_name: String,
    pub decay_spec: Expression,
    pub period_spec: Option<Expression>,
    pub curve: DecayCurve,
    pub rate: f64,
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCoordinationStatement {
    pub coordinator: Option<Expression>,
    pub participants: Vec<Expression>,
    pub coordination_type: Option<Expression>,
    pub constraints: Vec<Expression>,
    pub block: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceStatement {
    pub source: Option<Expression>,
    pub timestamp: Option<Expression>,
    pub chain_of_custody: Vec<Expression>,
    pub block: Block,
    pub span: Span,
}

/// `key = value` at top level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatement {
    pub key: String,
    pub value: Expression,
    pub span: Span,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Array(Vec<Expression>),
    Object(ObjectExpression),
    Entity(EntityExpression),
    Uncertainty(UncertaintyLiteral),
}

impl Expression {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expression::Literal(Literal::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// String literal contents or identifier name.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Expression::Literal(Literal::String(s)) => Some(s),
            Expression::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expression::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Expression]> {
        match self {
            Expression::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectExpression> {
        match self {
            Expression::Object(object) => Some(object),
            _ => None,
        }
    }

    /// True for uncertainty literals and strings spelled `"V ± U"`.
    pub fn carries_uncertainty(&self) -> bool {
        match self {
            Expression::Uncertainty(_) => true,
            Expression::Literal(Literal::String(s)) => s.contains('±'),
            _ => false,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Literal::String(s)) => write!(f, "{:?}", s),
            Expression::Literal(Literal::Number(n)) => write!(f, "{}", n),
            Expression::Literal(Literal::Boolean(b)) => write!(f, "{}", b),
            Expression::Identifier(name) => f.write_str(name),
            Expression::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Expression::Object(object) => write!(f, "{}", object),
            Expression::Entity(entity) => write!(f, "entity({}, {})", entity.name, entity.properties),
            Expression::Uncertainty(UncertaintyLiteral { value: Some(v), uncertainty }) => {
                write!(f, "{} ± {}", v, uncertainty)
            }
            Expression::Uncertainty(UncertaintyLiteral { value: None, uncertainty }) => {
                write!(f, "±{}", uncertainty)
            }
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectExpression {
    pub properties: Vec<ObjectProperty>,
}

impl ObjectExpression {
    /// Value of the last property named `key`.
    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.properties
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }
}

impl fmt::Display for ObjectExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, property) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {}: {}", property.key, property.value)?;
        }
        f.write_str(" }")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub key: String,
    pub value: Expression,
}

/// `entity(name, { ... })`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityExpression {
    pub name: Box<Expression>,
    pub properties: ObjectExpression,
}

/// `22.5 ± 0.1`, or a bare `± 0.1` with no base value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyLiteral {
    pub value: Option<f64>,
    pub uncertainty: f64,
}
