//! Parser for the BOC language
//!
//! Recursive descent over a pulled token stream with one token of lookahead.
//! The first error aborts the parse; no partial tree is returned.

use crate::belief::{Evidence, EvidenceKind};
use crate::determinism::Clock;
use crate::dsl::ast::*;
use crate::dsl::decay_rules::{mine_decay_spec, mine_period};
use crate::dsl::lexer::{Keyword, Lexer, Token, TokenType};
use crate::error::{BocError, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Parser for the BOC language
pub struct Parser {
    lexer: Lexer,
    current: Token,
    previous_end: SourceLocation,
    clock: Clock,
}

impl Parser {
    /// Create a parser and pull the first token from `lexer`
    pub fn new(lexer: Lexer) -> Result<Self> {
        Self::with_clock(lexer, Clock::new())
    }

    /// Create a parser whose `update_belief` evidence is stamped by `clock`
    pub fn with_clock(mut lexer: Lexer, clock: Clock) -> Result<Self> {
        let current = lexer.next_token()?;
        let previous_end = SourceLocation {
            line: current.line,
            column: current.column,
            offset: current.offset,
        };

        Ok(Self {
            lexer,
            current,
            previous_end,
            clock,
        })
    }

    /// Parse statements until EOF
    pub fn parse_program(&mut self) -> Result<Program> {
        let start = self.current_location();
        let mut statements = Vec::new();

        while !self.current.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            statements,
            span: Span {
                start,
                end: self.previous_end.clone(),
            },
        })
    }

    /// Parse a single top-level statement
    fn parse_statement(&mut self) -> Result<Statement> {
        let start = self.current_location();

        let statement = match self.current.token_type {
            TokenType::Keyword(keyword) => {
                debug!(keyword = keyword.kind_name(), line = self.current.line, "Parsing statement");
                match keyword {
                    Keyword::Belief => Statement::Belief(self.parse_belief(start)?),
                    Keyword::ReasoningContext => {
                        Statement::ReasoningContext(self.parse_block_statement(start)?)
                    }
                    Keyword::Intent => Statement::Intent(self.parse_intent(start)?),
                    Keyword::SharedState => Statement::SharedState(self.parse_block_statement(start)?),
                    Keyword::SelfCapability => {
                        Statement::SelfCapability(self.parse_block_statement(start)?)
                    }
                    Keyword::CalculateWithUncertainty => {
                        Statement::CalculateWithUncertainty(self.parse_calculation(start)?)
                    }
                    Keyword::StructuredKnowledge => {
                        Statement::StructuredKnowledge(self.parse_block_statement(start)?)
                    }
                    Keyword::UpdateBelief => Statement::UpdateBelief(self.parse_update_belief(start)?),
                    Keyword::ConfidenceDecay => {
                        Statement::ConfidenceDecay(self.parse_confidence_decay(start)?)
                    }
                    Keyword::AgentCoordination => {
                        Statement::AgentCoordination(self.parse_agent_coordination(start)?)
                    }
                    Keyword::Provenance => Statement::Provenance(self.parse_provenance(start)?),
                    Keyword::Entity => return Err(self.unexpected("statement")),
                }
            }
            TokenType::Identifier(_) => Statement::Assignment(self.parse_assignment(start)?),
            _ => return Err(self.unexpected("statement")),
        };

        Ok(statement)
    }

    /// `belief [confidence = expr] [@attrs] { ... }`
    fn parse_belief(&mut self, start: SourceLocation) -> Result<BlockStatement> {
        self.advance()?; // belief

        let mut attributes = BTreeMap::new();
        if self.check_identifier("confidence") {
            self.advance()?;
            self.eat(&TokenType::Assign)?;
            attributes.insert("confidence".to_string(), self.parse_expression()?);
        }
        attributes.extend(self.parse_attributes()?);

        let block = self.parse_block(attributes)?;
        Ok(BlockStatement {
            block,
            span: self.span_from(start),
        })
    }

    /// `<keyword> [@attrs] { ... }`
    fn parse_block_statement(&mut self, start: SourceLocation) -> Result<BlockStatement> {
        self.advance()?; // keyword
        let attributes = self.parse_attributes()?;
        let block = self.parse_block(attributes)?;

        Ok(BlockStatement {
            block,
            span: self.span_from(start),
        })
    }

    /// `intent [to_perform: expr] [@attrs] { ... }`
    fn parse_intent(&mut self, start: SourceLocation) -> Result<IntentStatement> {
        self.advance()?; // intent

        let action = if self.check_identifier("to_perform") {
            self.advance()?;
            self.eat(&TokenType::Colon)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        let attributes = self.parse_attributes()?;
        let block = self.parse_block(attributes)?;

        Ok(IntentStatement {
            action,
            block,
            span: self.span_from(start),
        })
    }

    /// `calculate_with_uncertainty [@attrs] { formula: "...", input_uncertainties: {...} }`
    fn parse_calculation(&mut self, start: SourceLocation) -> Result<CalculationStatement> {
        self.advance()?; // calculate_with_uncertainty
        let attributes = self.parse_attributes()?;
        let block = self.parse_block(attributes)?;
        let analysis = extract_analysis(&block);

        Ok(CalculationStatement {
            block,
            analysis,
            span: self.span_from(start),
        })
    }

    /// `update_belief name(confidence) [evidence: expr]`
    fn parse_update_belief(&mut self, start: SourceLocation) -> Result<UpdateBeliefStatement> {
        self.advance()?; // update_belief
        let belief_name = self.expect_identifier()?;

        self.eat(&TokenType::LeftParen)?;
        let new_confidence = self.parse_expression()?;
        self.eat(&TokenType::RightParen)?;

        let evidence_source = if self.check_identifier("evidence") {
            self.advance()?;
            self.eat(&TokenType::Colon)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        let source = evidence_source
            .as_ref()
            .map(|e| e.as_text().map(str::to_string).unwrap_or_else(|| e.to_string()))
            .unwrap_or_else(|| "unknown".to_string());

        let evidence = Evidence {
            content: format!("Belief update to {}", new_confidence),
            confidence: new_confidence
                .as_number()
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(0.0),
            source,
            timestamp: self.clock.now(),
            kind: EvidenceKind::Neutral,
            weight: 1.0,
        };

        Ok(UpdateBeliefStatement {
            belief_name,
            new_confidence,
            evidence_source,
            evidence,
            span: self.span_from(start),
        })
    }

    /// `confidence_decay name(decaySpec) [period: periodSpec]`
    fn parse_confidence_decay(&mut self, start: SourceLocation) -> Result<ConfidenceDecayStatement> {
        self.advance()?; // confidence_decay
        let belief_name = self.expect_identifier()?;

        self.eat(&TokenType::LeftParen)?;
        let decay_spec = self.parse_expression()?;
        self.eat(&TokenType::RightParen)?;

        let period_spec = if self.check_identifier("period") {
            self.advance()?;
            self.eat(&TokenType::Colon)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        let (curve, rate) = mine_decay_spec(decay_spec.as_string_literal());
        let period = mine_period(period_spec.as_ref().and_then(|e| e.as_string_literal()))?;

        Ok(ConfidenceDecayStatement {
            belief_name,
            decay_spec,
            period_spec,
            curve,
            rate,
            period,
            span: self.span_from(start),
        })
    }

    /// `agent_coordination [coordinator: expr] { participants: [...], type: ..., constraints: [...] }`
    fn parse_agent_coordination(
        &mut self,
        start: SourceLocation,
    ) -> Result<AgentCoordinationStatement> {
        self.advance()?; // agent_coordination

        let prefix = if self.check_identifier("coordinator") {
            self.advance()?;
            self.eat(&TokenType::Colon)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        let block = self.parse_block(BTreeMap::new())?;
        let coordinator = prefix.or_else(|| block.get("coordinator").cloned());

        Ok(AgentCoordinationStatement {
            coordinator,
            participants: array_items(&block, "participants"),
            coordination_type: block.get("type").cloned(),
            constraints: array_items(&block, "constraints"),
            block,
            span: self.span_from(start),
        })
    }

    /// `provenance { source: ..., timestamp: ..., chain_of_custody: [...] }`
    fn parse_provenance(&mut self, start: SourceLocation) -> Result<ProvenanceStatement> {
        self.advance()?; // provenance
        let block = self.parse_block(BTreeMap::new())?;

        Ok(ProvenanceStatement {
            source: block.get("source").cloned(),
            timestamp: block.get("timestamp").cloned(),
            chain_of_custody: array_items(&block, "chain_of_custody"),
            block,
            span: self.span_from(start),
        })
    }

    /// `key = expr`
    fn parse_assignment(&mut self, start: SourceLocation) -> Result<AssignmentStatement> {
        let key = self.expect_identifier()?;
        self.eat(&TokenType::Assign)?;
        let value = self.parse_expression()?;

        Ok(AssignmentStatement {
            key,
            value,
            span: self.span_from(start),
        })
    }

    /// Zero or more `@name` or `@name(expr)` prefixes
    fn parse_attributes(&mut self) -> Result<BTreeMap<String, Expression>> {
        let mut attributes = BTreeMap::new();

        while let TokenType::Identifier(name) = &self.current.token_type {
            let Some(name) = name.strip_prefix('@') else {
                break;
            };
            let name = name.to_string();
            self.advance()?;

            let value = if self.check(&TokenType::LeftParen) {
                self.advance()?;
                let value = self.parse_expression()?;
                self.eat(&TokenType::RightParen)?;
                value
            } else {
                Expression::Literal(Literal::Boolean(true))
            };

            attributes.insert(name, value);
        }

        Ok(attributes)
    }

    /// `{ key: value | expr ... }`; stray `,` and `;` between entries are skipped
    fn parse_block(&mut self, attributes: BTreeMap<String, Expression>) -> Result<Block> {
        self.eat(&TokenType::LeftBrace)?;
        let mut entries = Vec::new();

        loop {
            match &self.current.token_type {
                TokenType::RightBrace | TokenType::Eof => break,
                TokenType::Comma | TokenType::Semicolon => {
                    self.advance()?;
                }
                TokenType::Identifier(key) => {
                    let key = key.clone();
                    self.advance()?;
                    self.eat(&TokenType::Colon)?;
                    let value = self.parse_expression()?;
                    entries.push(BlockEntry::KeyValue { key, value });
                }
                _ => entries.push(BlockEntry::Expression(self.parse_expression()?)),
            }
        }

        self.eat(&TokenType::RightBrace)?;
        Ok(Block {
            attributes,
            entries,
        })
    }

    /// Parse an expression; dispatch is on the current token alone
    fn parse_expression(&mut self) -> Result<Expression> {
        match self.current.token_type.clone() {
            TokenType::LeftBracket => self.parse_array(),
            TokenType::LeftBrace => Ok(Expression::Object(self.parse_object()?)),
            TokenType::Keyword(Keyword::Entity) => self.parse_entity(),
            TokenType::Uncertainty(uncertainty) => {
                self.advance()?;
                Ok(Expression::Uncertainty(UncertaintyLiteral {
                    value: None,
                    uncertainty,
                }))
            }
            TokenType::Number(value) => {
                self.advance()?;
                // `22.5 ± 0.1` folds into one uncertainty literal
                if let TokenType::Uncertainty(uncertainty) = self.current.token_type {
                    self.advance()?;
                    return Ok(Expression::Uncertainty(UncertaintyLiteral {
                        value: Some(value),
                        uncertainty,
                    }));
                }
                Ok(Expression::Literal(Literal::Number(value)))
            }
            TokenType::String(value) => {
                self.advance()?;
                Ok(Expression::Literal(Literal::String(value)))
            }
            TokenType::Boolean(value) => {
                self.advance()?;
                Ok(Expression::Literal(Literal::Boolean(value)))
            }
            TokenType::Identifier(name) => {
                self.advance()?;
                Ok(Expression::Identifier(name))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `[a, b, ...]`
    fn parse_array(&mut self) -> Result<Expression> {
        self.eat(&TokenType::LeftBracket)?;
        let mut items = Vec::new();

        if !self.check(&TokenType::RightBracket) {
            loop {
                items.push(self.parse_expression()?);
                if self.check(&TokenType::RightBracket) {
                    break;
                }
                self.eat(&TokenType::Comma)?;
            }
        }

        self.eat(&TokenType::RightBracket)?;
        Ok(Expression::Array(items))
    }

    /// `{ key: value, ... }` with identifier or string keys; a trailing comma is allowed
    fn parse_object(&mut self) -> Result<ObjectExpression> {
        self.eat(&TokenType::LeftBrace)?;
        let mut properties = Vec::new();

        while !self.check(&TokenType::RightBrace) {
            let key = match &self.current.token_type {
                TokenType::Identifier(key) | TokenType::String(key) => key.clone(),
                TokenType::Keyword(_) => self.current.text.clone(),
                _ => return Err(self.unexpected("IDENTIFIER or STRING")),
            };
            self.advance()?;
            self.eat(&TokenType::Colon)?;
            let value = self.parse_expression()?;
            properties.push(ObjectProperty { key, value });

            if self.check(&TokenType::Comma) {
                self.advance()?;
            } else if !self.check(&TokenType::RightBrace) {
                return Err(self.unexpected("COMMA or RBRACE"));
            }
        }

        self.eat(&TokenType::RightBrace)?;
        Ok(ObjectExpression { properties })
    }

    /// `entity(name, { ... })`
    fn parse_entity(&mut self) -> Result<Expression> {
        self.advance()?; // entity
        self.eat(&TokenType::LeftParen)?;
        let name = self.parse_expression()?;
        self.eat(&TokenType::Comma)?;
        let properties = self.parse_object()?;
        self.eat(&TokenType::RightParen)?;

        Ok(Expression::Entity(EntityExpression {
            name: Box::new(name),
            properties,
        }))
    }

    // Token helpers

    /// Consume the current token if it has the expected kind
    fn eat(&mut self, expected: &TokenType) -> Result<Token> {
        if self.check(expected) {
            self.advance()
        } else {
            Err(self.unexpected(expected.kind_name()))
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        self.current.token_type.same_kind(token_type)
    }

    fn check_identifier(&self, name: &str) -> bool {
        matches!(&self.current.token_type, TokenType::Identifier(s) if s == name)
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.current.token_type {
            TokenType::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("IDENTIFIER")),
        }
    }

    /// Move to the next token, returning the one just consumed
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        let consumed = std::mem::replace(&mut self.current, next);
        self.previous_end = SourceLocation {
            line: consumed.line,
            column: consumed.column + consumed.length,
            offset: consumed.offset + consumed.length,
        };
        Ok(consumed)
    }

    fn unexpected(&self, expected: &str) -> BocError {
        BocError::Parsing {
            expected: expected.to_string(),
            found: self.current.token_type.kind_name().to_string(),
            line: self.current.line,
            column: self.current.column,
        }
    }

    // Span helper methods
    fn current_location(&self) -> SourceLocation {
        SourceLocation {
            line: self.current.line,
            column: self.current.column,
            offset: self.current.offset,
        }
    }

    fn span_from(&self, start: SourceLocation) -> Span {
        Span {
            start,
            end: self.previous_end.clone(),
        }
    }
}

/// Items of the array stored under `key`; empty when absent or not an array.
fn array_items(block: &Block, key: &str) -> Vec<Expression> {
    block
        .get(key)
        .and_then(Expression::as_array)
        .map(<[Expression]>::to_vec)
        .unwrap_or_default()
}

/// Formula and uncertain inputs of a `calculate_with_uncertainty` body.
fn extract_analysis(block: &Block) -> Option<UncertaintyAnalysis> {
    let formula = block.get("formula")?.as_string_literal()?;
    let inputs: Vec<ObjectProperty> = block
        .get("input_uncertainties")?
        .as_object()?
        .properties
        .iter()
        .filter(|p| p.value.carries_uncertainty())
        .cloned()
        .collect();

    if inputs.is_empty() {
        return None;
    }

    Some(UncertaintyAnalysis {
        formula: formula.to_string(),
        inputs,
    })
}
