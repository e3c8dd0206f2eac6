use super::*;
use crate::dsl::lexer::Keyword;
use crate::error::BocError;

#[test]
fn test_lexer_basic_tokens() {
    let mut lexer = Lexer::new("belief confidence=0.9 {}");
    let tokens = lexer.tokenize().unwrap();

    assert_eq!(tokens[0].token_type, TokenType::Keyword(Keyword::Belief));
    assert!(matches!(tokens[1].token_type, TokenType::Identifier(ref s) if s == "confidence"));
    assert_eq!(tokens[2].token_type, TokenType::Assign);
    assert!(matches!(tokens[3].token_type, TokenType::Number(n) if n == 0.9));
    assert_eq!(tokens.last().unwrap().token_type, TokenType::Eof);
}

#[test]
fn test_statement_count_matches_top_level() {
    let source = r#"
    belief confidence=0.85 { fact: "temperature_is_high" }
    reasoning_context { premise: "server is hot" }
    intent to_perform: "cool_down" { target: "server_room" }
    shared_state { counter: 1 }
    self_capability { tools: ["thermostat"] }
    calculate_with_uncertainty { formula: "a + b", input_uncertainties: { a: 1 ± 0.1 } }
    structured_knowledge { entity("room", { temp: 30 }) }
    update_belief temperature_is_high(0.9)
    confidence_decay temperature_is_high("exponential 0.1")
    agent_coordination { participants: [a, b] }
    provenance { source: "sensor" }
    threshold = 30
    "#;

    let program = parse(source).unwrap();
    assert_eq!(program.statements.len(), 12);
}

#[test]
fn test_nested_structures() {
    let source = r#"
    structured_knowledge {
        graph: {
            nodes: [entity("a", { weight: 1 }), entity("b", {})],
            "edge list": [[a, b]]
        }
    }
    "#;

    let program = parse(source).unwrap();
    let graph = program.statements[0]
        .block()
        .and_then(|b| b.get("graph"))
        .and_then(Expression::as_object)
        .unwrap();

    assert_eq!(graph.get("nodes").and_then(Expression::as_array).map(|n| n.len()), Some(2));
    let edges = graph.get("edge list").and_then(Expression::as_array).unwrap();
    assert_eq!(edges[0].as_array().map(|e| e.len()), Some(2));
}

#[test]
fn test_unbalanced_program_returns_no_tree() {
    let result = parse("belief { fact: \"a\" }\nshared_state { x: { y: 1 }");
    assert!(matches!(result, Err(BocError::Parsing { .. })));
}

#[test]
fn test_ast_serializes_with_stable_tags() {
    let program = parse("x = 22.5 ± 0.1").unwrap();
    let json = serde_json::to_value(&program).unwrap();

    let assignment = &json["statements"][0]["Assignment"];
    assert_eq!(assignment["key"], "x");
    assert_eq!(assignment["value"]["Uncertainty"]["value"], 22.5);
    assert_eq!(assignment["value"]["Uncertainty"]["uncertainty"], 0.1);
}

#[test]
fn test_ast_round_trips_through_json() {
    let source = r#"
    agent_coordination coordinator: lead { participants: [a, b], type: "vote" }
    confidence_decay a("step 0.5") period: "2 days"
    "#;

    let program = parse(source).unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let restored: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, program);
}

#[test]
fn test_keyword_case_insensitive_statements() {
    let program = parse("SHARED_STATE { x: 1 } Provenance { source: s }").unwrap();
    assert_eq!(program.statements[0].kind_name(), "shared_state");
    assert_eq!(program.statements[1].kind_name(), "provenance");
}

#[test]
fn test_error_position_is_reported() {
    let err = parse("shared_state {\n  x: ]\n}").unwrap_err();
    match err {
        BocError::Parsing {
            expected,
            found,
            line,
            column,
        } => {
            assert_eq!(expected, "expression");
            assert_eq!(found, "RBRACKET");
            assert_eq!(line, 2);
            assert_eq!(column, 6);
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}
