//! End-to-end scenarios run through the full pipeline: grammar file ->
//! EBNF -> BNF -> FIRST/FOLLOW tables -> streaming parse.
//!
//! The grammar mirrors the classic Lox expression grammar (precedence
//! climbing through `comma`, `equality`, `comparison`, `term`, `factor`,
//! `unary`, `primary`), written right-recursively via `*` so that lowering
//! keeps every level LL(1).

use std::rc::Rc;

use lox_frontend::grammar::analysis::analyze;
use lox_frontend::grammar::lower::lower_to_bnf;
use lox_frontend::grammar::term::parse_grammar_file;
use lox_frontend::lexer::buffered::CheckpointLexer;
use lox_frontend::lexer::{CodeStream, Lexer};
use lox_frontend::{GrammarTables, ParseError, ParseEvent, StreamingParser, TokenKind};

const GRAMMAR: &str = r#"
expression -> comma
comma -> equality
equality -> comparison ( ( "==" or "!=" ) comparison )*
comparison -> term ( ( "<" or "<=" or ">" or ">=" ) term )*
term -> factor ( ( "+" or "-" ) factor )*
factor -> unary ( ( "*" or "/" ) unary )*
unary -> ( "!" or "-" ) unary or primary
primary -> "NUMBER" or "STRING" or "true" or "false" or "nil" or "(" expression ")"
"#;

fn tables() -> Rc<GrammarTables> {
    let ebnf = parse_grammar_file(GRAMMAR).expect("valid grammar file");
    let bnf = lower_to_bnf(ebnf).expect("lowers to BNF");
    Rc::new(analyze(&bnf).expect("LL(1) tables"))
}

fn parse(tables: Rc<GrammarTables>, source: &'static str) -> Vec<ParseEvent> {
    let lexer = CheckpointLexer::new(Lexer::with_default_priority(), CodeStream::new(source), 64);
    let mut parser = StreamingParser::new(tables, lexer);
    let mut events = Vec::new();
    while let Some(event) = parser.parse_step() {
        events.push(event);
    }
    events
}

fn start(name: &str) -> ParseEvent {
    ParseEvent::Start(name.to_string())
}
fn end(name: &str) -> ParseEvent {
    ParseEvent::End(name.to_string())
}

/// Asserts the classic SAX-style invariants: every `Start(N)` is matched
/// by exactly one later `End(N)` with correct nesting, and no synthetic
/// (`$syn_`-prefixed) name ever leaks out.
fn assert_balanced_preorder(events: &[ParseEvent]) {
    let mut open = Vec::new();
    for event in events {
        match event {
            ParseEvent::Start(name) => {
                assert!(!name.starts_with("$syn_"), "synthetic Start leaked: {name}");
                open.push(name.clone());
            }
            ParseEvent::End(name) => {
                assert!(!name.starts_with("$syn_"), "synthetic End leaked: {name}");
                assert_eq!(open.pop().as_deref(), Some(name.as_str()), "unbalanced End({name})");
            }
            _ => {}
        }
    }
    assert!(open.is_empty(), "unclosed nonterminals: {open:?}");
}

#[test]
fn scenario_1_single_number_walks_full_precedence_chain() {
    let events = parse(tables(), "42");
    assert_balanced_preorder(&events);

    let expected = vec![
        start("expression"),
        start("comma"),
        start("equality"),
        start("comparison"),
        start("term"),
        start("factor"),
        start("unary"),
        start("primary"),
    ];
    assert_eq!(&events[..8], &expected[..]);
    assert!(matches!(&events[8], ParseEvent::Leaf(t) if t.kind == TokenKind::Number && t.lexeme == "42"));

    let expected_tail = vec![
        end("primary"),
        end("unary"),
        end("factor"),
        end("term"),
        end("comparison"),
        end("equality"),
        end("comma"),
        end("expression"),
    ];
    assert_eq!(&events[9..], &expected_tail[..]);
    assert_eq!(events.len(), 17);
}

#[test]
fn scenario_2_addition_wraps_both_operands_in_term() {
    let events = parse(tables(), "1+2");
    assert_balanced_preorder(&events);

    // Down to the first operand.
    assert_eq!(events[0], start("expression"));
    assert_eq!(events[5], start("factor"));
    assert!(matches!(&events[8], ParseEvent::Leaf(t) if t.kind == TokenKind::Number && t.lexeme == "1"));
    assert_eq!(events[9], end("primary"));
    assert_eq!(events[10], end("unary"));
    assert_eq!(events[11], end("factor"));

    // The "+" is a leaf directly under term, not under its own
    // nonterminal (it comes from a synthetic group).
    assert!(matches!(&events[12], ParseEvent::Leaf(t) if t.kind == TokenKind::Plus));

    // Second operand re-enters factor -> unary -> primary.
    assert_eq!(events[13], start("factor"));
    assert_eq!(events[14], start("unary"));
    assert_eq!(events[15], start("primary"));
    assert!(matches!(&events[16], ParseEvent::Leaf(t) if t.kind == TokenKind::Number && t.lexeme == "2"));

    assert_eq!(events.last(), Some(&end("expression")));
    assert_eq!(events.len(), 25);
}

#[test]
fn scenario_3_parenthesized_expression_nests_the_full_tower_twice() {
    let events = parse(tables(), "(123)");
    assert_balanced_preorder(&events);

    assert_eq!(events[0], start("expression"));
    assert_eq!(events[7], start("primary"));
    assert!(matches!(&events[8], ParseEvent::Leaf(t) if t.kind == TokenKind::ParenL));

    // Immediately re-enters the whole chain for the inner expression.
    assert_eq!(events[9], start("expression"));
    assert_eq!(events[16], start("primary"));
    assert!(matches!(&events[17], ParseEvent::Leaf(t) if t.kind == TokenKind::Number && t.lexeme == "123"));

    let closing_paren = events
        .iter()
        .position(|e| matches!(e, ParseEvent::Leaf(t) if t.kind == TokenKind::ParenR))
        .expect("closing paren leaf present");
    // Everything between the two parens is the fully closed inner tower.
    assert_eq!(events[closing_paren - 1], end("expression"));

    assert_eq!(events.last(), Some(&end("expression")));
    assert!(events.iter().all(|e| !matches!(e, ParseEvent::Error(_))));
}

#[test]
fn scenario_4_stray_operator_recovers_and_still_closes_open_frames() {
    let events = parse(tables(), "1+*2");

    let errors: Vec<&ParseError> = events
        .iter()
        .filter_map(|e| match e {
            ParseEvent::Error(err) => Some(err),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1, "exactly one error event: {events:?}");
    match errors[0] {
        ParseError::UnexpectedToken {
            nonterminal, found, ..
        } => {
            assert_eq!(nonterminal, "factor");
            assert_eq!(*found, TokenKind::Star);
        }
        other => panic!("unexpected error kind: {other:?}"),
    }

    // The already-opened outer nonterminals still close, in order, after
    // the abandoned (never-opened) second "factor".
    let tail = &events[events.len() - 5..];
    assert_eq!(
        tail,
        &[
            end("term"),
            end("comparison"),
            end("equality"),
            end("comma"),
        ]
        .into_iter()
        .chain(std::iter::once(end("expression")))
        .collect::<Vec<_>>()[..]
    );
}

#[test]
fn scenario_5_empty_input_reports_single_error_then_ends() {
    let events = parse(tables(), "");
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ParseEvent::Error(ParseError::UnexpectedEof { .. })
    ));
}

#[test]
fn scenario_6_star_with_no_preceding_term_is_an_invalid_grammar() {
    let ebnf = parse_grammar_file("bad -> * \"x\"\n");
    let err = ebnf.unwrap_err();
    match err {
        lox_frontend::GrammarError::InvalidGrammar { reason, .. } => {
            assert!(reason.contains("no preceding term"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
