//! Streaming LL(1) predictive parser.
//!
//! Drives a pushdown stack of [`Frame`]s against [`GrammarTables`],
//! emitting one SAX-style [`ParseEvent`] per call to
//! [`StreamingParser::parse_step`] in pre-order (`Start` before any of a
//! nonterminal's children, `End` after all of them). Synthetic
//! nonterminals introduced by grammar lowering never produce `Start`/`End`
//! events — a consumer sees exactly the shape of the original EBNF
//! grammar.
//!
//! Recovery is panic-mode: on a mismatch the parser skips tokens until one
//! in the relevant FOLLOW set (or the expected terminal) turns up. Errors
//! encountered *during* that skipping are dropped rather than queued as
//! further events.

use std::collections::HashSet;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::error::{LexError, ParseError};
use crate::grammar::{is_synthetic, GrammarElement, GrammarTables};
use crate::lexer::buffered::CheckpointLexer;
use crate::position::Position;
use crate::token::{Token, TokenKind};
use crate::util::logger::DebugLog;
use crate::util::Log;

/// One item of parser output, in guaranteed pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A nonterminal's expansion has begun.
    Start(String),
    /// A nonterminal's expansion has finished.
    End(String),
    /// A terminal was matched.
    Leaf(Token),
    /// A mismatch was found and the parser resynchronized past it.
    Error(ParseError),
}

/// One pending unit of work on the parser's stack.
enum Frame {
    /// Expand this nonterminal against the current lookahead.
    Start(String),
    /// All of a nonterminal's children have been pushed; emit its `End`
    /// once they're fully processed.
    End(String),
    /// Match exactly this terminal next.
    Leaf(TokenKind),
}

/// A streaming LL(1) parser over a [`CheckpointLexer`].
pub struct StreamingParser<'s> {
    tables: Rc<GrammarTables>,
    lexer: CheckpointLexer<'s>,
    stack: Vec<Frame>,
    lookahead: Option<Result<Token, LexError>>,
    done: bool,
    log: OnceCell<Log<&'static str>>,
}

impl<'s> StreamingParser<'s> {
    pub fn new(tables: Rc<GrammarTables>, lexer: CheckpointLexer<'s>) -> Self {
        let start = tables.start.clone();
        Self {
            tables,
            lexer,
            stack: vec![Frame::Start(start)],
            lookahead: None,
            done: false,
            log: OnceCell::new(),
        }
    }

    /// Tokens the grammar pipeline never references as terminals and
    /// that carry no parse-tree meaning of their own.
    fn is_insignificant(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline
        )
    }

    fn fetch_significant(&mut self) -> Result<Token, LexError> {
        loop {
            let tok = self.lexer.read()?;
            if !Self::is_insignificant(tok.kind) {
                return Ok(tok);
            }
        }
    }

    fn peek(&mut self) -> Result<Token, LexError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.fetch_significant());
        }
        self.lookahead.clone().expect("just populated")
    }

    fn advance(&mut self) -> Result<Token, LexError> {
        let tok = self.peek();
        self.lookahead = None;
        tok
    }

    /// Skips tokens (silently dropping any lex errors along the way)
    /// until the lookahead satisfies `stop` or is `Eof`.
    fn skip_until(&mut self, stop: impl Fn(TokenKind) -> bool) {
        loop {
            match self.peek() {
                Ok(tok) if tok.kind == TokenKind::Eof || stop(tok.kind) => return,
                Ok(_) => {
                    let _ = self.advance();
                }
                Err(_) => {
                    let _ = self.advance();
                }
            }
        }
    }

    fn recover_start(&mut self, name: &str) {
        let follow: HashSet<TokenKind> = self
            .tables
            .follow
            .get(name)
            .cloned()
            .unwrap_or_default();
        self.skip_until(move |k| follow.contains(&k));
    }

    fn recover_leaf(&mut self, expected: TokenKind) {
        self.skip_until(move |k| k == expected);
    }

    /// Produces the next parse event, or `None` once input and the stack
    /// are both exhausted.
    pub fn parse_step(&mut self) -> Option<ParseEvent> {
        if self.done {
            return None;
        }
        loop {
            let frame = match self.stack.pop() {
                Some(frame) => frame,
                None => return self.step_empty_stack(),
            };

            match frame {
                Frame::End(name) => {
                    if is_synthetic(&name) {
                        continue;
                    }
                    return Some(ParseEvent::End(name));
                }
                Frame::Start(name) => {
                    if let Some(event) = self.step_start(name) {
                        return Some(event);
                    }
                }
                Frame::Leaf(expected) => {
                    return Some(self.step_leaf(expected));
                }
            }
        }
    }

    /// The stack has fully unwound: either the input is exhausted (signal
    /// end-of-input) or trailing tokens remain after a complete
    /// start-symbol instance, in which case each call reports and
    /// consumes one more leftover token.
    fn step_empty_stack(&mut self) -> Option<ParseEvent> {
        let lookahead = match self.peek() {
            Ok(tok) => tok,
            Err(err) => {
                let _ = self.advance();
                return Some(ParseEvent::Error(ParseError::from(err)));
            }
        };
        if lookahead.kind == TokenKind::Eof {
            self.done = true;
            return None;
        }
        let pos = Position::new(lookahead.line, lookahead.column);
        let found = lookahead.kind;
        let _ = self.advance();
        Some(ParseEvent::Error(ParseError::ExpectedEof { found, pos }))
    }

    /// Handles one `Start` frame. Returns `None` only when it expanded
    /// silently (a synthetic nonterminal whose alternative matched) and
    /// the caller should keep looping.
    fn step_start(&mut self, name: String) -> Option<ParseEvent> {
        let lookahead = match self.peek() {
            Ok(tok) => tok,
            Err(err) => {
                let _ = self.advance();
                return Some(ParseEvent::Error(ParseError::from(err)));
            }
        };

        let rule = self
            .tables
            .get(&name)
            .unwrap_or_else(|| panic!("grammar table missing rule \"{}\"", name));

        let chosen = rule
            .alternatives
            .iter()
            .find(|alt| alt.first.contains(&lookahead.kind));

        match chosen {
            Some(alt) => {
                self.log_enter(&format!("expand \"{}\" on {}", name, lookahead.kind));
                self.stack.push(Frame::End(name.clone()));
                for element in alt.elements.iter().rev() {
                    match element {
                        GrammarElement::Terminal(kind) => self.stack.push(Frame::Leaf(*kind)),
                        GrammarElement::Nonterminal(n) => {
                            self.stack.push(Frame::Start(n.clone()))
                        }
                    }
                }
                if is_synthetic(&name) {
                    None
                } else {
                    Some(ParseEvent::Start(name))
                }
            }
            None => {
                let pos = Position::new(lookahead.line, lookahead.column);
                if lookahead.kind == TokenKind::Eof {
                    return Some(ParseEvent::Error(ParseError::UnexpectedEof {
                        nonterminal: name,
                    }));
                }
                let mut expected: Vec<TokenKind> = rule
                    .alternatives
                    .iter()
                    .flat_map(|alt| alt.first.iter().copied())
                    .collect();
                expected.sort();
                expected.dedup();
                let found = lookahead.kind;
                self.recover_start(&name);
                let err = ParseError::UnexpectedToken {
                    nonterminal: name,
                    expected,
                    found,
                    pos,
                };
                self.log_error(pos, &err);
                Some(ParseEvent::Error(err))
            }
        }
    }

    fn step_leaf(&mut self, expected: TokenKind) -> ParseEvent {
        let tok = match self.advance() {
            Ok(tok) => tok,
            Err(err) => return ParseEvent::Error(ParseError::from(err)),
        };
        if tok.kind == expected {
            self.log_commit(Position::new(tok.line, tok.column), &tok.kind);
            return ParseEvent::Leaf(tok);
        }
        let pos = Position::new(tok.line, tok.column);
        let found = tok.kind;
        if found != TokenKind::Eof {
            self.recover_leaf(expected);
        }
        let err = ParseError::ExpectedToken {
            expected,
            found,
            pos,
        };
        self.log_error(pos, &err);
        ParseEvent::Error(err)
    }
}

impl<'s> DebugLog for StreamingParser<'s> {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::analysis::analyze;
    use crate::grammar::lower::lower_to_bnf;
    use crate::grammar::term::parse_grammar_file;
    use crate::lexer::{CodeStream, Lexer};

    fn build(grammar_src: &str) -> Rc<GrammarTables> {
        let ebnf = parse_grammar_file(grammar_src).unwrap();
        let bnf = lower_to_bnf(ebnf).unwrap();
        Rc::new(analyze(&bnf).unwrap())
    }

    fn run(tables: Rc<GrammarTables>, source: &'static str) -> Vec<ParseEvent> {
        let lexer = CheckpointLexer::new(Lexer::with_default_priority(), CodeStream::new(source), 64);
        let mut parser = StreamingParser::new(tables, lexer);
        let mut events = Vec::new();
        while let Some(event) = parser.parse_step() {
            events.push(event);
        }
        events
    }

    const PROGRAM_GRAMMAR: &str = "program -> stmt* \"EOF\"\nstmt -> \"NUMBER\" \";\"\n";

    #[test]
    fn log_channel_can_be_set_and_traces_a_parse() {
        let tables = build(PROGRAM_GRAMMAR);
        let lexer = CheckpointLexer::new(Lexer::with_default_priority(), CodeStream::new("1;"), 64);
        let mut parser = StreamingParser::new(tables, lexer);
        parser.set_log(Log::Verbose("parser"));
        assert_eq!(parser.log_cell().get(), Some(&Log::Verbose("parser")));
        while parser.parse_step().is_some() {}
    }

    #[test]
    fn happy_path_emits_preorder_events() {
        let tables = build(PROGRAM_GRAMMAR);
        let events = run(tables, "1;2;");

        assert_eq!(events[0], ParseEvent::Start("program".into()));
        assert_eq!(events[1], ParseEvent::Start("stmt".into()));
        assert!(matches!(&events[2], ParseEvent::Leaf(t) if t.kind == TokenKind::Number));
        assert!(matches!(&events[3], ParseEvent::Leaf(t) if t.kind == TokenKind::Semicolon));
        assert_eq!(events[4], ParseEvent::End("stmt".into()));
        assert_eq!(events[5], ParseEvent::Start("stmt".into()));
        assert_eq!(events[8], ParseEvent::End("stmt".into()));
        assert!(matches!(&events[9], ParseEvent::Leaf(t) if t.kind == TokenKind::Eof));
        assert_eq!(events[10], ParseEvent::End("program".into()));
        assert_eq!(events.len(), 11);
    }

    #[test]
    fn synthetic_star_wrapper_never_emits_start_or_end() {
        let tables = build(PROGRAM_GRAMMAR);
        let events = run(tables, "1;");
        for event in &events {
            match event {
                ParseEvent::Start(name) | ParseEvent::End(name) => {
                    assert!(!name.starts_with("$syn_"), "leaked synthetic event: {name}");
                }
                _ => {}
            }
        }
    }

    #[test]
    fn unexpected_token_recovers_to_follow_set() {
        let tables = build(PROGRAM_GRAMMAR);
        let events = run(tables, "1;+;3;");

        let errors: Vec<&ParseError> = events
            .iter()
            .filter_map(|e| match e {
                ParseEvent::Error(err) => Some(err),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        match errors[0] {
            ParseError::UnexpectedToken { found, .. } => assert_eq!(*found, TokenKind::Plus),
            other => panic!("expected UnexpectedToken, got {other:?}"),
        }

        // The parser still closes out the top-level production after
        // resynchronizing on EOF.
        assert_eq!(events.last(), Some(&ParseEvent::End("program".into())));
    }

    #[test]
    fn trailing_tokens_after_empty_stack_report_expected_eof() {
        // No "EOF" terminal in the grammar itself, so the stack empties
        // out after a single "NUMBER" while input remains.
        let tables = build("lit -> \"NUMBER\"\n");
        let events = run(tables, "1 2");

        assert_eq!(events[0], ParseEvent::Start("lit".into()));
        assert!(matches!(&events[1], ParseEvent::Leaf(t) if t.kind == TokenKind::Number));
        assert_eq!(events[2], ParseEvent::End("lit".into()));
        match &events[3] {
            ParseEvent::Error(ParseError::ExpectedEof { found, .. }) => {
                assert_eq!(*found, TokenKind::Number)
            }
            other => panic!("expected ExpectedEof error, got {other:?}"),
        }
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn empty_input_with_no_nullable_start_reports_single_error() {
        let tables = build("lit -> \"NUMBER\"\n");
        let events = run(tables, "");
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ParseEvent::Error(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn expected_token_mismatch_is_reported() {
        let tables = build(PROGRAM_GRAMMAR);
        let events = run(tables, "1+");
        let has_expected_error = events.iter().any(|e| {
            matches!(
                e,
                ParseEvent::Error(ParseError::ExpectedToken {
                    expected: TokenKind::Semicolon,
                    found: TokenKind::Plus,
                    ..
                })
            )
        });
        assert!(has_expected_error);
    }
}
