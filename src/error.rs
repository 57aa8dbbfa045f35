use std::fmt::{Display, Formatter};

use crate::position::Position;
use crate::token::TokenKind;

/// Errors produced by the lexer and the buffered lexer built on top of it.
///
/// A closed, hand-written error enum with a manual [`Display`] impl
/// rather than a derive macro; this crate carries no `thiserror`/`anyhow`
/// dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// No DFA accepted the starting character.
    UnrecognizedCharacter { pos: Position },
    /// Input ended, or the next character diverged, inside a partial match.
    UnterminatedToken {
        best_guess_kind: TokenKind,
        pos: Position,
    },
    /// The buffered lexer's lookahead window was exceeded without a
    /// rollback to free space.
    BufferOverflow,
    /// The underlying byte source failed.
    Io(String),
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnrecognizedCharacter { pos } => {
                write!(f, "LexError: unrecognized character at {}", pos)
            }
            LexError::UnterminatedToken { best_guess_kind, pos } => write!(
                f,
                "LexError: unterminated {} at {}",
                best_guess_kind, pos
            ),
            LexError::BufferOverflow => write!(f, "LexError: lookahead buffer overflow"),
            LexError::Io(msg) => write!(f, "LexError: io error: {}", msg),
        }
    }
}

impl std::error::Error for LexError {}

impl From<std::io::Error> for LexError {
    fn from(err: std::io::Error) -> Self {
        LexError::Io(err.to_string())
    }
}

/// Errors produced by the grammar pipeline: the grammar-file parser, the
/// EBNF-to-BNF lowering pass, and the FIRST/FOLLOW analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    InvalidGrammar { reason: String, pos: Position },
    UnknownTerminal { literal: String },
    GrammarNotLL1 { nonterminal: String },
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::InvalidGrammar { reason, pos } => {
                write!(f, "GrammarError: {} at {}", reason, pos)
            }
            GrammarError::UnknownTerminal { literal } => {
                write!(f, "GrammarError: unknown terminal \"{}\"", literal)
            }
            GrammarError::GrammarNotLL1 { nonterminal } => write!(
                f,
                "GrammarError: \"{}\" is not LL(1) (FIRST/FIRST or FIRST/FOLLOW conflict)",
                nonterminal
            ),
        }
    }
}

impl std::error::Error for GrammarError {}

impl GrammarError {
    pub(crate) fn from_lex(err: LexError, pos: Position) -> Self {
        match err {
            LexError::UnrecognizedCharacter { pos } => GrammarError::InvalidGrammar {
                reason: "unrecognized character in grammar file".into(),
                pos,
            },
            LexError::UnterminatedToken { pos, .. } => GrammarError::InvalidGrammar {
                reason: "unterminated token in grammar file".into(),
                pos,
            },
            LexError::BufferOverflow => GrammarError::InvalidGrammar {
                reason: "lookahead buffer overflow while reading grammar file".into(),
                pos,
            },
            LexError::Io(msg) => GrammarError::InvalidGrammar {
                reason: format!("io error: {}", msg),
                pos,
            },
        }
    }
}

/// The error taxonomy surfaced by the streaming parser. Every
/// variant is recoverable: after yielding one as a
/// [`crate::parser::ParseEvent::Error`], `StreamingParser::parse_step`
/// re-synchronizes via panic-mode skipping and keeps producing events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// While expanding `nonterminal`, the lookahead token didn't select
    /// any alternative.
    UnexpectedToken {
        nonterminal: String,
        expected: Vec<TokenKind>,
        found: TokenKind,
        pos: Position,
    },
    /// A leaf frame expected one specific terminal and got another.
    ExpectedToken {
        expected: TokenKind,
        found: TokenKind,
        pos: Position,
    },
    /// Input ended while a nonterminal still had pending, non-nullable
    /// work.
    UnexpectedEof { nonterminal: String },
    /// The stack fully unwound (one start-symbol instance was matched)
    /// but a token other than end-of-input remained.
    ExpectedEof { found: TokenKind, pos: Position },
    /// The underlying lexer failed while the parser was requesting its
    /// next token.
    Lex(LexError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                nonterminal,
                found,
                pos,
                ..
            } => write!(
                f,
                "ParseError: unexpected {} while parsing \"{}\" at {}",
                found, nonterminal, pos
            ),
            ParseError::ExpectedToken {
                expected,
                found,
                pos,
            } => write!(
                f,
                "ParseError: expected {} but found {} at {}",
                expected, found, pos
            ),
            ParseError::UnexpectedEof { nonterminal } => write!(
                f,
                "ParseError: unexpected end of input while parsing \"{}\"",
                nonterminal
            ),
            ParseError::ExpectedEof { found, pos } => {
                write!(f, "ParseError: expected EOF but found {} at {}", found, pos)
            }
            ParseError::Lex(err) => write!(f, "ParseError: {}", err),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Lex(err)
    }
}
