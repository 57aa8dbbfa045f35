//! A streaming front-end toolchain for the Lox language: a parallel-DFA
//! maximal-munch lexer, an EBNF grammar pipeline that lowers to BNF and
//! builds LL(1) FIRST/FOLLOW tables, and a predictive parser that emits
//! SAX-style parse events with panic-mode error recovery.
//!
//! # Overview
//!
//! The crate is organized as four stages that feed one another:
//!
//! - [`dfa`] — the closed set of per-token-kind recognizers, each a
//!   three-state `Invalid`/`Intermediate`/`Valid` automaton.
//! - [`lexer`] — [`lexer::Lexer`] runs every recognizer in lockstep and
//!   commits to the longest valid match; [`lexer::buffered`] layers
//!   checkpoint/rollback lookahead over it.
//! - [`grammar`] — a grammar-file DSL is parsed
//!   ([`grammar::term::parse_grammar_file`]), lowered to BNF with
//!   synthetic nonterminals for `*`/`+`/`(...)`
//!   ([`grammar::lower::lower_to_bnf`]), and analyzed into LL(1) tables
//!   ([`grammar::analysis::analyze`]).
//! - [`parser`] — [`parser::StreamingParser`] walks those tables against
//!   a buffered lexer, producing [`parser::ParseEvent`]s.
//!
//! [`error`] holds the error taxonomy for every stage; [`token`] and
//! [`position`] are the shared vocabulary they all speak.
//!
//! # Example
//!
//! ```
//! use lox_frontend::grammar::analysis::analyze;
//! use lox_frontend::grammar::lower::lower_to_bnf;
//! use lox_frontend::grammar::term::parse_grammar_file;
//! use lox_frontend::lexer::buffered::CheckpointLexer;
//! use lox_frontend::lexer::{CodeStream, Lexer};
//! use lox_frontend::parser::{ParseEvent, StreamingParser};
//! use std::rc::Rc;
//!
//! let grammar_src = "program -> stmt* \"EOF\"\nstmt -> \"NUMBER\" \";\"\n";
//! let ebnf = parse_grammar_file(grammar_src).unwrap();
//! let bnf = lower_to_bnf(ebnf).unwrap();
//! let tables = Rc::new(analyze(&bnf).unwrap());
//!
//! let source = "1;2;3;";
//! let lexer = CheckpointLexer::new(Lexer::with_default_priority(), CodeStream::new(source), 64);
//! let mut parser = StreamingParser::new(tables, lexer);
//!
//! let mut starts = 0;
//! while let Some(event) = parser.parse_step() {
//!     if let ParseEvent::Start(_) = event {
//!         starts += 1;
//!     }
//! }
//! assert_eq!(starts, 4); // one "program" plus three "stmt"
//! ```

pub mod dfa;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod token;
pub mod util;

pub use error::{GrammarError, LexError, ParseError};
pub use grammar::{BnfGrammar, EbnfGrammar, GrammarElement, GrammarTerm};
pub use grammar::analysis::GrammarTables;
pub use lexer::buffered::CheckpointLexer;
pub use lexer::Lexer;
pub use parser::{ParseEvent, StreamingParser};
pub use position::Position;
pub use token::{Token, TokenKind};
