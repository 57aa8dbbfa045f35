//! Parallel-DFA state manager and maximal-munch lexer built on top of it.
//!
//! Every recognizer in the priority list is stepped in lockstep over each
//! code point; the lexer commits to the longest prefix any recognizer
//! accepted, falling back to the best partial match for error reporting.

pub mod buffered;

use once_cell::unsync::OnceCell;

use crate::dfa::{dfa_for, DfaKitLog, DfaState, TokenDfa};
use crate::error::LexError;
use crate::position::Position;
use crate::token::{Token, TokenKind};
use crate::util::logger::DebugLog;
use crate::util::Log;

/// A code-point source with incremental position tracking. Wraps a
/// `Chars` iterator; positions are advanced one code point at a time
/// rather than derived after the fact from a whole buffer (line
/// increments on `\n`, column resets to 0).
pub struct CodeStream<'s> {
    chars: std::str::Chars<'s>,
}

impl<'s> CodeStream<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            chars: source.chars(),
        }
    }

    fn read(&mut self) -> Option<char> {
        self.chars.next()
    }
}

impl<'s> From<&'s str> for CodeStream<'s> {
    fn from(source: &'s str) -> Self {
        CodeStream::new(source)
    }
}

/// The recommended priority ordering: lower-priority kinds first so that
/// later, higher-priority recognizers win ties via last-write-wins
/// summary updates (e.g. `while` the keyword outranks `while` matched as
/// an `Identifier`).
pub fn default_priority() -> Vec<TokenKind> {
    use TokenKind::*;
    vec![
        Eof,
        Identifier,
        String,
        Number,
        Comment,
        Whitespace,
        Newline,
        ParenL,
        ParenR,
        BraceL,
        BraceR,
        Comma,
        Dot,
        Minus,
        Plus,
        Semicolon,
        Slash,
        Star,
        Bang,
        BangEq,
        Eq,
        EqEq,
        Gt,
        GtEq,
        Lt,
        LtEq,
        And,
        Class,
        Else,
        False,
        Fun,
        For,
        If,
        Nil,
        Or,
        Print,
        Return,
        Super,
        This,
        True,
        Var,
        While,
    ]
}

/// `(any_valid?, winning_valid_kind, any_intermediate?,
/// winning_intermediate_kind)`, updated in priority-list order so later
/// entries overwrite earlier ones on a tie.
#[derive(Debug, Clone, Copy, Default)]
struct Summary {
    any_valid: bool,
    winning_valid: Option<TokenKind>,
    any_intermediate: bool,
    winning_intermediate: Option<TokenKind>,
}

impl Summary {
    fn all_invalid(&self) -> bool {
        !self.any_valid && !self.any_intermediate
    }
}

/// Steps every recognizer in `priority` order over each code point,
/// maintaining a current and previous summary.
struct ParallelDfaManager {
    priority: Vec<TokenKind>,
    recognizers: Vec<TokenDfa>,
    alive: Vec<bool>,
    current: Summary,
    previous: Summary,
    kit_log: DfaKitLog,
}

impl ParallelDfaManager {
    fn new(priority: Vec<TokenKind>) -> Self {
        let recognizers = priority.iter().map(|k| dfa_for(*k)).collect();
        let alive = vec![true; priority.len()];
        Self {
            priority,
            recognizers,
            alive,
            current: Summary::default(),
            previous: Summary::default(),
            kit_log: DfaKitLog::new(),
        }
    }

    fn reset_all(&mut self) {
        for r in &mut self.recognizers {
            r.reset();
        }
        self.alive.iter_mut().for_each(|a| *a = true);
        self.current = Summary::default();
        self.previous = Summary::default();
    }

    fn step(&mut self, c: char) {
        for i in 0..self.recognizers.len() {
            if !self.alive[i] {
                continue;
            }
            let state = self.recognizers[i].step(c);
            self.kit_log.trace_step(self.priority[i], c, state);
            match state {
                DfaState::Invalid => self.alive[i] = false,
                DfaState::Intermediate => {
                    self.current.any_intermediate = true;
                    self.current.winning_intermediate = Some(self.priority[i]);
                }
                DfaState::Valid => {
                    self.current.any_valid = true;
                    self.current.winning_valid = Some(self.priority[i]);
                }
            }
        }
    }

    fn rotate(&mut self) {
        self.previous = self.current;
        self.current = Summary::default();
    }
}

/// Maximal-munch tokenizer: runs every recognizer in lockstep and
/// commits to the longest valid prefix, re-feeding the one
/// not-yet-consumed character into the next call.
pub struct Lexer {
    manager: ParallelDfaManager,
    pos: Position,
    pending: Option<(char, Position)>,
    log: OnceCell<Log<&'static str>>,
}

impl Lexer {
    pub fn new(priority: Vec<TokenKind>) -> Self {
        Self {
            manager: ParallelDfaManager::new(priority),
            pos: Position::default(),
            pending: None,
            log: OnceCell::new(),
        }
    }

    /// A lexer configured with the recommended priority order.
    pub fn with_default_priority() -> Self {
        Self::new(default_priority())
    }

    /// Sets the log label on the DFA kit's own diagnostic channel (the
    /// per-recognizer step trace), distinct from the lexer's own
    /// commit/error channel reachable via [`DebugLog::set_log`].
    pub fn set_dfa_log(&self, label: Log<&'static str>) {
        self.manager.kit_log.set_log(label);
    }

    pub fn read_token(&mut self, source: &mut CodeStream) -> Result<Token, LexError> {
        let start_pos = self.pending.map(|(_, p)| p).unwrap_or(self.pos);
        self.manager.reset_all();
        let mut lexeme = String::new();

        loop {
            let (c, at) = match self.pending.take() {
                Some(pair) => pair,
                None => match source.read() {
                    Some(c) => {
                        let at = self.pos.advance(c);
                        (c, at)
                    }
                    None => {
                        if lexeme.is_empty() {
                            let tok = Token::new(TokenKind::Eof, String::new(), start_pos);
                            self.log_commit(start_pos, &tok.kind);
                            return Ok(tok);
                        }
                        return self.commit(self.manager.previous, lexeme, start_pos);
                    }
                },
            };
            lexeme.push(c);
            self.manager.step(c);
            if self.manager.current.all_invalid() {
                lexeme.pop();
                self.pending = Some((c, at));
                return self.commit(self.manager.previous, lexeme, start_pos);
            }
            self.manager.rotate();
        }
    }

    fn commit(
        &mut self,
        summary: Summary,
        lexeme: String,
        start_pos: Position,
    ) -> Result<Token, LexError> {
        if summary.any_valid {
            let kind = summary.winning_valid.expect("any_valid implies a winner");
            let tok = Token::new(kind, lexeme, start_pos);
            self.log_commit(start_pos, &tok.kind);
            Ok(tok)
        } else if summary.any_intermediate {
            let best_guess_kind = summary
                .winning_intermediate
                .expect("any_intermediate implies a winner");
            let err = LexError::UnterminatedToken {
                best_guess_kind,
                pos: start_pos,
            };
            self.log_error(start_pos, &err);
            Err(err)
        } else {
            let err = LexError::UnrecognizedCharacter { pos: start_pos };
            self.log_error(start_pos, &err);
            Err(err)
        }
    }
}

impl DebugLog for Lexer {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::with_default_priority();
        let mut stream = CodeStream::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.read_token(&mut stream).expect("lex error");
            let eof = tok.kind == TokenKind::Eof;
            out.push(tok);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn lexemes_cover_input_exactly() {
        let src = "var x = 1 + 2;\n";
        let tokens = lex_all(src);
        let joined: String = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn token_ending_exactly_at_eof_commits_instead_of_erroring() {
        // Regression: `read_token` used to commit from the manager's
        // *current* summary (always `Summary::default()` at this point,
        // since the last `rotate()` had already reset it and no further
        // `step()` ran) rather than `previous` when the source ran out
        // mid-commit. Every token ending exactly at end-of-input was
        // misreported as `UnrecognizedCharacter`.
        let tokens = lex_all("42");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn trailing_newline_at_eof_commits() {
        let tokens = lex_all("x\n");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[1].lexeme, "\n");
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn dfa_kit_log_can_be_set_and_traces_steps() {
        let mut lexer = Lexer::with_default_priority();
        lexer.set_dfa_log(Log::Verbose("dfa"));
        assert_eq!(
            lexer.manager.kit_log.log_cell().get(),
            Some(&Log::Verbose("dfa"))
        );
        let mut stream = CodeStream::new("1");
        lexer.read_token(&mut stream).expect("lex error");
    }

    #[test]
    fn lexer_log_channel_can_be_set() {
        let lexer = Lexer::with_default_priority();
        lexer.set_log(Log::Success("lex"));
        assert_eq!(lexer.log_cell().get(), Some(&Log::Success("lex")));
    }

    #[test]
    fn keyword_beats_identifier() {
        let tokens = lex_all("while");
        assert_eq!(tokens[0].kind, TokenKind::While);
        let tokens = lex_all("whiles");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn eq_vs_eqeq() {
        assert_eq!(lex_all("=")[0].kind, TokenKind::Eq);
        assert_eq!(lex_all("==")[0].kind, TokenKind::EqEq);
    }

    #[test]
    fn number_dot_requires_trailing_digit() {
        let tokens = lex_all("123.45");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "123.45");

        let mut lexer = Lexer::with_default_priority();
        let mut stream = CodeStream::new("123.");
        let err = lexer.read_token(&mut stream).unwrap_err();
        match err {
            LexError::UnterminatedToken { best_guess_kind, .. } => {
                assert_eq!(best_guess_kind, TokenKind::Number);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn string_with_embedded_quotes_is_verbatim() {
        let tokens = lex_all("\"hi\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "\"hi\"");
    }

    #[test]
    fn eof_is_stable_across_repeated_calls() {
        let mut lexer = Lexer::with_default_priority();
        let mut stream = CodeStream::new("");
        let first = lexer.read_token(&mut stream).unwrap();
        let second = lexer.read_token(&mut stream).unwrap();
        assert_eq!(first.kind, TokenKind::Eof);
        assert_eq!(second.kind, TokenKind::Eof);
    }

    #[test]
    fn comment_run_to_end_of_line() {
        let tokens = lex_all("// hello\nx");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].lexeme, "// hello");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn newline_run_is_one_token() {
        let tokens = lex_all("\n\n\nx");
        assert_eq!(tokens[0].kind, TokenKind::Newline);
        assert_eq!(tokens[0].lexeme, "\n\n\n");
    }

    #[test]
    fn unrecognized_character_reports_position() {
        let mut lexer = Lexer::with_default_priority();
        let mut stream = CodeStream::new("@");
        let err = lexer.read_token(&mut stream).unwrap_err();
        assert!(matches!(err, LexError::UnrecognizedCharacter { .. }));
    }
}
