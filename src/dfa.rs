//! Character-class DFA kit.
//!
//! Each recognizer exposes a three-state contract: `step`/`reset`,
//! returning [`DfaState::Invalid`], [`DfaState::Intermediate`] or
//! [`DfaState::Valid`]. Recognizers are modeled as a tagged sum
//! ([`TokenDfa`]) rather than a boxed trait object, to avoid a
//! heap allocation per step.

use once_cell::unsync::OnceCell;

use crate::token::TokenKind;
use crate::util::logger::DebugLog;
use crate::util::Log;

/// The three observable outcomes of stepping a recognizer with one code
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfaState {
    Invalid,
    Intermediate,
    Valid,
}

impl DfaState {
    pub fn is_valid(self) -> bool {
        matches!(self, DfaState::Valid)
    }
    pub fn is_intermediate(self) -> bool {
        matches!(self, DfaState::Intermediate)
    }
    pub fn is_invalid(self) -> bool {
        matches!(self, DfaState::Invalid)
    }
}

/// The kit's shared diagnostic channel: traces every recognizer's state
/// transition at `Log::Verbose`, gated behind `#[cfg(debug_assertions)]`.
/// Owned by whichever component drives the recognizers in lockstep (the
/// parallel-DFA manager), set once via [`DebugLog::set_log`].
#[derive(Debug, Clone, Default)]
pub struct DfaKitLog {
    log: OnceCell<Log<&'static str>>,
}

impl DfaKitLog {
    pub fn new() -> Self {
        Self {
            log: OnceCell::new(),
        }
    }

    /// Traces one recognizer's step against one code point.
    pub fn trace_step(&self, kind: TokenKind, c: char, state: DfaState) {
        self.log_enter(&format!("{} step {:?} -> {:?}", kind, c, state));
    }
}

impl DebugLog for DfaKitLog {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

/// Matches one fixed code-point sequence exactly: `Intermediate` until the
/// last character, `Valid` once, `Invalid` afterwards. Backs every
/// single-/two-char operator, punctuation mark and keyword.
#[derive(Debug, Clone)]
pub struct LiteralDfa {
    chars: Vec<char>,
    index: Option<usize>,
}

impl LiteralDfa {
    pub fn new(literal: &str) -> Self {
        Self {
            chars: literal.chars().collect(),
            index: Some(0),
        }
    }

    pub fn step(&mut self, c: char) -> DfaState {
        let Some(i) = self.index else {
            return DfaState::Invalid;
        };
        if self.chars.get(i) == Some(&c) {
            if i == self.chars.len() - 1 {
                self.index = None;
                DfaState::Valid
            } else {
                self.index = Some(i + 1);
                DfaState::Intermediate
            }
        } else {
            self.index = None;
            DfaState::Invalid
        }
    }

    pub fn reset(&mut self) {
        self.index = Some(0);
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}
fn is_alnum(c: char) -> bool {
    c.is_ascii_alphanumeric()
}
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentifierState {
    Start,
    /// Saw one or more bare `_` with no alphabetic character yet; a bare
    /// underscore run is not a valid identifier on its own, so this state
    /// is Intermediate, not Valid, until an alphabetic character arrives.
    UnderscoreRun,
    Body,
    Dead,
}

/// `[A-Za-z][A-Za-z0-9_]*`, with a leading run of `_` tolerated only if an
/// alphabetic character eventually follows (a bare `_`, or `_123`, never
/// becomes `Valid`).
#[derive(Debug, Clone)]
pub struct IdentifierDfa {
    state: IdentifierState,
}

impl IdentifierDfa {
    pub fn new() -> Self {
        Self {
            state: IdentifierState::Start,
        }
    }

    pub fn step(&mut self, c: char) -> DfaState {
        self.state = match self.state {
            IdentifierState::Start => {
                if is_alpha(c) {
                    IdentifierState::Body
                } else if c == '_' {
                    IdentifierState::UnderscoreRun
                } else {
                    IdentifierState::Dead
                }
            }
            IdentifierState::UnderscoreRun => {
                if is_alpha(c) {
                    IdentifierState::Body
                } else if c == '_' {
                    IdentifierState::UnderscoreRun
                } else {
                    IdentifierState::Dead
                }
            }
            IdentifierState::Body => {
                if is_alnum(c) || c == '_' {
                    IdentifierState::Body
                } else {
                    IdentifierState::Dead
                }
            }
            IdentifierState::Dead => IdentifierState::Dead,
        };
        match self.state {
            IdentifierState::Start => unreachable!(),
            IdentifierState::UnderscoreRun => DfaState::Intermediate,
            IdentifierState::Body => DfaState::Valid,
            IdentifierState::Dead => DfaState::Invalid,
        }
    }

    pub fn reset(&mut self) {
        self.state = IdentifierState::Start;
    }
}

impl Default for IdentifierDfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberState {
    Start,
    BeforeDecimal,
    JustSawDot,
    AfterDecimal,
    Dead,
}

/// `[0-9]+(\.[0-9]+)?`. The character right after a bare `.` must be a
/// digit or the whole number dies (no trailing-dot numbers; `"123."`
/// surfaces as `UnterminatedToken`).
#[derive(Debug, Clone)]
pub struct NumberDfa {
    state: NumberState,
}

impl NumberDfa {
    pub fn new() -> Self {
        Self {
            state: NumberState::Start,
        }
    }

    pub fn step(&mut self, c: char) -> DfaState {
        self.state = match self.state {
            NumberState::Start => {
                if is_digit(c) {
                    NumberState::BeforeDecimal
                } else {
                    NumberState::Dead
                }
            }
            NumberState::BeforeDecimal => {
                if c == '.' {
                    NumberState::JustSawDot
                } else if is_digit(c) {
                    NumberState::BeforeDecimal
                } else {
                    NumberState::Dead
                }
            }
            NumberState::JustSawDot => {
                if is_digit(c) {
                    NumberState::AfterDecimal
                } else {
                    NumberState::Dead
                }
            }
            NumberState::AfterDecimal => {
                if is_digit(c) {
                    NumberState::AfterDecimal
                } else {
                    NumberState::Dead
                }
            }
            NumberState::Dead => NumberState::Dead,
        };
        match self.state {
            NumberState::Start => unreachable!(),
            NumberState::BeforeDecimal | NumberState::AfterDecimal => DfaState::Valid,
            NumberState::JustSawDot => DfaState::Intermediate,
            NumberState::Dead => DfaState::Invalid,
        }
    }

    pub fn reset(&mut self) {
        self.state = NumberState::Start;
    }
}

impl Default for NumberDfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringState {
    Start,
    Opened,
    Content,
    Closed,
    Dead,
}

/// `"` then any run of non-`"` code points then a closing `"`. No escape
/// processing.
#[derive(Debug, Clone)]
pub struct StringDfa {
    state: StringState,
}

impl StringDfa {
    pub fn new() -> Self {
        Self {
            state: StringState::Start,
        }
    }

    pub fn step(&mut self, c: char) -> DfaState {
        self.state = match self.state {
            StringState::Start => {
                if c == '"' {
                    StringState::Opened
                } else {
                    StringState::Dead
                }
            }
            StringState::Opened => {
                if c == '"' {
                    StringState::Closed
                } else {
                    StringState::Content
                }
            }
            StringState::Content => {
                if c == '"' {
                    StringState::Closed
                } else {
                    StringState::Content
                }
            }
            StringState::Closed | StringState::Dead => StringState::Dead,
        };
        match self.state {
            StringState::Start => unreachable!(),
            StringState::Opened | StringState::Content => DfaState::Intermediate,
            StringState::Closed => DfaState::Valid,
            StringState::Dead => DfaState::Invalid,
        }
    }

    pub fn reset(&mut self) {
        self.state = StringState::Start;
    }
}

impl Default for StringDfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentState {
    Start,
    FirstSlash,
    Body,
    Dead,
}

/// `//` followed by any run of non-newline code points. A newline
/// terminates the comment (`Invalid`, not `Valid`-then-reset): the
/// terminating newline itself is re-fed to the lexer as the start of the
/// next token.
#[derive(Debug, Clone)]
pub struct CommentDfa {
    state: CommentState,
}

impl CommentDfa {
    pub fn new() -> Self {
        Self {
            state: CommentState::Start,
        }
    }

    pub fn step(&mut self, c: char) -> DfaState {
        self.state = match self.state {
            CommentState::Start => {
                if c == '/' {
                    CommentState::FirstSlash
                } else {
                    CommentState::Dead
                }
            }
            CommentState::FirstSlash => {
                if c == '/' {
                    CommentState::Body
                } else {
                    CommentState::Dead
                }
            }
            CommentState::Body => {
                if c == '\n' {
                    CommentState::Dead
                } else {
                    CommentState::Body
                }
            }
            CommentState::Dead => CommentState::Dead,
        };
        match self.state {
            CommentState::Start => unreachable!(),
            CommentState::FirstSlash => DfaState::Intermediate,
            CommentState::Body => DfaState::Valid,
            CommentState::Dead => DfaState::Invalid,
        }
    }

    pub fn reset(&mut self) {
        self.state = CommentState::Start;
    }
}

impl Default for CommentDfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhitespaceState {
    Start,
    Blanks,
    Dead,
}

/// One or more Unicode whitespace code points, excluding `\n` (newline has
/// its own DFA and token kind).
#[derive(Debug, Clone)]
pub struct WhitespaceDfa {
    state: WhitespaceState,
}

impl WhitespaceDfa {
    pub fn new() -> Self {
        Self {
            state: WhitespaceState::Start,
        }
    }

    fn is_space_not_newline(c: char) -> bool {
        c.is_whitespace() && c != '\n'
    }

    pub fn step(&mut self, c: char) -> DfaState {
        self.state = match self.state {
            WhitespaceState::Start | WhitespaceState::Blanks => {
                if Self::is_space_not_newline(c) {
                    WhitespaceState::Blanks
                } else {
                    WhitespaceState::Dead
                }
            }
            WhitespaceState::Dead => WhitespaceState::Dead,
        };
        match self.state {
            WhitespaceState::Blanks => DfaState::Valid,
            WhitespaceState::Dead => DfaState::Invalid,
            WhitespaceState::Start => unreachable!(),
        }
    }

    pub fn reset(&mut self) {
        self.state = WhitespaceState::Start;
    }
}

impl Default for WhitespaceDfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NewlineState {
    Start,
    Run,
    Dead,
}

/// One or more `\n`. A maximal run of consecutive newlines (even across a
/// blank line) lexes as a single `Newline` token.
#[derive(Debug, Clone)]
pub struct NewlineDfa {
    state: NewlineState,
}

impl NewlineDfa {
    pub fn new() -> Self {
        Self {
            state: NewlineState::Start,
        }
    }

    pub fn step(&mut self, c: char) -> DfaState {
        self.state = match self.state {
            NewlineState::Start | NewlineState::Run => {
                if c == '\n' {
                    NewlineState::Run
                } else {
                    NewlineState::Dead
                }
            }
            NewlineState::Dead => NewlineState::Dead,
        };
        match self.state {
            NewlineState::Run => DfaState::Valid,
            NewlineState::Dead => DfaState::Invalid,
            NewlineState::Start => unreachable!(),
        }
    }

    pub fn reset(&mut self) {
        self.state = NewlineState::Start;
    }
}

impl Default for NewlineDfa {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder recognizer so `Eof` can occupy a uniform slot in the
/// priority list; it never matches anything (the `Eof` token is
/// synthesized directly by the lexer at end of input).
#[derive(Debug, Clone, Copy, Default)]
pub struct EofDfa;

impl EofDfa {
    pub fn step(&mut self, _c: char) -> DfaState {
        DfaState::Invalid
    }
    pub fn reset(&mut self) {}
}

/// Tagged sum over every concrete recognizer, presenting the `step`/`reset`
/// contract uniformly without a heap-allocated trait object per step.
#[derive(Debug, Clone)]
pub enum TokenDfa {
    Literal(LiteralDfa),
    Identifier(IdentifierDfa),
    Number(NumberDfa),
    Str(StringDfa),
    Comment(CommentDfa),
    Whitespace(WhitespaceDfa),
    Newline(NewlineDfa),
    Eof(EofDfa),
}

impl TokenDfa {
    pub fn step(&mut self, c: char) -> DfaState {
        match self {
            TokenDfa::Literal(d) => d.step(c),
            TokenDfa::Identifier(d) => d.step(c),
            TokenDfa::Number(d) => d.step(c),
            TokenDfa::Str(d) => d.step(c),
            TokenDfa::Comment(d) => d.step(c),
            TokenDfa::Whitespace(d) => d.step(c),
            TokenDfa::Newline(d) => d.step(c),
            TokenDfa::Eof(d) => d.step(c),
        }
    }

    pub fn reset(&mut self) {
        match self {
            TokenDfa::Literal(d) => d.reset(),
            TokenDfa::Identifier(d) => d.reset(),
            TokenDfa::Number(d) => d.reset(),
            TokenDfa::Str(d) => d.reset(),
            TokenDfa::Comment(d) => d.reset(),
            TokenDfa::Whitespace(d) => d.reset(),
            TokenDfa::Newline(d) => d.reset(),
            TokenDfa::Eof(d) => d.reset(),
        }
    }
}

/// Builds the recognizer for a given [`TokenKind`].
pub fn dfa_for(kind: TokenKind) -> TokenDfa {
    use TokenKind::*;
    match kind {
        Eof => TokenDfa::Eof(EofDfa),
        Identifier => TokenDfa::Identifier(IdentifierDfa::new()),
        String => TokenDfa::Str(StringDfa::new()),
        Number => TokenDfa::Number(NumberDfa::new()),
        Comment => TokenDfa::Comment(CommentDfa::new()),
        Whitespace => TokenDfa::Whitespace(WhitespaceDfa::new()),
        Newline => TokenDfa::Newline(NewlineDfa::new()),
        Epsilon => TokenDfa::Eof(EofDfa), // never stepped; Epsilon is a grammar-table-only sentinel
        other => TokenDfa::Literal(LiteralDfa::new(other.name())),
    }
}
