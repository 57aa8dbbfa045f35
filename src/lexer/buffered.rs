//! Buffered lexer: a checkpoint/rollback presentation over the raw lexer,
//! plus a small 3-slot peek/shift convenience built on top of it.
//!
//! The checkpoint/rollback surface is what the streaming parser's
//! panic-mode recovery and the grammar-file parser's lookahead actually
//! need; the fixed 3-slot window is kept as [`PeekWindow`] for callers
//! that only ever need to look one token ahead or behind.

use crate::error::LexError;
use crate::lexer::{CodeStream, Lexer};
use crate::token::Token;

/// An opaque position in a [`CheckpointLexer`]'s buffer, returned by
/// [`CheckpointLexer::checkpoint`] and consumed by
/// [`CheckpointLexer::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(isize);

/// A bounded ring over the raw lexer providing
/// `read`/`checkpoint`/`rollback`/`clear`. Errors returned by the lexer
/// are buffered alongside tokens and replayed in order, exactly like
/// tokens.
pub struct CheckpointLexer<'s> {
    lexer: Lexer,
    source: CodeStream<'s>,
    buffer: Vec<Result<Token, LexError>>,
    capacity: usize,
    index: isize,
}

impl<'s> CheckpointLexer<'s> {
    pub fn new(lexer: Lexer, source: CodeStream<'s>, capacity: usize) -> Self {
        Self {
            lexer,
            source,
            buffer: Vec::with_capacity(capacity.min(64)),
            capacity,
            index: -1,
        }
    }

    fn points_to_buffered(&self) -> bool {
        self.index >= 0 && (self.index as usize) < self.buffer.len()
    }

    pub fn read(&mut self) -> Result<Token, LexError> {
        self.index += 1;
        if self.points_to_buffered() {
            return self.buffer[self.index as usize].clone();
        }
        if self.buffer.len() == self.capacity {
            return Err(LexError::BufferOverflow);
        }
        let result = self.lexer.read_token(&mut self.source);
        self.buffer.push(result.clone());
        result
    }

    /// Peek the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token, LexError> {
        let mark = self.checkpoint();
        let tok = self.read();
        self.rollback(mark);
        tok
    }

    pub fn checkpoint(&self) -> Mark {
        Mark(self.index)
    }

    pub fn rollback(&mut self, mark: Mark) {
        self.index = mark.0;
    }

    pub fn clear(&mut self) {
        self.index = -1;
        self.buffer.clear();
    }
}

/// A fixed 3-slot peek/shift window built on a [`CheckpointLexer`]:
/// `consume`/`peek_current`/`peek_next`/`peek_previous`, kept as a
/// convenience rather than the sole public surface.
pub struct PeekWindow<'s> {
    lexer: CheckpointLexer<'s>,
    previous: Option<Result<Token, LexError>>,
}

impl<'s> PeekWindow<'s> {
    pub fn new(lexer: CheckpointLexer<'s>) -> Self {
        Self {
            lexer,
            previous: None,
        }
    }

    pub fn consume(&mut self) -> Result<Token, LexError> {
        let tok = self.lexer.read();
        self.previous = Some(tok.clone());
        tok
    }

    pub fn peek_current(&mut self) -> Result<Token, LexError> {
        self.lexer.peek()
    }

    pub fn peek_next(&mut self) -> Result<Token, LexError> {
        let mark = self.lexer.checkpoint();
        let _current = self.lexer.read();
        let next = self.lexer.read();
        self.lexer.rollback(mark);
        next
    }

    pub fn peek_previous(&self) -> Option<Result<Token, LexError>> {
        self.previous.clone()
    }
}
