//! Ambient utilities shared across the lexer, grammar pipeline and parser.

pub mod logger;

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Opt-in debug-trace verbosity, ordered `None < Default < Success < Result
/// < Verbose`. Stored in a `once_cell::unsync::OnceCell` on each
/// recognizer/lexer/parser, gated behind `#[cfg(debug_assertions)]`,
/// printed with `println!` rather than a `log`/`tracing` dependency.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T> Default for Log<T> {
    fn default() -> Self {
        Log::None
    }
}

impl<T> Log<T> {
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}
