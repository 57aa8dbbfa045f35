use std::fmt::Debug;

use once_cell::unsync::OnceCell;

use super::Log;
use crate::position::Position;

/// A `debug_assertions`-gated trace channel, implemented by the lexer and
/// the streaming parser, tracing `Position`/`Token` pairs.
pub trait DebugLog {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>>;

    fn set_log(&self, label: Log<&'static str>) {
        let _ = self.log_cell().set(label);
    }

    fn log_commit<T: Debug>(&self, _pos: Position, _kind: &T) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log_cell().get() {
            if label.order() >= Log::Success(()).order() {
                println!("[{}; commit]: {:?} at {}", label, _kind, _pos);
            }
        }
    }

    fn log_error<E: Debug>(&self, _pos: Position, _err: &E) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log_cell().get() {
            if label.order() >= Log::Result(()).order() {
                println!("[{}; error]: {:?} at {}", label, _err, _pos);
            }
        }
    }

    fn log_enter(&self, _what: &str) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.log_cell().get() {
            if label.order() >= Log::Verbose(()).order() {
                println!("[{}; enter]: {}", label, _what);
            }
        }
    }
}
