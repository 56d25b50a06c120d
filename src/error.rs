use std::sync::atomic::{AtomicBool, Ordering};

use crate::object::Object;
use crate::token::{Token, TokenType};

// Process-wide, but (per the single-threaded execution model) never
// concurrently accessed. A REPL line clears these before running the next
// line; file mode reads them once after `run` returns.
static HAD_STATIC_ERROR: AtomicBool = AtomicBool::new(false);
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scan/parse/resolve error was already reported to stderr; this
    /// variant only unwinds the pipeline so the evaluator is skipped.
    #[error("parse error")]
    Parse,

    /// A type or binding precondition failed at evaluation time.
    #[error("{message}")]
    Runtime { token: Token, message: String },

    /// Non-local control transfer for `return`, not a user-facing error.
    #[error("return")]
    Return { value: Object },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn had_static_error() -> bool {
    HAD_STATIC_ERROR.load(Ordering::Relaxed)
}

pub fn had_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.load(Ordering::Relaxed)
}

/// Clears both flags; called between REPL lines so one bad line doesn't
/// poison the rest of the session.
pub fn reset() {
    HAD_STATIC_ERROR.store(false, Ordering::Relaxed);
    HAD_RUNTIME_ERROR.store(false, Ordering::Relaxed);
}

pub fn error(line: i32, message: &str) {
    report(line, "", message);
}

pub fn parser_error(token: &Token, message: &str) {
    if token.token_type == TokenType::Eof {
        report(token.line, " at end", message);
    } else {
        report(token.line, &format!(" at '{}'", token.lexeme), message);
    }
}

pub fn runtime_error(token: &Token, message: &str) {
    eprintln!("{message}\n[line {}]\n", token.line);
    HAD_RUNTIME_ERROR.store(true, Ordering::Relaxed);
}

fn report(line: i32, where_: &str, message: &str) {
    eprintln!("[line {line}] Error{where_}: {message}");
    HAD_STATIC_ERROR.store(true, Ordering::Relaxed);
}
