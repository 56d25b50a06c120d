pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod syntax;
pub mod token;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

pub use error::Error;
pub use interpreter::Interpreter;
pub use parser::Parser;
pub use resolver::Resolver;
pub use scanner::Scanner;

/// Runs one compilation unit through the full pipeline: scan, parse,
/// resolve, evaluate. Shared by the binary's file/REPL modes and by
/// integration tests, which pass their own `output` sink instead of stdout.
/// `repl` controls whether a bare expression statement's value is printed
/// (the one behavior that differs between REPL and file mode).
pub fn run(source: String, interpreter: &mut Interpreter, repl: bool) -> Result<(), Error> {
    interpreter.set_repl_mode(repl);

    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan_tokens();

    let mut parser = Parser::new(tokens);
    let statements = parser.parse()?;

    if error::had_static_error() {
        log::warn!("aborting before evaluation: static errors were reported during parsing");
        return Ok(());
    }

    // The resolver has a reference to the interpreter and pokes resolution
    // data directly into it as it walks over variables. When the
    // interpreter runs next, it has everything it needs.
    let mut resolver = Resolver::new(interpreter);
    resolver.resolve_stmts(&statements);

    if error::had_static_error() {
        log::warn!("aborting before evaluation: static errors were reported during resolution");
        return Ok(());
    }

    interpreter.interpret(&statements)
}

/// Convenience constructor for tests that want to assert on captured
/// `print` output instead of the real stdout.
pub fn interpreter_with_output(output: Rc<RefCell<dyn Write>>) -> Interpreter {
    Interpreter::with_output(output)
}
