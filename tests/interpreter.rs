use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use lox_interpreter_rs::error::{self, Error};
use lox_interpreter_rs::{interpreter_with_output, run};

/// Runs `source` against a fresh interpreter and returns (captured stdout,
/// pipeline result). Resets the process-wide error flags first so tests
/// don't see state left behind by a previous one. Mirrors what `main.rs`
/// does with a runtime error: report it (setting the flag the same way
/// `error::runtime_error` would) and fold it into `Ok(())` rather than
/// surfacing the `Error` value, since by this point it's already been
/// converted into process state.
fn run_source(source: &str) -> (String, Result<(), Error>) {
    run_source_mode(source, false)
}

/// Same as `run_source`, but lets a test pick REPL mode to exercise the
/// bare-expression-statement auto-print.
fn run_source_mode(source: &str, repl: bool) -> (String, Result<(), Error>) {
    error::reset();
    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = interpreter_with_output(Rc::clone(&sink) as Rc<RefCell<dyn std::io::Write>>);
    let result = match run(source.to_string(), &mut interpreter, repl) {
        Err(Error::Runtime { token, message }) => {
            error::runtime_error(&token, &message);
            Ok(())
        }
        other => other,
    };
    let output = String::from_utf8(sink.borrow().clone()).expect("print output is valid utf8");
    (output, result)
}

#[test]
fn arithmetic_respects_precedence() {
    let (output, result) = run_source("print 1 + 2 * 3;");
    assert!(result.is_ok());
    assert_eq!(output, "7\n");
}

#[test]
fn strings_concatenate_with_plus() {
    let (output, result) = run_source(r#"var a = "hi"; var b = " there"; print a + b;"#);
    assert!(result.is_ok());
    assert_eq!(output, "hi there\n");
}

#[test]
fn recursive_fibonacci() {
    let source = "fun fib(n){ if (n < 2) return n; return fib(n-1) + fib(n-2); } print fib(10);";
    let (output, result) = run_source(source);
    assert!(result.is_ok());
    assert_eq!(output, "55\n");
}

#[test]
fn closures_capture_their_own_environment() {
    let source = "fun make(){ var i = 0; fun inc(){ i = i + 1; return i; } return inc; } \
                  var c = make(); print c(); print c(); print c();";
    let (output, result) = run_source(source);
    assert!(result.is_ok());
    assert_eq!(output, "1\n2\n3\n");
}

#[test]
fn methods_are_bound_to_their_instance() {
    let source = r#"class Greeter { greet(name) { print "Hello, " + name; } } Greeter().greet("world");"#;
    let (output, result) = run_source(source);
    assert!(result.is_ok());
    assert_eq!(output, "Hello, world\n");
}

#[test]
fn super_calls_reach_the_parent_method() {
    let source = r#"class A { m() { print "A"; } } class B < A { m() { super.m(); print "B"; } } B().m();"#;
    let (output, result) = run_source(source);
    assert!(result.is_ok());
    assert_eq!(output, "A\nB\n");
}

#[test]
fn unary_minus_on_a_string_is_a_runtime_error() {
    let (_output, result) = run_source(r#"print -"s";"#);
    assert!(matches!(result, Ok(())));
    assert!(error::had_runtime_error());
    assert!(!error::had_static_error());
}

#[test]
fn variable_cannot_read_itself_in_its_own_initializer() {
    // Only a local-scope diagnostic: the resolver doesn't track the global
    // scope, so this has to happen inside a block to actually trigger it.
    let (_output, result) = run_source("{ var x = x; }");
    assert!(matches!(result, Ok(())));
    assert!(error::had_static_error());
}

#[test]
fn a_class_cannot_inherit_from_itself() {
    let (_output, result) = run_source("class Foo < Foo {}");
    assert!(matches!(result, Ok(())));
    assert!(error::had_static_error());
}

#[test]
fn top_level_return_is_a_static_error() {
    let (_output, result) = run_source("return 1;");
    assert!(matches!(result, Ok(())));
    assert!(error::had_static_error());
}

#[test]
fn nan_is_not_equal_to_itself_end_to_end() {
    let (output, result) = run_source("var n = 0/0; print n == n;");
    assert!(result.is_ok());
    assert_eq!(output, "false\n");
}

#[test]
fn bound_methods_are_not_identical_across_lookups() {
    let source = r#"class Box { get() { return 1; } } var b = Box(); print b.get == b.get;"#;
    let (output, result) = run_source(source);
    assert!(result.is_ok());
    assert_eq!(output, "false\n");
}

#[test]
fn repl_mode_auto_prints_a_bare_expression_statement() {
    let (output, result) = run_source_mode("1 + 2;", true);
    assert!(result.is_ok());
    assert_eq!(output, "3\n");
}

#[test]
fn file_mode_does_not_auto_print_a_bare_expression_statement() {
    let (output, result) = run_source_mode("1 + 2;", false);
    assert!(result.is_ok());
    assert_eq!(output, "");
}
