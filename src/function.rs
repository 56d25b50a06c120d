use crate::environment::Environment;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::syntax::stmt::Stmt;
use crate::token::Token;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type NativeBody = Rc<dyn Fn(&[Object]) -> Object>;

#[derive(Clone)]
pub enum Function {
    // These are functions that the interpreter exposes to user code but that
    // are implemented in the host language. Sometimes these are called
    // primitives, external functions, or foreign functions. To add a native
    // function, the book uses anonymous class instances that implement the
    // LoxCallable interface; here an `Rc<dyn Fn>` plays that role, which also
    // lets natives close over interpreter-independent state if they need to.
    Native {
        name: String,
        arity: usize,
        body: NativeBody,
    },

    // LoxFunction in the book.
    User {
        name: Token,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    },
}

impl Function {
    pub fn native(name: &str, arity: usize, body: NativeBody) -> Self {
        Function::Native {
            name: name.to_string(),
            arity,
            body,
        }
    }

    // We pass in the interpreter in case the implementation needs it, plus
    // the list of already-evaluated argument values.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Object]) -> Result<Object, Error> {
        match self {
            Function::Native { body, .. } => Ok(body(arguments)),
            Function::User {
                params,
                body,
                closure,
                is_initializer,
                ..
            } => {
                // Each call gets its own environment nested under the
                // closure. Otherwise recursion (and re-entrant calls to the
                // same function) would all share one set of locals.
                let environment = Rc::new(RefCell::new(Environment::from(closure)));
                for (param, argument) in params.iter().zip(arguments.iter()) {
                    environment
                        .borrow_mut()
                        .define(param.lexeme.clone(), argument.clone());
                }

                match interpreter.execute_block(body, environment) {
                    // `init` always yields the instance, regardless of what
                    // (if anything) it explicitly returns.
                    Err(Error::Return { .. }) | Ok(()) if *is_initializer => {
                        Ok(Environment::read_here(closure, "this")
                            .expect("bound initializer closures always define 'this'"))
                    }
                    Err(Error::Return { value }) => Ok(value),
                    Err(other) => Err(other),
                    Ok(()) => Ok(Object::Null),
                }
            }
        }
    }

    // Creates a new environment nested inside the method's original closure
    // and binds `this` there. That becomes the method body's parent
    // environment the next time it's called.
    pub fn bind(&self, instance: Object) -> Self {
        match self {
            Function::Native { .. } => unreachable!("native functions are never bound"),
            Function::User {
                name,
                params,
                body,
                closure,
                is_initializer,
            } => {
                let environment = Rc::new(RefCell::new(Environment::from(closure)));
                environment
                    .borrow_mut()
                    .define("this".to_string(), instance);
                Function::User {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: environment,
                    is_initializer: *is_initializer,
                }
            }
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Native { arity, .. } => *arity,
            Function::User { params, .. } => params.len(),
        }
    }

    pub fn identity_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native { body: left, .. }, Function::Native { body: right, .. }) => {
                Rc::ptr_eq(left, right)
            }
            (
                Function::User { closure: left, .. },
                Function::User { closure: right, .. },
            ) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native { .. } => write!(f, "<native fn>"),
            Function::User { name, .. } => write!(f, "<fn {}>", name.lexeme),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native { name, .. } => write!(f, "Function::Native({name})"),
            Function::User { name, .. } => write!(f, "Function::User({})", name.lexeme),
        }
    }
}
