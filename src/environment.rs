use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{error::Error, object::Object, token::Token};

pub struct Environment {
    values: HashMap<String, Object>,
    enclosing: Option<Rc<RefCell<Environment>>>, // Parent-pointer
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn from(enclosing: &Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }
    }

    /// Unconditionally binds (or rebinds) `name` in *this* scope. Inner
    /// scopes rely on the resolver to reject re-declaration; the top level
    /// allows redefinition so the REPL can redeclare freely.
    pub fn define(&mut self, name: String, value: Object) {
        self.values.insert(name, value);
    }

    /// Dynamic lookup: search this scope, then each enclosing scope in turn.
    /// Used for globals, where the resolver leaves the reference unresolved
    /// so that forward references between top-level declarations work.
    pub fn get(&self, name: &Token) -> Result<Object, Error> {
        let key = &*name.lexeme;
        if let Some(value) = self.values.get(key) {
            Ok(value.clone())
        } else if let Some(ref enclosing) = self.enclosing {
            // Recursion reads nicer than an explicit loop here and the
            // chain is bounded by lexical nesting depth, not input size.
            enclosing.borrow().get(name)
        } else {
            Err(Error::Runtime {
                token: name.clone(),
                message: format!("Undefined variable '{key}'."),
            })
        }
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), Error> {
        let key = &*name.lexeme;
        if self.values.contains_key(key) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(Error::Runtime {
                token: name.clone(),
                message: format!("Undefined variable '{key}'."),
            })
        }
    }

    /// Walks `distance` parent links starting from `env`. The resolver
    /// guarantees this always lands on a scope that declares `name`, so a
    /// missing link or missing key here indicates a resolver bug, not a Lox
    /// program error.
    pub fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            let next = current
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-reported distance exceeds the environment chain");
            current = next;
        }
        current
    }

    /// Reads `name` directly out of the scope `distance` links up, bypassing
    /// the dynamic walk `get` does for globals.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
    ) -> Result<Object, Error> {
        let target = Self::ancestor(env, distance);
        let value = target.borrow().values.get(&name.lexeme).cloned();
        value.ok_or_else(|| Error::Runtime {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Object,
    ) -> Result<(), Error> {
        let target = Self::ancestor(env, distance);
        target.borrow_mut().values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    /// Plain-name read with no error path, for internal bookkeeping (e.g.
    /// pulling `this` back out of an initializer's own closure) where the
    /// binding's presence is a structural guarantee, not something a Lox
    /// program could have left undefined.
    pub fn read_here(env: &Rc<RefCell<Environment>>, name: &str) -> Option<Object> {
        env.borrow().values.get(name).cloned()
    }
}
