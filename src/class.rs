use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Error;
use crate::function::Function;
use crate::object::Object;
use crate::token::Token;

// The instance stores the state, the class stores the behaviour.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<RefCell<LoxClass>>>,
    pub methods: HashMap<String, Function>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<RefCell<LoxClass>>>,
        methods: HashMap<String, Function>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Looks up `name` on this class, then walks up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.borrow().find_method(name))
    }

    /// A class's arity is its initializer's, or 0 if it has none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<RefCell<LoxClass>>,
    fields: HashMap<String, Object>,
}

impl LoxInstance {
    // Returns a new `LoxInstance` wrapped in an `Object::Instance`
    pub fn new(class: &Rc<RefCell<LoxClass>>) -> Object {
        let instance = LoxInstance {
            class: Rc::clone(class),
            fields: HashMap::new(),
        };

        Object::Instance(Rc::new(RefCell::new(instance)))
    }

    // Returns a member field of this instance.
    // instance - A reference to this instance as an object.
    pub fn get(&self, name: &Token, instance: &Object) -> Result<Object, Error> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            Ok(field.clone())
        } else if let Some(method) = self.class.borrow().find_method(&name.lexeme) {
            Ok(Object::Callable(method.bind(instance.clone())))
        } else {
            Err(Error::Runtime {
                token: name.clone(),
                message: format!("Undefined property '{}'.", name.lexeme),
            })
        }
    }

    // Since Lox allows freely creating new fields on instances, there’s no need
    // to see if the key is already present.
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_class(name: &str, superclass: Option<Rc<RefCell<LoxClass>>>) -> Rc<RefCell<LoxClass>> {
        Rc::new(RefCell::new(LoxClass::new(
            name.to_string(),
            superclass,
            HashMap::new(),
        )))
    }

    #[test]
    fn find_method_walks_superclass_chain() {
        let mut base_methods = HashMap::new();
        base_methods.insert(
            "greet".to_string(),
            Function::native("greet", 0, Rc::new(|_: &[Object]| Object::Null)),
        );
        let base = Rc::new(RefCell::new(LoxClass::new(
            "Base".to_string(),
            None,
            base_methods,
        )));
        let derived = make_class("Derived", Some(Rc::clone(&base)));

        assert!(derived.borrow().find_method("greet").is_some());
        assert!(derived.borrow().find_method("missing").is_none());
    }

    #[test]
    fn arity_without_init_is_zero() {
        let class = make_class("NoInit", None);
        assert_eq!(class.borrow().arity(), 0);
    }
}
