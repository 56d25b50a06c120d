use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::Error;
use crate::function::Function;
use crate::object::Object;
use crate::syntax::{expr, stmt};
use crate::syntax::{Expr, LiteralValue, Stmt};
use crate::token::{Token, TokenType};

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    // Populated by the resolver: node id -> number of environments to walk
    // outward before the binding is found. A variable absent from this map
    // is assumed global and is looked up dynamically instead.
    locals: HashMap<u32, usize>,
    output: Rc<RefCell<dyn Write>>,
    // REPL mode is the one place a bare expression statement's value is
    // printed instead of discarded; file mode always leaves this false.
    repl: bool,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Lets callers (tests, embedders) capture `print` output instead of
    /// writing to the process's real stdout.
    pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        define_natives(&globals);
        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            repl: false,
        }
    }

    /// Toggles the REPL's bare-expression-statement auto-print. Off by
    /// default, since file mode never does this.
    pub fn set_repl_mode(&mut self, repl: bool) {
        self.repl = repl;
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    /// Called by the resolver while it walks the tree; has nothing to do
    /// with evaluation itself.
    pub fn resolve(&mut self, id: u32, depth: usize) {
        self.locals.insert(id, depth);
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), Error> {
        statement.accept(self)
    }

    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Error> {
        let previous = Rc::clone(&self.environment);
        self.environment = environment;

        // Restore the enclosing environment on every exit path, including
        // the early return a `return` statement or a propagated error takes.
        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object, Error> {
        expr.accept(self)
    }

    fn lookup_variable(&mut self, id: u32, name: &Token) -> Result<Object, Error> {
        if let Some(&distance) = self.locals.get(&id) {
            Environment::get_at(&self.environment, distance, name)
        } else {
            self.globals.borrow().get(name)
        }
    }

    fn number_operand_error<R>(&self, operator: &Token) -> Result<R, Error> {
        Err(Error::Runtime {
            token: operator.clone(),
            message: "Operand must be a number.".to_string(),
        })
    }

    fn number_operands_error<R>(&self, operator: &Token) -> Result<R, Error> {
        Err(Error::Runtime {
            token: operator.clone(),
            message: "Operands must be numbers.".to_string(),
        })
    }
}

fn define_natives(globals: &Rc<RefCell<Environment>>) {
    globals.borrow_mut().define(
        "clock".to_string(),
        Object::Callable(Function::native(
            "clock",
            0,
            Rc::new(|_args: &[Object]| {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("system clock before the epoch")
                    .as_secs_f64();
                Object::Number(now)
            }),
        )),
    );

    globals.borrow_mut().define(
        "string".to_string(),
        Object::Callable(Function::native(
            "string",
            1,
            Rc::new(|args: &[Object]| Object::String(args[0].to_string())),
        )),
    );
}

impl expr::Visitor<Result<Object, Error>> for Interpreter {
    fn visit_literal_expr(&mut self, value: &LiteralValue) -> Result<Object, Error> {
        Ok(match value {
            LiteralValue::Boolean(b) => Object::Boolean(*b),
            LiteralValue::Null => Object::Null,
            LiteralValue::Number(n) => Object::Number(*n),
            LiteralValue::String(s) => Object::String(s.clone()),
        })
    }

    fn visit_grouping_expr(&mut self, expression: &Expr) -> Result<Object, Error> {
        self.evaluate(expression)
    }

    fn visit_unary_expr(&mut self, operator: &Token, right: &Expr) -> Result<Object, Error> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::Minus => match right {
                Object::Number(n) => Ok(Object::Number(-n)),
                _ => self.number_operand_error(operator),
            },
            TokenType::Bang => Ok(Object::Boolean(!right.is_truthy())),
            _ => unreachable!("unary parser only produces '-' and '!'"),
        }
    }

    fn visit_binary_expr(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Object, Error> {
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;

        match operator.token_type {
            TokenType::Minus => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Number(left_num - right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::Slash => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Number(left_num / right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::Star => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Number(left_num * right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::Plus => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Number(left_num + right_num))
                }
                (Object::String(left_str), Object::String(right_str)) => {
                    Ok(Object::String(left_str + &right_str))
                }
                _ => Err(Error::Runtime {
                    token: operator.clone(),
                    message: "Operands must be two numbers or two strings.".to_string(),
                }),
            },
            TokenType::GreaterEqual => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Boolean(left_num >= right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::Greater => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Boolean(left_num > right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::LessEqual => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Boolean(left_num <= right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::Less => match (l, r) {
                (Object::Number(left_num), Object::Number(right_num)) => {
                    Ok(Object::Boolean(left_num < right_num))
                }
                _ => self.number_operands_error(operator),
            },
            TokenType::BangEqual => Ok(Object::Boolean(!l.equals(&r))),
            TokenType::EqualEqual => Ok(Object::Boolean(l.equals(&r))),
            _ => unreachable!("term()/factor()/comparison()/equality() only produce these operators"),
        }
    }

    fn visit_logical_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, Error> {
        let left = self.evaluate(left)?;

        // Short-circuit: `or` returns as soon as it finds a truthy operand,
        // `and` as soon as it finds a falsy one. Either way we return the
        // operand's actual value, not a coerced boolean.
        if operator.token_type == TokenType::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(right)
    }

    fn visit_variable_expr(&mut self, id: u32, name: &Token) -> Result<Object, Error> {
        self.lookup_variable(id, name)
    }

    fn visit_assign_expr(&mut self, id: u32, name: &Token, value: &Expr) -> Result<Object, Error> {
        let value = self.evaluate(value)?;

        if let Some(&distance) = self.locals.get(&id) {
            Environment::assign_at(&self.environment, distance, name, value.clone())?;
        } else {
            self.globals.borrow_mut().assign(name, value.clone())?;
        }

        Ok(value)
    }

    fn visit_call_expr(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Object, Error> {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let (function, arity) = match &callee {
            Object::Callable(function) => (function.clone(), function.arity()),
            Object::Class(class) => {
                let instance = LoxInstance::new(class);
                let arity = class.borrow().arity();
                if args.len() != arity {
                    return Err(Error::Runtime {
                        token: paren.clone(),
                        message: format!("Expected {arity} arguments but got {}.", args.len()),
                    });
                }
                if let Some(init) = class.borrow().find_method("init") {
                    init.bind(instance.clone()).call(self, &args)?;
                }
                return Ok(instance);
            }
            _ => {
                return Err(Error::Runtime {
                    token: paren.clone(),
                    message: "Can only call functions and classes.".to_string(),
                });
            }
        };

        if args.len() != arity {
            return Err(Error::Runtime {
                token: paren.clone(),
                message: format!("Expected {} arguments but got {}.", arity, args.len()),
            });
        }

        function.call(self, &args)
    }

    fn visit_get_expr(&mut self, object: &Expr, name: &Token) -> Result<Object, Error> {
        let object = self.evaluate(object)?;
        if let Object::Instance(instance) = &object {
            instance.borrow().get(name, &object)
        } else {
            Err(Error::Runtime {
                token: name.clone(),
                message: "Only instances have properties.".to_string(),
            })
        }
    }

    fn visit_set_expr(&mut self, object: &Expr, name: &Token, value: &Expr) -> Result<Object, Error> {
        let object = self.evaluate(object)?;

        let instance = if let Object::Instance(instance) = &object {
            instance
        } else {
            return Err(Error::Runtime {
                token: name.clone(),
                message: "Only instances have fields.".to_string(),
            });
        };

        let value = self.evaluate(value)?;
        instance.borrow_mut().set(name, value.clone());
        Ok(value)
    }

    fn visit_this_expr(&mut self, id: u32, keyword: &Token) -> Result<Object, Error> {
        self.lookup_variable(id, keyword)
    }

    fn visit_super_expr(&mut self, id: u32, keyword: &Token, method: &Token) -> Result<Object, Error> {
        let distance = *self
            .locals
            .get(&id)
            .expect("resolver always resolves 'super' as a local");

        let superclass = match Environment::get_at(&self.environment, distance, keyword)? {
            Object::Class(class) => class,
            _ => unreachable!("'super' always resolves to a class"),
        };

        // `this` lives one scope closer in than `super`, by construction of
        // the two nested scopes the resolver opens around a subclass's
        // methods.
        let this_token = Token::new(TokenType::This, "this", keyword.line);
        let instance = Environment::get_at(&self.environment, distance - 1, &this_token)?;

        let method = superclass.borrow().find_method(&method.lexeme).ok_or_else(|| Error::Runtime {
            token: method.clone(),
            message: format!("Undefined property '{}'.", method.lexeme),
        })?;

        Ok(Object::Callable(method.bind(instance)))
    }
}

impl stmt::Visitor<Result<(), Error>> for Interpreter {
    fn visit_expression_stmt(&mut self, expression: &Expr) -> Result<(), Error> {
        let value = self.evaluate(expression)?;
        if self.repl {
            let mut output = self.output.borrow_mut();
            writeln!(output, "{value}").expect("write to print sink");
        }
        Ok(())
    }

    fn visit_print_stmt(&mut self, expression: &Expr) -> Result<(), Error> {
        let value = self.evaluate(expression)?;
        let mut output = self.output.borrow_mut();
        writeln!(output, "{value}").expect("write to print sink");
        Ok(())
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: &Option<Expr>) -> Result<(), Error> {
        let value = match initializer {
            Some(expr) => self.evaluate(expr)?,
            None => Object::Null,
        };
        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        let environment = Rc::new(RefCell::new(Environment::from(&self.environment)));
        self.execute_block(statements, environment)
    }

    fn visit_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: &Option<Box<Stmt>>,
    ) -> Result<(), Error> {
        if self.evaluate(condition)?.is_truthy() {
            self.execute(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.execute(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> Result<(), Error> {
        while self.evaluate(condition)?.is_truthy() {
            self.execute(body)?;
        }
        Ok(())
    }

    fn visit_function_stmt(&mut self, name: &Token, params: &[Token], body: &[Stmt]) -> Result<(), Error> {
        let function = Function::User {
            name: name.clone(),
            params: params.to_vec(),
            body: Rc::new(body.to_vec()),
            closure: Rc::clone(&self.environment),
            is_initializer: false,
        };
        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), Object::Callable(function));
        Ok(())
    }

    fn visit_return_stmt(&mut self, _keyword: &Token, value: &Option<Expr>) -> Result<(), Error> {
        let value = match value {
            Some(expr) => self.evaluate(expr)?,
            None => Object::Null,
        };
        Err(Error::Return { value })
    }

    fn visit_class_stmt(&mut self, name: &Token, superclass: &Option<Expr>, methods: &[Stmt]) -> Result<(), Error> {
        let superclass_class = match superclass {
            Some(expr @ Expr::Variable { name: super_name, .. }) => {
                match self.evaluate(expr)? {
                    Object::Class(class) => Some(class),
                    _ => {
                        return Err(Error::Runtime {
                            token: super_name.clone(),
                            message: "Superclass must be a class.".to_string(),
                        });
                    }
                }
            }
            Some(expr) => unreachable!("the parser only ever produces Expr::Variable here: {expr:?}"),
            None => None,
        };

        // Declared before its methods are evaluated, in two steps, so a
        // method body can reference the class it belongs to recursively.
        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), Object::Null);

        let method_env = if let Some(superclass_class) = &superclass_class {
            let env = Rc::new(RefCell::new(Environment::from(&self.environment)));
            env.borrow_mut()
                .define("super".to_string(), Object::Class(Rc::clone(superclass_class)));
            env
        } else {
            Rc::clone(&self.environment)
        };

        let mut class_methods = HashMap::new();
        for method in methods {
            if let Stmt::Function { name, params, body } = method {
                let function = Function::User {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    closure: Rc::clone(&method_env),
                    is_initializer: name.lexeme == "init",
                };
                class_methods.insert(name.lexeme.clone(), function);
            } else {
                unreachable!("class body only ever contains Stmt::Function")
            }
        }

        let class = Rc::new(RefCell::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_class,
            class_methods,
        )));

        self.environment
            .borrow_mut()
            .assign(name, Object::Class(class))?;

        Ok(())
    }

    fn visit_null_stmt(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
