use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Null,
    Number(f64),
    String(String),
}

// We don't really need to generate these like they are generated using a
// script in the book: a hand-written sum type plus a hand-written Visitor
// is small enough here to just write out.
//
// `Variable`, `Assign`, `This`, and `Super` each carry a stable `id`,
// assigned once by the parser, so the resolver's side-table can key off an
// integer instead of the expression's (unstable, collision-prone) token.
#[derive(Debug, Clone)]
pub enum Expr {
    Assign {
        id: u32,
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: LiteralValue,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    Super {
        id: u32,
        keyword: Token,
        method: Token,
    },
    This {
        id: u32,
        keyword: Token,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        id: u32,
        name: Token,
    },
}

pub mod expr {
    use super::{Expr, LiteralValue};
    use crate::token::Token;

    pub trait Visitor<R> {
        fn visit_assign_expr(&mut self, id: u32, name: &Token, value: &Expr) -> R;
        fn visit_binary_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
        fn visit_call_expr(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> R;
        fn visit_get_expr(&mut self, object: &Expr, name: &Token) -> R;
        fn visit_grouping_expr(&mut self, expression: &Expr) -> R;
        fn visit_literal_expr(&mut self, value: &LiteralValue) -> R;
        fn visit_logical_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
        fn visit_set_expr(&mut self, object: &Expr, name: &Token, value: &Expr) -> R;
        fn visit_super_expr(&mut self, id: u32, keyword: &Token, method: &Token) -> R;
        fn visit_this_expr(&mut self, id: u32, keyword: &Token) -> R;
        fn visit_unary_expr(&mut self, operator: &Token, right: &Expr) -> R;
        fn visit_variable_expr(&mut self, id: u32, name: &Token) -> R;
    }
}

impl Expr {
    pub fn accept<R, V: expr::Visitor<R>>(&self, visitor: &mut V) -> R {
        match self {
            Expr::Assign { id, name, value } => visitor.visit_assign_expr(*id, name, value),
            Expr::Binary {
                left,
                operator,
                right,
            } => visitor.visit_binary_expr(left, operator, right),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => visitor.visit_call_expr(callee, paren, arguments),
            Expr::Get { object, name } => visitor.visit_get_expr(object, name),
            Expr::Grouping { expression } => visitor.visit_grouping_expr(expression),
            Expr::Literal { value } => visitor.visit_literal_expr(value),
            Expr::Logical {
                left,
                operator,
                right,
            } => visitor.visit_logical_expr(left, operator, right),
            Expr::Set {
                object,
                name,
                value,
            } => visitor.visit_set_expr(object, name, value),
            Expr::Super {
                id,
                keyword,
                method,
            } => visitor.visit_super_expr(*id, keyword, method),
            Expr::This { id, keyword } => visitor.visit_this_expr(*id, keyword),
            Expr::Unary { operator, right } => visitor.visit_unary_expr(operator, right),
            Expr::Variable { id, name } => visitor.visit_variable_expr(*id, name),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block {
        statements: Vec<Stmt>,
    },
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Stmt>,
    },
    Expression {
        expression: Expr,
    },
    Function {
        name: Token,
        params: Vec<Token>,
        body: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// Placeholder substituted for a declaration that failed to parse and
    /// was already reported; lets `declaration()` keep returning `Stmt`
    /// after panic-mode synchronization instead of throwing the whole
    /// statement list away.
    Null,
    Print {
        expression: Expr,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

pub mod stmt {
    use super::{Expr, Stmt};
    use crate::token::Token;

    pub trait Visitor<R> {
        fn visit_block_stmt(&mut self, statements: &[Stmt]) -> R;
        fn visit_class_stmt(
            &mut self,
            name: &Token,
            superclass: &Option<Expr>,
            methods: &[Stmt],
        ) -> R;
        fn visit_expression_stmt(&mut self, expression: &Expr) -> R;
        fn visit_function_stmt(&mut self, name: &Token, params: &[Token], body: &[Stmt]) -> R;
        fn visit_if_stmt(
            &mut self,
            condition: &Expr,
            then_branch: &Stmt,
            else_branch: &Option<Box<Stmt>>,
        ) -> R;
        fn visit_null_stmt(&mut self) -> R;
        fn visit_print_stmt(&mut self, expression: &Expr) -> R;
        fn visit_return_stmt(&mut self, keyword: &Token, value: &Option<Expr>) -> R;
        fn visit_var_stmt(&mut self, name: &Token, initializer: &Option<Expr>) -> R;
        fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> R;
    }
}

impl Stmt {
    pub fn accept<R, V: stmt::Visitor<R>>(&self, visitor: &mut V) -> R {
        match self {
            Stmt::Block { statements } => visitor.visit_block_stmt(statements),
            Stmt::Class {
                name,
                superclass,
                methods,
            } => visitor.visit_class_stmt(name, superclass, methods),
            Stmt::Expression { expression } => visitor.visit_expression_stmt(expression),
            Stmt::Function { name, params, body } => {
                visitor.visit_function_stmt(name, params, body)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => visitor.visit_if_stmt(condition, then_branch, else_branch),
            Stmt::Null => visitor.visit_null_stmt(),
            Stmt::Print { expression } => visitor.visit_print_stmt(expression),
            Stmt::Return { keyword, value } => visitor.visit_return_stmt(keyword, value),
            Stmt::Var { name, initializer } => visitor.visit_var_stmt(name, initializer),
            Stmt::While { condition, body } => visitor.visit_while_stmt(condition, body),
        }
    }
}

/// Debug-only AST pretty-printer for the expression sublanguage, in the
/// style of the book's `AstPrinter`. Not used by the evaluator; kept around
/// the way the teacher kept it, for tracing/debugging a parse.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&mut self, expr: &Expr) -> String {
        expr.accept(self)
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expr]) -> String {
        let mut builder = String::new();

        builder.push('(');
        builder.push_str(name);

        for expr in exprs {
            builder.push(' ');
            builder.push_str(&expr.accept(self));
        }

        builder.push(')');

        builder
    }
}

impl expr::Visitor<String> for AstPrinter {
    fn visit_assign_expr(&mut self, _id: u32, name: &Token, value: &Expr) -> String {
        self.parenthesize(&format!("= {}", name.lexeme), &[value])
    }

    fn visit_binary_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_call_expr(&mut self, callee: &Expr, _paren: &Token, arguments: &[Expr]) -> String {
        let mut exprs = vec![callee];
        exprs.extend(arguments.iter());
        self.parenthesize("call", &exprs)
    }

    fn visit_get_expr(&mut self, object: &Expr, name: &Token) -> String {
        self.parenthesize(&format!(".{}", name.lexeme), &[object])
    }

    fn visit_grouping_expr(&mut self, expression: &Expr) -> String {
        self.parenthesize("group", &[expression])
    }

    fn visit_literal_expr(&mut self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::Null => "nil".to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Number(n) => n.to_string(),
            LiteralValue::String(s) => s.clone(),
        }
    }

    fn visit_logical_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_set_expr(&mut self, object: &Expr, name: &Token, value: &Expr) -> String {
        self.parenthesize(&format!(".{}=", name.lexeme), &[object, value])
    }

    fn visit_super_expr(&mut self, _id: u32, _keyword: &Token, method: &Token) -> String {
        format!("(super.{})", method.lexeme)
    }

    fn visit_this_expr(&mut self, _id: u32, _keyword: &Token) -> String {
        "this".to_string()
    }

    fn visit_unary_expr(&mut self, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[right])
    }

    fn visit_variable_expr(&mut self, _id: u32, name: &Token) -> String {
        name.lexeme.clone()
    }
}

// test from the book
#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    #[test]
    fn test_printer() {
        let expression = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::Minus, "-", 1),
                right: Box::new(Expr::Literal {
                    value: LiteralValue::Number(123.0),
                }),
            }),
            operator: Token::new(TokenType::Star, "*", 1),
            right: Box::new(Expr::Grouping {
                expression: Box::new(Expr::Literal {
                    value: LiteralValue::Number(45.67),
                }),
            }),
        };
        let mut printer = AstPrinter;

        assert_eq!(printer.print(&expression), "(* (- 123) (group 45.67))");
    }

    // Parsing the same expression sublanguage source twice must yield
    // pretty-printed output that's identical both times: the AST the parser
    // builds is a pure function of the token stream, not of any parser-
    // internal counter (the per-node `id` is allocation order, not data the
    // printer looks at).
    #[test]
    fn printing_a_parsed_expression_is_deterministic() {
        use crate::parser::Parser;
        use crate::scanner::Scanner;

        let print_first_expr = |source: &str| -> String {
            let mut scanner = Scanner::new(source.to_string());
            let tokens = scanner.scan_tokens();
            let mut parser = Parser::new(tokens);
            let statements = parser.parse().expect("valid expression parses");
            let expr = match &statements[0] {
                Stmt::Expression { expression } => expression.clone(),
                other => panic!("expected an expression statement, got {other:?}"),
            };
            AstPrinter.print(&expr)
        };

        let source = "1 + 2 * (3 - 4) == !nil;";
        assert_eq!(print_first_expr(source), print_first_expr(source));
    }
}
