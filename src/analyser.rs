//! Semantic analysis pass.
//!
//! Runs after parsing and before evaluation, over the same AST the evaluator
//! will later walk. Catches everything that can be decided without running
//! the program: unknown names, redeclaration and shadowing within a scope,
//! calling a function with the wrong number of arguments, and `return` or
//! `break` appearing somewhere they can't take effect.
//!
//! Like the evaluator, top-level (and block-local) function declarations
//! are hoisted before the rest of a scope is walked, so mutually recursive
//! and forward-referencing functions resolve.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{LangError, Position, Result};

#[derive(Clone, Copy)]
enum Binding {
    Variable,
    Function { arity: usize },
}

struct Scope {
    bindings: HashMap<String, Binding>,
}

impl Scope {
    fn new() -> Self {
        Self { bindings: HashMap::new() }
    }
}

pub struct Analyser {
    scopes: Vec<Scope>,
    loop_depth: usize,
    function_depth: usize,
}

impl Analyser {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::new()], loop_depth: 0, function_depth: 0 }
    }

    /// Checks `program`, returning the first semantic error found, if any.
    pub fn analyse(&mut self, program: &Program) -> Result<()> {
        log::trace!("analyser: start, {} top-level statements", program.statements.len());
        self.hoist_functions(&program.statements)?;
        for statement in &program.statements {
            self.check_statement(statement)?;
        }
        log::trace!("analyser: end");
        Ok(())
    }

    fn hoist_functions(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            if let Statement::FuncDecl { name, params, line, .. } = statement {
                self.declare(name, Binding::Function { arity: params.len() }, *line)?;
            }
        }
        Ok(())
    }

    fn declare(&mut self, name: &str, binding: Binding, line: usize) -> Result<()> {
        let scope = self.scopes.last_mut().expect("at least one scope");
        if scope.bindings.contains_key(name) {
            return Err(LangError::semantic(
                format!("'{}' is already declared in this scope", name),
                Position::new(line, 1),
            ));
        }
        scope.bindings.insert(name.to_string(), binding);
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<Binding> {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.bindings.get(name) {
                return Some(*binding);
            }
        }
        None
    }

    fn with_child_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push(Scope::new());
        log::trace!("analyser: scope push, depth {}", self.scopes.len());
        let result = f(self);
        self.scopes.pop();
        log::trace!("analyser: scope pop, depth {}", self.scopes.len());
        result
    }

    fn check_block(&mut self, block: &Block) -> Result<()> {
        self.with_child_scope(|this| {
            this.hoist_functions(&block.statements)?;
            for statement in &block.statements {
                this.check_statement(statement)?;
            }
            Ok(())
        })
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::VarDecl { name, initializer, line } => {
                self.check_expression(initializer)?;
                self.declare(name, Binding::Variable, *line)?;
                Ok(())
            }
            Statement::Print { arguments, .. } => {
                for arg in arguments {
                    self.check_expression(arg)?;
                }
                Ok(())
            }
            Statement::If { conditions, consequents, alternate, .. } => {
                for condition in conditions {
                    self.check_expression(condition)?;
                }
                for consequent in consequents {
                    self.check_block(consequent)?;
                }
                if let Some(block) = alternate {
                    self.check_block(block)?;
                }
                Ok(())
            }
            Statement::While { condition, body, .. } => {
                self.check_expression(condition)?;
                self.loop_depth += 1;
                let result = self.check_block(body);
                self.loop_depth -= 1;
                result
            }
            Statement::Break { line } => {
                if self.loop_depth == 0 {
                    return Err(LangError::semantic(
                        "'break' used outside a loop",
                        Position::new(*line, 1),
                    ));
                }
                Ok(())
            }
            Statement::FuncDecl { params, body, line, .. } => {
                // The name itself was already declared by hoist_functions.
                self.function_depth += 1;
                let saved_loop_depth = std::mem::take(&mut self.loop_depth);
                let result = self.with_child_scope(|this| {
                    for param in params {
                        this.declare(param, Binding::Variable, *line)?;
                    }
                    this.hoist_functions(&body.statements)?;
                    for statement in &body.statements {
                        this.check_statement(statement)?;
                    }
                    Ok(())
                });
                self.loop_depth = saved_loop_depth;
                self.function_depth -= 1;
                result
            }
            Statement::Return { value, line } => {
                if self.function_depth == 0 {
                    return Err(LangError::semantic(
                        "'return' used outside a function",
                        Position::new(*line, 1),
                    ));
                }
                if let Some(expr) = value {
                    self.check_expression(expr)?;
                }
                Ok(())
            }
            Statement::ExprStmt { expr, .. } => self.check_expression(expr),
            Statement::Block(block) => self.check_block(block),
        }
    }

    fn check_expression(&mut self, expr: &Expression) -> Result<()> {
        match expr {
            Expression::Literal { .. } => Ok(()),
            Expression::Identifier { name, line } => match self.resolve(name) {
                Some(_) => Ok(()),
                None => Err(LangError::semantic(
                    format!("Undefined name '{}'", name),
                    Position::new(*line, 1),
                )),
            },
            Expression::Assign { name, value, line } => {
                match self.resolve(name) {
                    Some(Binding::Variable) => {}
                    Some(Binding::Function { .. }) => {
                        return Err(LangError::semantic(
                            format!("Cannot assign to function '{}'", name),
                            Position::new(*line, 1),
                        ))
                    }
                    None => {
                        return Err(LangError::semantic(
                            format!("Undefined name '{}'", name),
                            Position::new(*line, 1),
                        ))
                    }
                }
                self.check_expression(value)
            }
            Expression::Binary { left, right, .. } => {
                self.check_expression(left)?;
                self.check_expression(right)
            }
            Expression::Unary { operand, .. } => self.check_expression(operand),
            Expression::Call { callee, arguments, line } => {
                match self.resolve(callee) {
                    Some(Binding::Function { arity }) => {
                        if arity != arguments.len() {
                            return Err(LangError::semantic(
                                format!(
                                    "Function '{}' expects {} argument(s), got {}",
                                    callee,
                                    arity,
                                    arguments.len()
                                ),
                                Position::new(*line, 1),
                            ));
                        }
                    }
                    Some(Binding::Variable) => {
                        // Resolved at runtime: the variable may hold a
                        // function value assigned from elsewhere, so arity
                        // cannot be checked here.
                    }
                    None => {
                        return Err(LangError::semantic(
                            format!("Undefined name '{}'", callee),
                            Position::new(*line, 1),
                        ))
                    }
                }
                for arg in arguments {
                    self.check_expression(arg)?;
                }
                Ok(())
            }
            Expression::Grouping { expr, .. } => self.check_expression(expr),
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn analyse(source: &str) -> Result<()> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        Analyser::new().analyse(&program)
    }

    #[test]
    fn undefined_variable_is_a_semantic_error() {
        assert!(matches!(analyse("action!\nek baat bataun: x\npaisa vasool"), Err(LangError::Semantic { .. })));
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_an_error() {
        assert!(matches!(
            analyse("action!\nmaan lo x = 1\nmaan lo x = 2\npaisa vasool"),
            Err(LangError::Semantic { .. })
        ));
    }

    #[test]
    fn shadowing_in_a_nested_scope_is_allowed() {
        assert!(analyse(
            "action!\nmaan lo x = 1\n{ maan lo x = 2\nek baat bataun: x }\npaisa vasool"
        )
        .is_ok());
    }

    #[test]
    fn calling_a_named_function_with_wrong_arity_is_an_error() {
        assert!(matches!(
            analyse("action!\nclimax f(a, b) { dialogue wapas do a }\nf(1)\npaisa vasool"),
            Err(LangError::Semantic { .. })
        ));
    }

    #[test]
    fn break_outside_a_loop_is_an_error() {
        assert!(matches!(
            analyse("action!\nme bahar ja raha hu\npaisa vasool"),
            Err(LangError::Semantic { .. })
        ));
    }

    #[test]
    fn return_outside_a_function_is_an_error() {
        assert!(matches!(
            analyse("action!\ndialogue wapas do 1\npaisa vasool"),
            Err(LangError::Semantic { .. })
        ));
    }

    #[test]
    fn forward_reference_between_sibling_functions_is_allowed() {
        assert!(analyse(
            "action!\nclimax is_even(n) { dialogue wapas do is_odd(n) }\nclimax is_odd(n) { dialogue wapas do galat }\nek baat bataun: is_even(4)\npaisa vasool"
        )
        .is_ok());
    }
}
