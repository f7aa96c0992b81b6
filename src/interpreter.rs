//! Tree-walking evaluator for the language.
//!
//! Executes a [`Program`] directly against its AST. Every `{ ... }` block
//! opens a child [`Environment`] whose parent link is the enclosing scope;
//! closures capture that link by `Rc`, not a snapshot, so a function sees
//! later assignments to variables in scopes it was defined inside. Top-level
//! function declarations are hoisted into the global scope before any
//! statement runs, so forward calls between sibling functions resolve.
//!
//! Non-local control flow (`break`, `return`) is threaded back up through
//! statement execution as a [`Completion`] value rather than a host-language
//! exception or panic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::*;
use crate::config::RunConfig;
use crate::error::{LangError, Result};

/// A runtime value. Functions close over the environment they were declared
/// in; the `Rc<RefCell<_>>` chain this builds is acyclic because a closure
/// only ever points at an *ancestor* environment, never at one it created.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Unit,
    Function(Rc<FunctionValue>),
}

pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub closure: Rc<RefCell<Environment>>,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", stringify(self))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A lexical scope. `parent` is `None` only for the global scope.
pub struct Environment {
    values: HashMap<String, Value>,
    parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { values: HashMap::new(), parent: None }))
    }

    pub fn child(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { values: HashMap::new(), parent: Some(Rc::clone(parent)) }))
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => None,
        }
    }

    /// Assigns to an existing binding anywhere in the scope chain. Returns
    /// `false` if no such binding exists (assignment never implicitly
    /// creates a global).
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => false,
        }
    }
}

/// What a statement (or sequence of statements) resolved to.
enum Completion {
    Normal,
    Return(Value),
    Break,
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    config: RunConfig,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new(config: RunConfig) -> Self {
        Self { globals: Environment::new(), config, output: Vec::new() }
    }

    /// Executes `program` and returns the lines produced by `print`
    /// statements, in order.
    pub fn run(&mut self, program: &Program) -> Result<Vec<String>> {
        log::trace!("evaluator: start, {} top-level statements", program.statements.len());
        for statement in &program.statements {
            if let Statement::FuncDecl { name, params, body, .. } = statement {
                self.hoist_function(name, params, body, &self.globals.clone());
            }
        }

        let env = self.globals.clone();
        for statement in &program.statements {
            match self.execute_statement(statement, &env)? {
                Completion::Normal => {}
                Completion::Return(_) => {
                    return Err(LangError::runtime("'return' used outside a function"))
                }
                Completion::Break => {
                    return Err(LangError::runtime("'break' used outside a loop"))
                }
            }
        }

        log::trace!("evaluator: end, {} lines printed", self.output.len());
        Ok(std::mem::take(&mut self.output))
    }

    fn hoist_function(
        &self,
        name: &str,
        params: &[String],
        body: &Block,
        env: &Rc<RefCell<Environment>>,
    ) {
        let function = Value::Function(Rc::new(FunctionValue {
            name: name.to_string(),
            params: params.to_vec(),
            body: body.clone(),
            closure: Rc::clone(env),
        }));
        env.borrow_mut().define(name, function);
    }

    fn execute_block(&mut self, block: &Block, parent: &Rc<RefCell<Environment>>) -> Result<Completion> {
        log::trace!("evaluator: scope push");
        let env = Environment::child(parent);
        for statement in &block.statements {
            if let Statement::FuncDecl { name, params, body, .. } = statement {
                self.hoist_function(name, params, body, &env);
                continue;
            }
            match self.execute_statement(statement, &env)? {
                Completion::Normal => {}
                other => {
                    log::trace!("evaluator: scope pop");
                    return Ok(other);
                }
            }
        }
        log::trace!("evaluator: scope pop");
        Ok(Completion::Normal)
    }

    fn execute_statement(
        &mut self,
        statement: &Statement,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Completion> {
        match statement {
            Statement::VarDecl { name, initializer, .. } => {
                let value = self.evaluate(initializer, env)?;
                env.borrow_mut().define(name.clone(), value);
                Ok(Completion::Normal)
            }
            Statement::Print { arguments, .. } => {
                let mut parts = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    parts.push(stringify(&self.evaluate(arg, env)?));
                }
                self.output.push(parts.join(" "));
                Ok(Completion::Normal)
            }
            Statement::If { conditions, consequents, alternate, .. } => {
                for (condition, consequent) in conditions.iter().zip(consequents.iter()) {
                    if is_truthy(&self.evaluate(condition, env)?) {
                        return self.execute_block(consequent, env);
                    }
                }
                match alternate {
                    Some(block) => self.execute_block(block, env),
                    None => Ok(Completion::Normal),
                }
            }
            Statement::While { condition, body, line } => {
                let mut iterations = 0usize;
                while is_truthy(&self.evaluate(condition, env)?) {
                    iterations += 1;
                    if iterations > self.config.loop_limit {
                        log::trace!("evaluator: loop limit of {} iterations tripped", self.config.loop_limit);
                        return Err(LangError::runtime_at(
                            format!("Loop limit of {} iterations exceeded", self.config.loop_limit),
                            crate::error::Position::new(*line, 1),
                        ));
                    }
                    match self.execute_block(body, env)? {
                        Completion::Normal => {}
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::Break { .. } => Ok(Completion::Break),
            Statement::FuncDecl { name, params, body, .. } => {
                self.hoist_function(name, params, body, env);
                Ok(Completion::Normal)
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Unit,
                };
                Ok(Completion::Return(value))
            }
            Statement::ExprStmt { expr, .. } => {
                self.evaluate(expr, env)?;
                Ok(Completion::Normal)
            }
            Statement::Block(block) => self.execute_block(block, env),
        }
    }

    fn evaluate(&mut self, expr: &Expression, env: &Rc<RefCell<Environment>>) -> Result<Value> {
        match expr {
            Expression::Literal { value, .. } => Ok(match value {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Unit => Value::Unit,
            }),
            Expression::Identifier { name, line } => env.borrow().get(name).ok_or_else(|| {
                LangError::runtime_at(
                    format!("Undefined variable '{}'", name),
                    crate::error::Position::new(*line, 1),
                )
            }),
            Expression::Assign { name, value, line } => {
                let value = self.evaluate(value, env)?;
                if env.borrow_mut().assign(name, value.clone()) {
                    Ok(value)
                } else {
                    Err(LangError::runtime_at(
                        format!("Undefined variable '{}'", name),
                        crate::error::Position::new(*line, 1),
                    ))
                }
            }
            Expression::Unary { operator, operand, line } => {
                let value = self.evaluate(operand, env)?;
                match operator {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&value))),
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(type_error("negate", &other, *line)),
                    },
                }
            }
            Expression::Binary { operator, left, right, line } => {
                self.evaluate_binary(*operator, left, right, *line, env)
            }
            Expression::Call { callee, arguments, line } => {
                let function = env.borrow().get(callee).ok_or_else(|| {
                    LangError::runtime_at(
                        format!("Undefined function '{}'", callee),
                        crate::error::Position::new(*line, 1),
                    )
                })?;
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg, env)?);
                }
                self.call(&function, args, *line)
            }
            Expression::Grouping { expr, .. } => self.evaluate(expr, env),
        }
    }

    fn evaluate_binary(
        &mut self,
        operator: BinaryOp,
        left: &Expression,
        right: &Expression,
        line: usize,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value> {
        // && and || short-circuit: the right operand is never evaluated
        // once the outcome is already decided.
        if operator == BinaryOp::And {
            let left = self.evaluate(left, env)?;
            if !is_truthy(&left) {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(is_truthy(&self.evaluate(right, env)?)));
        }
        if operator == BinaryOp::Or {
            let left = self.evaluate(left, env)?;
            if is_truthy(&left) {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(is_truthy(&self.evaluate(right, env)?)));
        }

        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;

        match operator {
            BinaryOp::Add => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    Ok(Value::Str(format!("{}{}", stringify(&left), stringify(&right))))
                }
                _ => Err(type_error("add", &left, line)),
            },
            BinaryOp::Sub => numeric(left, right, line, |a, b| Ok(a - b)),
            BinaryOp::Mul => numeric(left, right, line, |a, b| Ok(a * b)),
            BinaryOp::Div => numeric(left, right, line, |a, b| {
                if b == 0.0 {
                    Err(LangError::runtime_at("Division by zero", crate::error::Position::new(line, 1)))
                } else {
                    Ok(a / b)
                }
            }),
            BinaryOp::Mod => numeric(left, right, line, |a, b| {
                if b == 0.0 {
                    Err(LangError::runtime_at("Division by zero", crate::error::Position::new(line, 1)))
                } else {
                    Ok(a % b)
                }
            }),
            BinaryOp::Lt => compare(left, right, line, |a, b| a < b),
            BinaryOp::Gt => compare(left, right, line, |a, b| a > b),
            BinaryOp::Le => compare(left, right, line, |a, b| a <= b),
            BinaryOp::Ge => compare(left, right, line, |a, b| a >= b),
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::NotEq => Ok(Value::Bool(left != right)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn call(&mut self, callee: &Value, args: Vec<Value>, line: usize) -> Result<Value> {
        let function = match callee {
            Value::Function(f) => f,
            other => return Err(type_error("call", other, line)),
        };

        if args.len() != function.params.len() {
            return Err(LangError::runtime_at(
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    function.name,
                    function.params.len(),
                    args.len()
                ),
                crate::error::Position::new(line, 1),
            ));
        }

        log::trace!("evaluator: scope push (call to '{}')", function.name);
        let call_env = Environment::child(&function.closure);
        for (param, arg) in function.params.iter().zip(args.into_iter()) {
            call_env.borrow_mut().define(param.clone(), arg);
        }

        for statement in &function.body.statements {
            if let Statement::FuncDecl { name, params, body, .. } = statement {
                self.hoist_function(name, params, body, &call_env);
                continue;
            }
            match self.execute_statement(statement, &call_env)? {
                Completion::Normal => {}
                Completion::Return(value) => {
                    log::trace!("evaluator: scope pop (call to '{}')", function.name);
                    return Ok(value);
                }
                Completion::Break => {
                    return Err(LangError::runtime("'break' used outside a loop"))
                }
            }
        }

        log::trace!("evaluator: scope pop (call to '{}')", function.name);
        Ok(Value::Unit)
    }
}

fn numeric(
    left: Value,
    right: Value,
    line: usize,
    op: impl FnOnce(f64, f64) -> Result<f64>,
) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op(a, b)?)),
        (other, _) => Err(type_error("operate on", &other, line)),
    }
}

fn compare(left: Value, right: Value, line: usize, op: impl FnOnce(f64, f64) -> bool) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(op(a, b))),
        (other, _) => Err(type_error("compare", &other, line)),
    }
}

fn type_error(action: &str, value: &Value, line: usize) -> LangError {
    LangError::runtime_at(
        format!("Cannot {} a value of type {}", action, type_name(value)),
        crate::error::Position::new(line, 1),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "number",
        Value::Str(_) => "string",
        Value::Bool(_) => "boolean",
        Value::Unit => "khaali",
        Value::Function(_) => "function",
    }
}

/// Unit and `false` are falsy; every other value, including `0` and `""`,
/// is truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Unit | Value::Bool(false))
}

/// Renders a value the way `print` does.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Str(s) => s.clone(),
        Value::Bool(true) => "sach".to_string(),
        Value::Bool(false) => "galat".to_string(),
        Value::Unit => "khaali".to_string(),
        Value::Function(f) => format!("<function {}>", f.name),
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(source: &str) -> Result<Vec<String>> {
        let tokens = Lexer::new(source).tokenize()?;
        let program = Parser::new(tokens).parse()?;
        Interpreter::new(RunConfig::default()).run(&program)
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let err = run("action!\nek baat bataun: 1 / 0\npaisa vasool").unwrap_err();
        assert!(matches!(err, LangError::Runtime { .. }));
    }

    #[test]
    fn modulo_by_zero_reports_the_same_message_as_division() {
        let err = run("action!\nek baat bataun: 1 % 0\npaisa vasool").unwrap_err();
        match err {
            LangError::Runtime { message, .. } => assert_eq!(message, "Division by zero"),
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[test]
    fn while_loop_counts() {
        let out = run(
            "action!\nmaan lo i = 0\njab tak hai jaan (i < 3) { ek baat bataun: i\ni = i + 1 }\npaisa vasool",
        )
        .unwrap();
        assert_eq!(out, vec!["0", "1", "2"]);
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let out = run(
            "action!\nclimax make_adder(n) {\nclimax adder(x) { dialogue wapas do x + n }\ndialogue wapas do adder\n}\nmaan lo add5 = make_adder(5)\nek baat bataun: add5(10)\npaisa vasool",
        )
        .unwrap();
        assert_eq!(out, vec!["15"]);
    }

    #[test]
    fn and_or_short_circuit() {
        let out = run(
            "action!\nclimax boom() { ek baat bataun: \"should not run\"\ndialogue wapas do sach }\nek baat bataun: galat && boom()\nek baat bataun: sach || boom()\npaisa vasool",
        )
        .unwrap();
        assert_eq!(out, vec!["galat", "sach"]);
    }

    #[test]
    fn string_concatenation_with_numbers() {
        let out = run("action!\nek baat bataun: \"score: \" + 7\npaisa vasool").unwrap();
        assert_eq!(out, vec!["score: 7"]);
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let err = run("action!\nek baat bataun: x\npaisa vasool").unwrap_err();
        assert!(matches!(err, LangError::Runtime { .. }));
    }

    #[test]
    fn break_exits_only_the_enclosing_loop() {
        let out = run(
            "action!\nmaan lo i = 0\njab tak hai jaan (sach) {\ni = i + 1\nagar kismat rahi (i == 3) { me bahar ja raha hu }\n}\nek baat bataun: i\npaisa vasool",
        )
        .unwrap();
        assert_eq!(out, vec!["3"]);
    }
}
