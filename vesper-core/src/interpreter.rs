//! Tree-walking evaluator.
//!
//! Executes a `Program` against a fresh global scope, returning the
//! last evaluated value. Strictly synchronous; no suspension points.
//! Non-local control transfers (break, continue, return) are modeled
//! as the explicit `Flow` result returned by every statement and
//! checked by its caller, never as host panics or exceptions.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{AssignOp, BinaryOp, Expr, Literal, Program, Stmt, UnaryOp};
use crate::builtins;
use crate::error::RuntimeError;
use crate::scope::{Scope, ScopeRef};
use crate::value::{ClassValue, FunctionValue, Value};

pub type EvalResult<T> = Result<T, RuntimeError>;

/// Safety valve for runaway while loops; not a semantic feature.
pub const WHILE_ITERATION_LIMIT: u64 = 1_000_000;

/// Outcome of one statement: either a normal value or a pending
/// non-local exit the nearest loop or call boundary must intercept.
#[derive(Debug)]
pub enum Flow {
    Normal(Value),
    Break,
    Continue,
    Return(Value),
}

/// One engine instance: a global scope plus the evaluation methods.
/// Two instances never share scopes or any mutable state.
pub struct Interpreter {
    globals: ScopeRef,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            globals: Scope::root(),
        }
    }

    /// Runs a whole program, returning the last evaluated value.
    ///
    /// A top-level `return` ends the program with its value; a
    /// top-level `break` or `continue` is a runtime error.
    pub fn run(&mut self, program: &Program) -> EvalResult<Value> {
        let scope = Rc::clone(&self.globals);
        let mut last = Value::Undefined;
        for stmt in &program.statements {
            match self.exec(stmt, &scope)? {
                Flow::Normal(value) => last = value,
                Flow::Return(value) => return Ok(value),
                Flow::Break => return Err(RuntimeError::BreakOutsideLoop),
                Flow::Continue => return Err(RuntimeError::ContinueOutsideLoop),
            }
        }
        Ok(last)
    }

    /// Runs statements in order, stopping at the first non-normal flow.
    fn exec_block(&mut self, statements: &[Stmt], scope: &ScopeRef) -> EvalResult<Flow> {
        let mut last = Value::Undefined;
        for stmt in statements {
            match self.exec(stmt, scope)? {
                Flow::Normal(value) => last = value,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec(&mut self, stmt: &Stmt, scope: &ScopeRef) -> EvalResult<Flow> {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval(value, scope)?;
                Scope::define(scope, name, value.clone());
                Ok(Flow::Normal(value))
            }
            Stmt::Function(decl) => {
                let function = Value::Function(Rc::new(FunctionValue {
                    decl: Rc::clone(decl),
                    closure: Rc::clone(scope),
                }));
                Scope::define(scope, &decl.name, function);
                Ok(Flow::Normal(Value::Undefined))
            }
            Stmt::Class(decl) => {
                let class = self.declare_class(decl, scope)?;
                Scope::define(scope, &decl.name, class);
                Ok(Flow::Normal(Value::Undefined))
            }
            Stmt::If {
                branches,
                else_branch,
            } => {
                for (condition, body) in branches {
                    if self.eval(condition, scope)?.is_truthy() {
                        return self.exec_block(body, scope);
                    }
                }
                match else_branch {
                    Some(body) => self.exec_block(body, scope),
                    None => Ok(Flow::Normal(Value::Undefined)),
                }
            }
            Stmt::While { condition, body } => {
                let mut iterations: u64 = 0;
                while self.eval(condition, scope)?.is_truthy() {
                    iterations += 1;
                    if iterations > WHILE_ITERATION_LIMIT {
                        return Err(RuntimeError::InfiniteLoop(WHILE_ITERATION_LIMIT));
                    }
                    match self.exec_block(body, scope)? {
                        Flow::Normal(_) | Flow::Continue => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal(Value::Undefined))
            }
            Stmt::For {
                variable,
                start,
                end,
                step,
                body,
            } => self.exec_for(variable, start, end, step.as_ref(), body, scope),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Try {
                body,
                catch,
                finally,
            } => {
                let mut outcome = match self.exec_block(body, scope) {
                    Err(error) => match catch {
                        Some((param, handler)) => {
                            // Catch clauses get an isolated scope.
                            let catch_scope = Scope::child(scope);
                            if let Some(name) = param {
                                Scope::define(
                                    &catch_scope,
                                    name,
                                    Value::string(error.to_string()),
                                );
                            }
                            self.exec_block(handler, &catch_scope)
                        }
                        None => Err(error),
                    },
                    ok => ok,
                };
                if let Some(cleanup) = finally {
                    match self.exec_block(cleanup, scope) {
                        Ok(Flow::Normal(_)) => {}
                        // A non-normal exit or error from finally wins.
                        other => outcome = other,
                    }
                }
                outcome
            }
            // Module loading belongs to the host; the core records
            // nothing for an import.
            Stmt::Import { .. } => Ok(Flow::Normal(Value::Undefined)),
            Stmt::Expression(expr) => Ok(Flow::Normal(self.eval(expr, scope)?)),
        }
    }

    /// `for x = start to end [step s]`: one scope is shared across all
    /// iterations, so closures created in the body all capture the
    /// same loop variable (documented behavior).
    fn exec_for(
        &mut self,
        variable: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &[Stmt],
        scope: &ScopeRef,
    ) -> EvalResult<Flow> {
        let start = as_number(&self.eval(start, scope)?, "for loop start")?;
        let end = as_number(&self.eval(end, scope)?, "for loop end")?;
        let step = match step {
            Some(expr) => as_number(&self.eval(expr, scope)?, "for loop step")?,
            None => 1.0,
        };
        if step == 0.0 {
            return Err(RuntimeError::TypeMismatch(
                "for loop step must not be zero".to_string(),
            ));
        }

        let loop_scope = Scope::child(scope);
        Scope::define(&loop_scope, variable, Value::Number(start));

        let mut current = start;
        while (step > 0.0 && current <= end) || (step < 0.0 && current >= end) {
            match self.exec_block(body, &loop_scope)? {
                Flow::Normal(_) | Flow::Continue => {}
                Flow::Break => break,
                ret @ Flow::Return(_) => return Ok(ret),
            }
            // The body may have reassigned the loop variable; the
            // update reads it back rather than using a private copy.
            current = match Scope::get(&loop_scope, variable) {
                Some(Value::Number(n)) => n + step,
                _ => current + step,
            };
            Scope::define(&loop_scope, variable, Value::Number(current));
        }
        Ok(Flow::Normal(Value::Undefined))
    }

    fn declare_class(&mut self, decl: &crate::ast::ClassDecl, scope: &ScopeRef) -> EvalResult<Value> {
        let mut properties = Vec::new();
        let mut methods: Vec<Rc<crate::ast::FunctionDecl>> = Vec::new();

        // Superclass members are inherited by copy at declaration time.
        if let Some(super_name) = &decl.superclass {
            let parent = Scope::get(scope, super_name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(super_name.clone()))?;
            let Value::Class(parent) = parent else {
                return Err(RuntimeError::TypeMismatch(format!(
                    "'{super_name}' is not a class"
                )));
            };
            properties.extend(parent.properties.iter().cloned());
            methods.extend(parent.methods.iter().cloned());
        }

        for (name, init) in &decl.properties {
            properties.retain(|(existing, _)| existing != name);
            properties.push((name.clone(), init.clone()));
        }
        for method in &decl.methods {
            methods.retain(|existing| existing.name != method.name);
            methods.push(Rc::clone(method));
        }

        Ok(Value::Class(Rc::new(ClassValue {
            name: decl.name.clone(),
            properties,
            methods,
            closure: Rc::clone(scope),
        })))
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn eval(&mut self, expr: &Expr, scope: &ScopeRef) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Identifier(name) => self.resolve(name, scope),
            Expr::Assign { target, op, value } => self.eval_assign(target, *op, value, scope),
            Expr::Binary { op, left, right } => match op {
                // Logical operators short-circuit and return the
                // operand value, not a boolean.
                BinaryOp::And => {
                    let left = self.eval(left, scope)?;
                    if left.is_truthy() {
                        self.eval(right, scope)
                    } else {
                        Ok(left)
                    }
                }
                BinaryOp::Or => {
                    let left = self.eval(left, scope)?;
                    if left.is_truthy() {
                        Ok(left)
                    } else {
                        self.eval(right, scope)
                    }
                }
                _ => {
                    let left = self.eval(left, scope)?;
                    let right = self.eval(right, scope)?;
                    eval_binary(*op, &left, &right)
                }
            },
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => Ok(Value::Number(-as_number(&value, "unary '-'")?)),
                    UnaryOp::Plus => Ok(Value::Number(as_number(&value, "unary '+'")?)),
                }
            }
            Expr::Call { callee, args } => {
                let hint = match callee.as_ref() {
                    Expr::Identifier(name) => name.clone(),
                    Expr::Member { property, .. } => property.clone(),
                    _ => "<expression>".to_string(),
                };
                let callee = self.eval(callee, scope)?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval(arg, scope)?);
                }
                self.call(callee, evaluated, &hint)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                match object {
                    Value::Array(elements) => {
                        let element = array_index(&index)?
                            .and_then(|i| elements.borrow().get(i).cloned());
                        Ok(element.unwrap_or(Value::Undefined))
                    }
                    Value::Object(entries) => {
                        let key = index.to_string();
                        Ok(entries.borrow().get(&key).cloned().unwrap_or(Value::Undefined))
                    }
                    other => Err(RuntimeError::TypeMismatch(format!(
                        "cannot index a {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, scope)?;
                match object {
                    Value::Object(entries) => Ok(entries
                        .borrow()
                        .get(property)
                        .cloned()
                        .unwrap_or(Value::Undefined)),
                    Value::Class(class) => match class.method(property) {
                        Some(method) => Ok(Value::Function(Rc::new(FunctionValue {
                            decl: Rc::clone(method),
                            closure: Rc::clone(&class.closure),
                        }))),
                        None => Ok(Value::Undefined),
                    },
                    other => Err(RuntimeError::TypeMismatch(format!(
                        "cannot read property '{property}' of {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, scope)?);
                }
                Ok(Value::array(values))
            }
            Expr::Object(entries) => {
                let mut map = HashMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value, scope)?);
                }
                Ok(Value::object(map))
            }
        }
    }

    /// Identifier lookup order: scope chain (which terminates at the
    /// global scope), then the fixed builtin table.
    fn resolve(&self, name: &str, scope: &ScopeRef) -> EvalResult<Value> {
        if let Some(value) = Scope::get(scope, name) {
            return Ok(value);
        }
        if let Some(builtin) = builtins::find(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(RuntimeError::UndefinedVariable(name.to_string()))
    }

    fn eval_assign(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: &Expr,
        scope: &ScopeRef,
    ) -> EvalResult<Value> {
        match target {
            Expr::Identifier(name) => {
                let value = match op.binary() {
                    None => self.eval(value, scope)?,
                    Some(binary_op) => {
                        let old = Scope::get(scope, name)
                            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?;
                        let rhs = self.eval(value, scope)?;
                        eval_binary(binary_op, &old, &rhs)?
                    }
                };
                if !Scope::assign(scope, name, value.clone()) {
                    return Err(RuntimeError::UndefinedVariable(name.clone()));
                }
                Ok(value)
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, scope)?;
                let Value::Object(entries) = object else {
                    return Err(RuntimeError::TypeMismatch(format!(
                        "cannot set property '{property}' on {}",
                        object.type_name()
                    )));
                };
                let value = match op.binary() {
                    None => self.eval(value, scope)?,
                    Some(binary_op) => {
                        let old = entries
                            .borrow()
                            .get(property)
                            .cloned()
                            .unwrap_or(Value::Undefined);
                        let rhs = self.eval(value, scope)?;
                        eval_binary(binary_op, &old, &rhs)?
                    }
                };
                entries.borrow_mut().insert(property.clone(), value.clone());
                Ok(value)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                match object {
                    Value::Array(elements) => {
                        let Some(i) = array_index(&index)? else {
                            return Err(RuntimeError::TypeMismatch(format!(
                                "array index {index} out of range"
                            )));
                        };
                        let value = match op.binary() {
                            None => self.eval(value, scope)?,
                            Some(binary_op) => {
                                let old = elements
                                    .borrow()
                                    .get(i)
                                    .cloned()
                                    .unwrap_or(Value::Undefined);
                                let rhs = self.eval(value, scope)?;
                                eval_binary(binary_op, &old, &rhs)?
                            }
                        };
                        let mut elements = elements.borrow_mut();
                        if i < elements.len() {
                            elements[i] = value.clone();
                        } else if i == elements.len() {
                            elements.push(value.clone());
                        } else {
                            return Err(RuntimeError::TypeMismatch(format!(
                                "array index {i} out of range"
                            )));
                        }
                        Ok(value)
                    }
                    Value::Object(entries) => {
                        let key = index.to_string();
                        let value = match op.binary() {
                            None => self.eval(value, scope)?,
                            Some(binary_op) => {
                                let old = entries
                                    .borrow()
                                    .get(&key)
                                    .cloned()
                                    .unwrap_or(Value::Undefined);
                                let rhs = self.eval(value, scope)?;
                                eval_binary(binary_op, &old, &rhs)?
                            }
                        };
                        entries.borrow_mut().insert(key, value.clone());
                        Ok(value)
                    }
                    other => Err(RuntimeError::TypeMismatch(format!(
                        "cannot index a {}",
                        other.type_name()
                    ))),
                }
            }
            _ => Err(RuntimeError::InvalidAssignmentTarget),
        }
    }

    /// Calls any callable value.
    ///
    /// Arguments bind to parameters positionally by index: missing
    /// arguments become `undefined`, extras are ignored, and argument
    /// count is never validated against parameter count.
    fn call(&mut self, callee: Value, args: Vec<Value>, hint: &str) -> EvalResult<Value> {
        match callee {
            Value::Builtin(builtin) => (builtin.func)(&args),
            Value::Function(function) => self.call_function(&function, &args),
            Value::Class(class) => self.instantiate(&class, args),
            other => Err(RuntimeError::NotAFunction(if hint == "<expression>" {
                other.type_name().to_string()
            } else {
                hint.to_string()
            })),
        }
    }

    fn call_function(&mut self, function: &FunctionValue, args: &[Value]) -> EvalResult<Value> {
        let scope = Scope::child(&function.closure);
        for (index, param) in function.decl.params.iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or(Value::Undefined);
            Scope::define(&scope, param, value);
        }
        match self.exec_block(&function.decl.body, &scope)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Undefined),
            Flow::Break => Err(RuntimeError::BreakOutsideLoop),
            Flow::Continue => Err(RuntimeError::ContinueOutsideLoop),
        }
    }

    /// Constructs an instance: property initializers run per
    /// construction, methods close over a scope where `self` is the
    /// new instance, and `init` (if present) runs as the constructor.
    fn instantiate(&mut self, class: &Rc<ClassValue>, args: Vec<Value>) -> EvalResult<Value> {
        let mut fields = HashMap::new();
        let init_scope = Scope::child(&class.closure);
        for (name, expr) in &class.properties {
            let value = self.eval(expr, &init_scope)?;
            fields.insert(name.clone(), value);
        }
        let instance = Value::object(fields);

        let method_scope = Scope::child(&class.closure);
        Scope::define(&method_scope, "self", instance.clone());

        let Value::Object(entries) = &instance else {
            unreachable!("instance is always an object");
        };
        for method in &class.methods {
            let bound = Value::Function(Rc::new(FunctionValue {
                decl: Rc::clone(method),
                closure: Rc::clone(&method_scope),
            }));
            entries.borrow_mut().insert(method.name.clone(), bound);
        }

        if let Some(init) = class.method("init") {
            let constructor = FunctionValue {
                decl: Rc::clone(init),
                closure: Rc::clone(&method_scope),
            };
            self.call_function(&constructor, &args)?;
        }
        Ok(instance)
    }
}

impl AssignOp {
    /// The binary operation a compound assignment applies, if any.
    fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::Str(s) => Value::string(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

/// Array indices must be non-negative integers; any other number
/// misses every element.
fn array_index(value: &Value) -> EvalResult<Option<usize>> {
    let n = as_number(value, "array index")?;
    if n < 0.0 || n.fract() != 0.0 {
        return Ok(None);
    }
    Ok(Some(n as usize))
}

fn as_number(value: &Value, what: &str) -> EvalResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(RuntimeError::TypeMismatch(format!(
            "{what} expects a number, got {}",
            other.type_name()
        ))),
    }
}

/// Non-short-circuit binary evaluation over already-computed operands.
///
/// Arithmetic uses IEEE-754 double semantics throughout; `+`
/// concatenates when either side is a string.
fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::string(format!("{left}{right}")))
            }
            _ => Err(type_error("+", left, right)),
        },
        BinaryOp::Sub => numeric(op, left, right, |a, b| a - b),
        BinaryOp::Mul => numeric(op, left, right, |a, b| a * b),
        BinaryOp::Div => numeric(op, left, right, |a, b| a / b),
        BinaryOp::Mod => numeric(op, left, right, |a, b| a % b),
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(right))),
        BinaryOp::Lt => comparison(op, left, right),
        BinaryOp::Le => comparison(op, left, right),
        BinaryOp::Gt => comparison(op, left, right),
        BinaryOp::Ge => comparison(op, left, right),
        BinaryOp::And => Ok(if left.is_truthy() {
            right.clone()
        } else {
            left.clone()
        }),
        BinaryOp::Or => Ok(if left.is_truthy() {
            left.clone()
        } else {
            right.clone()
        }),
    }
}

fn numeric(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    apply: impl FnOnce(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(*a, *b))),
        _ => Err(type_error(op.symbol(), left, right)),
    }
}

fn comparison(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    let result = match (left, right) {
        (Value::Number(a), Value::Number(b)) => match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            _ => unreachable!("comparison called with non-relational op"),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            _ => unreachable!("comparison called with non-relational op"),
        },
        _ => return Err(type_error(op.symbol(), left, right)),
    };
    Ok(Value::Bool(result))
}

fn type_error(op: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch(format!(
        "'{op}' cannot combine {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(source: &str) -> EvalResult<Value> {
        let program = parse(source).expect("parse");
        Interpreter::new().run(&program)
    }

    fn run_number(source: &str) -> f64 {
        match run(source).expect("run") {
            Value::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn evaluates_variable_arithmetic() {
        assert_eq!(run_number("let x = 10\nlet y = 20\nlet z = x + y\nz"), 30.0);
    }

    #[test]
    fn calls_user_function() {
        assert_eq!(run_number("def add(a, b) { return a + b }\nadd(3, 4)"), 7.0);
    }

    #[test]
    fn function_without_return_yields_undefined() {
        let value = run("def f() { 1 }\nf()").expect("run");
        assert!(matches!(value, Value::Undefined));
    }

    #[test]
    fn missing_and_extra_arguments_bind_silently() {
        let value = run("def f(a, b) { return b }\nf(1)").expect("run");
        assert!(matches!(value, Value::Undefined));
        assert_eq!(run_number("def f(a) { return a }\nf(2, 99)"), 2.0);
    }

    #[test]
    fn closures_capture_defining_scope() {
        let source = "
            def make_counter() {
                let count = 0
                def tick() { count += 1; return count }
                return tick
            }
            let c = make_counter()
            c()
            c()
            c()
        ";
        assert_eq!(run_number(source), 3.0);
    }

    #[test]
    fn for_loop_runs_inclusive_range() {
        assert_eq!(run_number("let n = 0\nfor i = 1 to 3 { n += i }\nn"), 6.0);
    }

    #[test]
    fn for_loop_honors_step() {
        assert_eq!(
            run_number("let n = 0\nfor i = 0 to 10 step 5 { n += 1 }\nn"),
            3.0
        );
        assert_eq!(
            run_number("let n = 0\nfor i = 3 to 1 step -1 { n += 1 }\nn"),
            3.0
        );
    }

    #[test]
    fn for_loop_shares_one_scope_across_iterations() {
        // The loop variable is shared, not per-iteration; closures all
        // see its final value.
        let source = "
            let fns = []
            for i = 1 to 3 {
                def get() { return i }
                push(fns, get)
            }
            fns[0]() + fns[1]() + fns[2]()
        ";
        assert_eq!(run_number(source), 12.0);
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let source = "
            let n = 0
            let i = 0
            while true {
                i += 1
                if i > 10 { break }
                if i % 2 == 0 { continue }
                n += i
            }
            n
        ";
        assert_eq!(run_number(source), 25.0);
    }

    #[test]
    fn runaway_while_loop_is_stopped() {
        let err = run("while true { }").unwrap_err();
        assert!(matches!(err, RuntimeError::InfiniteLoop(_)));
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        assert!(matches!(run("break"), Err(RuntimeError::BreakOutsideLoop)));
        assert!(matches!(
            run("def f() { break }\nf()"),
            Err(RuntimeError::BreakOutsideLoop)
        ));
    }

    #[test]
    fn undefined_call_is_never_silent() {
        let err = run("undefinedName()").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable(_)));

        let err = run("let x = 5\nx()").unwrap_err();
        assert!(matches!(err, RuntimeError::NotAFunction(name) if name == "x"));
    }

    #[test]
    fn assignment_to_undeclared_name_fails() {
        assert!(matches!(
            run("y = 1"),
            Err(RuntimeError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn invalid_assignment_target_is_a_runtime_error() {
        assert!(matches!(
            run("1 = 2"),
            Err(RuntimeError::InvalidAssignmentTarget)
        ));
    }

    #[test]
    fn logical_operators_return_operand_values() {
        assert_eq!(run_number("0 || 7"), 7.0);
        assert_eq!(run_number("3 && 5"), 5.0);
        assert_eq!(run_number("0 && 5"), 0.0);
        let value = run("null || \"fallback\"").expect("run");
        assert!(matches!(value, Value::Str(s) if s.as_str() == "fallback"));
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        // The right side would raise if evaluated.
        assert_eq!(run_number("let x = 1\nfalse && missing()\nx"), 1.0);
    }

    #[test]
    fn equality_is_coercing() {
        let value = run("5 == \"5\"").expect("run");
        assert!(matches!(value, Value::Bool(true)));
        let value = run("0 == false").expect("run");
        assert!(matches!(value, Value::Bool(true)));
        let value = run("null == undefinedValue") // undefined identifier errors;
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(value, RuntimeError::UndefinedVariable(_)));
    }

    #[test]
    fn string_concatenation_with_plus() {
        let value = run("\"n = \" + 4").expect("run");
        assert!(matches!(value, Value::Str(s) if s.as_str() == "n = 4"));
    }

    #[test]
    fn arrays_and_objects_are_mutable_references() {
        let source = "
            let a = [1, 2]
            let b = a
            b[0] = 9
            a[0]
        ";
        assert_eq!(run_number(source), 9.0);
        assert_eq!(
            run_number("let o = { n: 1 }\no.n += 4\no[\"n\"]"),
            5.0
        );
    }

    #[test]
    fn negative_or_fractional_array_index_reads_undefined() {
        let value = run("let a = [7, 8]\na[0 - 1]").expect("run");
        assert!(matches!(value, Value::Undefined));
        let value = run("let a = [7, 8]\na[0.5]").expect("run");
        assert!(matches!(value, Value::Undefined));
    }

    #[test]
    fn negative_array_index_assignment_is_an_error() {
        let err = run("let a = [7, 8]\na[0 - 1] = 1").unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch(_)));
        // element 0 is untouched by the failed store
        assert_eq!(
            run_number("let a = [7, 8]\ntry { a[0 - 1] = 1 } catch { }\na[0]"),
            7.0
        );
    }

    #[test]
    fn try_catch_intercepts_runtime_errors() {
        let source = "
            let msg = \"\"
            try { missing() } catch (e) { msg = e }
            msg
        ";
        let value = run(source).expect("run");
        assert!(matches!(value, Value::Str(s) if s.contains("missing")));
    }

    #[test]
    fn finally_always_runs() {
        let source = "
            let n = 0
            try { missing() } catch { n += 1 } finally { n += 10 }
            n
        ";
        assert_eq!(run_number(source), 11.0);
    }

    #[test]
    fn uncaught_error_propagates_after_finally() {
        let err = run("let n = 0\ntry { missing() } finally { n = 1 }").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable(_)));
    }

    #[test]
    fn class_instantiation_and_methods() {
        let source = "
            class Counter {
                count = 0
                def init(start) { self.count = start }
                def bump() { self.count += 1; return self.count }
            }
            let c = Counter(10)
            c.bump()
            c.bump()
        ";
        assert_eq!(run_number(source), 12.0);
    }

    #[test]
    fn subclass_inherits_and_overrides() {
        let source = "
            class Animal {
                legs = 4
                def speak() { return \"...\" }
            }
            class Dog extends Animal {
                def speak() { return \"woof\" }
            }
            let d = Dog()
            d.speak() + d.legs
        ";
        let value = run(source).expect("run");
        assert!(matches!(value, Value::Str(s) if s.as_str() == "woof4"));
    }

    #[test]
    fn import_is_inert_in_the_core() {
        let value = run("import { sin } from \"math\"\n1").expect("run");
        assert!(matches!(value, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn execution_is_deterministic_across_fresh_engines() {
        let source = "
            def fib(n) { if n < 2 { return n } return fib(n - 1) + fib(n - 2) }
            fib(12)
        ";
        let first = run_number(source);
        let second = run_number(source);
        assert_eq!(first, second);
        assert_eq!(first, 144.0);
    }
}
