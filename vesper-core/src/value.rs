//! Runtime values for the Vesper evaluator.
//!
//! Values are a closed sum type. Arrays and objects are shared by
//! reference (`Rc<RefCell<..>>`), so assignment and parameter passing
//! alias the same storage; equality on aggregates is reference
//! identity, never structural.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl};
use crate::builtins::Builtin;
use crate::scope::ScopeRef;

/// A user-defined function value: the shared declaration plus the
/// scope captured at its definition site (closures).
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub decl: Rc<FunctionDecl>,
    pub closure: ScopeRef,
}

/// A class value: property initializers and methods, flattened over
/// the superclass at declaration time, plus the defining scope.
#[derive(Debug)]
pub struct ClassValue {
    pub name: String,
    pub properties: Vec<(String, Expr)>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub closure: ScopeRef,
}

impl ClassValue {
    pub fn method(&self, name: &str) -> Option<&Rc<FunctionDecl>> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(Rc<String>),
    Bool(bool),
    Null,
    Undefined,
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<HashMap<String, Value>>>),
    Function(Rc<FunctionValue>),
    Class(Rc<ClassValue>),
    Builtin(&'static Builtin),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(s.into()))
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn object(entries: HashMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    /// Truthiness: `false`, `null`, `undefined`, `0` and `""` are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null | Value::Undefined => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::Class(_) => "class",
        }
    }

    /// Coercing equality, pinned by the table below:
    ///
    /// - number == number: IEEE-754 (NaN is unequal to itself)
    /// - string == string: byte equality; bool == bool: identity
    /// - null == null, undefined == undefined, null == undefined: true
    /// - number == string: the string is parsed as a number;
    ///   unparseable strings compare unequal
    /// - bool == non-bool: the bool coerces to 1/0, then re-compares
    /// - arrays, objects, functions, classes: reference identity
    /// - every remaining cross-kind pair: unequal
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,
            (Value::Number(n), Value::Str(s)) | (Value::Str(s), Value::Number(n)) => {
                s.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
            }
            (Value::Bool(b), other) | (other, Value::Bool(b)) => {
                Value::Number(if *b { 1.0 } else { 0.0 }).loose_eq(other)
            }
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                // Whole numbers print without a trailing ".0".
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, v) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                // Keys print sorted so output is deterministic.
                let entries = entries.borrow();
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {}", entries[*key])?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.decl.name),
            Value::Class(class) => write!(f, "<class {}>", class.name),
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
        }
    }
}
