//! Built-in functions for the Vesper runtime.
//!
//! The table is fixed: identifier resolution consults it only after
//! the scope chain and the global scope both fail. Builtins receive
//! already-evaluated arguments and cannot observe the scope chain.

use crate::error::RuntimeError;
use crate::value::Value;

type BuiltinFn = fn(&[Value]) -> Result<Value, RuntimeError>;

/// Metadata and implementation for a single builtin.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// The complete list of builtins known to the core.
pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "print", func: builtin_print },
    Builtin { name: "len", func: builtin_len },
    Builtin { name: "str", func: builtin_str },
    Builtin { name: "num", func: builtin_num },
    Builtin { name: "type", func: builtin_type },
    Builtin { name: "push", func: builtin_push },
    Builtin { name: "keys", func: builtin_keys },
    Builtin { name: "abs", func: builtin_abs },
    Builtin { name: "floor", func: builtin_floor },
    Builtin { name: "sqrt", func: builtin_sqrt },
];

/// Look up a builtin by name. Linear search; the table is small.
pub fn find(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn number_arg(name: &str, args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    match arg(args, index) {
        Value::Number(n) => Ok(n),
        other => Err(RuntimeError::TypeMismatch(format!(
            "{name} expects a number, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_print(args: &[Value]) -> Result<Value, RuntimeError> {
    let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::Undefined)
}

fn builtin_len(args: &[Value]) -> Result<Value, RuntimeError> {
    match arg(args, 0) {
        Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::Array(elements) => Ok(Value::Number(elements.borrow().len() as f64)),
        Value::Object(entries) => Ok(Value::Number(entries.borrow().len() as f64)),
        other => Err(RuntimeError::TypeMismatch(format!(
            "len expects a string, array or object, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_str(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::string(arg(args, 0).to_string()))
}

/// Parses a value as a number; unparseable input yields `null` rather
/// than an error.
fn builtin_num(args: &[Value]) -> Result<Value, RuntimeError> {
    match arg(args, 0) {
        Value::Number(n) => Ok(Value::Number(n)),
        Value::Bool(b) => Ok(Value::Number(if b { 1.0 } else { 0.0 })),
        Value::Str(s) => Ok(s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

fn builtin_type(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::string(arg(args, 0).type_name()))
}

fn builtin_push(args: &[Value]) -> Result<Value, RuntimeError> {
    match arg(args, 0) {
        Value::Array(elements) => {
            elements.borrow_mut().push(arg(args, 1));
            Ok(Value::Array(elements))
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "push expects an array, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_keys(args: &[Value]) -> Result<Value, RuntimeError> {
    match arg(args, 0) {
        Value::Object(entries) => {
            let mut keys: Vec<String> = entries.borrow().keys().cloned().collect();
            keys.sort();
            Ok(Value::array(keys.into_iter().map(Value::string).collect()))
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "keys expects an object, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_abs(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(number_arg("abs", args, 0)?.abs()))
}

fn builtin_floor(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(number_arg("floor", args, 0)?.floor()))
}

fn builtin_sqrt(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(number_arg("sqrt", args, 0)?.sqrt()))
}
