//! Scopes and identifier resolution.
//!
//! A scope owns a name-to-value map and holds an optional link to its
//! parent. Lookup is an explicit loop over parent links terminating at
//! the global scope; the caller falls back to the builtin table when
//! the chain fails.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Default)]
pub struct Scope {
    values: HashMap<String, Value>,
    parent: Option<ScopeRef>,
}

impl Scope {
    /// The global scope: no parent.
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Scope::default()))
    }

    /// A child scope delegating lookups to `parent`. Created at each
    /// function call (parent = the function's captured defining scope)
    /// and at block constructs needing isolation.
    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            values: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Defines or overwrites `name` in this scope only.
    pub fn define(scope: &ScopeRef, name: &str, value: Value) {
        scope.borrow_mut().values.insert(name.to_string(), value);
    }

    /// Resolves `name` by walking the parent chain.
    pub fn get(scope: &ScopeRef, name: &str) -> Option<Value> {
        let mut current = Rc::clone(scope);
        loop {
            if let Some(value) = current.borrow().values.get(name) {
                return Some(value.clone());
            }
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => current = p,
                None => return None,
            }
        }
    }

    /// Assigns to the nearest existing binding of `name`. Returns
    /// false if no scope in the chain defines it.
    pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> bool {
        let mut current = Rc::clone(scope);
        loop {
            if current.borrow().values.contains_key(name) {
                current.borrow_mut().values.insert(name.to_string(), value);
                return true;
            }
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => current = p,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings() {
        let global = Scope::root();
        Scope::define(&global, "x", Value::Number(1.0));
        let inner = Scope::child(&global);
        assert!(Scope::get(&inner, "x").is_some());
        assert!(Scope::get(&inner, "y").is_none());
    }

    #[test]
    fn define_shadows_without_touching_parent() {
        let global = Scope::root();
        Scope::define(&global, "x", Value::Number(1.0));
        let inner = Scope::child(&global);
        Scope::define(&inner, "x", Value::Number(2.0));
        assert!(matches!(Scope::get(&inner, "x"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(Scope::get(&global, "x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let global = Scope::root();
        Scope::define(&global, "x", Value::Number(1.0));
        let inner = Scope::child(&global);
        assert!(Scope::assign(&inner, "x", Value::Number(5.0)));
        assert!(matches!(Scope::get(&global, "x"), Some(Value::Number(n)) if n == 5.0));
        assert!(!Scope::assign(&inner, "missing", Value::Null));
    }
}
