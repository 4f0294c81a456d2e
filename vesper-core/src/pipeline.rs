//! The two public entry points: direct execution and compilation.
//!
//! `execute` runs a source text through lexer, parser and evaluator.
//! `Compiler` runs lexer, parser, lowering and the optimizer, then
//! dispatches to a registered backend for the target text.

use crate::backend::{self, Backend, BackendOptions, BackendRegistry};
use crate::error::VesperError;
use crate::interpreter::Interpreter;
use crate::lowering;
use crate::optimizer;
use crate::parser;
use crate::value::Value;

/// Tokenize, parse and evaluate `source` on a fresh engine, returning
/// the value of the last evaluated statement.
pub fn execute(source: &str) -> Result<Value, VesperError> {
    let program = parser::parse(source)?;
    let mut interpreter = Interpreter::new();
    Ok(interpreter.run(&program)?)
}

/// Compile `source` for `target` using the bundled backends.
pub fn compile_to_target(source: &str, target: &str) -> Result<String, VesperError> {
    Compiler::default().compile(source, target)
}

/// A compilation front holding the backend registry and emit options.
/// Custom emitters register under a target name and are dispatched to
/// exactly like the bundled ones.
pub struct Compiler {
    registry: BackendRegistry,
    options: BackendOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            registry: BackendRegistry::with_default_targets(),
            options: BackendOptions::default(),
        }
    }

    pub fn with_options(options: BackendOptions) -> Self {
        Compiler {
            registry: BackendRegistry::with_default_targets(),
            options,
        }
    }

    pub fn register_target(&mut self, name: impl Into<String>, backend: Box<dyn Backend>) {
        self.registry.register(name, backend);
    }

    /// Registered target names, sorted.
    pub fn targets(&self) -> Vec<&str> {
        self.registry.targets()
    }

    /// The output file extension for `target`: the registered backend's
    /// if present, the static table's otherwise.
    pub fn extension(&self, target: &str) -> Option<&'static str> {
        self.registry
            .get(target)
            .map(|backend| backend.extension())
            .or_else(|| backend::extension_for(target))
    }

    pub fn compile(&self, source: &str, target: &str) -> Result<String, VesperError> {
        let backend = self
            .registry
            .get(target)
            .ok_or_else(|| VesperError::UnsupportedTarget(target.to_string()))?;
        let program =
            parser::parse(source).map_err(|err| VesperError::Compilation(err.to_string()))?;
        let ir = lowering::lower(&program);
        let optimized = optimizer::optimize(&ir);
        Ok(backend.generate(&optimized, &self.options))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}
