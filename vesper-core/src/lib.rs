//! Core pipeline for the Vesper scripting language.
//!
//! The pipeline is roughly:
//!
//!   source .vsp
//!     -> lexer       (tokens)
//!     -> parser      (AST)
//!     -> interpreter (direct evaluation)
//!   or, for compilation:
//!     -> lowering    (flat IR)
//!     -> optimizer   (fold / dce / cse)
//!     -> backend     (target source text)
//!
//! Higher-level tools (CLI, embedders) should depend on this crate
//! rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Runtime: values, scopes, builtins, evaluation
// ---------------------------------------------------------------------

pub mod value;
pub mod scope;
pub mod builtins;
pub mod interpreter;

// ---------------------------------------------------------------------
// Back-end: IR, optimization, emitters, orchestration
// ---------------------------------------------------------------------

pub mod ir;
pub mod lowering;
pub mod optimizer;
pub mod backend;
pub mod pipeline;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use backend::{Backend, BackendOptions, BackendRegistry, extension_for};
pub use error::{RuntimeError, VesperError};
pub use interpreter::Interpreter;
pub use pipeline::{Compiler, compile_to_target, execute};
pub use value::Value;
