use thiserror::Error;

/// Top-level error type for the Vesper pipeline.
///
/// Lexing and parsing abort the call immediately with no partial AST;
/// runtime errors abort the current `execute` call. `Compilation` wraps
/// any failure surfaced through `compile_to_target` with a stable
/// message prefix.
#[derive(Debug, Error)]
pub enum VesperError {
    #[error("lex error: unexpected character '{character}' at line {line}, column {column}")]
    Lex {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("parse error: expected {expected}, found {found} at line {line}, column {column}")]
    Parse {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("unsupported target: {0}")]
    UnsupportedTarget(String),
    #[error("compilation failed: {0}")]
    Compilation(String),
}

/// Errors raised by the evaluator.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("'{0}' is not a function")]
    NotAFunction(String),
    #[error("while loop exceeded {0} iterations")]
    InfiniteLoop(u64),
    #[error("break outside of a loop")]
    BreakOutsideLoop,
    #[error("continue outside of a loop")]
    ContinueOutsideLoop,
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}
