//! Flat intermediate representation.
//!
//! An IR program is a linear `Vec<Instruction>`; control flow is
//! expressed with label pseudo-instructions and jumps inline in the
//! same stream. Operands are literals or symbolic names: source
//! variables, fresh temporaries (`t0, t1, …`) or labels (`L0, L1, …`).
//! Every temporary is produced by exactly one instruction before any
//! read; the optimizer relies on this single-assignment discipline but
//! does not verify it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison and logic
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Neg,

    // Data movement
    Assign,
    Index,
    Member,
    StoreIndex,
    StoreMember,

    // Control flow
    Label,
    Jump,
    JumpIfFalse,

    // Calls and function bracketing
    Arg,
    Call,
    Return,
    Function,
    Param,
    EndFunction,
}

impl Opcode {
    /// Arithmetic opcodes are the ones constant folding and CSE act on.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod
        )
    }

    /// Pure value producers may be dropped when their result is unread.
    pub fn is_pure(self) -> bool {
        self.is_arithmetic()
            || matches!(
                self,
                Opcode::Eq
                    | Opcode::Ne
                    | Opcode::Lt
                    | Opcode::Le
                    | Opcode::Gt
                    | Opcode::Ge
                    | Opcode::And
                    | Opcode::Or
                    | Opcode::Not
                    | Opcode::Neg
                    | Opcode::Assign
                    | Opcode::Index
                    | Opcode::Member
            )
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Eq => "eq",
            Opcode::Ne => "ne",
            Opcode::Lt => "lt",
            Opcode::Le => "le",
            Opcode::Gt => "gt",
            Opcode::Ge => "ge",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Not => "not",
            Opcode::Neg => "neg",
            Opcode::Assign => "assign",
            Opcode::Index => "index",
            Opcode::Member => "member",
            Opcode::StoreIndex => "store_index",
            Opcode::StoreMember => "store_member",
            Opcode::Label => "label",
            Opcode::Jump => "jump",
            Opcode::JumpIfFalse => "jump_if_false",
            Opcode::Arg => "arg",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::Function => "function",
            Opcode::Param => "param",
            Opcode::EndFunction => "end_function",
        }
    }
}

/// Fresh temporaries are `t` followed by digits. Lowering renames any
/// source variable spelled this way, so downstream passes may treat
/// every match as a discardable intermediate.
pub fn is_temp_name(name: &str) -> bool {
    name.strip_prefix('t')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// An operand: a literal or a symbolic name.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Name(String),
}

impl Operand {
    pub fn name(name: impl Into<String>) -> Operand {
        Operand::Name(name.into())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Operand::Str(s) => write!(f, "{s:?}"),
            Operand::Bool(b) => write!(f, "{b}"),
            Operand::Null => write!(f, "null"),
            Operand::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One IR instruction: opcode, up to two operands, optional result name.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Opcode,
    pub a: Option<Operand>,
    pub b: Option<Operand>,
    pub result: Option<String>,
}

impl Instruction {
    pub fn binary(op: Opcode, a: Operand, b: Operand, result: impl Into<String>) -> Instruction {
        Instruction {
            op,
            a: Some(a),
            b: Some(b),
            result: Some(result.into()),
        }
    }

    pub fn unary(op: Opcode, a: Operand, result: impl Into<String>) -> Instruction {
        Instruction {
            op,
            a: Some(a),
            b: None,
            result: Some(result.into()),
        }
    }

    pub fn assign(value: Operand, result: impl Into<String>) -> Instruction {
        Instruction {
            op: Opcode::Assign,
            a: Some(value),
            b: None,
            result: Some(result.into()),
        }
    }

    pub fn label(name: impl Into<String>) -> Instruction {
        Instruction {
            op: Opcode::Label,
            a: Some(Operand::Name(name.into())),
            b: None,
            result: None,
        }
    }

    pub fn jump(target: impl Into<String>) -> Instruction {
        Instruction {
            op: Opcode::Jump,
            a: Some(Operand::Name(target.into())),
            b: None,
            result: None,
        }
    }

    pub fn jump_if_false(condition: Operand, target: impl Into<String>) -> Instruction {
        Instruction {
            op: Opcode::JumpIfFalse,
            a: Some(condition),
            b: Some(Operand::Name(target.into())),
            result: None,
        }
    }

    pub fn simple(op: Opcode) -> Instruction {
        Instruction {
            op,
            a: None,
            b: None,
            result: None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op.mnemonic())?;
        if let Some(a) = &self.a {
            write!(f, " {a}")?;
        }
        if let Some(b) = &self.b {
            write!(f, " {b}")?;
        }
        if let Some(result) = &self.result {
            write!(f, " -> {result}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_temporary_names() {
        assert!(is_temp_name("t0"));
        assert!(is_temp_name("t42"));
        assert!(!is_temp_name("t"));
        assert!(!is_temp_name("t1_"));
        assert!(!is_temp_name("total"));
        assert!(!is_temp_name("x"));
    }

    #[test]
    fn classifies_opcodes() {
        assert!(Opcode::Add.is_arithmetic());
        assert!(!Opcode::Eq.is_arithmetic());
        assert!(Opcode::Eq.is_pure());
        assert!(!Opcode::Call.is_pure());
        assert!(!Opcode::StoreIndex.is_pure());
    }

    #[test]
    fn displays_instructions() {
        let inst = Instruction::binary(
            Opcode::Add,
            Operand::name("x"),
            Operand::Number(2.0),
            "t0",
        );
        assert_eq!(inst.to_string(), "add x 2 -> t0");
        assert_eq!(Instruction::label("L1").to_string(), "label L1");
        assert_eq!(
            Instruction::jump_if_false(Operand::name("t0"), "L2").to_string(),
            "jump_if_false t0 L2"
        );
    }
}
