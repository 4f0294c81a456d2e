//! IR optimization passes.
//!
//! Three passes in a fixed order, each run exactly once: constant
//! folding, dead-code elimination, common-subexpression elimination.
//! The pipeline is not run to a fixed point; a second `optimize` call
//! may find opportunities the first one exposed.

use std::collections::{HashMap, HashSet};

use crate::ir::{Instruction, Opcode, Operand, is_temp_name};

/// Run all three passes once, in order.
pub fn optimize(instructions: &[Instruction]) -> Vec<Instruction> {
    let folded = fold_constants(instructions);
    let pruned = eliminate_dead_code(&folded);
    eliminate_common_subexpressions(&pruned)
}

/// Replaces every arithmetic instruction whose two operands are number
/// literals with an `assign` carrying the computed literal.
pub fn fold_constants(instructions: &[Instruction]) -> Vec<Instruction> {
    instructions
        .iter()
        .map(|inst| {
            if inst.op.is_arithmetic() {
                let a = inst.a.as_ref().and_then(Operand::as_number);
                let b = inst.b.as_ref().and_then(Operand::as_number);
                if let (Some(a), Some(b), Some(result)) = (a, b, &inst.result) {
                    let value = apply_arithmetic(inst.op, a, b);
                    return Instruction::assign(Operand::Number(value), result.clone());
                }
            }
            inst.clone()
        })
        .collect()
}

/// Drops pure instructions producing a temporary that is never read
/// anywhere in the stream, and labels no jump targets. Writes to
/// source variables are the program's observable effect and always
/// survive. The read set is computed over the whole stream, so a
/// temporary read only by another dead instruction survives until a
/// later pass observes the new stream.
pub fn eliminate_dead_code(instructions: &[Instruction]) -> Vec<Instruction> {
    let mut read: HashSet<&str> = HashSet::new();
    let mut targets: HashSet<&str> = HashSet::new();
    for inst in instructions {
        match inst.op {
            Opcode::Jump => {
                if let Some(target) = inst.a.as_ref().and_then(Operand::as_name) {
                    targets.insert(target);
                }
            }
            Opcode::JumpIfFalse => {
                if let Some(name) = inst.a.as_ref().and_then(Operand::as_name) {
                    read.insert(name);
                }
                if let Some(target) = inst.b.as_ref().and_then(Operand::as_name) {
                    targets.insert(target);
                }
            }
            Opcode::Label => {}
            _ => {
                for operand in [&inst.a, &inst.b] {
                    if let Some(name) = operand.as_ref().and_then(Operand::as_name) {
                        read.insert(name);
                    }
                }
            }
        }
    }

    let mut kept: Vec<Instruction> = Vec::new();
    for inst in instructions.iter().rev() {
        match inst.op {
            Opcode::Label => {
                let targeted = inst
                    .a
                    .as_ref()
                    .and_then(Operand::as_name)
                    .is_some_and(|name| targets.contains(name));
                if !targeted {
                    continue;
                }
            }
            op if op.is_pure() => {
                if let Some(result) = &inst.result {
                    if is_temp_name(result) && !read.contains(result.as_str()) {
                        continue;
                    }
                }
            }
            _ => {}
        }
        kept.push(inst.clone());
    }
    kept.reverse();
    kept
}

/// Memoizes arithmetic instructions by `(opcode, operand1, operand2)`
/// and rewrites an exact repeat into an `assign` of the earlier
/// result. Writing to a name evicts memo entries that read or cache
/// it. The memo is not cleared at labels or jumps, so a value reaching
/// a label from two paths can still be wrongly reused; there is no
/// control-flow tracking.
pub fn eliminate_common_subexpressions(instructions: &[Instruction]) -> Vec<Instruction> {
    let mut memo: HashMap<(Opcode, String, String), String> = HashMap::new();
    let mut out = Vec::with_capacity(instructions.len());
    for inst in instructions {
        let mut pending: Option<(Opcode, String, String)> = None;
        let mut replaced = false;
        if inst.op.is_arithmetic() {
            if let (Some(a), Some(b), Some(result)) = (&inst.a, &inst.b, &inst.result) {
                let key = (inst.op, a.to_string(), b.to_string());
                match memo.get(&key) {
                    Some(prior) => {
                        out.push(Instruction::assign(
                            Operand::name(prior.clone()),
                            result.clone(),
                        ));
                        replaced = true;
                    }
                    None => pending = Some(key),
                }
            }
        }
        if let Some(result) = &inst.result {
            let written = result.clone();
            memo.retain(|(_, a, b), cached| {
                *a != written && *b != written && *cached != written
            });
        }
        match pending {
            Some(key) => {
                if let Some(result) = &inst.result {
                    memo.insert(key, result.clone());
                }
                out.push(inst.clone());
            }
            None if !replaced => out.push(inst.clone()),
            None => {}
        }
    }
    out
}

fn apply_arithmetic(op: Opcode, a: f64, b: f64) -> f64 {
    match op {
        Opcode::Add => a + b,
        Opcode::Sub => a - b,
        Opcode::Mul => a * b,
        Opcode::Div => a / b,
        Opcode::Mod => a % b,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(a: Operand, b: Operand, result: &str) -> Instruction {
        Instruction::binary(Opcode::Add, a, b, result)
    }

    fn num(n: f64) -> Operand {
        Operand::Number(n)
    }

    fn name(n: &str) -> Operand {
        Operand::name(n)
    }

    #[test]
    fn folds_literal_arithmetic_into_assigns() {
        let ir = vec![
            add(num(1.0), num(2.0), "t0"),
            Instruction::binary(Opcode::Mul, num(4.0), num(5.0), "t1"),
        ];
        let folded = fold_constants(&ir);
        assert_eq!(folded[0].to_string(), "assign 3 -> t0");
        assert_eq!(folded[1].to_string(), "assign 20 -> t1");
        assert!(folded.iter().all(|i| i.op == Opcode::Assign));
    }

    #[test]
    fn folding_leaves_symbolic_operands_alone() {
        let ir = vec![add(name("x"), num(2.0), "t0")];
        assert_eq!(fold_constants(&ir), ir);
    }

    #[test]
    fn division_by_zero_folds_to_infinity() {
        let ir = vec![Instruction::binary(Opcode::Div, num(1.0), num(0.0), "t0")];
        let folded = fold_constants(&ir);
        let Some(Operand::Number(n)) = folded[0].a else {
            panic!("expected a number operand");
        };
        assert!(n.is_infinite());
    }

    #[test]
    fn dce_drops_unread_temporaries_and_untargeted_labels() {
        let ir = vec![
            add(name("x"), name("y"), "t0"),
            Instruction::assign(name("t0"), "z"),
            add(name("x"), num(1.0), "t9"),
            Instruction::label("L0"),
            Instruction::jump("L1"),
            Instruction::label("L1"),
            Instruction::jump_if_false(name("z"), "L1"),
        ];
        let pruned = eliminate_dead_code(&ir);
        let text: Vec<String> = pruned.iter().map(Instruction::to_string).collect();
        assert!(!text.iter().any(|line| line.contains("t9")));
        assert!(!text.contains(&"label L0".to_string()));
        assert!(text.contains(&"label L1".to_string()));
        // no surviving instruction reads a removed result name
        for inst in &pruned {
            for operand in [&inst.a, &inst.b] {
                if let Some(Operand::Name(n)) = operand {
                    assert_ne!(n, "t9");
                }
            }
        }
    }

    #[test]
    fn dce_never_drops_writes_to_source_variables() {
        let ir = vec![Instruction::assign(num(5.0), "x")];
        assert_eq!(eliminate_dead_code(&ir), ir);
    }

    #[test]
    fn dce_keeps_calls_with_unread_results() {
        let ir = vec![
            Instruction {
                op: Opcode::Arg,
                a: Some(name("x")),
                b: None,
                result: None,
            },
            Instruction {
                op: Opcode::Call,
                a: Some(name("print")),
                b: Some(num(1.0)),
                result: Some("t0".to_string()),
            },
        ];
        assert_eq!(eliminate_dead_code(&ir).len(), 2);
    }

    #[test]
    fn dce_keeps_loop_carried_assignments() {
        // while x < 10 { x += 1 }: the write to x precedes its read in
        // stream order but must survive.
        let ir = vec![
            Instruction::label("L0"),
            Instruction::binary(Opcode::Lt, name("x"), num(10.0), "t0"),
            Instruction::jump_if_false(name("t0"), "L1"),
            add(name("x"), num(1.0), "t1"),
            Instruction::assign(name("t1"), "x"),
            Instruction::jump("L0"),
            Instruction::label("L1"),
        ];
        assert_eq!(eliminate_dead_code(&ir), ir);
    }

    #[test]
    fn cse_reuses_a_repeated_expression() {
        let ir = vec![
            add(name("x"), name("y"), "t0"),
            add(name("x"), name("y"), "t1"),
        ];
        let out = eliminate_common_subexpressions(&ir);
        assert_eq!(out[1].to_string(), "assign t0 -> t1");
    }

    #[test]
    fn cse_does_not_reuse_across_operand_reassignment() {
        let ir = vec![
            add(name("x"), name("y"), "t0"),
            Instruction::assign(num(5.0), "x"),
            add(name("x"), name("y"), "t1"),
        ];
        let out = eliminate_common_subexpressions(&ir);
        assert_eq!(out[2], ir[2], "t1 must be recomputed, not aliased to t0");
    }

    #[test]
    fn cse_distinguishes_operand_order_and_opcode() {
        let ir = vec![
            add(name("x"), name("y"), "t0"),
            add(name("y"), name("x"), "t1"),
            Instruction::binary(Opcode::Sub, name("x"), name("y"), "t2"),
        ];
        assert_eq!(eliminate_common_subexpressions(&ir), ir);
    }

    #[test]
    fn a_second_optimize_call_may_shrink_the_stream_further() {
        // t1 is unread, so the first call drops it; t0 was read only by
        // t1's producer, which only a second call can observe.
        let ir = vec![
            add(name("x"), name("y"), "t0"),
            add(name("t0"), name("z"), "t1"),
        ];
        let once = optimize(&ir);
        let twice = optimize(&once);
        assert_eq!(once.len(), 1);
        assert_eq!(twice.len(), 0);
    }
}
