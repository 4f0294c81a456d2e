//! AST to IR lowering.
//!
//! Produces a flat instruction stream with monotonically increasing
//! fresh temporary and label counters scoped to one compilation.
//! Expression lowering mirrors the AST shape recursively; literals and
//! identifiers pass through as operands, every other expression lands
//! in a fresh temporary. Lowering never fails on a well-formed AST;
//! constructs outside the IR's vocabulary (classes, imports, catch
//! clauses) are skipped rather than rejected. Source variables spelled
//! like fresh temporaries (`t` plus digits) are renamed with a trailing
//! underscore so the two namespaces stay disjoint.

use std::collections::{HashMap, HashSet};

use crate::ast::{AssignOp, BinaryOp, Expr, FunctionDecl, Literal, Program, Stmt, UnaryOp};
use crate::ir::{Instruction, Opcode, Operand, is_temp_name};

/// Lower a program into a flat IR instruction sequence.
pub fn lower(program: &Program) -> Vec<Instruction> {
    let mut generator = IrGenerator::new(temp_collision_renames(program));
    for stmt in &program.statements {
        generator.lower_stmt(stmt);
    }
    generator.instructions
}

struct IrGenerator {
    instructions: Vec<Instruction>,
    next_temp: usize,
    next_label: usize,
    /// (continue target, break target) for each enclosing loop.
    loop_stack: Vec<(String, String)>,
    /// Source names that would collide with fresh temporaries.
    renames: HashMap<String, String>,
}

impl IrGenerator {
    fn new(renames: HashMap<String, String>) -> Self {
        IrGenerator {
            instructions: Vec::new(),
            next_temp: 0,
            next_label: 0,
            loop_stack: Vec::new(),
            renames,
        }
    }

    /// The IR name for a source variable.
    fn slot(&self, name: &str) -> String {
        match self.renames.get(name) {
            Some(renamed) => renamed.clone(),
            None => name.to_string(),
        }
    }

    fn fresh_temp(&mut self) -> String {
        let name = format!("t{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn fresh_label(&mut self) -> String {
        let name = format!("L{}", self.next_label);
        self.next_label += 1;
        name
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.lower_expr(value);
                let name = self.slot(name);
                self.emit(Instruction::assign(value, name));
            }
            Stmt::Function(decl) => {
                let name = self.slot(&decl.name);
                self.emit(Instruction {
                    op: Opcode::Function,
                    a: Some(Operand::name(name)),
                    b: None,
                    result: None,
                });
                for param in &decl.params {
                    let param = self.slot(param);
                    self.emit(Instruction {
                        op: Opcode::Param,
                        a: Some(Operand::name(param)),
                        b: None,
                        result: None,
                    });
                }
                // Function bodies are bracketed, not nested: a loop in
                // the enclosing code must not catch this body's breaks.
                let saved = std::mem::take(&mut self.loop_stack);
                for stmt in &decl.body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack = saved;
                self.emit(Instruction::simple(Opcode::EndFunction));
            }
            Stmt::If {
                branches,
                else_branch,
            } => {
                let end_label = self.fresh_label();
                for (condition, body) in branches {
                    let next_label = self.fresh_label();
                    let test = self.lower_expr(condition);
                    self.emit(Instruction::jump_if_false(test, next_label.clone()));
                    for stmt in body {
                        self.lower_stmt(stmt);
                    }
                    self.emit(Instruction::jump(end_label.clone()));
                    self.emit(Instruction::label(next_label));
                }
                if let Some(body) = else_branch {
                    for stmt in body {
                        self.lower_stmt(stmt);
                    }
                }
                self.emit(Instruction::label(end_label));
            }
            Stmt::While { condition, body } => {
                let start_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.emit(Instruction::label(start_label.clone()));
                let test = self.lower_expr(condition);
                self.emit(Instruction::jump_if_false(test, end_label.clone()));
                self.loop_stack
                    .push((start_label.clone(), end_label.clone()));
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack.pop();
                self.emit(Instruction::jump(start_label));
                self.emit(Instruction::label(end_label));
            }
            Stmt::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                let variable = self.slot(variable);
                let start_value = self.lower_expr(start);
                self.emit(Instruction::assign(start_value, variable.clone()));
                let end_value = self.lower_expr(end);
                // A literal step fixes the loop direction at compile
                // time; anything else is decided per iteration.
                let step_value = match step {
                    Some(expr) => match literal_number(expr) {
                        Some(n) => Operand::Number(n),
                        None => self.lower_expr(expr),
                    },
                    None => Operand::Number(1.0),
                };

                let start_label = self.fresh_label();
                let update_label = self.fresh_label();
                let end_label = self.fresh_label();

                self.emit(Instruction::label(start_label.clone()));
                let test = match step_value.as_number() {
                    Some(n) => {
                        let op = if n < 0.0 { Opcode::Ge } else { Opcode::Le };
                        let test = self.fresh_temp();
                        self.emit(Instruction::binary(
                            op,
                            Operand::name(&variable),
                            end_value,
                            test.clone(),
                        ));
                        test
                    }
                    None => self.lower_range_test(&variable, end_value, step_value.clone()),
                };
                self.emit(Instruction::jump_if_false(
                    Operand::name(test),
                    end_label.clone(),
                ));

                self.loop_stack
                    .push((update_label.clone(), end_label.clone()));
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack.pop();

                self.emit(Instruction::label(update_label));
                let next = self.fresh_temp();
                self.emit(Instruction::binary(
                    Opcode::Add,
                    Operand::name(&variable),
                    step_value,
                    next.clone(),
                ));
                self.emit(Instruction::assign(Operand::name(next), variable));
                self.emit(Instruction::jump(start_label));
                self.emit(Instruction::label(end_label));
            }
            Stmt::Return(value) => {
                let operand = value.as_ref().map(|expr| self.lower_expr(expr));
                self.emit(Instruction {
                    op: Opcode::Return,
                    a: operand,
                    b: None,
                    result: None,
                });
            }
            Stmt::Break => {
                if let Some((_, break_target)) = self.loop_stack.last().cloned() {
                    self.emit(Instruction::jump(break_target));
                }
            }
            Stmt::Continue => {
                if let Some((continue_target, _)) = self.loop_stack.last().cloned() {
                    self.emit(Instruction::jump(continue_target));
                }
            }
            Stmt::Try {
                body, finally, ..
            } => {
                // The IR has no unwinding; the body and finalizer
                // lower in sequence and catch clauses are dropped.
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                if let Some(cleanup) = finally {
                    for stmt in cleanup {
                        self.lower_stmt(stmt);
                    }
                }
            }
            Stmt::Class(_) | Stmt::Import { .. } => {}
            Stmt::Expression(expr) => {
                self.lower_expr(expr);
            }
        }
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn lower_expr(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::Literal(literal) => literal_operand(literal),
            Expr::Identifier(name) => Operand::name(self.slot(name)),
            Expr::Binary { op, left, right } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                let result = self.fresh_temp();
                self.emit(Instruction::binary(
                    binary_opcode(*op),
                    left,
                    right,
                    result.clone(),
                ));
                Operand::name(result)
            }
            Expr::Unary { op, operand } => {
                let operand = self.lower_expr(operand);
                match op {
                    UnaryOp::Plus => operand,
                    UnaryOp::Not => {
                        let result = self.fresh_temp();
                        self.emit(Instruction::unary(Opcode::Not, operand, result.clone()));
                        Operand::name(result)
                    }
                    UnaryOp::Neg => {
                        let result = self.fresh_temp();
                        self.emit(Instruction::unary(Opcode::Neg, operand, result.clone()));
                        Operand::name(result)
                    }
                }
            }
            Expr::Assign { target, op, value } => self.lower_assign(target, *op, value),
            Expr::Call { callee, args } => {
                let callee = self.lower_expr(callee);
                for arg in args {
                    let operand = self.lower_expr(arg);
                    self.emit(Instruction {
                        op: Opcode::Arg,
                        a: Some(operand),
                        b: None,
                        result: None,
                    });
                }
                let result = self.fresh_temp();
                self.emit(Instruction {
                    op: Opcode::Call,
                    a: Some(callee),
                    b: Some(Operand::Number(args.len() as f64)),
                    result: Some(result.clone()),
                });
                Operand::name(result)
            }
            Expr::Index { object, index } => {
                let object = self.lower_expr(object);
                let index = self.lower_expr(index);
                let result = self.fresh_temp();
                self.emit(Instruction::binary(
                    Opcode::Index,
                    object,
                    index,
                    result.clone(),
                ));
                Operand::name(result)
            }
            Expr::Member { object, property } => {
                let object = self.lower_expr(object);
                let result = self.fresh_temp();
                self.emit(Instruction::binary(
                    Opcode::Member,
                    object,
                    Operand::Str(property.clone()),
                    result.clone(),
                ));
                Operand::name(result)
            }
            Expr::Array(elements) => {
                for element in elements {
                    let operand = self.lower_expr(element);
                    self.emit(Instruction {
                        op: Opcode::Arg,
                        a: Some(operand),
                        b: None,
                        result: None,
                    });
                }
                let result = self.fresh_temp();
                self.emit(Instruction {
                    op: Opcode::Call,
                    a: Some(Operand::name("__array")),
                    b: Some(Operand::Number(elements.len() as f64)),
                    result: Some(result.clone()),
                });
                Operand::name(result)
            }
            Expr::Object(entries) => {
                for (key, value) in entries {
                    let operand = self.lower_expr(value);
                    self.emit(Instruction {
                        op: Opcode::Arg,
                        a: Some(Operand::Str(key.clone())),
                        b: Some(operand),
                        result: None,
                    });
                }
                let result = self.fresh_temp();
                self.emit(Instruction {
                    op: Opcode::Call,
                    a: Some(Operand::name("__object")),
                    b: Some(Operand::Number(entries.len() as f64)),
                    result: Some(result.clone()),
                });
                Operand::name(result)
            }
        }
    }

    fn lower_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> Operand {
        match target {
            Expr::Identifier(name) => {
                let name = self.slot(name);
                let value = self.lower_expr(value);
                let value = match compound_opcode(op) {
                    None => value,
                    Some(opcode) => {
                        let combined = self.fresh_temp();
                        self.emit(Instruction::binary(
                            opcode,
                            Operand::name(name.as_str()),
                            value,
                            combined.clone(),
                        ));
                        Operand::name(combined)
                    }
                };
                self.emit(Instruction::assign(value, name.clone()));
                Operand::name(name)
            }
            Expr::Index { object, index } => {
                let object = self.lower_expr(object);
                let index = self.lower_expr(index);
                let stored = self.lower_compound_value(
                    op,
                    value,
                    Opcode::Index,
                    object.clone(),
                    index.clone(),
                );
                self.emit(Instruction {
                    op: Opcode::StoreIndex,
                    a: Some(object),
                    b: Some(index),
                    result: Some(stored.clone()),
                });
                Operand::name(stored)
            }
            Expr::Member { object, property } => {
                let object = self.lower_expr(object);
                let property = Operand::Str(property.clone());
                let stored = self.lower_compound_value(
                    op,
                    value,
                    Opcode::Member,
                    object.clone(),
                    property.clone(),
                );
                self.emit(Instruction {
                    op: Opcode::StoreMember,
                    a: Some(object),
                    b: Some(property),
                    result: Some(stored.clone()),
                });
                Operand::name(stored)
            }
            // The evaluator rejects other targets at runtime; lowering
            // just drops them.
            _ => self.lower_expr(value),
        }
    }

    /// Computes the value to store for a (possibly compound) indexed or
    /// member assignment, materialized into a named temporary so the
    /// store's result field can reference it.
    fn lower_compound_value(
        &mut self,
        op: AssignOp,
        value: &Expr,
        load_op: Opcode,
        container: Operand,
        key: Operand,
    ) -> String {
        let value = self.lower_expr(value);
        let combined = match compound_opcode(op) {
            None => value,
            Some(opcode) => {
                let old = self.fresh_temp();
                self.emit(Instruction::binary(load_op, container, key, old.clone()));
                let combined = self.fresh_temp();
                self.emit(Instruction::binary(
                    opcode,
                    Operand::name(old),
                    value,
                    combined.clone(),
                ));
                Operand::name(combined)
            }
        };
        self.materialize(combined)
    }

    /// A step only known at run time needs both directions tested:
    /// `(step > 0 && var <= end) || (step < 0 && var >= end)`.
    fn lower_range_test(&mut self, variable: &str, end: Operand, step: Operand) -> String {
        let ascending = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::Gt,
            step.clone(),
            Operand::Number(0.0),
            ascending.clone(),
        ));
        let below = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::Le,
            Operand::name(variable),
            end.clone(),
            below.clone(),
        ));
        let up = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::And,
            Operand::name(ascending),
            Operand::name(below),
            up.clone(),
        ));
        let descending = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::Lt,
            step,
            Operand::Number(0.0),
            descending.clone(),
        ));
        let above = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::Ge,
            Operand::name(variable),
            end,
            above.clone(),
        ));
        let down = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::And,
            Operand::name(descending),
            Operand::name(above),
            down.clone(),
        ));
        let test = self.fresh_temp();
        self.emit(Instruction::binary(
            Opcode::Or,
            Operand::name(up),
            Operand::name(down),
            test.clone(),
        ));
        test
    }

    /// Returns a name for the operand, emitting an assign for literals.
    fn materialize(&mut self, operand: Operand) -> String {
        match operand {
            Operand::Name(name) => name,
            literal => {
                let temp = self.fresh_temp();
                self.emit(Instruction::assign(literal, temp.clone()));
                temp
            }
        }
    }
}

/// Number literals, possibly under prefix signs.
fn literal_number(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Literal(Literal::Number(n)) => Some(*n),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => literal_number(operand).map(|n| -n),
        Expr::Unary {
            op: UnaryOp::Plus,
            operand,
        } => literal_number(operand),
        _ => None,
    }
}

/// Maps every source variable spelled like a fresh temporary to a
/// replacement with trailing underscores, picked to miss every other
/// name in the program.
fn temp_collision_renames(program: &Program) -> HashMap<String, String> {
    let mut names = HashSet::new();
    collect_stmt_names(&program.statements, &mut names);

    let mut renames = HashMap::new();
    for name in names.iter().filter(|name| is_temp_name(name)) {
        let mut fresh = format!("{name}_");
        while names.contains(&fresh) {
            fresh.push('_');
        }
        renames.insert(name.clone(), fresh);
    }
    renames
}

fn collect_stmt_names(statements: &[Stmt], names: &mut HashSet<String>) {
    for stmt in statements {
        match stmt {
            Stmt::Let { name, value } => {
                names.insert(name.clone());
                collect_expr_names(value, names);
            }
            Stmt::Function(decl) => collect_function_names(decl, names),
            Stmt::Class(decl) => {
                names.insert(decl.name.clone());
                for (_, init) in &decl.properties {
                    collect_expr_names(init, names);
                }
                for method in &decl.methods {
                    collect_function_names(method, names);
                }
            }
            Stmt::If {
                branches,
                else_branch,
            } => {
                for (condition, body) in branches {
                    collect_expr_names(condition, names);
                    collect_stmt_names(body, names);
                }
                if let Some(body) = else_branch {
                    collect_stmt_names(body, names);
                }
            }
            Stmt::While { condition, body } => {
                collect_expr_names(condition, names);
                collect_stmt_names(body, names);
            }
            Stmt::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                names.insert(variable.clone());
                collect_expr_names(start, names);
                collect_expr_names(end, names);
                if let Some(step) = step {
                    collect_expr_names(step, names);
                }
                collect_stmt_names(body, names);
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    collect_expr_names(value, names);
                }
            }
            Stmt::Try {
                body,
                catch,
                finally,
            } => {
                collect_stmt_names(body, names);
                if let Some((param, handler)) = catch {
                    if let Some(param) = param {
                        names.insert(param.clone());
                    }
                    collect_stmt_names(handler, names);
                }
                if let Some(cleanup) = finally {
                    collect_stmt_names(cleanup, names);
                }
            }
            Stmt::Break | Stmt::Continue | Stmt::Import { .. } => {}
            Stmt::Expression(expr) => collect_expr_names(expr, names),
        }
    }
}

fn collect_function_names(decl: &FunctionDecl, names: &mut HashSet<String>) {
    names.insert(decl.name.clone());
    for param in &decl.params {
        names.insert(param.clone());
    }
    collect_stmt_names(&decl.body, names);
}

fn collect_expr_names(expr: &Expr, names: &mut HashSet<String>) {
    match expr {
        Expr::Identifier(name) => {
            names.insert(name.clone());
        }
        Expr::Assign { target, value, .. } => {
            collect_expr_names(target, names);
            collect_expr_names(value, names);
        }
        Expr::Binary { left, right, .. } => {
            collect_expr_names(left, names);
            collect_expr_names(right, names);
        }
        Expr::Unary { operand, .. } => collect_expr_names(operand, names),
        Expr::Call { callee, args } => {
            collect_expr_names(callee, names);
            for arg in args {
                collect_expr_names(arg, names);
            }
        }
        Expr::Index { object, index } => {
            collect_expr_names(object, names);
            collect_expr_names(index, names);
        }
        Expr::Member { object, .. } => collect_expr_names(object, names),
        Expr::Array(elements) => {
            for element in elements {
                collect_expr_names(element, names);
            }
        }
        Expr::Object(entries) => {
            for (_, value) in entries {
                collect_expr_names(value, names);
            }
        }
        Expr::Literal(_) => {}
    }
}

fn literal_operand(literal: &Literal) -> Operand {
    match literal {
        Literal::Number(n) => Operand::Number(*n),
        Literal::Str(s) => Operand::Str(s.clone()),
        Literal::Bool(b) => Operand::Bool(*b),
        Literal::Null => Operand::Null,
    }
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Eq => Opcode::Eq,
        BinaryOp::Ne => Opcode::Ne,
        BinaryOp::Lt => Opcode::Lt,
        BinaryOp::Le => Opcode::Le,
        BinaryOp::Gt => Opcode::Gt,
        BinaryOp::Ge => Opcode::Ge,
        BinaryOp::And => Opcode::And,
        BinaryOp::Or => Opcode::Or,
    }
}

fn compound_opcode(op: AssignOp) -> Option<Opcode> {
    match op {
        AssignOp::Set => None,
        AssignOp::Add => Some(Opcode::Add),
        AssignOp::Sub => Some(Opcode::Sub),
        AssignOp::Mul => Some(Opcode::Mul),
        AssignOp::Div => Some(Opcode::Div),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn lower_source(source: &str) -> Vec<Instruction> {
        lower(&parse(source).expect("parse"))
    }

    fn render(instructions: &[Instruction]) -> Vec<String> {
        instructions.iter().map(Instruction::to_string).collect()
    }

    #[test]
    fn lowers_let_with_nested_expression() {
        let ir = lower_source("let z = 1 + 2 * 3");
        assert_eq!(
            render(&ir),
            vec!["mul 2 3 -> t0", "add 1 t0 -> t1", "assign t1 -> z"]
        );
    }

    #[test]
    fn temporaries_and_labels_are_fresh_per_compilation() {
        let first = lower_source("let a = 1 + 2");
        let second = lower_source("let a = 1 + 2");
        assert_eq!(first, second);
    }

    #[test]
    fn lowers_if_with_jump_pattern() {
        let ir = lower_source("if a < b { let x = 1 } else { let x = 2 }");
        let text = render(&ir);
        assert_eq!(
            text,
            vec![
                "lt a b -> t0",
                "jump_if_false t0 L1",
                "assign 1 -> x",
                "jump L0",
                "label L1",
                "assign 2 -> x",
                "label L0",
            ]
        );
    }

    #[test]
    fn lowers_while_with_loop_pattern() {
        let ir = lower_source("while x < 10 { x += 1 }");
        let text = render(&ir);
        assert_eq!(
            text,
            vec![
                "label L0",
                "lt x 10 -> t0",
                "jump_if_false t0 L1",
                "add x 1 -> t1",
                "assign t1 -> x",
                "jump L0",
                "label L1",
            ]
        );
    }

    #[test]
    fn lowers_for_with_update_block() {
        let ir = lower_source("for i = 1 to 3 { }");
        let text = render(&ir);
        assert_eq!(
            text,
            vec![
                "assign 1 -> i",
                "label L0",
                "le i 3 -> t0",
                "jump_if_false t0 L2",
                "label L1",
                "add i 1 -> t1",
                "assign t1 -> i",
                "jump L0",
                "label L2",
            ]
        );
    }

    #[test]
    fn descending_literal_step_reverses_the_range_test() {
        let ir = lower_source("for i = 3 to 1 step -1 { }");
        let text = render(&ir);
        assert_eq!(
            text,
            vec![
                "assign 3 -> i",
                "label L0",
                "ge i 1 -> t0",
                "jump_if_false t0 L2",
                "label L1",
                "add i -1 -> t1",
                "assign t1 -> i",
                "jump L0",
                "label L2",
            ]
        );
    }

    #[test]
    fn runtime_step_tests_both_directions() {
        let ir = lower_source("for i = 9 to 1 step s { }");
        let text = render(&ir);
        assert_eq!(
            text,
            vec![
                "assign 9 -> i",
                "label L0",
                "gt s 0 -> t0",
                "le i 1 -> t1",
                "and t0 t1 -> t2",
                "lt s 0 -> t3",
                "ge i 1 -> t4",
                "and t3 t4 -> t5",
                "or t2 t5 -> t6",
                "jump_if_false t6 L2",
                "label L1",
                "add i s -> t7",
                "assign t7 -> i",
                "jump L0",
                "label L2",
            ]
        );
    }

    #[test]
    fn source_names_in_the_temporary_namespace_are_renamed() {
        let ir = lower_source("let t1 = 5\nlet x = t1 + 1");
        assert_eq!(
            render(&ir),
            vec!["assign 5 -> t1_", "add t1_ 1 -> t0", "assign t0 -> x"]
        );
    }

    #[test]
    fn renaming_avoids_existing_source_names() {
        let ir = lower_source("let t1 = 1\nlet t1_ = 2");
        assert_eq!(render(&ir), vec!["assign 1 -> t1__", "assign 2 -> t1_"]);
    }

    #[test]
    fn break_and_continue_jump_to_loop_labels() {
        let ir = lower_source("while true { break }");
        let text = render(&ir);
        assert!(text.contains(&"jump L1".to_string()));

        let ir = lower_source("for i = 1 to 3 { continue }");
        let text = render(&ir);
        assert!(text.contains(&"jump L1".to_string()), "continue targets the update label");
    }

    #[test]
    fn lowers_function_with_bracketing_markers() {
        let ir = lower_source("def add(a, b) { return a + b }");
        let text = render(&ir);
        assert_eq!(
            text,
            vec![
                "function add",
                "param a",
                "param b",
                "add a b -> t0",
                "return t0",
                "end_function",
            ]
        );
    }

    #[test]
    fn lowers_calls_with_arg_instructions() {
        let ir = lower_source("let r = add(1, x)");
        let text = render(&ir);
        assert_eq!(
            text,
            vec!["arg 1", "arg x", "call add 2 -> t0", "assign t0 -> r"]
        );
    }

    #[test]
    fn classes_and_imports_lower_to_nothing() {
        assert!(lower_source("import { a } from \"m\"").is_empty());
        assert!(lower_source("class C { }").is_empty());
    }
}
