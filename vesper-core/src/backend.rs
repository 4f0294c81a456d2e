//! Target-text emitters.
//!
//! A backend implements one operation: turn an IR stream into a single
//! string of target source text, without mutating its input, and name
//! the file extension its output should carry. The bundled targets all
//! share one `TemplateBackend` walking the instruction stream with a
//! per-target `TargetSpec` format map; only the map differs between
//! python, javascript and lua.

use std::collections::HashMap;

use crate::ir::{Instruction, Opcode, Operand};

/// Options passed through to `Backend::generate`.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Emit a one-line comment header at the top of the output.
    pub header: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions { header: true }
    }
}

/// The single contract the core has on emitters.
pub trait Backend {
    fn generate(&self, instructions: &[Instruction], options: &BackendOptions) -> String;
    fn extension(&self) -> &'static str;
}

/// Target name to output file extension, consulted only when naming
/// compiled files.
pub const TARGET_EXTENSIONS: &[(&str, &str)] = &[
    ("python", "py"),
    ("javascript", "js"),
    ("lua", "lua"),
];

pub fn extension_for(target: &str) -> Option<&'static str> {
    TARGET_EXTENSIONS
        .iter()
        .find(|(name, _)| *name == target)
        .map(|(_, ext)| *ext)
}

/// Per-target formatting table. Templates use `{placeholder}` slots
/// substituted verbatim.
pub struct TargetSpec {
    pub name: &'static str,
    pub extension: &'static str,
    pub comment: &'static str,
    pub terminator: &'static str,
    pub declare: &'static str,
    pub true_literal: &'static str,
    pub false_literal: &'static str,
    pub null_literal: &'static str,
    pub eq_op: &'static str,
    pub ne_op: &'static str,
    pub and_op: &'static str,
    pub or_op: &'static str,
    pub not_op: &'static str,
    pub function_open: &'static str,
    pub function_close: &'static str,
    pub empty_body: &'static str,
    pub return_keyword: &'static str,
    pub print_name: &'static str,
    pub array_literal: &'static str,
    pub object_literal: &'static str,
    pub object_entry: &'static str,
    /// (label, unconditional goto, conditional goto) templates, or
    /// None when the target has no goto and jumps become comments.
    pub goto_forms: Option<(&'static str, &'static str, &'static str)>,
}

impl TargetSpec {
    fn binary_operator(&self, op: Opcode) -> &'static str {
        match op {
            Opcode::Add => "+",
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            Opcode::Div => "/",
            Opcode::Mod => "%",
            Opcode::Eq => self.eq_op,
            Opcode::Ne => self.ne_op,
            Opcode::Lt => "<",
            Opcode::Le => "<=",
            Opcode::Gt => ">",
            Opcode::Ge => ">=",
            Opcode::And => self.and_op,
            Opcode::Or => self.or_op,
            _ => "?",
        }
    }
}

pub static PYTHON: TargetSpec = TargetSpec {
    name: "python",
    extension: "py",
    comment: "#",
    terminator: "",
    declare: "{name} = {value}",
    true_literal: "True",
    false_literal: "False",
    null_literal: "None",
    eq_op: "==",
    ne_op: "!=",
    and_op: "and",
    or_op: "or",
    not_op: "not ",
    function_open: "def {name}({params}):",
    function_close: "",
    empty_body: "pass",
    return_keyword: "return",
    print_name: "print",
    array_literal: "[{items}]",
    object_literal: "{{entries}}",
    object_entry: "\"{key}\": {value}",
    goto_forms: None,
};

pub static JAVASCRIPT: TargetSpec = TargetSpec {
    name: "javascript",
    extension: "js",
    comment: "//",
    terminator: ";",
    declare: "var {name} = {value}",
    true_literal: "true",
    false_literal: "false",
    null_literal: "null",
    eq_op: "===",
    ne_op: "!==",
    and_op: "&&",
    or_op: "||",
    not_op: "!",
    function_open: "function {name}({params}) {",
    function_close: "}",
    empty_body: "",
    return_keyword: "return",
    print_name: "console.log",
    array_literal: "[{items}]",
    object_literal: "{{entries}}",
    object_entry: "{key}: {value}",
    goto_forms: None,
};

pub static LUA: TargetSpec = TargetSpec {
    name: "lua",
    extension: "lua",
    comment: "--",
    terminator: "",
    declare: "local {name} = {value}",
    true_literal: "true",
    false_literal: "false",
    null_literal: "nil",
    eq_op: "==",
    ne_op: "~=",
    and_op: "and",
    or_op: "or",
    not_op: "not ",
    function_open: "local function {name}({params})",
    function_close: "end",
    empty_body: "",
    return_keyword: "return",
    print_name: "print",
    array_literal: "{{items}}",
    object_literal: "{{entries}}",
    object_entry: "[\"{key}\"] = {value}",
    goto_forms: Some(("::{label}::", "goto {label}", "if not ({cond}) then goto {label} end")),
};

fn fill(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in substitutions {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// The shared emitter: a switch per opcode over the flat stream, with
/// all target-specific text coming from the `TargetSpec`.
pub struct TemplateBackend {
    spec: &'static TargetSpec,
}

impl TemplateBackend {
    pub fn new(spec: &'static TargetSpec) -> Self {
        TemplateBackend { spec }
    }

    fn render_operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Bool(true) => self.spec.true_literal.to_string(),
            Operand::Bool(false) => self.spec.false_literal.to_string(),
            Operand::Null => self.spec.null_literal.to_string(),
            other => other.to_string(),
        }
    }

    fn render_callee(&self, operand: &Operand) -> String {
        match operand.as_name() {
            Some("print") => self.spec.print_name.to_string(),
            _ => self.render_operand(operand),
        }
    }
}

impl Backend for TemplateBackend {
    fn generate(&self, instructions: &[Instruction], options: &BackendOptions) -> String {
        let spec = self.spec;
        let mut lines: Vec<String> = Vec::new();
        if options.header {
            lines.push(format!("{} compiled by vesper", spec.comment));
        }

        let mut depth = 0usize;
        let mut body_open = false;
        let mut args: Vec<String> = Vec::new();
        let mut entries: Vec<String> = Vec::new();

        let push = |lines: &mut Vec<String>, depth: usize, text: String| {
            lines.push(format!("{}{}", "    ".repeat(depth), text));
        };
        let statement = |spec: &TargetSpec, text: String| format!("{}{}", text, spec.terminator);

        let mut i = 0;
        while i < instructions.len() {
            let inst = &instructions[i];
            match inst.op {
                Opcode::Function => {
                    let name = inst
                        .a
                        .as_ref()
                        .and_then(Operand::as_name)
                        .unwrap_or_default();
                    let mut params: Vec<&str> = Vec::new();
                    while let Some(next) = instructions.get(i + 1) {
                        if next.op != Opcode::Param {
                            break;
                        }
                        if let Some(param) = next.a.as_ref().and_then(Operand::as_name) {
                            params.push(param);
                        }
                        i += 1;
                    }
                    push(
                        &mut lines,
                        depth,
                        fill(
                            spec.function_open,
                            &[("name", name), ("params", &params.join(", "))],
                        ),
                    );
                    depth += 1;
                    body_open = true;
                }
                Opcode::EndFunction => {
                    if body_open && !spec.empty_body.is_empty() {
                        push(&mut lines, depth, spec.empty_body.to_string());
                    }
                    depth = depth.saturating_sub(1);
                    if !spec.function_close.is_empty() {
                        push(&mut lines, depth, spec.function_close.to_string());
                    }
                    body_open = false;
                }
                Opcode::Param => {}
                Opcode::Arg => {
                    body_open = false;
                    match (&inst.a, &inst.b) {
                        (Some(Operand::Str(key)), Some(value)) => entries.push(fill(
                            spec.object_entry,
                            &[("key", key.as_str()), ("value", &self.render_operand(value))],
                        )),
                        (Some(value), None) => args.push(self.render_operand(value)),
                        _ => {}
                    }
                }
                Opcode::Call => {
                    body_open = false;
                    let callee = inst.a.as_ref();
                    let value = match callee.and_then(|c| c.as_name()) {
                        Some("__array") => {
                            fill(spec.array_literal, &[("items", &args.join(", "))])
                        }
                        Some("__object") => {
                            fill(spec.object_literal, &[("entries", &entries.join(", "))])
                        }
                        _ => {
                            let name = callee
                                .map(|c| self.render_callee(c))
                                .unwrap_or_default();
                            format!("{}({})", name, args.join(", "))
                        }
                    };
                    args.clear();
                    entries.clear();
                    if let Some(result) = &inst.result {
                        push(
                            &mut lines,
                            depth,
                            statement(
                                spec,
                                fill(spec.declare, &[("name", result.as_str()), ("value", &value)]),
                            ),
                        );
                    }
                }
                Opcode::Assign => {
                    body_open = false;
                    if let (Some(value), Some(result)) = (&inst.a, &inst.result) {
                        let value = self.render_operand(value);
                        push(
                            &mut lines,
                            depth,
                            statement(
                                spec,
                                fill(spec.declare, &[("name", result.as_str()), ("value", &value)]),
                            ),
                        );
                    }
                }
                Opcode::Not | Opcode::Neg => {
                    body_open = false;
                    if let (Some(operand), Some(result)) = (&inst.a, &inst.result) {
                        let operand = self.render_operand(operand);
                        let prefix = if inst.op == Opcode::Not { spec.not_op } else { "-" };
                        let value = format!("{prefix}{operand}");
                        push(
                            &mut lines,
                            depth,
                            statement(
                                spec,
                                fill(spec.declare, &[("name", result.as_str()), ("value", &value)]),
                            ),
                        );
                    }
                }
                Opcode::Index | Opcode::Member => {
                    body_open = false;
                    if let (Some(object), Some(key), Some(result)) = (&inst.a, &inst.b, &inst.result)
                    {
                        let object = self.render_operand(object);
                        let value = match (inst.op, key) {
                            (Opcode::Member, Operand::Str(property)) => {
                                format!("{object}.{property}")
                            }
                            _ => format!("{object}[{}]", self.render_operand(key)),
                        };
                        push(
                            &mut lines,
                            depth,
                            statement(
                                spec,
                                fill(spec.declare, &[("name", result.as_str()), ("value", &value)]),
                            ),
                        );
                    }
                }
                Opcode::StoreIndex | Opcode::StoreMember => {
                    body_open = false;
                    if let (Some(object), Some(key), Some(value)) = (&inst.a, &inst.b, &inst.result)
                    {
                        let object = self.render_operand(object);
                        let place = match (inst.op, key) {
                            (Opcode::StoreMember, Operand::Str(property)) => {
                                format!("{object}.{property}")
                            }
                            _ => format!("{object}[{}]", self.render_operand(key)),
                        };
                        push(
                            &mut lines,
                            depth,
                            statement(spec, format!("{place} = {value}")),
                        );
                    }
                }
                Opcode::Return => {
                    body_open = false;
                    let text = match &inst.a {
                        Some(value) => {
                            format!("{} {}", spec.return_keyword, self.render_operand(value))
                        }
                        None => spec.return_keyword.to_string(),
                    };
                    push(&mut lines, depth, statement(spec, text));
                }
                Opcode::Label => {
                    body_open = false;
                    let name = inst
                        .a
                        .as_ref()
                        .and_then(Operand::as_name)
                        .unwrap_or_default();
                    match spec.goto_forms {
                        Some((label, _, _)) => {
                            push(&mut lines, depth, fill(label, &[("label", name)]))
                        }
                        None => push(
                            &mut lines,
                            depth,
                            format!("{} label {}", spec.comment, name),
                        ),
                    }
                }
                Opcode::Jump => {
                    body_open = false;
                    let target = inst
                        .a
                        .as_ref()
                        .and_then(Operand::as_name)
                        .unwrap_or_default();
                    match spec.goto_forms {
                        Some((_, goto, _)) => {
                            push(&mut lines, depth, fill(goto, &[("label", target)]))
                        }
                        None => push(
                            &mut lines,
                            depth,
                            format!("{} jump {}", spec.comment, target),
                        ),
                    }
                }
                Opcode::JumpIfFalse => {
                    body_open = false;
                    let condition = inst
                        .a
                        .as_ref()
                        .map(|c| self.render_operand(c))
                        .unwrap_or_default();
                    let target = inst
                        .b
                        .as_ref()
                        .and_then(Operand::as_name)
                        .unwrap_or_default();
                    match spec.goto_forms {
                        Some((_, _, conditional)) => push(
                            &mut lines,
                            depth,
                            fill(conditional, &[("cond", condition.as_str()), ("label", target)]),
                        ),
                        None => push(
                            &mut lines,
                            depth,
                            format!("{} jump_if_false {} {}", spec.comment, condition, target),
                        ),
                    }
                }
                op => {
                    body_open = false;
                    if let (Some(a), Some(b), Some(result)) = (&inst.a, &inst.b, &inst.result) {
                        let value = format!(
                            "{} {} {}",
                            self.render_operand(a),
                            spec.binary_operator(op),
                            self.render_operand(b)
                        );
                        push(
                            &mut lines,
                            depth,
                            statement(
                                spec,
                                fill(spec.declare, &[("name", result.as_str()), ("value", &value)]),
                            ),
                        );
                    }
                }
            }
            i += 1;
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn extension(&self) -> &'static str {
        self.spec.extension
    }
}

/// Registered backends keyed by target name.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    /// A registry with no targets.
    pub fn empty() -> Self {
        BackendRegistry {
            backends: HashMap::new(),
        }
    }

    /// A registry with the bundled python, javascript and lua targets.
    pub fn with_default_targets() -> Self {
        let mut registry = BackendRegistry::empty();
        for spec in [&PYTHON, &JAVASCRIPT, &LUA] {
            registry.register(spec.name, Box::new(TemplateBackend::new(spec)));
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, backend: Box<dyn Backend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Backend> {
        self.backends.get(name).map(Box::as_ref)
    }

    pub fn targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        BackendRegistry::with_default_targets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::lower;
    use crate::parser::parse;

    fn emit(target: &str, source: &str) -> String {
        let registry = BackendRegistry::default();
        let backend = registry.get(target).expect("registered target");
        let ir = lower(&parse(source).expect("parse"));
        backend.generate(&ir, &BackendOptions::default())
    }

    #[test]
    fn every_target_declares_a_simple_let() {
        let python = emit("python", "let x = 5");
        assert!(python.contains("x = 5"));
        let javascript = emit("javascript", "let x = 5");
        assert!(javascript.contains("var x = 5;"));
        let lua = emit("lua", "let x = 5");
        assert!(lua.contains("local x = 5"));
    }

    #[test]
    fn python_functions_use_def_and_indentation() {
        let out = emit("python", "def add(a, b) { return a + b }");
        assert!(out.contains("def add(a, b):"));
        assert!(out.contains("    t0 = a + b"));
        assert!(out.contains("    return t0"));
    }

    #[test]
    fn python_empty_function_body_gets_pass() {
        let out = emit("python", "def noop() { }");
        assert!(out.contains("def noop():"));
        assert!(out.contains("    pass"));
    }

    #[test]
    fn javascript_closes_functions_with_a_brace() {
        let out = emit("javascript", "def one() { return 1 }");
        assert!(out.contains("function one() {"));
        assert!(out.contains("    return 1;"));
        assert!(out.contains("\n}"));
    }

    #[test]
    fn lua_emits_real_labels_and_gotos() {
        let out = emit("lua", "while x < 3 { x += 1 }");
        assert!(out.contains("::L0::"));
        assert!(out.contains("if not (t0) then goto L1 end"));
        assert!(out.contains("goto L0"));
    }

    #[test]
    fn goto_free_targets_comment_out_jumps() {
        let out = emit("python", "while x < 3 { x += 1 }");
        assert!(out.contains("# label L0"));
        assert!(out.contains("# jump_if_false t0 L1"));
    }

    #[test]
    fn operators_are_localized_per_target() {
        assert!(emit("lua", "let a = x != y").contains("local t0 = x ~= y"));
        assert!(emit("javascript", "let a = x != y").contains("var t0 = x !== y"));
        assert!(emit("python", "let a = x && y").contains("t0 = x and y"));
        assert!(emit("javascript", "let a = x && y").contains("var t0 = x && y"));
    }

    #[test]
    fn aggregate_literals_render_natively() {
        assert!(emit("python", "let a = [1, 2]").contains("t0 = [1, 2]"));
        assert!(emit("python", "let o = { a: 1 }").contains("t0 = {\"a\": 1}"));
        assert!(emit("lua", "let a = [1, 2]").contains("local t0 = {1, 2}"));
        assert!(emit("lua", "let o = { a: 1 }").contains("local t0 = {[\"a\"] = 1}"));
        assert!(emit("javascript", "let o = { a: 1 }").contains("var t0 = {a: 1}"));
    }

    #[test]
    fn print_maps_to_the_target_console() {
        assert!(emit("javascript", "print(1)").contains("console.log(1)"));
        assert!(emit("python", "print(1)").contains("print(1)"));
    }

    #[test]
    fn booleans_and_null_use_target_spellings() {
        assert!(emit("python", "let a = true").contains("a = True"));
        assert!(emit("python", "let a = null").contains("a = None"));
        assert!(emit("lua", "let a = null").contains("local a = nil"));
    }

    #[test]
    fn extension_table_matches_backends() {
        let registry = BackendRegistry::default();
        for (target, extension) in TARGET_EXTENSIONS {
            assert_eq!(registry.get(target).map(|b| b.extension()), Some(*extension));
        }
        assert_eq!(extension_for("python"), Some("py"));
        assert_eq!(extension_for("cobol"), None);
    }

    #[test]
    fn generation_does_not_mutate_the_stream() {
        let ir = lower(&parse("let x = 1 + y").expect("parse"));
        let before = ir.clone();
        let registry = BackendRegistry::default();
        registry
            .get("python")
            .expect("registered")
            .generate(&ir, &BackendOptions::default());
        assert_eq!(ir, before);
    }

    #[test]
    fn registry_lists_targets_sorted() {
        let registry = BackendRegistry::default();
        assert_eq!(registry.targets(), vec!["javascript", "lua", "python"]);
    }
}
