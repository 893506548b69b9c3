//! Canonical printer: renders a [`Module`] back into HOIL source text.
//!
//! Exists primarily to exercise the round-trip property in
//! `SPEC_FULL.md` §8 (`lex → parse → print → reparse` yields an
//! equal-modulo-location tree) — see the test in `lib.rs` that parses,
//! prints, and reparses a handful of modules and compares the printed
//! text of both trees rather than deriving `PartialEq` across
//! `SourceLocation`-bearing nodes.

use crate::ast::*;

/// Prints `module` as HOIL source text that [`crate::parser::parse_module`]
/// accepts and that round-trips to an equivalent tree.
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    out.push_str(&format!("MODULE {:?};\n", module.name));
    for decl in &module.declarations {
        print_declaration(&mut out, decl);
    }
    out
}

fn print_declaration(out: &mut String, decl: &Declaration) {
    match decl {
        Declaration::TypeDef(td) => print_typedef(out, td),
        Declaration::Constant(c) => print_constant(out, c),
        Declaration::Global(g) => print_global(out, g),
        Declaration::Function(f) => print_function(out, f),
        Declaration::ExternFunction(ef) => print_extern_function(out, ef),
    }
}

fn print_typedef(out: &mut String, td: &TypeDef) {
    out.push_str(&format!("TYPE {} {{ ", td.name));
    let fields = td
        .fields
        .iter()
        .map(|(n, t)| format!("{n}: {}", t.render()))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&fields);
    out.push_str(" }\n");
}

fn print_constant(out: &mut String, c: &Constant) {
    out.push_str(&format!(
        "CONSTANT {}: {} = {};\n",
        c.name,
        c.ty.render(),
        print_expr(&c.value)
    ));
}

fn print_global(out: &mut String, g: &Global) {
    match &g.value {
        Some(v) => out.push_str(&format!("GLOBAL {}: {} = {};\n", g.name, g.ty.render(), print_expr(v))),
        None => out.push_str(&format!("GLOBAL {}: {};\n", g.name, g.ty.render())),
    }
}

fn print_function(out: &mut String, f: &Function) {
    let params = f
        .params
        .iter()
        .map(|(n, t)| format!("{n}: {}", t.render()))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("FUNCTION {}({params}) -> {}", f.name, f.ret_type.render()));
    if let Some(target) = &f.target {
        out.push_str(&format!(" TARGET {target:?}"));
    }
    out.push_str(" {\n");
    for block in &f.blocks {
        out.push_str(&format!("{}:\n", block.label));
        for stmt in &block.stmts {
            out.push_str("    ");
            print_stmt(out, stmt);
            out.push('\n');
        }
    }
    out.push_str("}\n");
}

fn print_extern_function(out: &mut String, ef: &ExternFunction) {
    let mut parts: Vec<String> = ef
        .params
        .iter()
        .enumerate()
        .map(|(i, t)| format!("p{i}: {}", t.render()))
        .collect();
    if ef.variadic {
        parts.push("...".to_string());
    }
    out.push_str(&format!(
        "EXTERN FUNCTION {}({}) -> {};\n",
        ef.name,
        parts.join(", "),
        ef.ret_type.render()
    ));
}

fn print_stmt(out: &mut String, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Assign { target, value } => {
            out.push_str(&format!("{target} = {};", print_expr(value)));
        }
        StmtKind::Instruction { opcode, operands } => {
            let operands = operands.iter().map(print_expr).collect::<Vec<_>>().join(", ");
            if operands.is_empty() {
                out.push_str(&format!("{opcode};"));
            } else {
                out.push_str(&format!("{opcode} {operands};"));
            }
        }
        StmtKind::Branch { cond, true_target, false_target } => match (cond, false_target) {
            (None, None) => out.push_str(&format!("BR ALWAYS, {true_target};")),
            (Some(cond), Some(false_target)) => {
                out.push_str(&format!("BR {}, {true_target}, {false_target};", print_expr(cond)));
            }
            _ => unreachable!("a branch always has both a false target and a condition, or neither"),
        },
        StmtKind::Return { value } => match value {
            Some(v) => out.push_str(&format!("RET {};", print_expr(v))),
            None => out.push_str("RET;"),
        },
    }
}

/// Renders `expr`, special-casing the synthetic `Call(Identifier(mnemonic),
/// operands)` shape the parser builds for bare-mnemonic assignment RHSes
/// back into its paren-free surface form (`ADD a, b`, not `ADD(a, b)`).
fn print_expr(expr: &Expr) -> String {
    if let ExprKind::Call(callee, args) = &expr.kind {
        if let ExprKind::Identifier(name) = &callee.kind {
            if coil_asm::CompactOpcode::from_mnemonic(name).is_some() {
                let args = args.iter().map(print_expr).collect::<Vec<_>>().join(", ");
                return if args.is_empty() {
                    name.clone()
                } else {
                    format!("{name} {args}")
                };
            }
        }
    }
    expr.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    fn roundtrip(src: &str) {
        let first = parse_module(src, "t.hoil").expect("first parse");
        let printed = print_module(&first);
        let second = parse_module(&printed, "t.hoil").unwrap_or_else(|e| {
            panic!("reparse failed: {e}\n--- printed ---\n{printed}");
        });
        assert_eq!(print_module(&first), print_module(&second));
    }

    #[test]
    fn minimal_module_round_trips() {
        roundtrip(r#"MODULE "empty";"#);
    }

    #[test]
    fn function_with_instructions_round_trips() {
        roundtrip(
            r#"MODULE "t";
            FUNCTION add(a: i32, b: i32) -> i32 {
            entry:
                r1 = ADD a, b;
                RET r1;
            }"#,
        );
    }

    #[test]
    fn branches_round_trip() {
        roundtrip(
            r#"MODULE "t";
            FUNCTION f(x: bool) -> void {
            start:
                BR x, yes, no;
            yes:
                RET;
            no:
                RET;
            }"#,
        );
    }

    #[test]
    fn typedef_and_global_round_trip() {
        roundtrip(
            r#"MODULE "t";
            TYPE Point { x: i32, y: i32 }
            GLOBAL origin: Point;"#,
        );
    }
}
