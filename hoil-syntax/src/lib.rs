//! HOIL front end: lexer, parser, AST, scoped symbol table, type
//! checker, canonical printer, and code generator.
//!
//! The pipeline a `.hoil` source file goes through is linear:
//!
//! ```text
//! source text -> lexer -> parser -> AST -> checker -> code generator -> COIL module bytes
//! ```
//!
//! [`compile`] runs the whole thing. Each stage is also exposed on its
//! own (`lexer::Lexer`, `parser::parse_module`, `checker::check_module`,
//! `codegen::generate`, `printer::print_module`) for callers that only
//! need part of it — `coil-cli`'s `hoilc` binary for instance reuses
//! `parser::parse_module` and `printer::print_module` alone for its
//! `--emit=canonical` mode.

pub mod ast;
pub mod checker;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod printer;
pub mod symbol;

pub use ast::{Declaration, Expr, ExprKind, Module, Stmt, StmtKind, Type};
pub use checker::{check_module, CheckedModule};
pub use codegen::generate;
pub use error::Error;
pub use location::SourceLocation;
pub use parser::parse_module;
pub use printer::print_module;

/// Runs the full pipeline: parses `source`, type-checks the result,
/// and generates a COIL module image from it.
pub fn compile(source: &str, filename: impl Into<std::rc::Rc<str>>) -> Result<Vec<u8>, Error> {
    let module = parse_module(source, filename)?;
    let checked = check_module(&module)?;
    generate(&module, &checked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_runs_the_whole_pipeline() {
        let bytes = compile(
            r#"MODULE "pipeline";
            FUNCTION add(a: i32, b: i32) -> i32 {
            entry:
                r = ADD a, b;
                RET r;
            }"#,
            "pipeline.hoil",
        )
        .expect("compile");
        assert!(!bytes.is_empty());
    }

    #[test]
    fn syntax_errors_surface_from_the_top_level_entry_point() {
        let err = compile(r#"MODULE ;"#, "bad.hoil");
        assert!(err.is_err());
    }
}
