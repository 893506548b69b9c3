use std::rc::Rc;

/// A position in a HOIL source file: 1-based line and column, plus a
/// shared (not owned-per-node) filename.
///
/// `Rc<str>` gives every node in a module a cheap handle to the same
/// filename string rather than copying it at every AST node, matching
/// the "shared lifetime, not owned copy" ownership note in
/// `SPEC_FULL.md` §3.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// The source file this location is in.
    pub file: Rc<str>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceLocation {
    /// A location at the very start of `file`.
    pub fn start(file: Rc<str>) -> Self {
        Self {
            file,
            line: 1,
            column: 1,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
