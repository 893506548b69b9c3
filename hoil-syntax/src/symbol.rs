//! Scoped symbol table (component G, `SPEC_FULL.md` §4.G).
//!
//! Scopes form a tree: the single global scope at the root, one child
//! scope per function body. Lookup walks from a scope up through its
//! ancestors, so a function's parameters and locals shadow globals of
//! the same name without erasing them. Each scope's table is a
//! `std::collections::HashMap` — the specification's "insertion-order
//! independence, amortized constant-time insert/lookup" contract holds
//! for any reasonable hash table, so there is no call to hand-roll
//! chaining or a particular hash function here.

use std::collections::HashMap;

use crate::ast::Type;
use crate::error::Error;
use crate::location::SourceLocation;

/// What kind of declaration a [`SymbolEntry`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Constant,
    Global,
    Function,
    ExternFunction,
    Parameter,
    Local,
    Block,
}

/// One bound name.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    /// The symbol's resolved type, once known. `None` for `Block`
    /// labels, which aren't typed.
    pub resolved_type: Option<Type>,
    pub location: SourceLocation,
}

/// An opaque handle to one scope.
pub type ScopeId = usize;

struct ScopeNode {
    parent: Option<ScopeId>,
    symbols: HashMap<String, SymbolEntry>,
}

/// The module's scope tree.
pub struct SymbolTable {
    scopes: Vec<ScopeNode>,
}

impl SymbolTable {
    /// A table with just the global scope, `id 0`.
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeNode {
                parent: None,
                symbols: HashMap::with_capacity(64),
            }],
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        0
    }

    /// Opens a new child scope under `parent` (a function body, for
    /// instance) and returns its id.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(ScopeNode {
            parent: Some(parent),
            symbols: HashMap::with_capacity(64),
        });
        self.scopes.len() - 1
    }

    /// Binds `entry` in `scope`. Fails if that scope (not an ancestor)
    /// already has a symbol with this name — shadowing an outer scope
    /// is fine, redeclaring within the same one is not.
    pub fn insert(&mut self, scope: ScopeId, entry: SymbolEntry) -> Result<(), Error> {
        let node = &mut self.scopes[scope];
        if let Some(existing) = node.symbols.get(&entry.name) {
            return Err(Error::Semantic {
                location: entry.location,
                message: format!(
                    "'{}' is already declared at {}",
                    entry.name, existing.location
                ),
            });
        }
        node.symbols.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Looks up `name` starting at `scope` and walking up to the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&SymbolEntry> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = &self.scopes[id];
            if let Some(entry) = node.symbols.get(name) {
                return Some(entry);
            }
            current = node.parent;
        }
        None
    }

    /// Looks up `name` in `scope` only, without consulting ancestors.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&SymbolEntry> {
        self.scopes[scope].symbols.get(name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn loc() -> SourceLocation {
        SourceLocation::start(Rc::from("t.hoil"))
    }

    fn entry(name: &str, kind: SymbolKind) -> SymbolEntry {
        SymbolEntry {
            name: name.to_string(),
            kind,
            resolved_type: None,
            location: loc(),
        }
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        let g = table.global_scope();
        table.insert(g, entry("x", SymbolKind::Global)).unwrap();
        assert!(table.insert(g, entry("x", SymbolKind::Global)).is_err());
    }

    #[test]
    fn child_scope_can_shadow_parent() {
        let mut table = SymbolTable::new();
        let g = table.global_scope();
        table.insert(g, entry("x", SymbolKind::Global)).unwrap();
        let f = table.push_scope(g);
        table.insert(f, entry("x", SymbolKind::Parameter)).unwrap();
        assert_eq!(table.lookup(f, "x").unwrap().kind, SymbolKind::Parameter);
        assert_eq!(table.lookup(g, "x").unwrap().kind, SymbolKind::Global);
    }

    #[test]
    fn lookup_walks_up_to_globals() {
        let mut table = SymbolTable::new();
        let g = table.global_scope();
        table.insert(g, entry("CONST", SymbolKind::Constant)).unwrap();
        let f = table.push_scope(g);
        assert!(table.lookup(f, "CONST").is_some());
        assert!(table.lookup_local(f, "CONST").is_none());
    }

    #[test]
    fn unknown_name_is_none() {
        let table = SymbolTable::new();
        assert!(table.lookup(table.global_scope(), "nope").is_none());
    }
}
