//! Type resolver and checker (component H, `SPEC_FULL.md` §4.H).
//!
//! Two passes over the module's declarations:
//!
//! 1. **Registration** — every `TYPE`, `FUNCTION`, and `EXTERN
//!    FUNCTION` name is bound in the global scope before any body is
//!    examined, so mutually recursive functions and forward branches
//!    type-check regardless of declaration order.
//! 2. **Checking** — declarations are walked in source order. A
//!    `CONSTANT`/`GLOBAL`'s initializer is checked (and the name only
//!    becomes visible) at the point its declaration is reached, so a
//!    constant cannot forward-reference one declared later — this is
//!    a deliberate simplification over the otherwise order-independent
//!    registration pass (see `DESIGN.md`). A function's body is
//!    checked in a child scope seeded with its parameters; every block
//!    label in the function is registered before any statement is
//!    walked, so branches may jump forward.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::error::Error;
use crate::location::SourceLocation;
use crate::symbol::{ScopeId, SymbolEntry, SymbolKind, SymbolTable};

/// Everything the code generator needs that the checker already
/// computed: resolved declaration types and, per function, the
/// inferred type of every local (parameters and assignment targets).
#[derive(Debug, Default)]
pub struct CheckedModule {
    /// `TYPE` name -> its resolved `Struct` form.
    pub typedefs: HashMap<String, Type>,
    /// `CONSTANT` name -> (resolved type, initializer expression).
    pub constants: HashMap<String, (Type, Expr)>,
    /// `GLOBAL` name -> resolved type.
    pub globals: HashMap<String, Type>,
    /// Function/extern-function name -> (parameter types, return type).
    pub functions: HashMap<String, (Vec<Type>, Type)>,
    /// Function name -> local variable name -> resolved type.
    pub locals: HashMap<String, HashMap<String, Type>>,
}

/// Runs the checker over `module`, returning the resolved type
/// information the code generator needs, or the first error found.
pub fn check_module(module: &Module) -> Result<CheckedModule, Error> {
    let mut checker = Checker::new(module);
    checker.run()
}

struct Checker<'a> {
    module: &'a Module,
    typedefs: HashMap<&'a str, &'a TypeDef>,
    table: SymbolTable,
    result: CheckedModule,
}

impl<'a> Checker<'a> {
    fn new(module: &'a Module) -> Self {
        let typedefs = module
            .declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::TypeDef(td) => Some((td.name.as_str(), td)),
                _ => None,
            })
            .collect();
        Self {
            module,
            typedefs,
            table: SymbolTable::new(),
            result: CheckedModule::default(),
        }
    }

    fn run(&mut self) -> Result<CheckedModule, Error> {
        self.register_signatures()?;
        for decl in &self.module.declarations {
            match decl {
                Declaration::TypeDef(td) => self.check_typedef(td)?,
                Declaration::Constant(c) => self.check_constant(c)?,
                Declaration::Global(g) => self.check_global(g)?,
                Declaration::Function(f) => self.check_function(f)?,
                Declaration::ExternFunction(_) => {}
            }
        }
        Ok(std::mem::take(&mut self.result))
    }

    // ---- pass 1: signatures -----------------------------------------

    fn register_signatures(&mut self) -> Result<(), Error> {
        let global = self.table.global_scope();
        for decl in &self.module.declarations {
            match decl {
                Declaration::TypeDef(td) => {
                    let resolved = self.resolve_named(&td.name, &mut HashSet::new(), &td.location)?;
                    self.result.typedefs.insert(td.name.clone(), resolved.clone());
                    self.table.insert(
                        global,
                        SymbolEntry {
                            name: td.name.clone(),
                            kind: SymbolKind::Type,
                            resolved_type: Some(resolved),
                            location: td.location.clone(),
                        },
                    )?;
                }
                Declaration::Function(f) => {
                    let params = f
                        .params
                        .iter()
                        .map(|(_, t)| self.resolve_type(t, &f.location))
                        .collect::<Result<Vec<_>, _>>()?;
                    let ret = self.resolve_type(&f.ret_type, &f.location)?;
                    self.result
                        .functions
                        .insert(f.name.clone(), (params.clone(), ret.clone()));
                    self.table.insert(
                        global,
                        SymbolEntry {
                            name: f.name.clone(),
                            kind: SymbolKind::Function,
                            resolved_type: Some(Type::Function {
                                params,
                                ret: Box::new(ret),
                                variadic: false,
                            }),
                            location: f.location.clone(),
                        },
                    )?;
                }
                Declaration::ExternFunction(ef) => {
                    let params = ef
                        .params
                        .iter()
                        .map(|t| self.resolve_type(t, &ef.location))
                        .collect::<Result<Vec<_>, _>>()?;
                    let ret = self.resolve_type(&ef.ret_type, &ef.location)?;
                    self.result
                        .functions
                        .insert(ef.name.clone(), (params.clone(), ret.clone()));
                    self.table.insert(
                        global,
                        SymbolEntry {
                            name: ef.name.clone(),
                            kind: SymbolKind::ExternFunction,
                            resolved_type: Some(Type::Function {
                                params,
                                ret: Box::new(ret),
                                variadic: ef.variadic,
                            }),
                            location: ef.location.clone(),
                        },
                    )?;
                }
                Declaration::Constant(_) | Declaration::Global(_) => {}
            }
        }
        Ok(())
    }

    // ---- type resolution ----------------------------------------------

    /// Resolves `Named(name)` references one level deep, substituting
    /// the referenced `TYPE` declaration's field list. Fields are
    /// copied as-written, not recursively resolved again, so a
    /// self-referential struct reached through a pointer (`next:
    /// ptr<Node>` inside `TYPE Node`) doesn't recurse forever.
    fn resolve_type(&self, ty: &Type, at: &SourceLocation) -> Result<Type, Error> {
        match ty {
            Type::Named(name) => self.resolve_named(name, &mut HashSet::new(), at),
            Type::Ptr { elem, memory_space } => Ok(Type::Ptr {
                elem: Box::new(self.resolve_type(elem, at)?),
                memory_space: memory_space.clone(),
            }),
            Type::Vec { elem, size } => Ok(Type::Vec {
                elem: Box::new(self.resolve_type(elem, at)?),
                size: *size,
            }),
            Type::Array { elem, size } => Ok(Type::Array {
                elem: Box::new(self.resolve_type(elem, at)?),
                size: *size,
            }),
            Type::Function { params, ret, variadic } => Ok(Type::Function {
                params: params
                    .iter()
                    .map(|p| self.resolve_type(p, at))
                    .collect::<Result<_, _>>()?,
                ret: Box::new(self.resolve_type(ret, at)?),
                variadic: *variadic,
            }),
            Type::Struct { name, fields } => Ok(Type::Struct {
                name: name.clone(),
                fields: fields
                    .iter()
                    .map(|(n, t)| Ok((n.clone(), self.resolve_type(t, at)?)))
                    .collect::<Result<_, Error>>()?,
            }),
            other => Ok(other.clone()),
        }
    }

    fn resolve_named(&self, name: &str, visiting: &mut HashSet<String>, at: &SourceLocation) -> Result<Type, Error> {
        if !visiting.insert(name.to_string()) {
            return Err(Error::Semantic {
                location: at.clone(),
                message: format!("cyclic type definition involving '{name}'"),
            });
        }
        let td = self.typedefs.get(name).ok_or_else(|| Error::Semantic {
            location: at.clone(),
            message: format!("unknown type '{name}'"),
        })?;
        Ok(Type::Struct {
            name: Some(name.to_string()),
            fields: td.fields.clone(),
        })
    }

    // ---- pass 2: declarations -----------------------------------------

    fn check_typedef(&self, td: &TypeDef) -> Result<(), Error> {
        for (_, field_ty) in &td.fields {
            self.resolve_type(field_ty, &td.location)?;
        }
        Ok(())
    }

    fn check_constant(&mut self, c: &Constant) -> Result<(), Error> {
        let global = self.table.global_scope();
        let declared = self.resolve_type(&c.ty, &c.location)?;
        let actual = self.expr_type(&c.value, global)?;
        if !declared.compatible(&actual) && !is_null_assignable(&declared, &c.value) {
            return Err(Error::Type {
                location: c.value.location.clone(),
                message: format!(
                    "constant '{}' declared as {} but initializer has type {}",
                    c.name,
                    declared.render(),
                    actual.render()
                ),
            });
        }
        self.result.constants.insert(c.name.clone(), (declared.clone(), c.value.clone()));
        self.table.insert(
            global,
            SymbolEntry {
                name: c.name.clone(),
                kind: SymbolKind::Constant,
                resolved_type: Some(declared),
                location: c.location.clone(),
            },
        )
    }

    fn check_global(&mut self, g: &Global) -> Result<(), Error> {
        let global = self.table.global_scope();
        let declared = self.resolve_type(&g.ty, &g.location)?;
        if let Some(value) = &g.value {
            let actual = self.expr_type(value, global)?;
            if !declared.compatible(&actual) && !is_null_assignable(&declared, value) {
                return Err(Error::Type {
                    location: value.location.clone(),
                    message: format!(
                        "global '{}' declared as {} but initializer has type {}",
                        g.name,
                        declared.render(),
                        actual.render()
                    ),
                });
            }
        }
        self.result.globals.insert(g.name.clone(), declared.clone());
        self.table.insert(
            global,
            SymbolEntry {
                name: g.name.clone(),
                kind: SymbolKind::Global,
                resolved_type: Some(declared),
                location: g.location.clone(),
            },
        )
    }

    fn check_function(&mut self, f: &Function) -> Result<(), Error> {
        let global = self.table.global_scope();
        let scope = self.table.push_scope(global);
        for (pname, pty) in &f.params {
            let resolved = self.resolve_type(pty, &f.location)?;
            self.table.insert(
                scope,
                SymbolEntry {
                    name: pname.clone(),
                    kind: SymbolKind::Parameter,
                    resolved_type: Some(resolved),
                    location: f.location.clone(),
                },
            )?;
        }

        let mut labels = HashSet::new();
        for block in &f.blocks {
            if !labels.insert(block.label.clone()) {
                return Err(Error::Semantic {
                    location: block.location.clone(),
                    message: format!("duplicate block label '{}' in function '{}'", block.label, f.name),
                });
            }
            self.table.insert(
                scope,
                SymbolEntry {
                    name: block.label.clone(),
                    kind: SymbolKind::Block,
                    resolved_type: None,
                    location: block.location.clone(),
                },
            )?;
        }

        let ret_type = self.resolve_type(&f.ret_type, &f.location)?;
        for block in &f.blocks {
            for stmt in &block.stmts {
                self.check_stmt(stmt, scope, &labels, &ret_type)?;
            }
        }

        let mut locals = HashMap::new();
        for (name, ty) in f.params.iter().map(|(n, t)| (n.clone(), t.clone())) {
            locals.insert(name, self.resolve_type(&ty, &f.location)?);
        }
        for block in &f.blocks {
            for stmt in &block.stmts {
                if let StmtKind::Assign { target, .. } = &stmt.kind {
                    if let Some(entry) = self.table.lookup_local(scope, target) {
                        if let Some(ty) = &entry.resolved_type {
                            locals.insert(target.clone(), ty.clone());
                        }
                    }
                }
            }
        }
        self.result.locals.insert(f.name.clone(), locals);
        Ok(())
    }

    fn check_stmt(
        &mut self,
        stmt: &Stmt,
        scope: ScopeId,
        labels: &HashSet<String>,
        ret_type: &Type,
    ) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let ty = self.expr_type(value, scope)?;
                self.bind_local(scope, target, ty, value, &stmt.location)?;
            }
            StmtKind::Instruction { operands, .. } => {
                for op in operands {
                    self.expr_type(op, scope)?;
                }
            }
            StmtKind::Branch { cond, true_target, false_target } => {
                if let Some(cond) = cond {
                    let ty = self.expr_type(cond, scope)?;
                    if !ty.compatible(&Type::Bool) {
                        return Err(Error::Type {
                            location: cond.location.clone(),
                            message: format!("branch condition must be bool, found {}", ty.render()),
                        });
                    }
                }
                if !labels.contains(true_target) {
                    return Err(Error::Semantic {
                        location: stmt.location.clone(),
                        message: format!("unknown block label '{true_target}'"),
                    });
                }
                if let Some(false_target) = false_target {
                    if !labels.contains(false_target) {
                        return Err(Error::Semantic {
                            location: stmt.location.clone(),
                            message: format!("unknown block label '{false_target}'"),
                        });
                    }
                }
            }
            StmtKind::Return { value } => match (value, ret_type) {
                (None, Type::Void) => {}
                (None, _) => {
                    return Err(Error::Type {
                        location: stmt.location.clone(),
                        message: format!("function returns {} but this 'RET' has no value", ret_type.render()),
                    });
                }
                (Some(v), Type::Void) => {
                    self.expr_type(v, scope)?;
                    return Err(Error::Type {
                        location: v.location.clone(),
                        message: "cannot return a value from a void function".to_string(),
                    });
                }
                (Some(v), _) => {
                    let actual = self.expr_type(v, scope)?;
                    if !ret_type.compatible(&actual) && !is_null_assignable(ret_type, v) {
                        return Err(Error::Type {
                            location: v.location.clone(),
                            message: format!(
                                "function returns {} but this 'RET' has type {}",
                                ret_type.render(),
                                actual.render()
                            ),
                        });
                    }
                }
            },
        }
        Ok(())
    }

    fn bind_local(&mut self, scope: ScopeId, name: &str, ty: Type, value: &Expr, at: &SourceLocation) -> Result<(), Error> {
        if let Some(existing) = self.table.lookup_local(scope, name) {
            let existing_ty = existing.resolved_type.clone();
            if let Some(existing_ty) = existing_ty {
                if !existing_ty.compatible(&ty) && !is_null_assignable(&existing_ty, value) {
                    return Err(Error::Type {
                        location: at.clone(),
                        message: format!(
                            "'{name}' was previously {} but is assigned a {} here",
                            existing_ty.render(),
                            ty.render()
                        ),
                    });
                }
            }
            return Ok(());
        }
        // A parameter already occupies this name in the parent scope
        // via shadowing rules, but assignment to a parameter doesn't
        // need a new binding — only genuinely new locals do.
        if self.table.lookup(scope, name).is_some() {
            return Ok(());
        }
        self.table.insert(
            scope,
            SymbolEntry {
                name: name.to_string(),
                kind: SymbolKind::Local,
                resolved_type: Some(ty),
                location: at.clone(),
            },
        )
    }

    // ---- expression typing ----------------------------------------------

    fn expr_type(&self, expr: &Expr, scope: ScopeId) -> Result<Type, Error> {
        match &expr.kind {
            ExprKind::IntLit(_) => Ok(Type::Int { bits: 32, signed: true }),
            ExprKind::FloatLit(_) => Ok(Type::Float { bits: 64 }),
            ExprKind::StringLit(_) => Ok(Type::Ptr {
                elem: Box::new(Type::Int { bits: 8, signed: false }),
                memory_space: None,
            }),
            ExprKind::Identifier(name) => self
                .table
                .lookup(scope, name)
                .and_then(|e| e.resolved_type.clone())
                .ok_or_else(|| Error::Semantic {
                    location: expr.location.clone(),
                    message: format!("unknown name '{name}'"),
                }),
            ExprKind::FieldAccess(base, field) => {
                let mut base_ty = self.expr_type(base, scope)?;
                if let Type::Ptr { elem, .. } = base_ty {
                    base_ty = *elem;
                }
                match base_ty {
                    Type::Struct { fields, .. } => fields
                        .iter()
                        .find(|(n, _)| n == field)
                        .map(|(_, t)| t.clone())
                        .ok_or_else(|| Error::Semantic {
                            location: expr.location.clone(),
                            message: format!("no field '{field}' on this struct"),
                        }),
                    other => Err(Error::Type {
                        location: expr.location.clone(),
                        message: format!("'{}' is not a struct", other.render()),
                    }),
                }
            }
            ExprKind::Index(base, idx) => {
                let base_ty = self.expr_type(base, scope)?;
                let idx_ty = self.expr_type(idx, scope)?;
                if !matches!(idx_ty, Type::Int { .. }) {
                    return Err(Error::Type {
                        location: idx.location.clone(),
                        message: format!("index must be an integer, found {}", idx_ty.render()),
                    });
                }
                match base_ty {
                    Type::Vec { elem, .. } | Type::Array { elem, .. } | Type::Ptr { elem, .. } => Ok(*elem),
                    other => Err(Error::Type {
                        location: expr.location.clone(),
                        message: format!("cannot index into {}", other.render()),
                    }),
                }
            }
            ExprKind::Call(callee, args) => self.call_type(callee, args, scope),
        }
    }

    fn call_type(&self, callee: &Expr, args: &[Expr], scope: ScopeId) -> Result<Type, Error> {
        if let ExprKind::Identifier(name) = &callee.kind {
            if let Some(func) = self.result.functions.get(name) {
                let (params, ret) = func;
                if args.len() < params.len() || (!self.function_is_variadic(name) && args.len() != params.len()) {
                    return Err(Error::Semantic {
                        location: callee.location.clone(),
                        message: format!(
                            "'{name}' expects {} argument(s), found {}",
                            params.len(),
                            args.len()
                        ),
                    });
                }
                for (arg, pty) in args.iter().zip(params) {
                    let arg_ty = self.expr_type(arg, scope)?;
                    if !arg_ty.compatible(pty) {
                        return Err(Error::Type {
                            location: arg.location.clone(),
                            message: format!(
                                "argument has type {} but '{name}' expects {}",
                                arg_ty.render(),
                                pty.render()
                            ),
                        });
                    }
                }
                for arg in &args[params.len()..] {
                    self.expr_type(arg, scope)?;
                }
                return Ok(ret.clone());
            }
            if let Some(ty) = self.instruction_result_type(name, args, scope)? {
                return Ok(ty);
            }
        }
        Err(Error::Semantic {
            location: callee.location.clone(),
            message: "call target is neither a declared function nor a known instruction".to_string(),
        })
    }

    fn function_is_variadic(&self, name: &str) -> bool {
        self.module.declarations.iter().any(|d| match d {
            Declaration::ExternFunction(ef) => ef.name == name && ef.variadic,
            _ => false,
        })
    }

    /// Types the result of a bare-mnemonic call synthesized by the
    /// parser for `target = MNEMONIC operands` statements. Returns
    /// `Ok(None)` when `name` isn't a recognized mnemonic at all.
    fn instruction_result_type(&self, name: &str, args: &[Expr], scope: ScopeId) -> Result<Option<Type>, Error> {
        let arg_ty = |i: usize| -> Result<Type, Error> {
            args.get(i)
                .ok_or_else(|| Error::Semantic {
                    location: args.first().map(|a| a.location.clone()).unwrap_or_else(|| {
                        SourceLocation::start(std::rc::Rc::from("<instruction>"))
                    }),
                    message: format!("'{name}' is missing an operand"),
                })
                .and_then(|a| self.expr_type(a, scope))
        };
        Ok(Some(match name {
            "ADD" | "SUB" | "MUL" | "DIV" | "REM" | "AND" | "OR" | "XOR" | "SHL" | "SHR" => {
                let lhs = arg_ty(0)?;
                let rhs = arg_ty(1)?;
                if !lhs.compatible(&rhs) {
                    return Err(Error::Type {
                        location: args[1].location.clone(),
                        message: format!(
                            "'{name}' operands have incompatible types {} and {}",
                            lhs.render(),
                            rhs.render()
                        ),
                    });
                }
                lhs
            }
            "NEG" | "NOT" => arg_ty(0)?,
            "CMP_EQ" | "CMP_NE" | "CMP_LT" | "CMP_LE" | "CMP_GT" | "CMP_GE" => {
                let lhs = arg_ty(0)?;
                let rhs = arg_ty(1)?;
                if !lhs.compatible(&rhs) {
                    return Err(Error::Type {
                        location: args[1].location.clone(),
                        message: format!(
                            "'{name}' operands have incompatible types {} and {}",
                            lhs.render(),
                            rhs.render()
                        ),
                    });
                }
                Type::Bool
            }
            "LOAD" => match arg_ty(0)? {
                Type::Ptr { elem, .. } => *elem,
                other => {
                    return Err(Error::Type {
                        location: args[0].location.clone(),
                        message: format!("'LOAD' requires a pointer operand, found {}", other.render()),
                    })
                }
            },
            "STORE" => {
                let ptr_ty = arg_ty(0)?;
                let value_ty = arg_ty(1)?;
                match ptr_ty {
                    Type::Ptr { elem, .. } if elem.compatible(&value_ty) => Type::Void,
                    Type::Ptr { elem, .. } => {
                        return Err(Error::Type {
                            location: args[1].location.clone(),
                            message: format!(
                                "cannot store a {} through a pointer to {}",
                                value_ty.render(),
                                elem.render()
                            ),
                        })
                    }
                    other => {
                        return Err(Error::Type {
                            location: args[0].location.clone(),
                            message: format!("'STORE' requires a pointer operand, found {}", other.render()),
                        })
                    }
                }
            }
            "LEA" => Type::Ptr {
                elem: Box::new(arg_ty(0)?),
                memory_space: None,
            },
            "CALL" => match arg_ty(0)? {
                Type::Function { ret, .. } => *ret,
                Type::Ptr { elem, .. } => match *elem {
                    Type::Function { ret, .. } => *ret,
                    other => {
                        return Err(Error::Type {
                            location: args[0].location.clone(),
                            message: format!("'CALL' target is not callable: {}", other.render()),
                        })
                    }
                },
                other => {
                    return Err(Error::Type {
                        location: args[0].location.clone(),
                        message: format!("'CALL' target is not callable: {}", other.render()),
                    })
                }
            },
            "BR" | "RET" => {
                return Err(Error::Semantic {
                    location: args.first().map(|a| a.location.clone()).unwrap_or_else(|| {
                        SourceLocation::start(std::rc::Rc::from("<instruction>"))
                    }),
                    message: format!("'{name}' cannot be used as an expression"),
                })
            }
            _ => return Ok(None),
        }))
    }
}

/// `Null` — the integer literal `0` — may be assigned to any `Ptr`
/// without going through `~` (`SPEC_FULL.md` §4.H). This lives at
/// assignment sites rather than in `Type::compatible` itself, since
/// `~` is also used for operand/argument compatibility where a bare
/// `0` isn't a null pointer, just an integer.
fn is_null_assignable(declared: &Type, value: &Expr) -> bool {
    matches!(declared, Type::Ptr { .. }) && matches!(value.kind, ExprKind::IntLit(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    fn check(src: &str) -> Result<CheckedModule, Error> {
        let module = parse_module(src, "t.hoil").expect("parse should succeed");
        check_module(&module)
    }

    #[test]
    fn well_typed_function_checks() {
        let result = check(
            r#"MODULE "t";
            FUNCTION add(a: i32, b: i32) -> i32 {
            entry:
                r1 = ADD a, b;
                RET r1;
            }"#,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn mismatched_branch_condition_is_a_type_error() {
        let result = check(
            r#"MODULE "t";
            FUNCTION f(x: i32) -> void {
            entry:
                BR x, yes, no;
            yes:
                RET;
            no:
                RET;
            }"#,
        );
        assert!(matches!(result, Err(Error::Type { .. })));
    }

    #[test]
    fn unknown_branch_target_is_semantic_error() {
        let result = check(
            r#"MODULE "t";
            FUNCTION f(x: bool) -> void {
            entry:
                BR x, yes, nowhere;
            yes:
                RET;
            }"#,
        );
        assert!(matches!(result, Err(Error::Semantic { .. })));
    }

    #[test]
    fn void_function_returning_value_is_rejected() {
        let result = check(
            r#"MODULE "t";
            FUNCTION f() -> void {
            entry:
                RET 1;
            }"#,
        );
        assert!(matches!(result, Err(Error::Type { .. })));
    }

    #[test]
    fn self_referential_struct_resolves_without_looping() {
        let result = check(
            r#"MODULE "t";
            TYPE Node { next: ptr<Node>, value: i32 }
            FUNCTION f(n: ptr<Node>) -> i32 {
            entry:
                r1 = n.value;
                RET r1;
            }"#,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn forward_reference_to_function_is_allowed() {
        let result = check(
            r#"MODULE "t";
            FUNCTION a() -> i32 {
            entry:
                r1 = b();
                RET r1;
            }
            FUNCTION b() -> i32 {
            entry:
                RET 0;
            }"#,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn constant_cannot_forward_reference_a_later_constant() {
        let result = check(
            r#"MODULE "t";
            CONSTANT A: i32 = B;
            CONSTANT B: i32 = 1;"#,
        );
        assert!(matches!(result, Err(Error::Semantic { .. })));
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        let result = check(
            r#"MODULE "t";
            EXTERN FUNCTION two(a: i32, b: i32) -> i32;
            FUNCTION f() -> i32 {
            entry:
                r1 = two(1);
                RET r1;
            }"#,
        );
        assert!(matches!(result, Err(Error::Semantic { .. })));
    }

    #[test]
    fn integer_literal_is_compatible_with_a_32_bit_declared_type() {
        let result = check(
            r#"MODULE "t";
            CONSTANT k: i32 = 5;
            FUNCTION f(a: i32) -> i32 {
            entry:
                r1 = ADD a, 5;
                RET r1;
            }"#,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn null_literal_is_assignable_to_any_pointer_type() {
        let result = check(
            r#"MODULE "t";
            GLOBAL g: ptr<i32> = 0;
            FUNCTION f(p: ptr<i32>) -> ptr<i32> {
            entry:
                p = 0;
                RET p;
            }"#,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn variadic_extern_accepts_extra_arguments() {
        let result = check(
            r#"MODULE "t";
            EXTERN FUNCTION printf(fmt: ptr<i8>, ...) -> i32;
            FUNCTION f(fmt: ptr<i8>) -> i32 {
            entry:
                r1 = printf(fmt, 1, 2);
                RET r1;
            }"#,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }
}
