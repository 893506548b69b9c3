//! The HOIL abstract syntax tree (component F, `SPEC_FULL.md` §3.1).
//!
//! The whole tree is owned by value, rooted at [`Module`]; dropping a
//! `Module` drops everything it reaches exactly once. There is no
//! separate arena or index scheme — ordinary `Vec`/`Box` ownership
//! already gives the doubling-growth, single-owner semantics the
//! specification asks for.

use crate::location::SourceLocation;

/// A HOIL type, before (`Named`) or after (everything else) structural
/// resolution by the type checker.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    Bool,
    Int {
        bits: u8,
        signed: bool,
    },
    Float {
        bits: u8,
    },
    Ptr {
        elem: Box<Type>,
        memory_space: Option<String>,
    },
    Vec {
        elem: Box<Type>,
        size: u32,
    },
    /// `size == 0` means unsized; legal only for pointer/field uses,
    /// never as a stack local (`SPEC_FULL.md` §3.1 invariants).
    Array {
        elem: Box<Type>,
        size: u32,
    },
    /// A structural struct type. `name` carries the originating `TYPE`
    /// declaration's name when this came from substituting a
    /// [`Type::Named`] reference — struct compatibility is nominal
    /// (`SPEC_FULL.md` §4.H), so two structurally identical but
    /// differently-named types are *not* `~`-compatible.
    Struct {
        name: Option<String>,
        fields: Vec<(String, Type)>,
    },
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
        variadic: bool,
    },
    /// An unresolved reference to a `TYPE` declaration; replaced with
    /// its structural `Struct` form during type resolution (§4.H).
    Named(String),
}

impl Type {
    pub fn ptr(elem: Type) -> Self {
        Type::Ptr {
            elem: Box::new(elem),
            memory_space: None,
        }
    }

    /// A short, stable textual rendering, used both by the canonical
    /// printer and by error messages.
    pub fn render(&self) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Int { bits, signed } => format!("{}{bits}", if *signed { "i" } else { "u" }),
            Type::Float { bits } => format!("f{bits}"),
            Type::Ptr { elem, .. } => format!("ptr<{}>", elem.render()),
            Type::Vec { elem, size } => format!("vec<{}, {size}>", elem.render()),
            Type::Array { elem, size } => format!("array<{}, {size}>", elem.render()),
            Type::Struct { name, fields } => {
                let body = fields
                    .iter()
                    .map(|(n, t)| format!("{n}: {}", t.render()))
                    .collect::<Vec<_>>()
                    .join(", ");
                match name {
                    Some(name) => name.clone(),
                    None => format!("struct {{ {body} }}"),
                }
            }
            Type::Function { params, ret, variadic } => {
                let body = params.iter().map(Type::render).collect::<Vec<_>>().join(", ");
                let variadic = if *variadic { ", ..." } else { "" };
                format!("fn({body}{variadic}) -> {}", ret.render())
            }
            Type::Named(name) => name.clone(),
        }
    }

    /// The `~` compatibility relation used by the type checker
    /// (`SPEC_FULL.md` §3.1, §4.H): a structural relation for every
    /// variant except `Struct`, which is nominal.
    pub fn compatible(&self, other: &Type) -> bool {
        use Type::*;
        match (self, other) {
            (Void, Void) | (Bool, Bool) => true,
            (Int { bits: a, .. }, Int { bits: b, .. }) => a == b,
            (Float { bits: a }, Float { bits: b }) => a == b,
            // Integers and floats of any width coerce into each other.
            (Int { .. }, Float { .. }) | (Float { .. }, Int { .. }) => true,
            (Ptr { elem: a, .. }, Ptr { elem: b, .. }) => a.compatible(b),
            (Vec { elem: a, size: sa }, Vec { elem: b, size: sb }) => sa == sb && a.compatible(b),
            (Array { elem: a, size: sa }, Array { elem: b, size: sb }) => sa == sb && a.compatible(b),
            (Struct { name: a, .. }, Struct { name: b, .. }) => a.is_some() && a == b,
            (
                Function { params: pa, ret: ra, variadic: va },
                Function { params: pb, ret: rb, variadic: vb },
            ) => {
                va == vb
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| x.compatible(y))
                    && ra.compatible(rb)
            }
            (Named(a), Named(b)) => a == b,
            _ => false,
        }
    }
}

/// A HOIL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    Identifier(String),
    FieldAccess(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
}

/// An expression together with the location its first token started
/// at.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
}

impl Expr {
    pub fn new(kind: ExprKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// A short textual rendering for diagnostics and the canonical
    /// printer. Field/index/call chains render left-to-right.
    pub fn render(&self) -> String {
        match &self.kind {
            ExprKind::IntLit(v) => v.to_string(),
            ExprKind::FloatLit(v) => v.to_string(),
            ExprKind::StringLit(s) => format!("\"{s}\""),
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::FieldAccess(base, field) => format!("{}.{field}", base.render()),
            ExprKind::Index(base, idx) => format!("{}[{}]", base.render(), idx.render()),
            ExprKind::Call(callee, args) => {
                let args = args.iter().map(Expr::render).collect::<Vec<_>>().join(", ");
                format!("{}({args})", callee.render())
            }
        }
    }
}

/// A HOIL statement.
#[derive(Debug, Clone)]
pub enum StmtKind {
    Assign {
        target: String,
        value: Expr,
    },
    Instruction {
        opcode: String,
        operands: Vec<Expr>,
    },
    Branch {
        cond: Option<Expr>,
        true_target: String,
        false_target: Option<String>,
    },
    Return {
        value: Option<Expr>,
    },
}

/// A statement and the location of its first token.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

/// One labeled basic block inside a function body.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub stmts: Vec<Stmt>,
    pub location: SourceLocation,
}

/// A defined function: parameters, return type, and an ordered
/// sequence of basic blocks.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub ret_type: Type,
    pub target: Option<String>,
    pub blocks: Vec<BasicBlock>,
    pub location: SourceLocation,
}

/// An `EXTERN FUNCTION` declaration: signature only, no body.
#[derive(Debug, Clone)]
pub struct ExternFunction {
    pub name: String,
    pub params: Vec<Type>,
    pub variadic: bool,
    pub ret_type: Type,
    pub location: SourceLocation,
}

/// A `TYPE` declaration.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub fields: Vec<(String, Type)>,
    pub location: SourceLocation,
}

/// A `CONSTANT` declaration.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub ty: Type,
    pub value: Expr,
    pub location: SourceLocation,
}

/// A `GLOBAL` declaration.
#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub ty: Type,
    pub value: Option<Expr>,
    pub location: SourceLocation,
}

/// One top-level declaration.
#[derive(Debug, Clone)]
pub enum Declaration {
    TypeDef(TypeDef),
    Constant(Constant),
    Global(Global),
    Function(Function),
    ExternFunction(ExternFunction),
}

impl Declaration {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Declaration::TypeDef(d) => &d.location,
            Declaration::Constant(d) => &d.location,
            Declaration::Global(d) => &d.location,
            Declaration::Function(d) => &d.location,
            Declaration::ExternFunction(d) => &d.location,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::TypeDef(d) => &d.name,
            Declaration::Constant(d) => &d.name,
            Declaration::Global(d) => &d.name,
            Declaration::Function(d) => &d.name,
            Declaration::ExternFunction(d) => &d.name,
        }
    }
}

/// The compilation unit: a name and its ordered declarations.
///
/// Owns every node reachable from it. Dropping a `Module` drops the
/// whole tree; there is nothing else to destroy.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub declarations: Vec<Declaration>,
}
