//! Code generator (component I, `SPEC_FULL.md` §4.I).
//!
//! Walks a checked [`Module`] and drives a [`coil_format::ModuleBuilder`]
//! to produce one COIL module image. Register allocation is the
//! simplest thing that works: every distinct local gets the next free
//! register the first time it's assigned, parameters take the first
//! few registers in declaration order, and nothing is ever freed or
//! reused (`SPEC_FULL.md` leaves allocation strategy unspecified; see
//! `DESIGN.md`).
//!
//! Operands are encoded as a small tagged byte sequence private to this
//! module — the Code section itself treats `CompactInstruction.operands`
//! as opaque payload, so this tagging is ours to define: a register
//! reference, an inline 64-bit immediate (for literals and for the
//! zero-add trick used to materialize a literal or copy a variable into
//! a fresh register — the compact opcode table has no dedicated `MOV`
//! or `LOAD_IMM`), or a callee function index for `CALL`.
//!
//! String literals don't fit the zero-add trick (they're not a single
//! 64-bit word): each one is decoded and emitted as its own anonymous
//! byte-array global, and `LEA` materializes a pointer to it.

use std::collections::HashMap;

use coil_asm::{CompactOpcode, TypeCategory, TypeEncoding};
use coil_format::ModuleBuilder;
use coil_types::NO_REGISTER;

use crate::ast::*;
use crate::checker::CheckedModule;
use crate::error::Error;

const TAG_REGISTER: u8 = 0;
const TAG_IMMEDIATE: u8 = 1;
const TAG_FUNCTION: u8 = 2;

enum Operand {
    Register(u8),
    Immediate(i64),
    Function(u32),
}

fn push_operand(bytes: &mut Vec<u8>, op: &Operand) {
    match op {
        Operand::Register(r) => {
            bytes.push(TAG_REGISTER);
            bytes.push(*r);
        }
        Operand::Immediate(v) => {
            bytes.push(TAG_IMMEDIATE);
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Operand::Function(idx) => {
            bytes.push(TAG_FUNCTION);
            bytes.extend_from_slice(&idx.to_le_bytes());
        }
    }
}

/// Generates a complete COIL module image for `module`, using the type
/// information `checked` already computed.
pub fn generate(module: &Module, checked: &CheckedModule) -> Result<Vec<u8>, Error> {
    let mut gen = CodeGen {
        builder: ModuleBuilder::new(),
        checked,
        type_cache: HashMap::new(),
        current_function: String::new(),
        next_string_id: 0,
    };
    gen.emit_module(module)?;
    Ok(gen.builder.build())
}

struct CodeGen<'a> {
    builder: ModuleBuilder,
    checked: &'a CheckedModule,
    type_cache: HashMap<String, u32>,
    /// Name of the function currently being emitted, so field-access
    /// codegen can look its locals' resolved types up in
    /// `checked.locals`.
    current_function: String,
    /// Counter for synthetic global names backing string literals.
    next_string_id: u32,
}

impl<'a> CodeGen<'a> {
    fn emit_module(&mut self, module: &Module) -> Result<(), Error> {
        self.builder.set_module_name(module.name.clone());

        for decl in &module.declarations {
            if let Declaration::Global(g) = decl {
                self.emit_global(g)?;
            }
        }

        let mut func_indices = HashMap::new();
        for decl in &module.declarations {
            match decl {
                Declaration::Function(f) => {
                    let (params, ret) = self
                        .checked
                        .functions
                        .get(&f.name)
                        .expect("function was registered by the checker")
                        .clone();
                    let ret_idx = self.type_index(&ret)?;
                    let param_idxs = params
                        .iter()
                        .map(|t| self.type_index(t))
                        .collect::<Result<Vec<_>, _>>()?;
                    let idx = self
                        .builder
                        .add_function(f.name.clone(), ret_idx, &param_idxs, false)
                        .map_err(Error::from)?;
                    func_indices.insert(f.name.clone(), idx);
                }
                Declaration::ExternFunction(ef) => {
                    let (params, ret) = self
                        .checked
                        .functions
                        .get(&ef.name)
                        .expect("extern function was registered by the checker")
                        .clone();
                    let ret_idx = self.type_index(&ret)?;
                    let param_idxs = params
                        .iter()
                        .map(|t| self.type_index(t))
                        .collect::<Result<Vec<_>, _>>()?;
                    let idx = self
                        .builder
                        .add_function(ef.name.clone(), ret_idx, &param_idxs, true)
                        .map_err(Error::from)?;
                    func_indices.insert(ef.name.clone(), idx);
                }
                _ => {}
            }
        }

        for decl in &module.declarations {
            if let Declaration::Function(f) = decl {
                self.emit_function(f, &func_indices)?;
            }
        }
        Ok(())
    }

    // ---- types -----------------------------------------------------

    fn type_index(&mut self, ty: &Type) -> Result<u32, Error> {
        match ty {
            Type::Void => Ok(0),
            Type::Bool => Ok(1),
            Type::Int { bits: 8, signed: true } => Ok(2),
            Type::Int { bits: 16, signed: true } => Ok(3),
            Type::Int { bits: 32, signed: true } => Ok(4),
            Type::Int { bits: 64, signed: true } => Ok(5),
            Type::Int { bits: 8, signed: false } => Ok(6),
            Type::Int { bits: 16, signed: false } => Ok(7),
            Type::Int { bits: 32, signed: false } => Ok(8),
            Type::Int { bits: 64, signed: false } => Ok(9),
            Type::Float { bits: 16 } => Ok(10),
            Type::Float { bits: 32 } => Ok(11),
            Type::Float { bits: 64 } => Ok(12),
            Type::Int { bits, .. } => Err(Error::Internal(format!("unsupported integer width {bits}"))),
            Type::Ptr { elem, .. } if matches!(**elem, Type::Void) => Ok(coil_format::GENERIC_PTR_TYPE_INDEX),
            Type::Ptr { elem, .. } => {
                let inner = self.type_index(elem)?;
                let key = format!("ptr<{inner}>");
                if let Some(&idx) = self.type_cache.get(&key) {
                    return Ok(idx);
                }
                let idx = self
                    .builder
                    .add_type(TypeEncoding::new(TypeCategory::Ptr, 64, 0, 0), None)
                    .map_err(Error::from)?;
                self.type_cache.insert(key, idx);
                Ok(idx)
            }
            Type::Vec { elem, size } => {
                let inner = self.type_index(elem)?;
                let key = format!("vec<{inner},{size}>");
                if let Some(&idx) = self.type_cache.get(&key) {
                    return Ok(idx);
                }
                let idx = self
                    .builder
                    .add_type(TypeEncoding::new(TypeCategory::Vec, 0, 0, *size as u16), None)
                    .map_err(Error::from)?;
                self.type_cache.insert(key, idx);
                Ok(idx)
            }
            Type::Array { elem, size } => {
                let inner = self.type_index(elem)?;
                let key = format!("array<{inner},{size}>");
                if let Some(&idx) = self.type_cache.get(&key) {
                    return Ok(idx);
                }
                let idx = self
                    .builder
                    .add_type(TypeEncoding::new(TypeCategory::Array, 0, 0, *size as u16), None)
                    .map_err(Error::from)?;
                self.type_cache.insert(key, idx);
                Ok(idx)
            }
            Type::Struct { name, fields } => {
                let key = name.clone().unwrap_or_else(|| ty.render());
                if let Some(&idx) = self.type_cache.get(&key) {
                    return Ok(idx);
                }
                let field_idxs = fields
                    .iter()
                    .map(|(_, t)| self.type_index(t))
                    .collect::<Result<Vec<_>, _>>()?;
                let idx = self
                    .builder
                    .add_struct_type(&field_idxs, name.as_deref())
                    .map_err(Error::from)?;
                self.type_cache.insert(key, idx);
                Ok(idx)
            }
            Type::Function { params, ret: _, variadic: _ } => {
                let key = ty.render();
                if let Some(&idx) = self.type_cache.get(&key) {
                    return Ok(idx);
                }
                let idx = self
                    .builder
                    .add_type(TypeEncoding::new(TypeCategory::Function, 0, 0, params.len() as u16), None)
                    .map_err(Error::from)?;
                self.type_cache.insert(key, idx);
                Ok(idx)
            }
            Type::Named(name) => Err(Error::Internal(format!(
                "unresolved named type '{name}' reached code generation"
            ))),
        }
    }

    // ---- globals -----------------------------------------------------

    fn emit_global(&mut self, g: &Global) -> Result<(), Error> {
        let ty = self
            .checked
            .globals
            .get(&g.name)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("global '{}' missing from checker output", g.name)))?;
        let ty_idx = self.type_index(&ty)?;
        let init_bytes = g.value.as_ref().and_then(|v| const_fold_bytes(v, &ty));
        self.builder
            .add_global(g.name.clone(), ty_idx, init_bytes.as_deref())
            .map_err(Error::from)?;
        Ok(())
    }

    // ---- functions -----------------------------------------------------

    fn emit_function(&mut self, f: &Function, func_indices: &HashMap<String, u32>) -> Result<(), Error> {
        let idx = func_indices[&f.name];
        self.current_function = f.name.clone();
        self.builder.begin_function_code(idx).map_err(Error::from)?;

        let mut regs: HashMap<String, u8> = HashMap::new();
        let mut next_reg: u8 = 0;
        for (pname, _) in &f.params {
            regs.insert(pname.clone(), next_reg);
            next_reg += 1;
        }

        let mut block_indices = HashMap::new();
        for block in &f.blocks {
            let idx = self.builder.add_block(block.label.clone()).map_err(Error::from)?;
            block_indices.insert(block.label.clone(), idx);
        }

        for block in &f.blocks {
            self.builder.add_block(block.label.clone()).map_err(Error::from)?;
            for stmt in &block.stmts {
                self.emit_stmt(stmt, &mut regs, &mut next_reg, &block_indices)?;
            }
        }

        self.builder.end_function_code().map_err(Error::from)?;
        Ok(())
    }

    fn emit_stmt(
        &mut self,
        stmt: &Stmt,
        regs: &mut HashMap<String, u8>,
        next_reg: &mut u8,
        blocks: &HashMap<String, u32>,
    ) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let dest = *regs.entry(target.clone()).or_insert_with(|| {
                    let r = *next_reg;
                    *next_reg += 1;
                    r
                });
                self.emit_value_into(value, dest, regs, next_reg)?;
            }
            StmtKind::Instruction { opcode, operands } => {
                let opcode = CompactOpcode::from_mnemonic(opcode)
                    .ok_or_else(|| Error::Internal(format!("'{opcode}' has no compact opcode")))?;
                self.emit_opcode(opcode, operands, NO_REGISTER, regs, next_reg)?;
            }
            StmtKind::Branch { cond, true_target, false_target } => match (cond, false_target) {
                (None, None) => {
                    let target = blocks[true_target];
                    let mut bytes = Vec::new();
                    push_operand(&mut bytes, &Operand::Immediate(target as i64));
                    self.builder
                        .add_instruction(CompactOpcode::Br.as_u8(), 0, NO_REGISTER, &bytes)
                        .map_err(Error::from)?;
                }
                (Some(cond), Some(false_target)) => {
                    let cond_reg = self.resolve_register(cond, regs, next_reg)?;
                    let true_idx = blocks[true_target];
                    let false_idx = blocks[false_target];
                    let mut bytes = Vec::new();
                    push_operand(&mut bytes, &Operand::Immediate(true_idx as i64));
                    push_operand(&mut bytes, &Operand::Immediate(false_idx as i64));
                    self.builder
                        .add_instruction(CompactOpcode::BrCond.as_u8(), 0, cond_reg, &bytes)
                        .map_err(Error::from)?;
                }
                _ => unreachable!("the parser never produces a branch with exactly one target"),
            },
            StmtKind::Return { value } => {
                let reg = match value {
                    Some(v) => self.resolve_register(v, regs, next_reg)?,
                    None => NO_REGISTER,
                };
                self.builder
                    .add_instruction(CompactOpcode::Ret.as_u8(), 0, reg, &[])
                    .map_err(Error::from)?;
            }
        }
        Ok(())
    }

    /// Computes `value` and leaves the result in register `dest`.
    fn emit_value_into(
        &mut self,
        value: &Expr,
        dest: u8,
        regs: &mut HashMap<String, u8>,
        next_reg: &mut u8,
    ) -> Result<(), Error> {
        match &value.kind {
            ExprKind::Call(callee, args) => {
                if let ExprKind::Identifier(name) = &callee.kind {
                    return self.emit_opcode_into(name, args, dest, regs, next_reg);
                }
                Err(Error::Internal("call target is not a plain identifier".to_string()))
            }
            ExprKind::Identifier(name) => {
                if let Some(&src) = regs.get(name) {
                    self.zero_add(dest, Operand::Register(src))
                } else {
                    Err(Error::Internal(format!("'{name}' has no register assigned")))
                }
            }
            ExprKind::IntLit(v) => self.zero_add(dest, Operand::Immediate(*v)),
            ExprKind::FloatLit(v) => self.zero_add(dest, Operand::Immediate(v.to_bits() as i64)),
            ExprKind::FieldAccess(base, field) => {
                let offset = self.field_ordinal(base, field)?;
                let base_reg = self.resolve_register(base, regs, next_reg)?;
                let mut bytes = Vec::new();
                push_operand(&mut bytes, &Operand::Register(base_reg));
                push_operand(&mut bytes, &Operand::Immediate(offset));
                self.builder
                    .add_instruction(CompactOpcode::Load.as_u8(), 0, dest, &bytes)
                    .map_err(Error::from)
            }
            ExprKind::Index(base, index) => {
                let base_reg = self.resolve_register(base, regs, next_reg)?;
                let index_op = self.operand_for(index, regs, next_reg)?;
                let mut bytes = Vec::new();
                push_operand(&mut bytes, &Operand::Register(base_reg));
                push_operand(&mut bytes, &index_op);
                self.builder
                    .add_instruction(CompactOpcode::Load.as_u8(), 0, dest, &bytes)
                    .map_err(Error::from)
            }
            ExprKind::StringLit(raw) => {
                let mut bytes = decode_string_escapes(raw);
                bytes.push(0); // NUL terminator, so an extern varargs callee can find the end
                let elem_ty = Type::Int { bits: 8, signed: false };
                let arr_ty = Type::Array { elem: Box::new(elem_ty), size: bytes.len() as u32 };
                let ty_idx = self.type_index(&arr_ty)?;
                let name = format!(".str.{}", self.next_string_id);
                self.next_string_id += 1;
                let global_idx = self
                    .builder
                    .add_global(name, ty_idx, Some(&bytes))
                    .map_err(Error::from)?;
                let mut operand_bytes = Vec::new();
                push_operand(&mut operand_bytes, &Operand::Immediate(global_idx as i64));
                self.builder
                    .add_instruction(CompactOpcode::Lea.as_u8(), 0, dest, &operand_bytes)
                    .map_err(Error::from)
            }
        }
    }

    /// Dispatches a bare-mnemonic RHS: either a real instruction
    /// mnemonic (`ADD`, `LOAD`, ...) or, when no compact opcode
    /// matches, a call to a declared HOIL function reusing the same
    /// `target = NAME operand, operand` call syntax.
    fn emit_opcode_into(
        &mut self,
        mnemonic: &str,
        args: &[Expr],
        dest: u8,
        regs: &mut HashMap<String, u8>,
        next_reg: &mut u8,
    ) -> Result<(), Error> {
        match CompactOpcode::from_mnemonic(mnemonic) {
            Some(opcode) => self.emit_opcode(opcode, args, dest, regs, next_reg),
            None if self.checked.functions.contains_key(mnemonic) => {
                self.emit_call(mnemonic, args, dest, regs, next_reg)
            }
            None => Err(Error::Internal(format!("'{mnemonic}' is neither an instruction nor a known function"))),
        }
    }

    fn emit_call(
        &mut self,
        name: &str,
        args: &[Expr],
        dest: u8,
        regs: &mut HashMap<String, u8>,
        next_reg: &mut u8,
    ) -> Result<(), Error> {
        // `CALL`'s callee operand carries a stable name hash rather
        // than a numeric function index: the VM resolves it against
        // the module's Function section by name at load time
        // (component K), so this crate doesn't need to track final
        // function indices across the whole module.
        let mut bytes = Vec::new();
        push_operand(&mut bytes, &Operand::Function(name_hash(name)));
        for arg in args {
            let op = self.operand_for(arg, regs, next_reg)?;
            push_operand(&mut bytes, &op);
        }
        self.builder
            .add_instruction(CompactOpcode::Call.as_u8(), 0, dest, &bytes)
            .map_err(Error::from)
    }

    fn emit_opcode(
        &mut self,
        opcode: CompactOpcode,
        args: &[Expr],
        dest: u8,
        regs: &mut HashMap<String, u8>,
        next_reg: &mut u8,
    ) -> Result<(), Error> {
        let mut bytes = Vec::new();
        for arg in args {
            let op = self.operand_for(arg, regs, next_reg)?;
            push_operand(&mut bytes, &op);
        }
        self.builder
            .add_instruction(opcode.as_u8(), 0, dest, &bytes)
            .map_err(Error::from)
    }

    /// Turns `expr` into an operand without necessarily allocating a
    /// register: identifiers reuse their existing register, literals
    /// become inline immediates, anything more complex is computed
    /// into a fresh temporary first.
    fn operand_for(&mut self, expr: &Expr, regs: &mut HashMap<String, u8>, next_reg: &mut u8) -> Result<Operand, Error> {
        match &expr.kind {
            ExprKind::Identifier(name) => regs
                .get(name)
                .map(|&r| Operand::Register(r))
                .ok_or_else(|| Error::Internal(format!("'{name}' has no register assigned"))),
            ExprKind::IntLit(v) => Ok(Operand::Immediate(*v)),
            ExprKind::FloatLit(v) => Ok(Operand::Immediate(v.to_bits() as i64)),
            _ => {
                let tmp = *next_reg;
                *next_reg += 1;
                self.emit_value_into(expr, tmp, regs, next_reg)?;
                Ok(Operand::Register(tmp))
            }
        }
    }

    /// Like [`Self::operand_for`], but always returns a register —
    /// immediates are materialized into a fresh temporary first.
    /// Branch conditions and `RET` values need an actual register
    /// (the compact encoding's `dest`/`cond` slot is a single register
    /// byte, not a tagged operand), so they go through this instead of
    /// `operand_for`.
    fn resolve_register(&mut self, expr: &Expr, regs: &mut HashMap<String, u8>, next_reg: &mut u8) -> Result<u8, Error> {
        match self.operand_for(expr, regs, next_reg)? {
            Operand::Register(r) => Ok(r),
            other => {
                let tmp = *next_reg;
                *next_reg += 1;
                self.zero_add(tmp, other)?;
                Ok(tmp)
            }
        }
    }

    /// Materializes `op` into register `dest` via `dest = 0 + op` —
    /// the zero-add trick this toolchain uses in place of a dedicated
    /// `MOV`/`LOAD_IMM` compact opcode (neither exists in the table;
    /// see the module-level doc comment).
    fn zero_add(&mut self, dest: u8, op: Operand) -> Result<(), Error> {
        let mut bytes = Vec::new();
        push_operand(&mut bytes, &Operand::Immediate(0));
        push_operand(&mut bytes, &op);
        self.builder
            .add_instruction(CompactOpcode::Add.as_u8(), 0, dest, &bytes)
            .map_err(Error::from)
    }

    /// The resolved type of a local, parameter, or global named
    /// `name`, as recorded by the checker for the function currently
    /// being emitted.
    fn local_type(&self, name: &str) -> Option<Type> {
        self.checked
            .locals
            .get(&self.current_function)
            .and_then(|locals| locals.get(name))
            .cloned()
            .or_else(|| self.checked.globals.get(name).cloned())
    }

    /// Resolves `expr`'s static type as far as field-ordinal lookup
    /// needs: plain identifiers and chains of field/index access built
    /// on top of one.
    fn expr_type(&self, expr: &Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::Identifier(name) => self.local_type(name),
            ExprKind::FieldAccess(base, field) => match self.expr_type(base)? {
                Type::Struct { fields, .. } => fields.into_iter().find(|(n, _)| n == field).map(|(_, t)| t),
                _ => None,
            },
            ExprKind::Index(base, _) => match self.expr_type(base)? {
                Type::Array { elem, .. } | Type::Vec { elem, .. } => Some(*elem),
                _ => None,
            },
            _ => None,
        }
    }

    /// A struct field's ordinal position among its declared fields,
    /// the address `LOAD`/`STORE` agree on for that field
    /// (`SPEC_FULL.md` §4.J's static-memory model has no byte-level
    /// struct layout, so ordinal position is what both sides use).
    fn field_ordinal(&self, base: &Expr, field: &str) -> Result<i64, Error> {
        match self.expr_type(base) {
            Some(Type::Struct { fields, .. }) => fields
                .iter()
                .position(|(name, _)| name == field)
                .map(|idx| idx as i64)
                .ok_or_else(|| Error::Internal(format!("struct has no field '{field}'"))),
            _ => Err(Error::Internal(format!(
                "'{field}' access on an expression whose struct type codegen couldn't resolve"
            ))),
        }
    }
}

/// A stable small-integer name hash `CALL` operands carry so the VM
/// can resolve a callee by name against the module's Function section
/// without this crate needing to know final function indices (which
/// depend on link-time ordering it doesn't control).
fn name_hash(name: &str) -> u32 {
    let mut h: u32 = 2166136261;
    for b in name.as_bytes() {
        h ^= *b as u32;
        h = h.wrapping_mul(16777619);
    }
    h
}

/// Decodes `\n \t \\ \"` in a string literal's raw payload; any other
/// backslash escape is copied through unchanged, backslash included
/// (`SPEC_FULL.md` §9).
fn decode_string_escapes(raw: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('\\') => out.push(b'\\'),
            Some('"') => out.push(b'"'),
            Some(other) => {
                out.push(b'\\');
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => out.push(b'\\'),
        }
    }
    out
}

/// Folds a literal initializer expression into little-endian bytes
/// sized for `ty`, or `None` if `value` isn't a compile-time constant
/// this code generator can fold (anything other than a bare literal).
fn const_fold_bytes(value: &Expr, ty: &Type) -> Option<Vec<u8>> {
    match (&value.kind, ty) {
        (ExprKind::IntLit(v), Type::Int { bits, .. }) => {
            let full = v.to_le_bytes();
            Some(full[..(*bits as usize / 8).min(8)].to_vec())
        }
        (ExprKind::FloatLit(v), Type::Float { bits: 32 }) => Some((*v as f32).to_le_bytes().to_vec()),
        (ExprKind::FloatLit(v), Type::Float { .. }) => Some(v.to_le_bytes().to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::check_module;
    use crate::parser::parse_module;

    fn compile(src: &str) -> Vec<u8> {
        let module = parse_module(src, "t.hoil").expect("parse");
        let checked = check_module(&module).expect("check");
        generate(&module, &checked).expect("codegen")
    }

    #[test]
    fn minimal_function_compiles_to_nonempty_bytes() {
        let bytes = compile(
            r#"MODULE "t";
            FUNCTION f() -> void {
            entry:
                RET;
            }"#,
        );
        assert!(!bytes.is_empty());
    }

    #[test]
    fn assignment_with_literal_rhs_compiles() {
        let bytes = compile(
            r#"MODULE "t";
            FUNCTION f() -> i32 {
            entry:
                x = 42;
                RET x;
            }"#,
        );
        assert!(!bytes.is_empty());
    }

    #[test]
    fn unconditional_branch_compiles() {
        let bytes = compile(
            r#"MODULE "t";
            FUNCTION f() -> void {
            entry:
                BR ALWAYS, done;
            done:
                RET;
            }"#,
        );
        assert!(!bytes.is_empty());
    }

    #[test]
    fn conditional_branch_compiles() {
        let bytes = compile(
            r#"MODULE "t";
            FUNCTION f(cond: bool) -> void {
            entry:
                BR cond, yes, no;
            yes:
                RET;
            no:
                RET;
            }"#,
        );
        assert!(!bytes.is_empty());
    }

    #[test]
    fn global_with_constant_initializer_compiles() {
        let bytes = compile(
            r#"MODULE "t";
            GLOBAL counter: i32 = 7;
            FUNCTION f() -> void {
            entry:
                RET;
            }"#,
        );
        assert!(!bytes.is_empty());
    }

    #[test]
    fn call_to_declared_function_compiles() {
        let bytes = compile(
            r#"MODULE "t";
            FUNCTION helper(a: i32) -> i32 {
            entry:
                RET a;
            }
            FUNCTION main() -> i32 {
            entry:
                r = helper(1);
                RET r;
            }"#,
        );
        assert!(!bytes.is_empty());
    }

    #[test]
    fn name_hash_is_stable_and_distinguishes_names() {
        assert_eq!(name_hash("foo"), name_hash("foo"));
        assert_ne!(name_hash("foo"), name_hash("bar"));
    }

    #[test]
    fn field_access_uses_the_fields_declared_ordinal() {
        let bytes = compile(
            r#"MODULE "t";
            TYPE Point { x: i32, y: i32 }
            FUNCTION f(p: Point) -> i32 {
            entry:
                RET p.y;
            }"#,
        );
        let image = coil_format::ModuleImage::parse(&bytes).unwrap();
        let code = image.code().unwrap();
        let load = code[0].blocks[0]
            .instructions()
            .unwrap()
            .into_iter()
            .find(|i| i.opcode == CompactOpcode::Load.as_u8())
            .expect("a LOAD for p.y");
        // operands: [TAG_REGISTER, base_reg, TAG_IMMEDIATE, 8 little-endian bytes]
        assert_eq!(load.operands[2], TAG_IMMEDIATE);
        let mut offset_bytes = [0u8; 8];
        offset_bytes.copy_from_slice(&load.operands[3..11]);
        assert_eq!(i64::from_le_bytes(offset_bytes), 1, "y is Point's second field");
    }

    #[test]
    fn string_literal_decodes_escapes_and_materializes_as_a_global() {
        let bytes = compile(
            r#"MODULE "t";
            EXTERN FUNCTION puts(s: ptr<i8>) -> i32;
            FUNCTION f() -> i32 {
            entry:
                r = puts("hi\n");
                RET r;
            }"#,
        );
        let image = coil_format::ModuleImage::parse(&bytes).unwrap();
        let lea = image.code().unwrap()[0].blocks[0]
            .instructions()
            .unwrap()
            .into_iter()
            .find(|i| i.opcode == CompactOpcode::Lea.as_u8())
            .expect("a LEA for the string literal");
        assert_eq!(lea.operands[0], TAG_IMMEDIATE);
        let mut idx_bytes = [0u8; 8];
        idx_bytes.copy_from_slice(&lea.operands[1..9]);
        let global_idx = i64::from_le_bytes(idx_bytes) as usize;

        let globals = image.globals().unwrap();
        let global = &globals[global_idx];
        assert_eq!(global.init_bytes, b"hi\n\0");
    }

    #[test]
    fn const_fold_truncates_to_declared_width() {
        let expr = Expr::new(ExprKind::IntLit(300), crate::location::SourceLocation::start(std::rc::Rc::from("t")));
        let bytes = const_fold_bytes(&expr, &Type::Int { bits: 8, signed: false }).unwrap();
        assert_eq!(bytes, vec![300i64.to_le_bytes()[0]]);
    }
}
