//! Compact-to-streaming lowering (`SPEC_FULL.md` §9, open question 1).
//!
//! The compact Code section is a register machine: every value lives
//! in a small numbered register, renumbered from zero in every
//! function. The streaming VM has no registers at all, only static
//! memory addresses. This module bridges the two by giving each
//! function a disjoint "frame" — a contiguous range of static memory
//! one 8-byte slot per register wide — and translating every compact
//! instruction into the streaming records that read and write slots in
//! that frame.
//!
//! Two conventions this translator invents, because the specification
//! only describes the streaming encoding's built-in syscalls and says
//! nothing about a calling convention: arguments are copied into the
//! callee's frame before `CALL`, and a single well-known address
//! (`RETURN_VALUE_ADDR`) carries a function's return value back to its
//! caller. Neither survives re-entrant or recursive calls, since two
//! live calls to the same function would alias the same frame — this
//! translator targets straight-line, non-recursive programs, the
//! common case described in `SPEC_FULL.md` §9.

use std::collections::HashMap;

use coil_asm::{CompactOpcode, Instruction, MemType, WideOpcode};
use coil_format::sections::{BlockRecord, CodeEntry, CompactInstruction};
use coil_format::ModuleImage;
use coil_types::NO_REGISTER;

use crate::Error;

const TAG_REGISTER: u8 = 0;
const TAG_IMMEDIATE: u8 = 1;
const TAG_FUNCTION: u8 = 2;

const SCRATCH_SLOTS: u16 = 4;
const SLOT_BYTES: u16 = 8;

const ZERO_CONST_ADDR: u16 = 0;
const RETURN_VALUE_ADDR: u16 = SLOT_BYTES;
const REGISTER_AREA_BASE: u16 = 2 * SLOT_BYTES;

#[derive(Debug, Clone, Copy)]
enum Operand {
    Register(u8),
    Immediate(i64),
    Function(u32),
}

/// Decodes every tagged operand in a compact instruction's opaque
/// operand bytes, mirroring `hoil_syntax::codegen`'s private encoder —
/// the two sides of this format agree by convention, not by a shared
/// type, since `coil-format` treats the bytes as opaque payload.
fn decode_operands(bytes: &[u8]) -> Vec<Operand> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            TAG_REGISTER => {
                out.push(Operand::Register(bytes[i + 1]));
                i += 2;
            }
            TAG_IMMEDIATE => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes[i + 1..i + 9]);
                out.push(Operand::Immediate(i64::from_le_bytes(arr)));
                i += 9;
            }
            TAG_FUNCTION => {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(&bytes[i + 1..i + 5]);
                out.push(Operand::Function(u32::from_le_bytes(arr)));
                i += 5;
            }
            _ => unreachable!("hoil-syntax's codegen never writes an unknown operand tag"),
        }
    }
    out
}

/// A stable small-integer name hash, bit-for-bit identical to
/// `hoil_syntax::codegen`'s private `name_hash` — the two crates share
/// this convention without sharing code, since `CALL`'s callee operand
/// is specified (§4.I) only as "a stable name hash", not as an index.
fn name_hash(name: &str) -> u32 {
    let mut h: u32 = 2166136261;
    for b in name.as_bytes() {
        h ^= *b as u32;
        h = h.wrapping_mul(16777619);
    }
    h
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    base: u16,
    register_count: u16,
}

impl Frame {
    fn register_addr(&self, r: u8) -> u16 {
        self.base + r as u16 * SLOT_BYTES
    }

    fn scratch_addr(&self, slot: u16) -> u16 {
        self.base + (self.register_count + slot % SCRATCH_SLOTS) * SLOT_BYTES
    }

    fn size_bytes(&self) -> u16 {
        (self.register_count + SCRATCH_SLOTS) * SLOT_BYTES
    }
}

/// Highest register id this instruction's dest or operands reference,
/// or `None` if it references none.
fn max_register(instr: &CompactInstruction) -> Option<u8> {
    let mut max = if instr.dest != NO_REGISTER { Some(instr.dest) } else { None };
    for op in decode_operands(&instr.operands) {
        if let Operand::Register(r) = op {
            max = Some(max.map_or(r, |m| m.max(r)));
        }
    }
    max
}

/// A function's frame must be at least wide enough to hold every
/// declared parameter, even one the body never reads or writes —
/// `hoil_syntax::codegen` pre-assigns registers `0..paramCount` to
/// parameters unconditionally, so scanning only instruction operands
/// can undercount and alias a trailing unused parameter's register
/// onto this frame's own scratch slots.
fn register_count(entry: &CodeEntry, param_count: u16) -> Result<u16, Error> {
    let mut max: Option<u8> = None;
    for block in &entry.blocks {
        for instr in block.instructions()? {
            if let Some(r) = max_register(&instr) {
                max = Some(max.map_or(r, |m| m.max(r)));
            }
        }
    }
    let scanned = max.map(|m| m as u16 + 1).unwrap_or(0);
    Ok(scanned.max(param_count))
}

struct Lowering {
    out: Vec<u8>,
    frames: HashMap<u32, Frame>,
    callee_by_hash: HashMap<u32, u32>,
    block_labels: HashMap<(u32, usize), u16>,
    next_label: u16,
}

impl Lowering {
    fn emit(&mut self, instr: Instruction) {
        self.out.extend(instr.encode());
    }

    fn fresh_label(&mut self) -> u16 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn alloc_imm(&mut self, addr: u16, value: i64) {
        self.emit(Instruction::new(WideOpcode::AllocImm, MemType::Int64 as u8, addr, value as u64));
    }

    /// Returns an address holding `op`'s value, materializing an
    /// immediate into a fresh scratch slot first if needed.
    fn materialize(&mut self, frame: &Frame, op: Operand, scratch_idx: &mut u16) -> Result<u16, Error> {
        match op {
            Operand::Register(r) => Ok(frame.register_addr(r)),
            Operand::Immediate(v) => {
                let addr = frame.scratch_addr(*scratch_idx);
                *scratch_idx += 1;
                self.alloc_imm(addr, v);
                Ok(addr)
            }
            Operand::Function(h) => Err(Error::UnresolvedCallee(h)),
        }
    }

    fn lower_binary(&mut self, wide: WideOpcode, frame: &Frame, dest: u8, ops: &[Operand]) -> Result<(), Error> {
        if dest == NO_REGISTER {
            return Err(Error::MissingDestination);
        }
        let mut scratch = 0u16;
        let a = self.materialize(frame, ops[0], &mut scratch)?;
        let b = self.materialize(frame, ops[1], &mut scratch)?;
        let imm = ((a as u64) << 32) | b as u64;
        self.emit(Instruction::new(wide, 0, frame.register_addr(dest), imm));
        Ok(())
    }

    fn lower_unary(&mut self, wide: WideOpcode, frame: &Frame, dest: u8, ops: &[Operand]) -> Result<(), Error> {
        if dest == NO_REGISTER {
            return Err(Error::MissingDestination);
        }
        let mut scratch = 0u16;
        let a = self.materialize(frame, ops[0], &mut scratch)?;
        self.emit(Instruction::new(wide, 0, frame.register_addr(dest), a as u64));
        Ok(())
    }

    fn lower_shift(&mut self, wide: WideOpcode, frame: &Frame, dest: u8, ops: &[Operand]) -> Result<(), Error> {
        if dest == NO_REGISTER {
            return Err(Error::MissingDestination);
        }
        let Operand::Immediate(amount) = ops[1] else {
            return Err(Error::ShiftAmountNotImmediate);
        };
        let mut scratch = 0u16;
        let a = self.materialize(frame, ops[0], &mut scratch)?;
        let imm = ((a as u64) << 32) | (amount as u64 & 0xFFFF_FFFF);
        self.emit(Instruction::new(wide, 0, frame.register_addr(dest), imm));
        Ok(())
    }

    fn lower_compare(&mut self, wide: WideOpcode, frame: &Frame, dest: u8, ops: &[Operand]) -> Result<(), Error> {
        if dest == NO_REGISTER {
            return Err(Error::MissingDestination);
        }
        let mut scratch = 0u16;
        let a = self.materialize(frame, ops[0], &mut scratch)?;
        let b = self.materialize(frame, ops[1], &mut scratch)?;
        let true_label = self.fresh_label();
        let after_label = self.fresh_label();
        let dest_addr = frame.register_addr(dest);
        let jump_imm = ((a as u64) << 48) | ((b as u64) << 32) | true_label as u64;
        self.emit(Instruction::new(wide, 0, 0, jump_imm));
        self.alloc_imm(dest_addr, 0);
        self.emit(Instruction::new(WideOpcode::Jmp, 0, 0, after_label as u64));
        self.emit(Instruction::new(WideOpcode::LabelDef, 0, true_label, 0));
        self.alloc_imm(dest_addr, 1);
        self.emit(Instruction::new(WideOpcode::LabelDef, 0, after_label, 0));
        Ok(())
    }

    fn lower_call(&mut self, frame: &Frame, dest: u8, ops: &[Operand]) -> Result<(), Error> {
        let Operand::Function(hash) = ops[0] else {
            return Err(Error::MalformedInstruction);
        };
        let callee_idx = *self.callee_by_hash.get(&hash).ok_or(Error::UnresolvedCallee(hash))?;
        let callee_frame = *self.frames.get(&callee_idx).ok_or(Error::UnresolvedCallee(hash))?;
        let mut scratch = 0u16;
        for (i, &op) in ops[1..].iter().enumerate() {
            let src = self.materialize(frame, op, &mut scratch)?;
            let param_addr = callee_frame.register_addr(i as u8);
            self.emit(Instruction::new(WideOpcode::Move, MemType::Int64 as u8, param_addr, src as u64));
        }
        let entry_label = self.block_labels[&(callee_idx, 0)];
        self.emit(Instruction::new(WideOpcode::Call, 0, 0, entry_label as u64));
        if dest != NO_REGISTER {
            self.emit(Instruction::new(
                WideOpcode::Move,
                MemType::Int64 as u8,
                frame.register_addr(dest),
                RETURN_VALUE_ADDR as u64,
            ));
        }
        Ok(())
    }

    fn lower_ret(&mut self, frame: &Frame, dest: u8) {
        if dest != NO_REGISTER {
            self.emit(Instruction::new(
                WideOpcode::Move,
                MemType::Int64 as u8,
                RETURN_VALUE_ADDR,
                frame.register_addr(dest) as u64,
            ));
        }
        self.emit(Instruction::new(WideOpcode::Ret, 0, 0, 0));
    }

    fn lower_br(&mut self, func_index: u32, target_block: usize) {
        let label = self.block_labels[&(func_index, target_block)];
        self.emit(Instruction::new(WideOpcode::Jmp, 0, 0, label as u64));
    }

    fn lower_br_cond(&mut self, func_index: u32, frame: &Frame, cond_reg: u8, true_block: usize, false_block: usize) {
        let cond_addr = frame.register_addr(cond_reg);
        let true_label = self.block_labels[&(func_index, true_block)];
        let false_label = self.block_labels[&(func_index, false_block)];
        let jump_imm = ((cond_addr as u64) << 48) | ((ZERO_CONST_ADDR as u64) << 32) | true_label as u64;
        self.emit(Instruction::new(WideOpcode::Jne, 0, 0, jump_imm));
        self.emit(Instruction::new(WideOpcode::Jmp, 0, 0, false_label as u64));
    }

    /// Lowers one instruction that isn't `BR`/`BR_COND` (those need the
    /// enclosing function index to resolve their block-index operands
    /// to labels, so `lower_block` handles them directly).
    fn lower_instruction(&mut self, frame: &Frame, instr: &CompactInstruction) -> Result<(), Error> {
        let opcode = CompactOpcode::from_u8(instr.opcode).ok_or(Error::MalformedInstruction)?;
        let ops = decode_operands(&instr.operands);
        use CompactOpcode::*;
        match opcode {
            Add => self.lower_binary(WideOpcode::Add, frame, instr.dest, &ops),
            Sub => self.lower_binary(WideOpcode::Sub, frame, instr.dest, &ops),
            Mul => self.lower_binary(WideOpcode::Mul, frame, instr.dest, &ops),
            Div => self.lower_binary(WideOpcode::Div, frame, instr.dest, &ops),
            Rem => self.lower_binary(WideOpcode::Mod, frame, instr.dest, &ops),
            And => self.lower_binary(WideOpcode::And, frame, instr.dest, &ops),
            Or => self.lower_binary(WideOpcode::Or, frame, instr.dest, &ops),
            Xor => self.lower_binary(WideOpcode::Xor, frame, instr.dest, &ops),
            Neg => self.lower_unary(WideOpcode::Neg, frame, instr.dest, &ops),
            Not => self.lower_unary(WideOpcode::Not, frame, instr.dest, &ops),
            Shl => self.lower_shift(WideOpcode::Shl, frame, instr.dest, &ops),
            Shr => self.lower_shift(WideOpcode::Shr, frame, instr.dest, &ops),
            CmpEq => self.lower_compare(WideOpcode::Jeq, frame, instr.dest, &ops),
            CmpNe => self.lower_compare(WideOpcode::Jne, frame, instr.dest, &ops),
            CmpLt => self.lower_compare(WideOpcode::Jlt, frame, instr.dest, &ops),
            CmpLe => self.lower_compare(WideOpcode::Jle, frame, instr.dest, &ops),
            CmpGt => self.lower_compare(WideOpcode::Jgt, frame, instr.dest, &ops),
            CmpGe => self.lower_compare(WideOpcode::Jge, frame, instr.dest, &ops),
            Call => self.lower_call(frame, instr.dest, &ops),
            Ret => {
                self.lower_ret(frame, instr.dest);
                Ok(())
            }
            Br | BrCond => unreachable!("lower_block dispatches these directly"),
            Abs | Min | Max | Fma | Load | Store | Lea | Fence | Switch => Err(Error::UnsupportedOpcode(opcode)),
        }
    }
}

/// Translates a parsed module image's compact Code section into one
/// flat streaming instruction stream, ready for
/// `coil_vm::Executor::new`.
pub fn lower_module(image: &ModuleImage<'_>) -> Result<Vec<u8>, Error> {
    let functions = image.functions()?;
    let code = image.code()?;

    let mut lowering = Lowering {
        out: Vec::new(),
        frames: HashMap::new(),
        callee_by_hash: HashMap::new(),
        block_labels: HashMap::new(),
        next_label: 0,
    };

    for f in &functions {
        if !f.is_external {
            lowering.callee_by_hash.insert(name_hash(&f.name), f.index);
        }
    }

    let mut base = REGISTER_AREA_BASE;
    for entry in &code {
        let param_count = functions
            .iter()
            .find(|f| f.index == entry.func_index)
            .map(|f| f.param_types.len() as u16)
            .unwrap_or(0);
        let register_count = register_count(entry, param_count)?;
        let frame = Frame { base, register_count };
        base += frame.size_bytes();
        lowering.frames.insert(entry.func_index, frame);
        for block_idx in 0..entry.blocks.len() {
            let label = lowering.fresh_label();
            lowering.block_labels.insert((entry.func_index, block_idx), label);
        }
    }

    let needed = base as usize;
    let capacity = coil_vm::STATIC_MEMORY_SIZE;
    if needed > capacity {
        return Err(Error::ProgramTooLarge { needed, capacity });
    }

    let main_index = functions
        .iter()
        .find(|f| !f.is_external && f.name == "main")
        .map(|f| f.index)
        .ok_or(Error::NoEntryPoint)?;
    let main_label = lowering.block_labels[&(main_index, 0)];

    lowering.alloc_imm(ZERO_CONST_ADDR, 0);
    // A bare top-level `RET` has no enclosing `CALL` to return to — a
    // streaming program has no notion of "the top level" the sectioned
    // format's declaration list does. Wrapping `main` in an explicit
    // call/exit frame gives its `RET` somewhere real to return to.
    lowering.emit(Instruction::new(WideOpcode::Call, 0, 0, main_label as u64));
    lowering.emit(Instruction::new(WideOpcode::Exit, 0, 0, 0));

    for entry in &code {
        let frame = lowering.frames[&entry.func_index];
        for (block_idx, block) in entry.blocks.iter().enumerate() {
            let label = lowering.block_labels[&(entry.func_index, block_idx)];
            lowering.emit(Instruction::new(WideOpcode::LabelDef, 0, label, 0));
            lower_block(&mut lowering, entry.func_index, &frame, block)?;
        }
    }

    Ok(lowering.out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_count_floors_to_the_declared_parameter_count() {
        let entry = CodeEntry {
            func_index: 0,
            blocks: vec![BlockRecord {
                name: "entry".to_string(),
                // A bare `RET` referencing register 0: opcode, flags,
                // operand count, dest, then zero operand bytes — the
                // same layout `CompactInstruction` decodes.
                bytes: vec![CompactOpcode::Ret.as_u8(), 0, 0, 0],
            }],
        };
        // Only register 0 is ever referenced, but the function declares
        // three parameters — a trailing unused one must still reserve
        // its own slot rather than aliasing this frame's scratch area.
        assert_eq!(register_count(&entry, 3).unwrap(), 3);
        assert_eq!(register_count(&entry, 0).unwrap(), 1);
    }
}

fn lower_block(lowering: &mut Lowering, func_index: u32, frame: &Frame, block: &BlockRecord) -> Result<(), Error> {
    for instr in block.instructions()? {
        match CompactOpcode::from_u8(instr.opcode) {
            Some(CompactOpcode::Br) => {
                let ops = decode_operands(&instr.operands);
                let Some(Operand::Immediate(target)) = ops.first() else {
                    return Err(Error::MalformedInstruction);
                };
                lowering.lower_br(func_index, *target as usize);
            }
            Some(CompactOpcode::BrCond) => {
                let ops = decode_operands(&instr.operands);
                let (Some(Operand::Immediate(true_idx)), Some(Operand::Immediate(false_idx))) =
                    (ops.first(), ops.get(1))
                else {
                    return Err(Error::MalformedInstruction);
                };
                lowering.lower_br_cond(func_index, frame, instr.dest, *true_idx as usize, *false_idx as usize);
            }
            _ => lowering.lower_instruction(frame, &instr)?,
        }
    }
    Ok(())
}
