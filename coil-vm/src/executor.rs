//! The streaming VM executor (component K, `SPEC_FULL.md` §4.K).
//!
//! Strictly single-threaded and synchronous: the "program counter" is
//! just the seek position into the program buffer, there is no
//! suspension or preemption, and every instruction dispatches
//! in-line before the next is decoded.

use std::io::Write;

use coil_asm::{Instruction, MemType, WideOpcode};

use crate::error::Error;
use crate::memory::State;

fn u16_at(imm: u64, bit_offset: u32) -> u16 {
    ((imm >> bit_offset) & 0xFFFF) as u16
}

/// What happened after one call to [`Executor::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The VM is still running; more records remain (or may be
    /// appended and re-run from here).
    Continued,
    /// The VM halted — either a clean end of stream or `EXIT`/`SYSCALL
    /// 60`/a fatal error already recorded in `State`.
    Halted,
}

/// Drives one VM run over an in-memory streaming program.
///
/// `program` is the whole byte stream; `pos` is the executor's current
/// read offset into it, standing in for "the input file's seek
/// position" the specification describes (`SPEC_FULL.md` §3.5).
pub struct Executor<'a> {
    program: &'a [u8],
    pos: usize,
    state: State,
}

impl<'a> Executor<'a> {
    /// A fresh executor over `program`, positioned at the start.
    pub fn new(program: &'a [u8]) -> Self {
        Self {
            program,
            pos: 0,
            state: State::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Seeks to an arbitrary offset without executing anything — the
    /// debugger's `goto` command.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }

    /// Decodes the record at the current position without consuming
    /// it — the debugger's "decode and display" step (`SPEC_FULL.md`
    /// §4.L).
    pub fn peek(&self) -> Result<Option<Instruction>, Error> {
        let rest = self.slice_from(self.pos)?;
        Ok(Instruction::decode(rest)?.map(|(instr, _)| instr))
    }

    /// Borrows `program[from..]`, refusing a position past the end of
    /// the stream instead of letting the slice panic (`goto` and a
    /// corrupt label table are the two ways `pos` can run wild).
    fn slice_from(&self, from: usize) -> Result<&[u8], Error> {
        self.program
            .get(from..)
            .ok_or(Error::InvalidPosition(from))
    }

    /// Pass 1: rewinds and scans the whole stream for `LABEL_DEF`
    /// records, recording `label id -> offset just after the record`.
    /// Duplicate ids are fatal (`Error::DuplicateLabel`).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn collect_labels(&mut self) -> Result<(), Error> {
        let mut pos = 0usize;
        while pos < self.program.len() {
            let Some((instr, consumed)) = Instruction::decode(&self.program[pos..])? else {
                break;
            };
            let after = pos + consumed;
            if instr.opcode == WideOpcode::LabelDef {
                tracing::trace!(label = instr.var_address, offset = after, "label registered");
                self.state.register_label(instr.var_address, after as i64)?;
            }
            pos = after;
        }
        Ok(())
    }

    /// Decodes and executes exactly one record at the current
    /// position. A clean end of stream halts with `exit_code = 0`.
    pub fn step(&mut self) -> Result<StepOutcome, Error> {
        if !self.state.running() {
            return Ok(StepOutcome::Halted);
        }
        let rest = self.slice_from(self.pos)?;
        let Some((instr, consumed)) = Instruction::decode(rest)? else {
            self.state.halt(0);
            return Ok(StepOutcome::Halted);
        };
        let mut next_pos = self.pos + consumed;
        if instr.opcode != WideOpcode::LabelDef {
            self.state.count_instruction();
        }
        tracing::trace!(pos = self.pos, opcode = ?instr.opcode, "dispatch");
        if let Err(err) = self.dispatch(&instr, &mut next_pos) {
            tracing::warn!(pos = self.pos, opcode = ?instr.opcode, %err, "instruction failed, halting");
            return Err(err);
        }
        self.pos = next_pos;
        if self.state.running() {
            Ok(StepOutcome::Continued)
        } else {
            Ok(StepOutcome::Halted)
        }
    }

    /// Runs label collection followed by execution to completion
    /// (halt or clean EOF), consuming the executor and returning its
    /// final state.
    #[tracing::instrument(level = "info", skip(self), fields(program_len = self.program.len()))]
    pub fn run(mut self) -> Result<State, Error> {
        self.collect_labels()?;
        self.pos = 0;
        loop {
            if self.step()? == StepOutcome::Halted {
                break;
            }
        }
        tracing::info!(
            exit_code = self.state.exit_code(),
            instructions = self.state.instruction_count(),
            "run complete"
        );
        Ok(self.state)
    }

    fn mem_type(instr: &Instruction) -> MemType {
        MemType::from_u8(instr.mem_type).unwrap_or(MemType::Int64)
    }

    fn dispatch(&mut self, instr: &Instruction, next_pos: &mut usize) -> Result<(), Error> {
        use WideOpcode::*;
        match instr.opcode {
            LabelDef | ArgData => {}
            AllocImm => {
                let ty = Self::mem_type(instr);
                let bytes = &instr.imm_value.to_le_bytes()[..ty.size_bytes()];
                self.state.write_memory(instr.var_address, bytes)?;
            }
            AllocMem => {
                let ty = Self::mem_type(instr);
                let src = instr.imm_value as u16;
                let bytes = self.state.read_memory(src, ty.size_bytes())?.to_vec();
                self.state.write_memory(instr.var_address, &bytes)?;
            }
            Move => {
                let ty = Self::mem_type(instr);
                let src = instr.imm_value as u16;
                let bytes = self.state.read_memory(src, ty.size_bytes())?.to_vec();
                self.state.move_memory(instr.var_address, &bytes)?;
            }
            Add | Sub | Mul | Div | Mod => {
                let src1 = u16_at(instr.imm_value, 32);
                let src2 = u16_at(instr.imm_value, 0);
                let a = self.state.read_i64(src1)?;
                let b = self.state.read_i64(src2)?;
                let result = match instr.opcode {
                    Add => a.wrapping_add(b),
                    Sub => a.wrapping_sub(b),
                    Mul => a.wrapping_mul(b),
                    Div => {
                        if b == 0 {
                            return Err(Error::DivideByZero);
                        }
                        a.wrapping_div(b)
                    }
                    Mod => {
                        if b == 0 {
                            return Err(Error::DivideByZero);
                        }
                        a.wrapping_rem(b)
                    }
                    _ => unreachable!(),
                };
                self.state.write_i64(instr.var_address, result)?;
            }
            Neg => {
                let src = u16_at(instr.imm_value, 0);
                let a = self.state.read_i64(src)?;
                self.state.write_i64(instr.var_address, -a)?;
            }
            And | Or | Xor | Shl | Shr => {
                let src1 = u16_at(instr.imm_value, 32);
                let a = self.state.read_i64(src1)? as u64;
                let b = match instr.opcode {
                    Shl | Shr => instr.imm_value & 0xFFFF_FFFF,
                    _ => self.state.read_i64(u16_at(instr.imm_value, 0))? as u64,
                };
                let result = match instr.opcode {
                    And => a & b,
                    Or => a | b,
                    Xor => a ^ b,
                    Shl => a.wrapping_shl(b as u32),
                    Shr => a.wrapping_shr(b as u32),
                    _ => unreachable!(),
                };
                self.state.write_i64(instr.var_address, result as i64)?;
            }
            Not => {
                let src = u16_at(instr.imm_value, 0);
                let a = self.state.read_i64(src)?;
                self.state.write_i64(instr.var_address, !a)?;
            }
            Jmp => {
                let label = instr.imm_value as u16;
                *next_pos = self.state.label_offset(label)? as usize;
            }
            Jeq | Jne | Jlt | Jle | Jgt | Jge => {
                let src1 = u16_at(instr.imm_value, 48);
                let src2 = u16_at(instr.imm_value, 32);
                let label = u16_at(instr.imm_value, 0);
                let a = self.state.read_i64(src1)?;
                let b = self.state.read_i64(src2)?;
                let taken = match instr.opcode {
                    Jeq => a == b,
                    Jne => a != b,
                    Jlt => a < b,
                    Jle => a <= b,
                    Jgt => a > b,
                    Jge => a >= b,
                    _ => unreachable!(),
                };
                if taken {
                    *next_pos = self.state.label_offset(label)? as usize;
                }
            }
            Call => {
                let label = instr.imm_value as u16;
                let target = self.state.label_offset(label)?;
                self.state.push_call(*next_pos as i64)?;
                *next_pos = target as usize;
            }
            Ret => {
                *next_pos = self.state.pop_call()? as usize;
            }
            Push => {
                let ty = Self::mem_type(instr);
                let bytes = self.state.read_memory(instr.var_address, ty.size_bytes())?.to_vec();
                self.state.push_stack(&bytes)?;
            }
            Pop => {
                let ty = Self::mem_type(instr);
                let bytes = self.state.pop_stack(ty.size_bytes())?;
                self.state.write_memory(instr.var_address, &bytes)?;
            }
            Syscall => {
                let id = instr.imm_value as u16;
                let args = self.peek_arg_data(next_pos)?;
                self.syscall(id, args)?;
            }
            Exit => {
                self.state.halt(instr.imm_value as i32);
            }
        }
        Ok(())
    }

    /// If the record immediately following the current one is
    /// `ARG_DATA`, consumes it and returns its four packed `u16`
    /// argument slots; otherwise leaves the stream untouched and
    /// returns all zeros (`SPEC_FULL.md` §4.K, `SYSCALL`).
    fn peek_arg_data(&self, next_pos: &mut usize) -> Result<[u16; 4], Error> {
        let Ok(rest) = self.slice_from(*next_pos) else {
            return Ok([0; 4]);
        };
        match Instruction::decode(rest)? {
            Some((instr, consumed)) if instr.opcode == WideOpcode::ArgData => {
                *next_pos += consumed;
                Ok([
                    u16_at(instr.imm_value, 0),
                    u16_at(instr.imm_value, 16),
                    u16_at(instr.imm_value, 32),
                    u16_at(instr.imm_value, 48),
                ])
            }
            _ => Ok([0; 4]),
        }
    }

    fn syscall(&mut self, id: u16, args: [u16; 4]) -> Result<(), Error> {
        match id {
            1 => {
                let [fd, buf_addr, count, _] = args;
                let bytes = self.state.read_memory(buf_addr, count as usize)?;
                match fd {
                    1 => std::io::stdout().write_all(bytes).map_err(coil_types::IoError::from)?,
                    2 => std::io::stderr().write_all(bytes).map_err(coil_types::IoError::from)?,
                    other => return Err(Error::BadFileDescriptor(other)),
                }
                Ok(())
            }
            60 => {
                self.state.halt(args[0] as i32);
                Ok(())
            }
            other => Err(Error::UnknownSyscall(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coil_asm::WideOpcode;

    fn alloc_imm(ty: MemType, addr: u16, value: i64) -> Instruction {
        Instruction::new(WideOpcode::AllocImm, ty as u8, addr, value as u64)
    }

    #[test]
    fn streaming_add_matches_scenario_3() {
        let mut bytes = Vec::new();
        bytes.extend(alloc_imm(MemType::Int64, 10, 2).encode());
        bytes.extend(alloc_imm(MemType::Int64, 18, 40).encode());
        let add = Instruction::new(WideOpcode::Add, 0, 0, (10u64 << 32) | 18);
        bytes.extend(add.encode());

        let state = Executor::new(&bytes).run().unwrap();
        assert_eq!(state.read_i64(0).unwrap(), 42);
        assert_eq!(state.instruction_count(), 3);
        assert_eq!(state.exit_code(), 0);
    }

    #[test]
    fn unconditional_branch_with_label_collection_matches_scenario_4() {
        let mut bytes = Vec::new();
        bytes.extend(Instruction::new(WideOpcode::Jmp, 0, 0, 99).encode());
        bytes.extend(Instruction::new(WideOpcode::LabelDef, 0, 1, 0).encode());
        bytes.extend(Instruction::new(WideOpcode::Exit, 0, 0, 7).encode());
        bytes.extend(Instruction::new(WideOpcode::Jmp, 0, 0, 1).encode());

        let mut exec = Executor::new(&bytes);
        exec.collect_labels().unwrap();
        exec.seek(0);
        let err = loop {
            match exec.step() {
                Ok(StepOutcome::Continued) => continue,
                Ok(StepOutcome::Halted) => panic!("expected a Runtime error before halting"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, Error::UnknownLabel(99)));
        assert_eq!(exec.state().memory_used(), 0);
    }

    #[test]
    fn divide_by_zero_is_fatal() {
        let mut bytes = Vec::new();
        bytes.extend(alloc_imm(MemType::Int64, 0, 10).encode());
        bytes.extend(alloc_imm(MemType::Int64, 8, 0).encode());
        bytes.extend(Instruction::new(WideOpcode::Div, 0, 0, (0u64 << 32) | 8).encode());

        let err = Executor::new(&bytes).run().unwrap_err();
        assert!(matches!(err, Error::DivideByZero));
    }

    #[test]
    fn call_and_ret_round_trip_the_call_stack() {
        let mut bytes = Vec::new();
        // 0: CALL -> label 1
        bytes.extend(Instruction::new(WideOpcode::Call, 0, 0, 1).encode());
        // 1: EXIT 0 (only reached after returning, to prove RET came back)
        let after_call = bytes.len();
        bytes.extend(Instruction::new(WideOpcode::Exit, 0, 0, 0).encode());
        // 2: LABEL_DEF id=1 (callee entry)
        bytes.extend(Instruction::new(WideOpcode::LabelDef, 0, 1, 0).encode());
        // 3: RET
        bytes.extend(Instruction::new(WideOpcode::Ret, 0, 0, 0).encode());

        let state = Executor::new(&bytes).run().unwrap();
        assert_eq!(state.exit_code(), 0);
        let _ = after_call;
    }
}
