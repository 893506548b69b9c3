//! Code section records: per-function basic blocks of compact
//! instructions (`SPEC_FULL.md` §3.3, §4.B `addInstruction`).

use coil_types::bytes::{ByteReader, GrowableBuffer};

use crate::Error;

/// One compact-encoded instruction: a 4-byte header followed by raw
/// operand bytes.
///
/// Distinct from `coil_asm::Instruction`, the 17-byte marker-framed
/// record the VM reads — see `SPEC_FULL.md` §9, open question 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactInstruction {
    /// The 8-bit compact opcode (`coil_asm::CompactOpcode`).
    pub opcode: u8,
    /// Builder/codegen-defined flags; opaque to this crate.
    pub flags: u8,
    /// The destination register, or `coil_types::NO_REGISTER`.
    pub dest: u8,
    /// Raw operand bytes. This section treats them as opaque payload;
    /// the code generator (component I) owns whatever tagged layout it
    /// chooses (register vs. inline immediate, branch target indices,
    /// ...) and decodes its own encoding back out.
    pub operands: Vec<u8>,
}

impl CompactInstruction {
    fn encode_into(&self, buf: &mut GrowableBuffer) {
        buf.write_u8(self.opcode);
        buf.write_u8(self.flags);
        buf.write_u8(self.operands.len() as u8);
        buf.write_u8(self.dest);
        buf.append(&self.operands);
    }

    fn decode_from(r: &mut ByteReader<'_>) -> Result<Self, Error> {
        let opcode = r.read_u8()?;
        let flags = r.read_u8()?;
        let operand_count = r.read_u8()? as usize;
        let dest = r.read_u8()?;
        let operands = r.read_bytes(operand_count)?.to_vec();
        Ok(Self {
            opcode,
            flags,
            dest,
            operands,
        })
    }
}

/// One named basic block's worth of compact instructions, concatenated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRecord {
    /// The block's label.
    pub name: String,
    /// The block body: concatenated [`CompactInstruction`] encodings.
    pub bytes: Vec<u8>,
}

impl BlockRecord {
    /// Decode every instruction this block's raw bytes encode, in order.
    pub fn instructions(&self) -> Result<Vec<CompactInstruction>, Error> {
        let mut r = ByteReader::new(&self.bytes);
        let mut out = Vec::new();
        while r.remaining() > 0 {
            out.push(CompactInstruction::decode_from(&mut r)?);
        }
        Ok(out)
    }
}

/// A function's full code body: its ordered basic blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEntry {
    /// The function this code belongs to.
    pub func_index: u32,
    /// Basic blocks, in declaration order.
    pub blocks: Vec<BlockRecord>,
}

pub(crate) fn encode(entries: &[CodeEntry]) -> Vec<u8> {
    let mut buf = GrowableBuffer::new();
    buf.write_u32(entries.len() as u32);
    for e in entries {
        buf.write_u32(e.func_index);
        buf.write_u32(e.blocks.len() as u32);
        for b in &e.blocks {
            buf.write_string(&b.name);
            buf.write_u32(b.bytes.len() as u32);
            buf.append(&b.bytes);
        }
    }
    buf.into_vec()
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<CodeEntry>, Error> {
    let mut r = ByteReader::new(bytes);
    let func_count = r.read_u32()?;
    let mut out = Vec::with_capacity(func_count as usize);
    for _ in 0..func_count {
        let func_index = r.read_u32()?;
        let block_count = r.read_u32()?;
        let mut blocks = Vec::with_capacity(block_count as usize);
        for _ in 0..block_count {
            let name = r.read_string()?.to_string();
            let code_size = r.read_u32()? as usize;
            let code_bytes = r.read_bytes(code_size)?.to_vec();
            blocks.push(BlockRecord {
                name,
                bytes: code_bytes,
            });
        }
        out.push(CodeEntry { func_index, blocks });
    }
    Ok(out)
}

pub(crate) fn write_instruction(buf: &mut GrowableBuffer, instr: &CompactInstruction) {
    instr.encode_into(buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_round_trips_through_a_block() {
        let instr = CompactInstruction {
            opcode: 0x01,
            flags: 0,
            dest: 3,
            operands: vec![1, 2],
        };
        let mut buf = GrowableBuffer::new();
        write_instruction(&mut buf, &instr);
        let block = BlockRecord {
            name: "entry".to_string(),
            bytes: buf.into_vec(),
        };
        let decoded = block.instructions().unwrap();
        assert_eq!(decoded, vec![instr]);
    }
}
