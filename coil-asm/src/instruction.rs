//! The streaming VM instruction record (component C, `SPEC_FULL.md` §3.4).
//!
//! A fixed 17-byte, marker-framed record. The marker bytes at fixed
//! offsets are a redundancy check, not a resync point: a reader that
//! sees a mismatched marker rejects the record outright.

use coil_types::bytes::{ByteReader, GrowableBuffer};

use crate::DecodeError;
use crate::WideOpcode;

const START_MARKER: u8 = 0xC0;
const TYPE_MARKER: u8 = 0xC3;
const VAR_MARKER: u8 = 0xC1;
const IMM_MARKER: u8 = 0xC2;
const END_MARKER: u8 = 0xCF;

/// On-wire size of one streaming instruction record, in bytes.
pub const INSTRUCTION_SIZE: usize = 17;

/// One decoded streaming instruction record.
///
/// Field names and widths match `SPEC_FULL.md` §3.4 exactly; this is
/// the type the VM executor (component K) dispatches on and the
/// debugger (component L) displays one-at-a-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: WideOpcode,
    /// The memory type tag governing operand width/signedness.
    pub mem_type: u8,
    /// A static-memory or stack address operand.
    pub var_address: u16,
    /// A 64-bit immediate, often packing several sub-fields (see the
    /// per-opcode semantics in `SPEC_FULL.md` §4.K).
    pub imm_value: u64,
}

impl Instruction {
    /// Build an instruction record from its raw fields.
    pub const fn new(opcode: WideOpcode, mem_type: u8, var_address: u16, imm_value: u64) -> Self {
        Self {
            opcode,
            mem_type,
            var_address,
            imm_value,
        }
    }

    /// Encode this record as the fixed 17-byte streaming wire form.
    pub fn encode(&self) -> [u8; INSTRUCTION_SIZE] {
        let mut buf = GrowableBuffer::new();
        buf.write_u8(START_MARKER);
        buf.write_u16(self.opcode.as_u16());
        buf.write_u8(TYPE_MARKER);
        buf.write_u8(self.mem_type);
        buf.write_u8(VAR_MARKER);
        buf.write_u16(self.var_address);
        buf.write_u8(IMM_MARKER);
        buf.write_u64(self.imm_value);
        buf.write_u8(END_MARKER);
        let bytes = buf.into_vec();
        debug_assert_eq!(bytes.len(), INSTRUCTION_SIZE);
        let mut out = [0u8; INSTRUCTION_SIZE];
        out.copy_from_slice(&bytes);
        out
    }

    /// Decode one record from `buf`, or `Ok(None)` on a clean end of
    /// stream (zero bytes remaining before the start marker).
    ///
    /// A short read that begins mid-record, or any mismatched marker
    /// byte, is an `Err` — the spec calls for fail-fast rejection, not
    /// resync.
    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, DecodeError> {
        if buf.is_empty() {
            return Ok(None);
        }
        let mut r = ByteReader::new(buf);
        expect_marker(&mut r, 0, START_MARKER)?;
        let raw_opcode = r.read_u16().map_err(DecodeError::ShortRead)?;
        let opcode = WideOpcode::try_from_u16(raw_opcode)?;
        expect_marker(&mut r, 3, TYPE_MARKER)?;
        let mem_type = r.read_u8().map_err(DecodeError::ShortRead)?;
        expect_marker(&mut r, 5, VAR_MARKER)?;
        let var_address = r.read_u16().map_err(DecodeError::ShortRead)?;
        expect_marker(&mut r, 8, IMM_MARKER)?;
        let imm_value = r.read_u64().map_err(DecodeError::ShortRead)?;
        expect_marker(&mut r, 16, END_MARKER)?;
        let instr = Self {
            opcode,
            mem_type,
            var_address,
            imm_value,
        };
        Ok(Some((instr, INSTRUCTION_SIZE)))
    }
}

fn expect_marker(r: &mut ByteReader<'_>, offset: usize, expected: u8) -> Result<(), DecodeError> {
    let found = r.read_u8().map_err(DecodeError::ShortRead)?;
    if found != expected {
        return Err(DecodeError::BadMarker {
            offset,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bit_for_bit() {
        let instr = Instruction::new(WideOpcode::Add, 0x08, 0x0000, (10u64 << 32) | 18);
        let bytes = instr.encode();
        let (decoded, consumed) = Instruction::decode(&bytes).unwrap().unwrap();
        assert_eq!(consumed, INSTRUCTION_SIZE);
        assert_eq!(decoded, instr);
    }

    #[test]
    fn empty_buffer_is_clean_eof() {
        assert!(Instruction::decode(&[]).unwrap().is_none());
    }

    #[test]
    fn altered_marker_byte_is_rejected() {
        let instr = Instruction::new(WideOpcode::Jmp, 0, 0, 0);
        let mut bytes = instr.encode();
        bytes[0] = 0x00;
        let err = Instruction::decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::BadMarker { offset: 0, .. }));
    }

    #[test]
    fn short_read_mid_record_is_an_error() {
        let instr = Instruction::new(WideOpcode::Ret, 0, 0, 0);
        let bytes = instr.encode();
        let err = Instruction::decode(&bytes[..5]).unwrap_err();
        assert!(matches!(err, DecodeError::ShortRead(_)));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut bytes = Instruction::new(WideOpcode::Add, 0, 0, 0).encode();
        bytes[1] = 0xAB;
        bytes[2] = 0xCD;
        let err = Instruction::decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownOpcode(_)));
    }
}
