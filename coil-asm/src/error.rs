use coil_types::IoError;

/// Failure decoding a streaming [`crate::Instruction`] record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not enough bytes remained to read a full 17-byte record.
    #[error(transparent)]
    ShortRead(#[from] IoError),
    /// A marker byte at a fixed offset didn't match the expected value.
    ///
    /// The spec treats this as a fail-fast signal: no resync is
    /// attempted, the record is simply rejected.
    #[error("bad marker byte {found:#04x} at offset {offset}, expected {expected:#04x}")]
    BadMarker {
        /// Byte offset within the record.
        offset: usize,
        /// The marker value that should have been there.
        expected: u8,
        /// The byte that was actually read.
        found: u8,
    },
    /// The opcode field did not correspond to any known wide opcode.
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),
}
