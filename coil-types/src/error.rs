use std::io;

/// I/O and framing failures from the byte codec (component A).
///
/// Every higher-level error enum in this workspace (`hoil_syntax::Error`,
/// `coil_format::Error`, `coil_vm::Error`, ...) wraps this variant rather
/// than re-deriving its own I/O arm.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The underlying reader/writer failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Fewer bytes were available than the scalar or record being decoded
    /// requires.
    #[error("short read: needed {needed} bytes, had {available}")]
    ShortRead {
        /// Bytes required to decode the value.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },
}
