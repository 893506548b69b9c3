use coil_types::IoError;

use crate::header::SectionType;

/// Failures building or reading a COIL module image (component B).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read/write/allocation failure in the underlying byte codec.
    #[error(transparent)]
    Io(#[from] IoError),
    /// The header's magic bytes were not `COIL`.
    #[error("bad module magic: {0:#010x}")]
    BadMagic(u32),
    /// The header named a version this toolchain doesn't understand.
    #[error("unsupported module version: {0:#010x}")]
    UnsupportedVersion(u32),
    /// A raw section-type value in the section table matched no known
    /// [`SectionType`].
    #[error("unknown section type {0}")]
    UnknownSectionType(u32),
    /// `beginFunctionCode` was called while code-building mode was
    /// already active for another function.
    #[error("beginFunctionCode called while function {0} is still open")]
    NestedFunctionCode(u32),
    /// `addBlock`/`addInstruction`/`endFunctionCode` was called before
    /// `beginFunctionCode`.
    #[error("no function code in progress")]
    NoActiveFunctionCode,
    /// A type index named by `addStructType` or a function/global
    /// signature did not exist.
    #[error("type index {0} out of range")]
    BadTypeIndex(u32),
    /// `endFunctionCode` was called for a function index that was
    /// never opened by `beginFunctionCode`.
    #[error("function index {0} out of range")]
    BadFunctionIndex(u32),
    /// A section grew past what a `u32` offset/size pair can address.
    #[error("section {0:?} exceeds the maximum representable size")]
    SectionTooLarge(SectionType),
    /// A section's declared `offset`/`size` ran past the end of the
    /// buffer being parsed, or named a section type this module image
    /// doesn't carry.
    #[error("section {0:?} missing or truncated")]
    MissingSection(SectionType),
}
