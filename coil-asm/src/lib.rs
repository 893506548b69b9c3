//! Instruction encodings for the COIL toolchain.
//!
//! Two independent wire formats live in this crate, mirroring the two
//! opcode tables the specification keeps apart (see `DESIGN.md`, open
//! question 1):
//!
//! - The **streaming** encoding ([`Instruction`]): a fixed 17-byte,
//!   marker-framed record read one at a time by the VM and the
//!   debugger off of a byte stream.
//! - The **compact** encoding ([`CompactOpcode`]): the 4-byte-header
//!   instruction the code generator emits into a module's Code
//!   section.
//!
//! Also defined here: [`MemType`], the per-instruction memory type tag
//! carried by the streaming record, and [`TypeEncoding`], the packed
//! `u32` type descriptor used by the module builder's Type section.

mod error;
mod instruction;
mod mem_type;
mod opcode;
mod type_encoding;

pub use error::DecodeError;
pub use instruction::Instruction;
pub use mem_type::MemType;
pub use opcode::{CompactOpcode, WideOpcode};
pub use type_encoding::{TypeCategory, TypeEncoding, PREDEFINED_TYPES};
