//! Primitive types and the little-endian byte codec shared by every
//! crate in the HOIL/COIL toolchain.
//!
//! This crate plays the same role `fuel-types` plays for the FuelVM
//! workspace: it is the lowest leaf in the dependency graph, so it
//! carries no knowledge of HOIL syntax, COIL sections, or VM opcodes —
//! only the scalar types and byte-level helpers everything else is
//! built from.

mod error;

pub mod bytes;

pub use error::IoError;

/// A machine word as the VM and builder see it: 64 bits, used for
/// immediates, memory offsets promoted to full width, and stack
/// slots.
pub type Word = u64;

/// An 8-bit operand register index. `0xFF` is reserved to mean "no
/// destination" (see [`NO_REGISTER`]).
pub type RegisterId = u8;

/// Sentinel register id meaning "this instruction writes nothing".
pub const NO_REGISTER: RegisterId = 0xFF;

/// A 16-bit address into the VM's static memory or stack arenas.
pub type Addr = u16;
