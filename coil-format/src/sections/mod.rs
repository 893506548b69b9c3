//! Per-section-type record types and their byte encodings.
//!
//! Each submodule owns the payload format for exactly one
//! [`crate::header::SectionType`]; [`crate::builder::ModuleBuilder`]
//! and [`crate::reader::ModuleImage`] are the only callers.

pub mod code;
pub mod functions;
pub mod globals;
pub mod types;

pub use code::{BlockRecord, CodeEntry, CompactInstruction};
pub use functions::FunctionRecord;
pub use globals::GlobalRecord;
pub use types::{StructFields, TypeRecord};
