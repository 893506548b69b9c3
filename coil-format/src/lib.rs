//! The sectioned COIL module image: header, section table, and the
//! stateful builder that assembles one (component B, `SPEC_FULL.md`
//! §3.3, §4.B).
//!
//! This crate owns the *compact* on-disk format the code generator
//! writes. The streaming format the VM reads lives in `coil-asm`; see
//! `SPEC_FULL.md` §9 for why the two don't share a codec.

mod builder;
mod error;
pub mod header;
mod reader;
pub mod sections;

pub use builder::{ModuleBuilder, GENERIC_PTR_TYPE_INDEX};
pub use error::Error;
pub use header::{ModuleHeader, SectionHeader, SectionType, ALL_SECTIONS, MAGIC, SECTION_COUNT, VERSION};
pub use reader::{all_section_kinds, sections_are_aligned, ModuleImage};
