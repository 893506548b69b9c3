//! The stateful COIL module assembler (component B, `SPEC_FULL.md` §4.B).

use coil_types::bytes::{align4, GrowableBuffer};

use crate::header::{ModuleHeader, SectionHeader, ALL_SECTIONS};
use crate::sections::code::{self, CompactInstruction};
use crate::sections::{functions, globals, types, BlockRecord, CodeEntry, FunctionRecord, GlobalRecord, StructFields, TypeRecord};
use crate::Error;

use coil_asm::{TypeEncoding, GENERIC_PTR_TYPE_INDEX as _GENERIC_PTR_TYPE_INDEX, PREDEFINED_TYPES};

/// Index of the predefined generic pointer type, re-exported for
/// callers that don't want to depend on `coil-asm` directly.
pub const GENERIC_PTR_TYPE_INDEX: u32 = _GENERIC_PTR_TYPE_INDEX;

struct CodeBuilderState {
    func_index: u32,
    blocks: Vec<BlockRecord>,
    current_block: Option<usize>,
}

/// Stateful assembler that produces one COIL module image.
///
/// Mirrors the interpreter's own builder pattern: every mutating call
/// returns `Result` rather than panicking, and the whole thing is
/// consumed exactly once by [`Self::build`].
pub struct ModuleBuilder {
    module_name: String,
    types: Vec<TypeRecord>,
    struct_fields: Vec<StructFields>,
    functions: Vec<FunctionRecord>,
    globals: Vec<GlobalRecord>,
    code: Vec<CodeEntry>,
    current_function: Option<CodeBuilderState>,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    /// A fresh builder with the 14 predefined types already populated
    /// at indices `0..=13`, matching `SPEC_FULL.md` §3.3.
    pub fn new() -> Self {
        let types = PREDEFINED_TYPES
            .iter()
            .map(|t| TypeRecord {
                encoding: t.raw(),
                name: None,
            })
            .collect();
        Self {
            module_name: String::new(),
            types,
            struct_fields: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            code: Vec::new(),
            current_function: None,
        }
    }

    /// Set the module's name. May be called more than once; the last
    /// call wins.
    pub fn set_module_name(&mut self, name: impl Into<String>) {
        self.module_name = name.into();
    }

    /// Append a type to the Type section, returning its index.
    pub fn add_type(&mut self, encoding: TypeEncoding, name: Option<&str>) -> Result<u32, Error> {
        let index = self.types.len() as u32;
        self.types.push(TypeRecord {
            encoding: encoding.raw(),
            name: name.map(str::to_string),
        });
        tracing::trace!(index, ?encoding, "addType");
        Ok(index)
    }

    /// Allocate a fresh type index for a struct with the given field
    /// types, and record the field-type list alongside it.
    pub fn add_struct_type(&mut self, field_types: &[u32], name: Option<&str>) -> Result<u32, Error> {
        for &ft in field_types {
            if ft as usize >= self.types.len() {
                return Err(Error::BadTypeIndex(ft));
            }
        }
        let encoding = TypeEncoding::new(
            coil_asm::TypeCategory::Struct,
            0,
            0,
            field_types.len() as u16,
        );
        let index = self.add_type(encoding, name)?;
        self.struct_fields.push(StructFields {
            type_index: index,
            field_types: field_types.to_vec(),
        });
        Ok(index)
    }

    /// Append a function or extern-function signature, returning its
    /// index.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        ret_type: u32,
        param_types: &[u32],
        external: bool,
    ) -> Result<u32, Error> {
        if ret_type as usize >= self.types.len() {
            return Err(Error::BadTypeIndex(ret_type));
        }
        for &pt in param_types {
            if pt as usize >= self.types.len() {
                return Err(Error::BadTypeIndex(pt));
            }
        }
        let index = self.functions.len() as u32;
        self.functions.push(FunctionRecord {
            index,
            name: name.into(),
            ret_type,
            param_types: param_types.to_vec(),
            is_external: external,
        });
        Ok(index)
    }

    /// Append a global, returning its index.
    pub fn add_global(
        &mut self,
        name: impl Into<String>,
        ty: u32,
        init_bytes: Option<&[u8]>,
    ) -> Result<u32, Error> {
        if ty as usize >= self.types.len() {
            return Err(Error::BadTypeIndex(ty));
        }
        let index = self.globals.len() as u32;
        self.globals.push(GlobalRecord {
            index,
            name: name.into(),
            ty,
            init_bytes: init_bytes.unwrap_or(&[]).to_vec(),
        });
        Ok(index)
    }

    /// Enter code-building mode for `func_index`. Must not be called
    /// again before a matching [`Self::end_function_code`].
    pub fn begin_function_code(&mut self, func_index: u32) -> Result<(), Error> {
        if let Some(existing) = &self.current_function {
            return Err(Error::NestedFunctionCode(existing.func_index));
        }
        if func_index as usize >= self.functions.len() {
            return Err(Error::BadFunctionIndex(func_index));
        }
        self.current_function = Some(CodeBuilderState {
            func_index,
            blocks: Vec::new(),
            current_block: None,
        });
        Ok(())
    }

    /// Start (or resume, if `name` already exists) a block within the
    /// function currently being built, returning its index.
    pub fn add_block(&mut self, name: impl Into<String>) -> Result<u32, Error> {
        let name = name.into();
        let state = self
            .current_function
            .as_mut()
            .ok_or(Error::NoActiveFunctionCode)?;
        if let Some(idx) = state.blocks.iter().position(|b| b.name == name) {
            state.current_block = Some(idx);
            return Ok(idx as u32);
        }
        state.blocks.push(BlockRecord {
            name,
            bytes: Vec::new(),
        });
        let idx = state.blocks.len() - 1;
        state.current_block = Some(idx);
        Ok(idx as u32)
    }

    /// Append one compact instruction to the current block of the
    /// function currently being built.
    pub fn add_instruction(
        &mut self,
        opcode: u8,
        flags: u8,
        dest: u8,
        operands: &[u8],
    ) -> Result<(), Error> {
        let state = self
            .current_function
            .as_mut()
            .ok_or(Error::NoActiveFunctionCode)?;
        let block_idx = state.current_block.ok_or(Error::NoActiveFunctionCode)?;
        let instr = CompactInstruction {
            opcode,
            flags,
            dest,
            operands: operands.to_vec(),
        };
        let mut buf = GrowableBuffer::new();
        code::write_instruction(&mut buf, &instr);
        state.blocks[block_idx].bytes.extend_from_slice(buf.as_slice());
        Ok(())
    }

    /// Flush the blocks built since the matching
    /// [`Self::begin_function_code`] into the Code section.
    pub fn end_function_code(&mut self) -> Result<(), Error> {
        let state = self
            .current_function
            .take()
            .ok_or(Error::NoActiveFunctionCode)?;
        self.code.push(CodeEntry {
            func_index: state.func_index,
            blocks: state.blocks,
        });
        Ok(())
    }

    /// Serialize the whole module: header, section table, then every
    /// section payload padded to a 4-byte boundary.
    pub fn build(self) -> Vec<u8> {
        tracing::debug!(
            types = self.types.len(),
            functions = self.functions.len(),
            globals = self.globals.len(),
            code = self.code.len(),
            "build"
        );
        let mut metadata = GrowableBuffer::new();
        metadata.write_string(&self.module_name);

        let payloads: [Vec<u8>; 7] = [
            types::encode(&self.types, &self.struct_fields),
            functions::encode(&self.functions),
            globals::encode(&self.globals),
            Vec::new(), // Constant: HOIL `CONSTANT` declarations are inlined by
            // the code generator rather than materialized as storage
            // (see SPEC_FULL.md §4.I); the section is always present
            // but always empty in this toolchain.
            code::encode(&self.code),
            Vec::new(), // Relocation: unused, no dynamic linking (Non-goals).
            metadata.into_vec(),
        ];

        let header = ModuleHeader::new(0);
        let mut running = (ModuleHeader::SIZE + SectionHeader::SIZE * ALL_SECTIONS.len()) as u32;
        let mut section_headers = Vec::with_capacity(ALL_SECTIONS.len());
        for (section, payload) in ALL_SECTIONS.iter().zip(&payloads) {
            let offset = running;
            let size = payload.len() as u32;
            section_headers.push(SectionHeader {
                section_type: *section as u32,
                offset,
                size,
            });
            running += align4(payload.len()) as u32;
        }

        let mut out = GrowableBuffer::new();
        header.write(&mut out);
        for sh in &section_headers {
            sh.write(&mut out);
        }
        for payload in &payloads {
            out.append(payload);
            out.pad_to(4);
        }
        out.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{MAGIC, SECTION_COUNT, VERSION};

    #[test]
    fn minimal_module_matches_scenario_one_header_bytes() {
        let mut b = ModuleBuilder::new();
        b.set_module_name("m");
        let void = 0u32;
        let f = b.add_function("f", void, &[], false).unwrap();
        b.begin_function_code(f).unwrap();
        b.add_block("ENTRY").unwrap();
        b.add_instruction(coil_asm::CompactOpcode::Ret.as_u8(), 0, coil_types::NO_REGISTER, &[])
            .unwrap();
        b.end_function_code().unwrap();
        let bytes = b.build();

        assert_eq!(
            &bytes[0..12],
            &[0x43, 0x4F, 0x49, 0x4C, 0x00, 0x00, 0x01, 0x00, 0x07, 0x00, 0x00, 0x00]
        );
        assert_eq!(u32::from_be_bytes(bytes[0..4].try_into().unwrap()), MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), VERSION);
        assert_eq!(
            u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            SECTION_COUNT
        );

        let image = crate::reader::ModuleImage::parse(&bytes).unwrap();
        let funcs = image.functions().unwrap();
        assert_eq!(funcs.len(), 1);
        assert!(!funcs[0].is_external);
        for sh in image.section_headers() {
            assert_eq!(sh.offset % 4, 0);
        }
    }

    #[test]
    fn nested_begin_function_code_is_an_error() {
        let mut b = ModuleBuilder::new();
        let f = b.add_function("f", 0, &[], false).unwrap();
        b.begin_function_code(f).unwrap();
        assert!(matches!(
            b.begin_function_code(f),
            Err(Error::NestedFunctionCode(_))
        ));
    }

    #[test]
    fn add_block_before_begin_function_code_is_an_error() {
        let mut b = ModuleBuilder::new();
        assert!(matches!(
            b.add_block("x"),
            Err(Error::NoActiveFunctionCode)
        ));
    }

    #[test]
    fn add_block_is_idempotent_on_existing_name() {
        let mut b = ModuleBuilder::new();
        let f = b.add_function("f", 0, &[], false).unwrap();
        b.begin_function_code(f).unwrap();
        let a = b.add_block("loop").unwrap();
        b.add_instruction(0x01, 0, 0, &[]).unwrap();
        let a2 = b.add_block("loop").unwrap();
        assert_eq!(a, a2);
    }

    #[test]
    fn struct_type_records_field_list() {
        let mut b = ModuleBuilder::new();
        let i32_ty = 4u32;
        let idx = b.add_struct_type(&[i32_ty, i32_ty], Some("Point")).unwrap();
        assert_eq!(idx, 14); // first index after the 14 predefined types
        assert_eq!(b.struct_fields[0].field_types, vec![i32_ty, i32_ty]);
    }
}
