//! Type section records (`SPEC_FULL.md` §3.3, §4.B `addType`/`addStructType`).

use coil_types::bytes::{ByteReader, GrowableBuffer};

use crate::Error;

/// One entry in the Type section: a packed [`coil_asm::TypeEncoding`]
/// plus an optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    /// The raw packed type descriptor.
    pub encoding: u32,
    /// The name passed to `addType`/`addStructType`, if any.
    pub name: Option<String>,
}

/// The field-type list for a struct type, keyed by the type index the
/// basic [`TypeRecord`] was allocated at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructFields {
    /// The struct's own type index.
    pub type_index: u32,
    /// Field type indices, in declaration order.
    pub field_types: Vec<u32>,
}

pub(crate) fn encode(types: &[TypeRecord], structs: &[StructFields]) -> Vec<u8> {
    let mut buf = GrowableBuffer::new();
    buf.write_u32(types.len() as u32);
    for t in types {
        buf.write_u32(t.encoding);
        buf.write_string(t.name.as_deref().unwrap_or(""));
    }
    buf.write_u32(structs.len() as u32);
    for s in structs {
        buf.write_u32(s.type_index);
        buf.write_u32(s.field_types.len() as u32);
        for ft in &s.field_types {
            buf.write_u32(*ft);
        }
    }
    buf.into_vec()
}

pub(crate) fn decode(bytes: &[u8]) -> Result<(Vec<TypeRecord>, Vec<StructFields>), Error> {
    let mut r = ByteReader::new(bytes);
    let type_count = r.read_u32()?;
    let mut types = Vec::with_capacity(type_count as usize);
    for _ in 0..type_count {
        let encoding = r.read_u32()?;
        let name = r.read_string()?;
        let name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        types.push(TypeRecord { encoding, name });
    }
    let struct_count = r.read_u32()?;
    let mut structs = Vec::with_capacity(struct_count as usize);
    for _ in 0..struct_count {
        let type_index = r.read_u32()?;
        let field_count = r.read_u32()?;
        let mut field_types = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            field_types.push(r.read_u32()?);
        }
        structs.push(StructFields {
            type_index,
            field_types,
        });
    }
    Ok((types, structs))
}
