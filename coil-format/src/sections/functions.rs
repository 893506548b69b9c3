//! Function section records (`SPEC_FULL.md` §3.3, §4.B `addFunction`).

use coil_types::bytes::{ByteReader, GrowableBuffer};

use crate::Error;

/// One entry in the Function section: a signature for a defined or
/// external function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    /// This function's index, matching its position among `addFunction`
    /// calls.
    pub index: u32,
    /// The function's name.
    pub name: String,
    /// Return type index into the Type section.
    pub ret_type: u32,
    /// Parameter type indices, in declaration order.
    pub param_types: Vec<u32>,
    /// `true` for `EXTERN FUNCTION` declarations.
    pub is_external: bool,
}

pub(crate) fn encode(functions: &[FunctionRecord]) -> Vec<u8> {
    let mut buf = GrowableBuffer::new();
    buf.write_u32(functions.len() as u32);
    for f in functions {
        buf.write_u32(f.index);
        buf.write_string(&f.name);
        buf.write_u32(f.ret_type);
        buf.write_u32(f.param_types.len() as u32);
        for p in &f.param_types {
            buf.write_u32(*p);
        }
        buf.write_u32(f.is_external as u32);
    }
    buf.into_vec()
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<FunctionRecord>, Error> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_u32()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = r.read_u32()?;
        let name = r.read_string()?.to_string();
        let ret_type = r.read_u32()?;
        let param_count = r.read_u32()?;
        let mut param_types = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            param_types.push(r.read_u32()?);
        }
        let is_external = r.read_u32()? != 0;
        out.push(FunctionRecord {
            index,
            name,
            ret_type,
            param_types,
            is_external,
        });
    }
    Ok(out)
}
