//! Global section records (`SPEC_FULL.md` §3.3, §4.B `addGlobal`).

use coil_types::bytes::{ByteReader, GrowableBuffer};

use crate::Error;

/// One entry in the Global section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRecord {
    /// This global's index, matching its position among `addGlobal`
    /// calls.
    pub index: u32,
    /// The global's name.
    pub name: String,
    /// Type index into the Type section.
    pub ty: u32,
    /// Initializer bytes, empty if the global has no initializer.
    pub init_bytes: Vec<u8>,
}

pub(crate) fn encode(globals: &[GlobalRecord]) -> Vec<u8> {
    let mut buf = GrowableBuffer::new();
    buf.write_u32(globals.len() as u32);
    for g in globals {
        buf.write_u32(g.index);
        buf.write_string(&g.name);
        buf.write_u32(g.ty);
        buf.write_u32(g.init_bytes.len() as u32);
        buf.append(&g.init_bytes);
    }
    buf.into_vec()
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<GlobalRecord>, Error> {
    let mut r = ByteReader::new(bytes);
    let count = r.read_u32()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = r.read_u32()?;
        let name = r.read_string()?.to_string();
        let ty = r.read_u32()?;
        let init_size = r.read_u32()? as usize;
        let init_bytes = r.read_bytes(init_size)?.to_vec();
        out.push(GlobalRecord {
            index,
            name,
            ty,
            init_bytes,
        });
    }
    Ok(out)
}
