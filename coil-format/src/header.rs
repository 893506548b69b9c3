//! The 16-byte module header and 12-byte-per-entry section table
//! (`SPEC_FULL.md` §3.3).

use coil_types::bytes::{ByteReader, GrowableBuffer};

use crate::Error;

/// The four ASCII bytes `C`, `O`, `I`, `L`, read as one big-endian `u32`.
///
/// Unlike every other scalar in the module image, the magic is written
/// to disk as its literal ASCII bytes in order, not as a
/// little-endian-encoded integer — this is what makes `coil_dump`'s raw
/// hex output read as the word "COIL" rather than its byte-reversal.
pub const MAGIC: u32 = 0x434F_494C;

/// Current on-disk format version: major 1, minor 0.
pub const VERSION: u32 = 0x0001_0000;

/// Every module carries exactly these section kinds, in this order,
/// whether or not a given section ends up empty.
pub const SECTION_COUNT: u32 = 7;

/// A section's role inside a module image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum SectionType {
    /// Type table: predefined entries plus any `addType`/`addStructType`.
    Type = 0,
    /// Function signatures and externs.
    Function = 1,
    /// Mutable global storage.
    Global = 2,
    /// Compile-time constant values.
    Constant = 3,
    /// Per-function basic-block code.
    Code = 4,
    /// Reserved for a future linker; always empty in this toolchain
    /// (no dynamic linking — see `SPEC_FULL.md` §1 Non-goals).
    Relocation = 5,
    /// Free-form builder/toolchain metadata.
    Metadata = 6,
}

/// All seven section kinds, in the fixed order they appear in every
/// module's section table.
pub const ALL_SECTIONS: [SectionType; 7] = [
    SectionType::Type,
    SectionType::Function,
    SectionType::Global,
    SectionType::Constant,
    SectionType::Code,
    SectionType::Relocation,
    SectionType::Metadata,
];

impl SectionType {
    /// This section's fixed position in [`ALL_SECTIONS`] and in the
    /// on-disk section table.
    pub const fn index(self) -> usize {
        self as u32 as usize
    }
}

/// The module image's 16-byte leading header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleHeader {
    /// Always [`MAGIC`] for a header this toolchain produced.
    pub magic: u32,
    /// Always [`VERSION`] for a header this toolchain produced.
    pub version: u32,
    /// Always [`SECTION_COUNT`].
    pub section_count: u32,
    /// Builder-defined flags; unused by this toolchain, carried through
    /// unexamined.
    pub flags: u32,
}

impl ModuleHeader {
    /// On-disk size in bytes.
    pub const SIZE: usize = 16;

    /// A fresh header for a module this builder is about to emit.
    pub const fn new(flags: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            section_count: SECTION_COUNT,
            flags,
        }
    }

    /// Write the header to `buf`.
    pub fn write(&self, buf: &mut GrowableBuffer) {
        buf.append(&self.magic.to_be_bytes());
        buf.write_u32(self.version);
        buf.write_u32(self.section_count);
        buf.write_u32(self.flags);
    }

    /// Parse a header, validating the magic bytes.
    ///
    /// An unrecognized `version` is *not* rejected here — the caller
    /// decides whether to proceed, matching the spec's silence on
    /// forward-compatibility policy.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, Error> {
        let magic_bytes = r.read_bytes(4)?;
        let magic = u32::from_be_bytes(magic_bytes.try_into().expect("read_bytes(4)"));
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = r.read_u32()?;
        let section_count = r.read_u32()?;
        let flags = r.read_u32()?;
        Ok(Self {
            magic,
            version,
            section_count,
            flags,
        })
    }
}

/// One 12-byte entry in the section table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Raw section-type tag; see [`SectionType`].
    pub section_type: u32,
    /// Byte offset of the section payload from the start of the file.
    pub offset: u32,
    /// Payload size in bytes (before 4-byte alignment padding).
    pub size: u32,
}

impl SectionHeader {
    /// On-disk size in bytes.
    pub const SIZE: usize = 12;

    /// Write the entry to `buf`.
    pub fn write(&self, buf: &mut GrowableBuffer) {
        buf.write_u32(self.section_type);
        buf.write_u32(self.offset);
        buf.write_u32(self.size);
    }

    /// Parse one section-table entry.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(Self {
            section_type: r.read_u32()?,
            offset: r.read_u32()?,
            size: r.read_u32()?,
        })
    }

    /// This entry's [`SectionType`], or an error if the tag is unknown.
    pub fn kind(&self) -> Result<SectionType, Error> {
        SectionType::from_repr(self.section_type).ok_or(Error::UnknownSectionType(self.section_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coil_types::bytes::ByteReader;

    #[test]
    fn header_round_trips() {
        let header = ModuleHeader::new(0);
        let mut buf = GrowableBuffer::new();
        header.write(&mut buf);
        let bytes = buf.into_vec();
        assert_eq!(&bytes[0..4], b"COIL");
        let mut r = ByteReader::new(&bytes);
        let back = ModuleHeader::read(&mut r).unwrap();
        assert_eq!(back, header);
        assert_eq!(back.version, VERSION);
        assert_eq!(back.section_count, SECTION_COUNT);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buf = GrowableBuffer::new();
        buf.append(b"XXXX");
        buf.write_u32(VERSION);
        buf.write_u32(SECTION_COUNT);
        buf.write_u32(0);
        let bytes = buf.into_vec();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            ModuleHeader::read(&mut r),
            Err(Error::BadMagic(_))
        ));
    }
}
