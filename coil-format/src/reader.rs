//! Read-back of a COIL module image, used by `coil_dump` and by
//! `hoil2stream`'s compact-to-streaming translator.

use coil_types::bytes::{align4, ByteReader};

use crate::header::{ModuleHeader, SectionHeader, SectionType, ALL_SECTIONS};
use crate::sections::{self, CodeEntry, FunctionRecord, GlobalRecord, StructFields, TypeRecord};
use crate::Error;

/// A parsed module image: the header, section table, and a borrow of
/// the original bytes to decode payloads from on demand.
pub struct ModuleImage<'a> {
    header: ModuleHeader,
    section_headers: Vec<SectionHeader>,
    bytes: &'a [u8],
}

impl<'a> ModuleImage<'a> {
    /// Parse the header and section table from `bytes`. Section
    /// payloads are decoded lazily by the typed accessors below.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        let mut r = ByteReader::new(bytes);
        let header = ModuleHeader::read(&mut r)?;
        let mut section_headers = Vec::with_capacity(header.section_count as usize);
        for _ in 0..header.section_count {
            section_headers.push(SectionHeader::read(&mut r)?);
        }
        Ok(Self {
            header,
            section_headers,
            bytes,
        })
    }

    /// The module header.
    pub fn header(&self) -> ModuleHeader {
        self.header
    }

    /// The section table, in on-disk order.
    pub fn section_headers(&self) -> &[SectionHeader] {
        &self.section_headers
    }

    fn payload(&self, kind: SectionType) -> Result<&'a [u8], Error> {
        let sh = self
            .section_headers
            .iter()
            .find(|sh| sh.kind().ok() == Some(kind))
            .ok_or(Error::MissingSection(kind))?;
        let start = sh.offset as usize;
        let end = start + sh.size as usize;
        self.bytes.get(start..end).ok_or(Error::MissingSection(kind))
    }

    /// Decode the Type section's basic entries and struct field lists.
    pub fn types(&self) -> Result<(Vec<TypeRecord>, Vec<StructFields>), Error> {
        sections::types::decode(self.payload(SectionType::Type)?)
    }

    /// Decode the Function section.
    pub fn functions(&self) -> Result<Vec<FunctionRecord>, Error> {
        sections::functions::decode(self.payload(SectionType::Function)?)
    }

    /// Decode the Global section.
    pub fn globals(&self) -> Result<Vec<GlobalRecord>, Error> {
        sections::globals::decode(self.payload(SectionType::Global)?)
    }

    /// Decode the Code section.
    pub fn code(&self) -> Result<Vec<CodeEntry>, Error> {
        sections::code::decode(self.payload(SectionType::Code)?)
    }

    /// Decode the module name out of the Metadata section.
    pub fn module_name(&self) -> Result<&'a str, Error> {
        let mut r = ByteReader::new(self.payload(SectionType::Metadata)?);
        Ok(r.read_string()?)
    }
}

/// `true` if every section's declared offset is a multiple of 4, as
/// the builder always produces (`SPEC_FULL.md` §8, property 4).
pub fn sections_are_aligned(image: &ModuleImage<'_>) -> bool {
    image
        .section_headers()
        .iter()
        .all(|sh| sh.offset as usize == align4(sh.offset as usize))
}

/// All seven section kinds a well-formed image carries, for callers
/// (like `coil_dump`) that want to print a table regardless of which
/// sections are populated.
pub fn all_section_kinds() -> &'static [SectionType] {
    &ALL_SECTIONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModuleBuilder;

    #[test]
    fn round_trips_module_name_and_functions() {
        let mut b = ModuleBuilder::new();
        b.set_module_name("demo");
        b.add_function("main", 0, &[], false).unwrap();
        let bytes = b.build();
        let image = ModuleImage::parse(&bytes).unwrap();
        assert_eq!(image.module_name().unwrap(), "demo");
        assert_eq!(image.functions().unwrap().len(), 1);
        assert!(sections_are_aligned(&image));
    }
}
