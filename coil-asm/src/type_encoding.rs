/// The category tag packed into the top 4 bits of a [`TypeEncoding`].
///
/// Ordering matches the AST `Type` tags in `SPEC_FULL.md` §3.1 so that a
/// category value can be read off directly from the front-end's type
/// representation during code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TypeCategory {
    /// `Void`
    Void = 0,
    /// `Bool`
    Bool = 1,
    /// `Int { bits, signed }`
    Int = 2,
    /// `Float { bits }`
    Float = 3,
    /// `Ptr { elem }`
    Ptr = 4,
    /// `Vec { elem, size }`
    Vec = 5,
    /// `Array { elem, size }`
    Array = 6,
    /// `Struct { fields }`
    Struct = 7,
    /// `Function { params, ret, variadic }`
    Function = 8,
}

/// Bit set in `qualifiers` when an [`TypeCategory::Int`] is unsigned.
pub const QUAL_UNSIGNED: u8 = 0b0000_0001;

/// A packed `u32` type descriptor: `[category:4][width:8][qualifiers:8][attributes:12]`.
///
/// `width` carries the bit width for `Int`/`Float`, is `64` for `Ptr`
/// (pointers are always word-sized at runtime), and is otherwise `0`.
/// `attributes` carries the element count for `Vec`/`Array` and the
/// field count for `Struct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeEncoding(u32);

impl TypeEncoding {
    /// Pack the four fields into one `u32`.
    pub const fn new(category: TypeCategory, width: u8, qualifiers: u8, attributes: u16) -> Self {
        let attributes = attributes & 0x0FFF;
        let packed = ((category as u32) << 28)
            | ((width as u32) << 20)
            | ((qualifiers as u32) << 12)
            | attributes as u32;
        Self(packed)
    }

    /// The raw packed `u32`, as stored in a module's Type section.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Reinterpret an already-packed `u32` (e.g. read back from a module
    /// image) as a `TypeEncoding`.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The type category.
    pub fn category(self) -> Option<TypeCategory> {
        TypeCategory::from_repr(((self.0 >> 28) & 0xF) as u8)
    }

    /// The bit width field.
    pub const fn width(self) -> u8 {
        ((self.0 >> 20) & 0xFF) as u8
    }

    /// The qualifiers field.
    pub const fn qualifiers(self) -> u8 {
        ((self.0 >> 12) & 0xFF) as u8
    }

    /// The attributes field (size/field count).
    pub const fn attributes(self) -> u16 {
        (self.0 & 0x0FFF) as u16
    }

    /// `true` if `QUAL_UNSIGNED` is set.
    pub const fn is_unsigned(self) -> bool {
        self.qualifiers() & QUAL_UNSIGNED != 0
    }
}

/// The 14 predefined types every module's Type section starts with, in
/// the fixed order the builder pre-populates them at construction.
///
/// Index into this table *is* the type index used everywhere else in
/// the module image: `0..=13`.
pub const PREDEFINED_TYPES: [TypeEncoding; 14] = [
    TypeEncoding::new(TypeCategory::Void, 0, 0, 0), // 0: void
    TypeEncoding::new(TypeCategory::Bool, 1, 0, 0), // 1: bool
    TypeEncoding::new(TypeCategory::Int, 8, 0, 0),  // 2: i8
    TypeEncoding::new(TypeCategory::Int, 16, 0, 0), // 3: i16
    TypeEncoding::new(TypeCategory::Int, 32, 0, 0), // 4: i32
    TypeEncoding::new(TypeCategory::Int, 64, 0, 0), // 5: i64
    TypeEncoding::new(TypeCategory::Int, 8, QUAL_UNSIGNED, 0), // 6: u8
    TypeEncoding::new(TypeCategory::Int, 16, QUAL_UNSIGNED, 0), // 7: u16
    TypeEncoding::new(TypeCategory::Int, 32, QUAL_UNSIGNED, 0), // 8: u32
    TypeEncoding::new(TypeCategory::Int, 64, QUAL_UNSIGNED, 0), // 9: u64
    TypeEncoding::new(TypeCategory::Float, 16, 0, 0), // 10: f16
    TypeEncoding::new(TypeCategory::Float, 32, 0, 0), // 11: f32
    TypeEncoding::new(TypeCategory::Float, 64, 0, 0), // 12: f64
    TypeEncoding::new(TypeCategory::Ptr, 64, 0, 0),  // 13: generic ptr
];

/// Type index of the predefined generic pointer, the `Ptr{elem:Void}`
/// code generation falls back to when no more specific pointee is known.
pub const GENERIC_PTR_TYPE_INDEX: u32 = 13;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_table_has_fourteen_entries_in_order() {
        assert_eq!(PREDEFINED_TYPES.len(), 14);
        assert_eq!(PREDEFINED_TYPES[0].category(), Some(TypeCategory::Void));
        assert_eq!(PREDEFINED_TYPES[5].category(), Some(TypeCategory::Int));
        assert_eq!(PREDEFINED_TYPES[5].width(), 64);
        assert!(!PREDEFINED_TYPES[5].is_unsigned());
        assert_eq!(PREDEFINED_TYPES[9].width(), 64);
        assert!(PREDEFINED_TYPES[9].is_unsigned());
        assert_eq!(PREDEFINED_TYPES[13].category(), Some(TypeCategory::Ptr));
    }

    #[test]
    fn pack_unpack_round_trips() {
        let t = TypeEncoding::new(TypeCategory::Struct, 0, 0, 7);
        let raw = t.raw();
        let back = TypeEncoding::from_raw(raw);
        assert_eq!(back.category(), Some(TypeCategory::Struct));
        assert_eq!(back.attributes(), 7);
    }

    #[test]
    fn attributes_field_is_masked_to_twelve_bits() {
        let t = TypeEncoding::new(TypeCategory::Vec, 32, 0, 0xFFFF);
        assert_eq!(t.attributes(), 0x0FFF);
    }
}
