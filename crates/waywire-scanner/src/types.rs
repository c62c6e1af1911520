use std::collections::BTreeMap;

use crate::model::WireType;

/// How one wire type appears in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Type of struct fields and method parameters.
    pub storage: String,
    /// Suffix of the `Message::read_*` / `write_*` pair that encodes it.
    pub codec: String,
}

/// Immutable wire-type → generated-type mapping handed to the generator.
///
/// Each generation run gets its own table; there is no global registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    entries: BTreeMap<WireType, TypeMapping>,
}

impl TypeTable {
    /// A table with no mappings.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The mapping used by the bundled Rust template.
    pub fn rust() -> Self {
        Self::empty()
            .with(WireType::NewId, "ObjectId", "object_id")
            .with(WireType::Object, "ObjectId", "object_id")
            .with(WireType::Uint, "u32", "uint")
            .with(WireType::String, "String", "string")
            .with(WireType::Int, "i32", "int")
            .with(WireType::Fd, "RawFd", "fd")
            .with(WireType::Fixed, "Fixed", "fixed")
            .with(WireType::Array, "Vec<u8>", "array")
    }

    /// Return a copy with `ty` mapped to `storage` / `codec`.
    #[must_use]
    pub fn with(mut self, ty: WireType, storage: impl Into<String>, codec: impl Into<String>) -> Self {
        self.entries.insert(
            ty,
            TypeMapping {
                storage: storage.into(),
                codec: codec.into(),
            },
        );
        self
    }

    pub fn get(&self, ty: WireType) -> Option<&TypeMapping> {
        self.entries.get(&ty)
    }

    /// Look up a mapping by its document tag (`"new_id"`, `"fd"`, ...).
    pub fn lookup(&self, tag: &str) -> Option<&TypeMapping> {
        tag.parse::<WireType>().ok().and_then(|ty| self.get(ty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WireType, &TypeMapping)> {
        self.entries.iter().map(|(ty, mapping)| (*ty, mapping))
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::rust()
    }
}
