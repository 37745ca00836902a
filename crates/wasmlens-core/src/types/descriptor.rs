//! Type descriptors driving formatter generation.

/// Shape of a type, extracted from debug info.
///
/// The category set is deliberately closed: the formatter generator pattern
/// matches over exactly these four variants, so a new category is a compile
/// error at every match site rather than a silently ignored default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor
{
    /// A primitive value read and formatted in one piece
    Scalar
    {
        /// Canonical type name used for formatter-registry lookup
        name: String,
        /// Storage size in bytes
        byte_size: u32,
    },
    /// A pointer; formatted by a primitive that follows the pointee
    Pointer
    {
        /// Canonical type name (e.g. `const char *`)
        name: String,
        /// Pointer width in bytes
        byte_size: u32,
    },
    /// A fixed-length sequence of one element type
    Array
    {
        /// Display name of the array itself (e.g. `int [4]`)
        name: String,
        /// Element type
        element: Box<TypeDescriptor>,
        /// Number of elements
        length: u64,
        /// True when the debug info does not record a length
        incomplete: bool,
    },
    /// A struct/class/union with ordered fields
    Aggregate
    {
        /// Display name of the aggregate
        name: String,
        /// Storage size in bytes
        byte_size: u32,
        /// Fields in declaration order
        fields: Vec<FieldDescriptor>,
    },
}

/// One field of an aggregate type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor
{
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeDescriptor,
    /// Offset from the start of the aggregate, in bits
    pub bit_offset: u64,
}

impl TypeDescriptor
{
    /// Canonical display name of the described type.
    pub fn name(&self) -> &str
    {
        match self {
            TypeDescriptor::Scalar { name, .. }
            | TypeDescriptor::Pointer { name, .. }
            | TypeDescriptor::Array { name, .. }
            | TypeDescriptor::Aggregate { name, .. } => name,
        }
    }

    /// Storage size in bytes.
    ///
    /// For arrays this is the element size times the recorded length, which
    /// is 0 for incomplete arrays.
    pub fn byte_size(&self) -> u32
    {
        match self {
            TypeDescriptor::Scalar { byte_size, .. }
            | TypeDescriptor::Pointer { byte_size, .. }
            | TypeDescriptor::Aggregate { byte_size, .. } => *byte_size,
            TypeDescriptor::Array { element, length, .. } => {
                element.byte_size().saturating_mul(u32::try_from(*length).unwrap_or(u32::MAX))
            }
        }
    }
}
