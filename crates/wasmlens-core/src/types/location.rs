//! Source positions and resolved variable locations.

use std::fmt;

/// A position in a source file.
///
/// A line or column of 0 is the debug-info sentinel for "no location";
/// query results never carry it. Columns fit in a `u16` the same way the
/// line tables store them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation
{
    /// Source file path as recorded in the line table
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u16,
}

impl SourceLocation
{
    pub fn new(file: impl Into<String>, line: u32, column: u16) -> Self
    {
        SourceLocation {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Storage class a resolved location points into.
///
/// The numeric encoding matches the location bytecode's own space tags:
/// linear memory is space 0, and the spaces named by a `WASM_LOCATION`
/// operand map to `Local`/`Global` by `tag + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace
{
    /// The target's flat linear memory
    Memory,
    /// Function-local storage (wasm locals)
    Local,
    /// Module-global storage (wasm globals)
    Global,
}

impl AddressSpace
{
    /// Map a `WASM_LOCATION` memory-type tag to an address space.
    ///
    /// Tag 0 is local storage and tag 1 is global storage (`tag + 1` in the
    /// enum's own encoding). Anything larger is outside the closed set and
    /// yields `None`.
    pub fn from_wasm_tag(tag: u64) -> Option<Self>
    {
        match tag {
            0 => Some(AddressSpace::Local),
            1 => Some(AddressSpace::Global),
            _ => None,
        }
    }

    /// Numeric encoding shared with the location bytecode.
    pub fn encoding(self) -> u8
    {
        match self {
            AddressSpace::Memory => 0,
            AddressSpace::Local => 1,
            AddressSpace::Global => 2,
        }
    }
}

impl fmt::Display for AddressSpace
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            AddressSpace::Memory => "memory",
            AddressSpace::Local => "local",
            AddressSpace::Global => "global",
        };
        write!(f, "{name}")
    }
}

/// A concrete place a variable's value lives, produced by evaluating its
/// location expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLocation
{
    /// Canonical name of the value's type
    pub type_name: String,
    /// Storage class the offset indexes into
    pub address_space: AddressSpace,
    /// Offset (or index, for non-memory spaces) within the address space
    pub offset: i64,
}

impl MemoryLocation
{
    pub fn new(type_name: impl Into<String>, address_space: AddressSpace, offset: i64) -> Self
    {
        MemoryLocation {
            type_name: type_name.into(),
            address_space,
            offset,
        }
    }
}
