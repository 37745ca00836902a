//! The formatter intermediate representation.

use std::collections::BTreeSet;

/// Entry point every compiled formatter exports:
/// `wasm_format(buffer: *mut u8, capacity: u32)`.
pub const ENTRY_SYMBOL: &str = "wasm_format";

/// Memory-layout symbols the final link must export alongside the entry
/// point so the host can set up linear memory.
pub const LAYOUT_SYMBOLS: [&str; 2] = ["__heap_base", "__data_end"];

/// Host-supplied memory-read import, intentionally left unresolved at link
/// time: `__get_memory(offset: u32, size: u32, result: *mut u8)`.
pub const MEMORY_READ_IMPORT: &str = "__get_memory";

/// One step of a synthesized formatter.
///
/// The program is straight-line: reads stage a raw value into scratch
/// storage, calls hand the output window to a runtime primitive, and the
/// window shrinks by each call's byte count before the next step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOp
{
    /// Read `size` bytes of linear memory at `offset` into scratch storage
    ReadMemory
    {
        offset: u32,
        size: u32,
    },
    /// Call a primitive formatter on the staged value
    CallPrimitive
    {
        /// Runtime symbol to call
        symbol: &'static str,
        /// Variable name passed to the primitive
        variable: String,
    },
    /// Open a compound value (`format_begin_array`)
    BeginCompound
    {
        /// Variable name of the compound
        variable: String,
        /// Display type name of the compound itself
        type_name: String,
    },
    /// Emit the element separator (`format_sep`)
    Separator,
    /// Close a compound value (`format_end_array`)
    EndCompound,
}

/// A complete formatter program for one variable, ready for compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterProgram
{
    ops: Vec<FormatOp>,
}

impl FormatterProgram
{
    pub(crate) fn new(ops: Vec<FormatOp>) -> Self
    {
        FormatterProgram { ops }
    }

    pub fn ops(&self) -> &[FormatOp]
    {
        &self.ops
    }

    /// Symbols the runtime support library must supply, deduplicated.
    pub fn required_primitives(&self) -> BTreeSet<&'static str>
    {
        let mut symbols = BTreeSet::new();
        for op in &self.ops {
            match op {
                FormatOp::CallPrimitive { symbol, .. } => {
                    symbols.insert(*symbol);
                }
                FormatOp::BeginCompound { .. } => {
                    symbols.insert("format_begin_array");
                }
                FormatOp::Separator => {
                    symbols.insert("format_sep");
                }
                FormatOp::EndCompound => {
                    symbols.insert("format_end_array");
                }
                FormatOp::ReadMemory { .. } => {}
            }
        }
        symbols
    }

    /// Largest staged read in the program, for sizing scratch storage.
    pub fn scratch_size(&self) -> u32
    {
        self.ops
            .iter()
            .filter_map(|op| match op {
                FormatOp::ReadMemory { size, .. } => Some(*size),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
