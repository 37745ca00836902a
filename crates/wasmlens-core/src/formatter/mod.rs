//! Type-directed formatter synthesis and compilation.
//!
//! [`FormatterCompiler::generate`] recurses over a variable's type
//! descriptor and emits a straight-line program of calls into the runtime
//! support library; [`FormatterCompiler::compile`] turns that program into a
//! loadable wasm module through the build pipeline.

pub mod emit;
pub mod pipeline;
pub mod program;
pub mod registry;

use tracing::debug;

pub use pipeline::{RuntimeLibrary, Toolchain, WasmToolchain};
pub use program::{FormatOp, FormatterProgram, ENTRY_SYMBOL, LAYOUT_SYMBOLS, MEMORY_READ_IMPORT};
pub use registry::{FormatterRegistry, PrimitiveFormatter};

use crate::error::{EngineError, Result};
use crate::types::{AddressSpace, MemoryLocation, TypeDescriptor};

/// Compiles per-variable formatter programs against a registry and a build
/// toolchain, both borrowed from the embedder.
pub struct FormatterCompiler<'a>
{
    registry: &'a FormatterRegistry,
    toolchain: &'a dyn Toolchain,
}

impl<'a> FormatterCompiler<'a>
{
    pub fn new(registry: &'a FormatterRegistry, toolchain: &'a dyn Toolchain) -> Self
    {
        FormatterCompiler { registry, toolchain }
    }

    /// Synthesize the formatter program for one variable.
    ///
    /// ## Errors
    ///
    /// - `NotFound` when a scalar or pointer type has no registered formatter
    /// - `Unsupported` for non-memory locations, incomplete arrays, and
    ///   non-byte-aligned aggregate fields
    pub fn generate(&self, name: &str, ty: &TypeDescriptor, location: &MemoryLocation) -> Result<FormatterProgram>
    {
        debug!(variable = name, ty = ty.name(), "generating formatter");
        let mut ops = Vec::new();
        self.emit_value(&mut ops, name, ty, location.address_space, location.offset)?;
        Ok(FormatterProgram::new(ops))
    }

    /// Compile a generated program into a loadable wasm module.
    pub fn compile(&self, program: &FormatterProgram) -> Result<Vec<u8>>
    {
        pipeline::compile(program, self.toolchain)
    }

    fn emit_value(
        &self,
        ops: &mut Vec<FormatOp>,
        name: &str,
        ty: &TypeDescriptor,
        space: AddressSpace,
        offset: i64,
    ) -> Result<()>
    {
        match ty {
            TypeDescriptor::Scalar { name: type_name, .. } | TypeDescriptor::Pointer { name: type_name, .. } => {
                let formatter = self
                    .registry
                    .find(type_name)
                    .ok_or_else(|| EngineError::NotFound(format!("no formatter for type '{type_name}'")))?;
                if space != AddressSpace::Memory {
                    return Err(EngineError::Unsupported(format!(
                        "cannot read variable '{name}' from {space} storage"
                    )));
                }
                let offset = u32::try_from(offset).map_err(|_| {
                    EngineError::Unsupported(format!("offset {offset} of variable '{name}' out of range"))
                })?;
                ops.push(FormatOp::ReadMemory {
                    offset,
                    size: formatter.value_size,
                });
                ops.push(FormatOp::CallPrimitive {
                    symbol: formatter.symbol,
                    variable: name.to_string(),
                });
                Ok(())
            }
            TypeDescriptor::Array {
                name: type_name,
                element,
                length,
                incomplete,
            } => {
                if *incomplete {
                    return Err(EngineError::Unsupported(format!(
                        "incomplete array type '{type_name}' of variable '{name}'"
                    )));
                }
                ops.push(FormatOp::BeginCompound {
                    variable: name.to_string(),
                    type_name: type_name.clone(),
                });
                let stride = i64::from(element.byte_size());
                for index in 0..*length {
                    if index > 0 {
                        ops.push(FormatOp::Separator);
                    }
                    let element_offset = offset + stride * index as i64;
                    self.emit_value(ops, &format!("[{index}]"), element, space, element_offset)?;
                }
                ops.push(FormatOp::EndCompound);
                Ok(())
            }
            TypeDescriptor::Aggregate {
                name: type_name,
                fields,
                ..
            } => {
                ops.push(FormatOp::BeginCompound {
                    variable: name.to_string(),
                    type_name: type_name.clone(),
                });
                for (index, field) in fields.iter().enumerate() {
                    if field.bit_offset % 8 != 0 {
                        return Err(EngineError::Unsupported(format!(
                            "field '{}' of '{type_name}' is not byte-aligned",
                            field.name
                        )));
                    }
                    if index > 0 {
                        ops.push(FormatOp::Separator);
                    }
                    let field_offset = offset + (field.bit_offset / 8) as i64;
                    self.emit_value(ops, &field.name, &field.ty, space, field_offset)?;
                }
                ops.push(FormatOp::EndCompound);
                Ok(())
            }
        }
    }
}
