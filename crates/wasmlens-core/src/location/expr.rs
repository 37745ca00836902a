//! The location-expression bytecode interpreter.
//!
//! Variables carry a tiny stack-machine program describing where their value
//! lives. Only the literal address/offset forms are supported here; the
//! instruction set is closed by construction, so an opcode outside it aborts
//! the whole request instead of being skipped.

use gimli::{constants, EndianSlice, LittleEndian, Reader};
use smallvec::SmallVec;

use crate::error::{map_dwarf_error, EngineError, Result};
use crate::types::{AddressSpace, MemoryLocation};

/// Decoded location operations. Expressions are almost always a single
/// operation, so the inline capacity covers the common case.
pub(crate) type OpVec = SmallVec<[LocationOp; 2]>;

/// One decoded operation of a location expression.
///
/// Each operation stands alone and emits exactly one location; there is no
/// evaluation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationOp
{
    /// `DW_OP_plus_uconst`: a linear-memory offset
    PlusUconst(u64),
    /// `DW_OP_WASM_location`: an offset into a tagged wasm storage space
    WasmLocation
    {
        /// Raw storage-space tag (0 = local, 1 = global)
        space: u64,
        /// Offset or index within that space
        offset: u64,
    },
    /// `DW_OP_addr`: an absolute linear-memory address
    Addr(u64),
}

/// Decode a raw expression into operations.
///
/// ## Errors
///
/// `Unsupported` for any opcode outside the closed set; `DebugInfo` when the
/// expression is truncated mid-operand.
pub(crate) fn decode(bytes: &[u8], address_size: u8) -> Result<OpVec>
{
    let mut reader = EndianSlice::new(bytes, LittleEndian);
    let mut ops = OpVec::new();
    while !reader.is_empty() {
        let opcode = reader
            .read_u8()
            .map_err(|err| map_dwarf_error("reading location opcode", err))?;
        match constants::DwOp(opcode) {
            constants::DW_OP_plus_uconst => {
                let imm = reader
                    .read_uleb128()
                    .map_err(|err| map_dwarf_error("reading DW_OP_plus_uconst operand", err))?;
                ops.push(LocationOp::PlusUconst(imm));
            }
            constants::DW_OP_WASM_location => {
                let space = reader
                    .read_uleb128()
                    .map_err(|err| map_dwarf_error("reading DW_OP_WASM_location space", err))?;
                let offset = reader
                    .read_uleb128()
                    .map_err(|err| map_dwarf_error("reading DW_OP_WASM_location offset", err))?;
                ops.push(LocationOp::WasmLocation { space, offset });
            }
            constants::DW_OP_addr => {
                let imm = reader
                    .read_address(address_size)
                    .map_err(|err| map_dwarf_error("reading DW_OP_addr operand", err))?;
                ops.push(LocationOp::Addr(imm));
            }
            other => {
                return Err(EngineError::Unsupported(format!(
                    "location opcode {:#04x}",
                    other.0
                )));
            }
        }
    }
    Ok(ops)
}

/// Interpret a location expression, emitting one location per operation.
pub(crate) fn interpret(bytes: &[u8], address_size: u8, type_name: &str) -> Result<Vec<MemoryLocation>>
{
    let ops = decode(bytes, address_size)?;
    let mut locations = Vec::with_capacity(ops.len());
    for op in ops {
        let location = match op {
            LocationOp::PlusUconst(imm) | LocationOp::Addr(imm) => {
                MemoryLocation::new(type_name, AddressSpace::Memory, imm as i64)
            }
            LocationOp::WasmLocation { space, offset } => {
                let address_space = AddressSpace::from_wasm_tag(space).ok_or_else(|| {
                    EngineError::Unsupported(format!("wasm address space {space}"))
                })?;
                MemoryLocation::new(type_name, address_space, offset as i64)
            }
        };
        locations.push(location);
    }
    Ok(locations)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_decode_plus_uconst()
    {
        let ops = decode(&[0x23, 0x8c, 0x01], 4).unwrap();
        assert_eq!(ops.as_slice(), &[LocationOp::PlusUconst(140)]);
    }

    #[test]
    fn test_decode_wasm_location()
    {
        let ops = decode(&[0xed, 0x00, 0x05], 4).unwrap();
        assert_eq!(
            ops.as_slice(),
            &[LocationOp::WasmLocation { space: 0, offset: 5 }]
        );
    }

    #[test]
    fn test_decode_addr_reads_target_width()
    {
        let ops = decode(&[0x03, 0x04, 0x04, 0x00, 0x00], 4).unwrap();
        assert_eq!(ops.as_slice(), &[LocationOp::Addr(0x404)]);
    }

    #[test]
    fn test_unknown_opcode_is_rejected()
    {
        // DW_OP_call_frame_cfa is outside the closed set.
        let err = decode(&[0x9c], 4).unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }

    #[test]
    fn test_truncated_operand_is_invalid()
    {
        let err = decode(&[0x03, 0x04], 4).unwrap_err();
        assert!(matches!(err, EngineError::DebugInfo(_)));
    }

    #[test]
    fn test_interpret_maps_spaces()
    {
        let locations = interpret(&[0xed, 0x01, 0x02], 4, "int").unwrap();
        assert_eq!(
            locations,
            vec![MemoryLocation::new("int", AddressSpace::Global, 2)]
        );

        let locations = interpret(&[0x23, 0x0c], 4, "int").unwrap();
        assert_eq!(
            locations,
            vec![MemoryLocation::new("int", AddressSpace::Memory, 12)]
        );
    }

    #[test]
    fn test_interpret_rejects_unknown_space()
    {
        let err = interpret(&[0xed, 0x07, 0x00], 4, "int").unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }
}
