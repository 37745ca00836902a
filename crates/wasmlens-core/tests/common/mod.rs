//! Shared fixture: a wasm module with synthesized DWARF for a tiny C
//! program.
//!
//! The fixture mimics what clang emits for:
//!
//! ```c
//! // hello.c (includes printf.h)
//! int G;
//! int main(int argc) {      // code at 0x60..0x90
//!     int A[4];             //   line 3 -> 0x60
//!     ...                   //   line 4 -> 0x72 (column 3)
//!     ...                   //   line 5 -> 0x7e
//! }
//! ```
//!
//! Variable locations: `A` at memory offset 12 (`DW_OP_plus_uconst 12`),
//! `argc` in wasm local 0 (`DW_OP_WASM_location 0x00 0`), `G` at memory
//! address 0x404 (`DW_OP_addr`).

use gimli::write::{Address, AttributeValue, DwarfUnit, EndianVec, Expression, LineProgram, LineString, Sections};
use gimli::{constants, Encoding, Format, LineEncoding, LittleEndian};

pub const MAIN_LOW: u64 = 0x60;

fn uleb(mut value: u64, out: &mut Vec<u8>)
{
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Wrap named payloads as custom sections of a minimal wasm container.
pub fn wasm_container(sections: &[(String, Vec<u8>)]) -> Vec<u8>
{
    let mut out = b"\0asm".to_vec();
    out.extend_from_slice(&1u32.to_le_bytes());
    for (name, payload) in sections {
        if payload.is_empty() {
            continue;
        }
        let mut body = Vec::new();
        uleb(name.len() as u64, &mut body);
        body.extend_from_slice(name.as_bytes());
        body.extend_from_slice(payload);
        out.push(0); // custom section id
        uleb(body.len() as u64, &mut out);
        out.extend_from_slice(&body);
    }
    out
}

/// Build the fixture module's bytes.
pub fn fixture_module_bytes() -> Vec<u8>
{
    let encoding = Encoding {
        format: Format::Dwarf32,
        version: 5,
        address_size: 4,
    };
    let mut dwarf = DwarfUnit::new(encoding);

    // A "." working dir is stripped when file paths render, leaving bare
    // names.
    let comp_dir = LineString::String(b".".to_vec());
    let comp_file = LineString::String(b"hello.c".to_vec());
    let mut program = LineProgram::new(encoding, LineEncoding::default(), comp_dir, None, comp_file.clone(), None);
    let dir = program.default_directory();
    let file_hello = program.add_file(comp_file, dir, None);
    program.add_file(LineString::String(b"printf.h".to_vec()), dir, None);

    program.begin_sequence(Some(Address::Constant(MAIN_LOW)));
    for (offset, line, column) in [(0x00, 3, 1), (0x12, 4, 3), (0x1e, 5, 1), (0x24, 0, 0)] {
        program.row().address_offset = offset;
        program.row().file = file_hello;
        program.row().line = line;
        program.row().column = column;
        program.generate_row();
    }
    program.end_sequence(0x30);
    dwarf.unit.line_program = program;

    let root = dwarf.unit.root();
    {
        let entry = dwarf.unit.get_mut(root);
        entry.set(constants::DW_AT_name, AttributeValue::String(b"hello.c".to_vec()));
        entry.set(constants::DW_AT_comp_dir, AttributeValue::String(b".".to_vec()));
        entry.set(constants::DW_AT_low_pc, AttributeValue::Address(Address::Constant(MAIN_LOW)));
    }

    let int_type = dwarf.unit.add(root, constants::DW_TAG_base_type);
    {
        let entry = dwarf.unit.get_mut(int_type);
        entry.set(constants::DW_AT_name, AttributeValue::String(b"int".to_vec()));
        entry.set(constants::DW_AT_byte_size, AttributeValue::Data1(4));
        entry.set(constants::DW_AT_encoding, AttributeValue::Encoding(constants::DW_ATE_signed));
    }

    let array_type = dwarf.unit.add(root, constants::DW_TAG_array_type);
    dwarf
        .unit
        .get_mut(array_type)
        .set(constants::DW_AT_type, AttributeValue::UnitRef(int_type));
    let subrange = dwarf.unit.add(array_type, constants::DW_TAG_subrange_type);
    dwarf
        .unit
        .get_mut(subrange)
        .set(constants::DW_AT_count, AttributeValue::Udata(4));

    let global = dwarf.unit.add(root, constants::DW_TAG_variable);
    {
        let entry = dwarf.unit.get_mut(global);
        entry.set(constants::DW_AT_name, AttributeValue::String(b"G".to_vec()));
        entry.set(constants::DW_AT_type, AttributeValue::UnitRef(int_type));
        // DW_OP_addr 0x00000404
        entry.set(
            constants::DW_AT_location,
            AttributeValue::Exprloc(Expression::raw(vec![0x03, 0x04, 0x04, 0x00, 0x00])),
        );
    }

    let main = dwarf.unit.add(root, constants::DW_TAG_subprogram);
    {
        let entry = dwarf.unit.get_mut(main);
        entry.set(constants::DW_AT_name, AttributeValue::String(b"main".to_vec()));
        entry.set(constants::DW_AT_low_pc, AttributeValue::Address(Address::Constant(MAIN_LOW)));
        entry.set(constants::DW_AT_high_pc, AttributeValue::Udata(0x30));
    }
    let argc = dwarf.unit.add(main, constants::DW_TAG_formal_parameter);
    {
        let entry = dwarf.unit.get_mut(argc);
        entry.set(constants::DW_AT_name, AttributeValue::String(b"argc".to_vec()));
        entry.set(constants::DW_AT_type, AttributeValue::UnitRef(int_type));
        // DW_OP_WASM_location local 0
        entry.set(
            constants::DW_AT_location,
            AttributeValue::Exprloc(Expression::raw(vec![0xed, 0x00, 0x00])),
        );
    }
    let var_a = dwarf.unit.add(main, constants::DW_TAG_variable);
    {
        let entry = dwarf.unit.get_mut(var_a);
        entry.set(constants::DW_AT_name, AttributeValue::String(b"A".to_vec()));
        entry.set(constants::DW_AT_type, AttributeValue::UnitRef(array_type));
        // DW_OP_plus_uconst 12
        entry.set(
            constants::DW_AT_location,
            AttributeValue::Exprloc(Expression::raw(vec![0x23, 0x0c])),
        );
    }

    let mut sections = Sections::new(EndianVec::new(LittleEndian));
    dwarf.write(&mut sections).expect("fixture DWARF must serialize");
    let mut named = Vec::new();
    sections
        .for_each(|id, data| {
            named.push((id.name().to_string(), data.slice().to_vec()));
            Ok::<(), gimli::write::Error>(())
        })
        .expect("collecting fixture sections cannot fail");

    wasm_container(&named)
}
