//! C code generation for linked formatter programs.
//!
//! The rendered translation unit is freestanding: it declares its own fixed
//! width typedefs, imports the host memory read, and calls the runtime
//! support primitives resolved during linking. Every primitive call advances
//! the output window by its return value, and the first negative return
//! aborts the formatter.

use std::fmt::Write;

use super::pipeline::LinkedProgram;
use super::program::{FormatOp, ENTRY_SYMBOL, MEMORY_READ_IMPORT};

/// Escape a string for inclusion in a C string literal.
fn c_escape(text: &str) -> String
{
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render the complete C translation unit for a linked program.
pub(crate) fn render_c_source(linked: &LinkedProgram<'_>) -> String
{
    let mut source = String::new();

    source.push_str("typedef unsigned int uint32_t;\n");
    source.push_str("typedef signed char int8_t;\n");
    source.push_str("typedef int int32_t;\n");
    source.push_str("typedef long long int64_t;\n");
    source.push('\n');
    let _ = writeln!(source, "void {MEMORY_READ_IMPORT}(uint32_t offset, uint32_t size, void *result);");
    for primitive in &linked.primitives {
        source.push_str(primitive.declaration);
        source.push('\n');
    }
    source.push('\n');

    let _ = writeln!(source, "void {ENTRY_SYMBOL}(char *buffer, uint32_t size)");
    source.push_str("{\n");
    source.push_str("    int64_t scratch = 0;\n");
    source.push_str("    int32_t rc;\n");

    for op in linked.program.ops() {
        match op {
            FormatOp::ReadMemory { offset, size } => {
                let _ = writeln!(source, "    {MEMORY_READ_IMPORT}({offset}u, {size}u, &scratch);");
            }
            FormatOp::CallPrimitive { symbol, variable } => {
                let cast = linked.value_param(symbol).unwrap_or("const void *");
                let _ = writeln!(
                    source,
                    "    rc = {symbol}(({cast})&scratch, \"{}\", buffer, size);",
                    c_escape(variable)
                );
                push_advance(&mut source);
            }
            FormatOp::BeginCompound { variable, type_name } => {
                let _ = writeln!(
                    source,
                    "    rc = format_begin_array(\"{}\", \"{}\", buffer, size);",
                    c_escape(variable),
                    c_escape(type_name)
                );
                push_advance(&mut source);
            }
            FormatOp::Separator => {
                source.push_str("    rc = format_sep(buffer, size);\n");
                push_advance(&mut source);
            }
            FormatOp::EndCompound => {
                source.push_str("    rc = format_end_array(buffer, size);\n");
                push_advance(&mut source);
            }
        }
    }

    source.push_str("}\n");
    source
}

fn push_advance(source: &mut String)
{
    source.push_str("    if (rc < 0) {\n");
    source.push_str("        return;\n");
    source.push_str("    }\n");
    source.push_str("    buffer += rc;\n");
    source.push_str("    size -= (uint32_t)rc;\n");
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::formatter::pipeline::RuntimeLibrary;
    use crate::formatter::program::FormatterProgram;

    fn render(ops: Vec<FormatOp>) -> String
    {
        let program = FormatterProgram::new(ops);
        let linked = RuntimeLibrary::builtin().link(&program).unwrap();
        render_c_source(&linked)
    }

    #[test]
    fn test_scalar_program_renders_read_and_call()
    {
        let source = render(vec![
            FormatOp::ReadMemory { offset: 12, size: 4 },
            FormatOp::CallPrimitive {
                symbol: "format_int",
                variable: String::from("argc"),
            },
        ]);
        assert!(source.contains("__get_memory(12u, 4u, &scratch);"));
        assert!(source.contains("rc = format_int((const int32_t *)&scratch, \"argc\", buffer, size);"));
        assert!(source.contains("buffer += rc;"));
        assert!(source.contains("size -= (uint32_t)rc;"));
    }

    #[test]
    fn test_compound_program_declares_used_primitives_once()
    {
        let source = render(vec![
            FormatOp::BeginCompound {
                variable: String::from("A"),
                type_name: String::from("int [2]"),
            },
            FormatOp::ReadMemory { offset: 0, size: 4 },
            FormatOp::CallPrimitive {
                symbol: "format_int",
                variable: String::from("[0]"),
            },
            FormatOp::Separator,
            FormatOp::ReadMemory { offset: 4, size: 4 },
            FormatOp::CallPrimitive {
                symbol: "format_int",
                variable: String::from("[1]"),
            },
            FormatOp::EndCompound,
        ]);
        assert_eq!(source.matches("int32_t format_begin_array(").count(), 1);
        assert!(source.contains("rc = format_begin_array(\"A\", \"int [2]\", buffer, size);"));
        assert!(source.contains("rc = format_sep(buffer, size);"));
        assert!(source.contains("rc = format_end_array(buffer, size);"));
    }

    #[test]
    fn test_names_are_escaped_in_literals()
    {
        let source = render(vec![
            FormatOp::ReadMemory { offset: 0, size: 4 },
            FormatOp::CallPrimitive {
                symbol: "format_int",
                variable: String::from("a\"b"),
            },
        ]);
        assert!(source.contains("\"a\\\"b\""));
    }
}
