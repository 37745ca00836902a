//! The primitive-formatter registry.

/// One primitive formatter provided by the runtime support library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveFormatter
{
    /// Canonical type name the formatter handles
    pub type_name: &'static str,
    /// Exported symbol of the runtime routine
    pub symbol: &'static str,
    /// Bytes of raw value the routine reads through its value pointer
    pub value_size: u32,
}

/// Registry of primitive formatters, keyed by canonical type name.
///
/// Constructed once by the embedder and passed by reference into the
/// compiler; there is no global table.
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry
{
    entries: Vec<PrimitiveFormatter>,
}

impl FormatterRegistry
{
    #[must_use]
    pub fn new() -> Self
    {
        FormatterRegistry::default()
    }

    /// The built-in set backed by the runtime support library.
    #[must_use]
    pub fn with_builtins() -> Self
    {
        let mut registry = FormatterRegistry::new();
        registry.register(PrimitiveFormatter {
            type_name: "int64_t",
            symbol: "format_int64_t",
            value_size: 8,
        });
        registry.register(PrimitiveFormatter {
            type_name: "int32_t",
            symbol: "format_int32_t",
            value_size: 4,
        });
        registry.register(PrimitiveFormatter {
            type_name: "int",
            symbol: "format_int",
            value_size: 4,
        });
        registry.register(PrimitiveFormatter {
            type_name: "int8_t",
            symbol: "format_int8_t",
            value_size: 1,
        });
        registry.register(PrimitiveFormatter {
            type_name: "const char *",
            symbol: "format_string",
            value_size: 4,
        });
        registry
    }

    /// Register a formatter, replacing any existing entry for the same type
    /// name.
    pub fn register(&mut self, formatter: PrimitiveFormatter)
    {
        self.entries.retain(|entry| entry.type_name != formatter.type_name);
        self.entries.push(formatter);
    }

    #[must_use]
    pub fn find(&self, type_name: &str) -> Option<&PrimitiveFormatter>
    {
        self.entries.iter().find(|entry| entry.type_name == type_name)
    }
}
