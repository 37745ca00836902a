//! Variables visible at a code offset.

use std::fmt;

/// How a variable is scoped at the point it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope
{
    /// Declared inside the containing function or a nested lexical block
    Local,
    /// A formal parameter of the containing function
    Parameter,
    /// A module-level variable, visible everywhere
    Global,
}

impl fmt::Display for VariableScope
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            VariableScope::Local => "local",
            VariableScope::Parameter => "parameter",
            VariableScope::Global => "global",
        };
        write!(f, "{name}")
    }
}

/// A variable reported by a scope query.
///
/// Only the name, scope class, and type name are carried here; resolving the
/// variable to a concrete location or a full type descriptor is a separate
/// query against the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable
{
    /// Variable name as recorded in the debug info
    pub name: String,
    /// Scope classification
    pub scope: VariableScope,
    /// Canonical type name (e.g. `int`, `const char *`, `int [4]`)
    pub type_name: String,
}
