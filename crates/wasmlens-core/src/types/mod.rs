//! Value types produced by engine queries.
//!
//! Everything in this module is a plain value: queries produce them, the
//! caller owns them, and nothing here borrows from a cached module.

mod descriptor;
mod location;
mod variable;

pub use descriptor::{FieldDescriptor, TypeDescriptor};
pub use location::{AddressSpace, MemoryLocation, SourceLocation};
pub use variable::{Variable, VariableScope};
