//! # wasmlens-core
//!
//! The debug-session engine for WebAssembly modules.
//!
//! This crate provides the core capabilities behind a source-level wasm
//! debugging session:
//! - Module loading and caching keyed by id and by content
//! - Source location and raw offset mapping through DWARF line tables
//! - Variable discovery and location-expression evaluation
//! - Type-directed formatter synthesis and compilation
//!
//! ## Module validity
//!
//! A module that fails to parse, or parses but carries no usable debug
//! information, is still cached. Such a module answers every query with an
//! empty result rather than an error; only genuine I/O failures while
//! fetching module bytes are reported as errors.

pub mod error;
pub mod formatter;
pub mod location;
pub mod modules;
pub mod typeinfo;
pub mod types;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use formatter::{FormatterCompiler, FormatterRegistry, Toolchain, WasmToolchain};
pub use location::LocationOp;
pub use modules::{DebugModule, ModuleCache, PathSubstitution, UrlResolver};
pub use types::{
    AddressSpace, FieldDescriptor, MemoryLocation, SourceLocation, TypeDescriptor, Variable, VariableScope,
};
