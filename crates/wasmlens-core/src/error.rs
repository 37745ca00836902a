//! # Error Types
//!
//! General error handling for the debug engine.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for engine operations
///
/// This enum represents all the ways a load, resolve, or compile request can
/// fail. Each variant corresponds to one category of the engine's error
/// taxonomy.
///
/// ## Error Categories
///
/// 1. **Lookup errors**: NotFound (unknown module id, unknown type name, unknown variable)
/// 2. **Capability errors**: Unsupported (location opcode outside the closed set,
///    non-memory address space, incomplete array, non-byte-aligned field)
/// 3. **Capacity errors**: InsufficientCapacity (a formatting primitive reported a
///    negative byte count)
/// 4. **Pipeline errors**: Build (a compile-pipeline stage failed; carries the stage name)
/// 5. **Debug-info errors**: DebugInfo (malformed DWARF)
/// 6. **I/O errors**: Io (file reads, temp files, artifact read-back)
#[derive(Error, Debug)]
pub enum EngineError
{
    /// A named module, type, variable, or formatter does not exist
    ///
    /// This happens when:
    /// - A request names a module id that was never added to the cache
    /// - A variable name is not visible at the requested code offset
    /// - A type name has no matching definition in the module's debug info
    /// - A scalar or pointer type has no registered primitive formatter
    #[error("not found: {0}")]
    NotFound(String),

    /// The request needs a capability outside the engine's closed feature set
    ///
    /// Location expressions are interpreted over a closed opcode set, and the
    /// formatter generator only handles memory-resident, byte-aligned,
    /// complete types. Anything outside that set fails the whole request
    /// rather than silently degrading.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A formatting primitive reported a negative byte count
    ///
    /// The runtime primitives return the number of bytes written or a
    /// negative value when the output window is too small. The first negative
    /// result aborts the request; nothing in the cache is affected.
    #[error("insufficient output capacity")]
    InsufficientCapacity,

    /// A compile-pipeline stage failed
    ///
    /// Reported with the failing stage name so callers can tell a missing
    /// backend apart from a linker failure or an artifact read-back failure.
    /// Temporary artifacts are removed regardless.
    #[error("build stage '{stage}' failed: {message}")]
    Build
    {
        /// Name of the pipeline stage that failed
        stage: &'static str,
        /// Details from the failing tool or I/O operation
        message: String,
    },

    /// Malformed or undecodable debug information
    #[error("invalid debug info: {0}")]
    DebugInfo(String),

    /// I/O error (for file operations, etc.)
    ///
    /// Used for errors when reading module files, writing temp files, etc.
    /// This is a standard Rust `std::io::Error` converted to our error type.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, EngineError>`
///
/// ```rust
/// use wasmlens_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, EngineError>;

pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> EngineError
{
    EngineError::DebugInfo(format!("{context}: {err}"))
}
