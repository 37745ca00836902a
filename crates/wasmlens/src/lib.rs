//! # wasmlens
//!
//! A source-level debug-session engine for WebAssembly modules.
//!
//! This crate is the session facade over the engine in `wasmlens-core`: one
//! [`DebugSession`] value owns the module cache, the formatter registry, and
//! the build toolchain, and exposes the debugging operations as plain
//! methods. Transports (RPC servers, editor protocols) live outside this
//! workspace and call into the session.
//!
//! ```rust,no_run
//! use wasmlens::{DebugSession, ModuleSource, SessionConfig, WasmToolchain};
//!
//! let toolchain = WasmToolchain::new("formatters.wasm");
//! let mut session = DebugSession::new(SessionConfig::default(), Box::new(toolchain));
//! let summary = session
//!     .add_raw_module("main", ModuleSource::Url("file:///app/main.wasm"), None)
//!     .expect("module bytes unreadable");
//! if summary.valid {
//!     let scripts = session.source_scripts("main").expect("module exists");
//!     println!("debuggable sources: {scripts:?}");
//! }
//! ```

pub mod session;

pub use session::{DebugSession, ModuleSource, ModuleSummary, SessionConfig};
// Re-export the engine vocabulary so embedders need only this crate
pub use wasmlens_core::{
    AddressSpace, EngineError, MemoryLocation, Result, SourceLocation, Toolchain, TypeDescriptor, Variable,
    VariableScope, WasmToolchain,
};
pub use wasmlens_utils::{init_logging, init_logging_with_level, LogFormat, LogLevel};
