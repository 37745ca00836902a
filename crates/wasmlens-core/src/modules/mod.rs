//! Module loading and caching.
//!
//! A [`DebugModule`] is a wasm binary plus its DWARF debug sections, parsed
//! once and then queried read-only. The [`ModuleCache`] stores modules under
//! both their caller-chosen id and a content hash so that reloading identical
//! bytes under a new id aliases the existing entry.

pub mod cache;
pub mod module;
pub mod url;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian};

pub use cache::ModuleCache;
pub use module::{is_wasm_module, DebugModule};
pub use url::{PathSubstitution, UrlResolver};

pub(crate) type OwnedReader = EndianArcSlice<RunTimeEndian>;
pub(crate) type OwnedDwarf = Dwarf<OwnedReader>;
