//! # Module Cache
//!
//! Identity- and content-addressed store of loaded debug modules.
//!
//! Modules are cached twice: under the caller-chosen `id` and under a hash
//! of the module bytes plus the symbol reference. Loading identical content
//! under a second id aliases the first entry instead of re-parsing it.
//!
//! ## Thread Safety
//!
//! The cache is not thread-safe. If you need concurrent access, wrap it in
//! a `Mutex` or serialize all cache-mutating operations on one owner.

use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};

use super::module::DebugModule;
use super::url::UrlResolver;
use crate::error::Result;

fn content_hash(bytes: &[u8], symbols_url: Option<&str>) -> u64
{
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    symbols_url.hash(&mut hasher);
    hasher.finish()
}

/// Cache of loaded debug modules.
#[derive(Default)]
pub struct ModuleCache
{
    resolver: UrlResolver,
    modules: HashMap<String, Arc<DebugModule>>,
    by_hash: HashMap<u64, Arc<DebugModule>>,
}

impl ModuleCache
{
    #[must_use]
    pub fn new() -> Self
    {
        ModuleCache::default()
    }

    /// Create a cache that resolves module URLs with `resolver`.
    #[must_use]
    pub fn with_resolver(resolver: UrlResolver) -> Self
    {
        ModuleCache {
            resolver,
            ..ModuleCache::default()
        }
    }

    /// Load a module from a URL, or return the entry already cached under `id`.
    ///
    /// The URL is resolved to a local path and the bytes are read and hashed
    /// together with `symbols_url`; a content hit aliases `id` to the
    /// existing module. A fresh load is cached under both keys even when it
    /// produced zero compile units; check [`DebugModule::valid`] afterwards.
    ///
    /// ## Errors
    ///
    /// Returns an error only when the resolved file cannot be read at all.
    /// Malformed content is cached as an invalid module, not reported here.
    pub fn get_module_from_url(&mut self, id: &str, url: &str, symbols_url: Option<&str>) -> Result<Arc<DebugModule>>
    {
        if let Some(existing) = self.modules.get(id) {
            return Ok(existing.clone());
        }

        let path = self.resolver.resolve(url);
        let bytes = fs::read(&path)?;
        self.insert_module(id, path, &bytes, symbols_url, None)
    }

    /// Load a module from raw bytes, or return the entry already cached under `id`.
    ///
    /// The bytes are written to a uniquely-named temporary file whose
    /// lifetime is tied to the resulting module; deleting the last cache
    /// entry for the module deletes the file.
    ///
    /// ## Errors
    ///
    /// Returns an error only when the temporary file cannot be created or
    /// written.
    pub fn get_module_from_code(&mut self, id: &str, bytes: &[u8], symbols_url: Option<&str>) -> Result<Arc<DebugModule>>
    {
        if let Some(existing) = self.modules.get(id) {
            return Ok(existing.clone());
        }

        let mut temp_file = tempfile::Builder::new()
            .prefix("wasmlens-module-")
            .suffix(".wasm")
            .tempfile()?;
        temp_file.write_all(bytes)?;
        temp_file.flush()?;
        let path = temp_file.path().to_path_buf();
        self.insert_module(id, path, bytes, symbols_url, Some(temp_file))
    }

    fn insert_module(
        &mut self,
        id: &str,
        path: std::path::PathBuf,
        bytes: &[u8],
        symbols_url: Option<&str>,
        temp_file: Option<tempfile::NamedTempFile>,
    ) -> Result<Arc<DebugModule>>
    {
        let hash = content_hash(bytes, symbols_url);
        if let Some(existing) = self.by_hash.get(&hash) {
            debug!(module = id, "aliasing id to content-identical module");
            self.modules.insert(id.to_string(), existing.clone());
            return Ok(existing.clone());
        }

        let symbols_path = symbols_url.map(|url| self.resolver.resolve_symbols(url, &path));
        let module = Arc::new(DebugModule::load(id, path, bytes, symbols_path, temp_file));
        info!(
            module = id,
            valid = module.valid(),
            scripts = module.source_scripts().len(),
            "loaded module"
        );
        self.modules.insert(id.to_string(), module.clone());
        self.by_hash.insert(hash, module.clone());
        Ok(module)
    }

    /// Direct id lookup, no side effects.
    #[must_use]
    pub fn find_module(&self, id: &str) -> Option<Arc<DebugModule>>
    {
        self.modules.get(id).cloned()
    }

    /// Remove the `id -> module` mapping; returns whether it existed.
    ///
    /// Only the id mapping is removed. Other ids aliasing the same content
    /// keep resolving, and the content-hash entry stays in place.
    pub fn delete_module(&mut self, id: &str) -> bool
    {
        self.modules.remove(id).is_some()
    }

    /// All cached modules whose compile units reference `file` as a support
    /// file. Linear scan; ordering follows the id map.
    #[must_use]
    pub fn find_modules_containing_source_script(&self, file: &str) -> Vec<Arc<DebugModule>>
    {
        self.modules
            .values()
            .filter(|module| module.references_source_script(file))
            .cloned()
            .collect()
    }
}
