//! The debug session: one value owning the caches and configuration behind
//! every debugging operation.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use wasmlens_core::formatter::FormatterCompiler;
use wasmlens_core::modules::DebugModule;
use wasmlens_core::{
    EngineError, FormatterRegistry, MemoryLocation, ModuleCache, PathSubstitution, Result, SourceLocation, Toolchain,
    UrlResolver, Variable,
};

/// Session-level configuration, applied when modules are loaded.
#[derive(Debug, Default)]
pub struct SessionConfig
{
    /// Directory that relative module URLs resolve against
    pub base_dir: Option<PathBuf>,
    /// Ordered prefix substitutions applied to non-file module URLs
    pub substitutions: Vec<PathSubstitution>,
}

/// Where a raw module's bytes come from.
pub enum ModuleSource<'a>
{
    /// Fetch the bytes from a URL resolved through the session configuration
    Url(&'a str),
    /// The caller already holds the bytes
    Code(&'a [u8]),
}

/// What a module load reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary
{
    pub id: String,
    /// Whether the module carries usable debug information
    pub valid: bool,
    /// Source files the module's debug info references
    pub source_scripts: Vec<String>,
}

/// A debugging session over a set of raw wasm modules.
///
/// Loading a malformed module is not an error: the summary reports it as
/// invalid and later queries against it return empty results. Errors surface
/// only for unknown module ids, I/O failures, and the unsupported constructs
/// spelled out on each operation.
pub struct DebugSession
{
    cache: ModuleCache,
    registry: FormatterRegistry,
    toolchain: Box<dyn Toolchain>,
}

impl DebugSession
{
    pub fn new(config: SessionConfig, toolchain: Box<dyn Toolchain>) -> Self
    {
        let mut resolver = UrlResolver::new().with_substitutions(config.substitutions);
        if let Some(base_dir) = config.base_dir {
            resolver = resolver.with_base_dir(base_dir);
        }
        DebugSession {
            cache: ModuleCache::with_resolver(resolver),
            registry: FormatterRegistry::with_builtins(),
            toolchain,
        }
    }

    /// Replace the primitive-formatter registry for this session.
    pub fn set_registry(&mut self, registry: FormatterRegistry)
    {
        self.registry = registry;
    }

    /// Register a raw module under `id` and parse its debug information.
    ///
    /// ## Errors
    ///
    /// Only I/O failures while fetching the bytes are errors. A module whose
    /// content cannot be parsed is registered as invalid.
    pub fn add_raw_module(
        &mut self,
        id: &str,
        source: ModuleSource<'_>,
        symbols_url: Option<&str>,
    ) -> Result<ModuleSummary>
    {
        let module = match source {
            ModuleSource::Url(url) => self.cache.get_module_from_url(id, url, symbols_url)?,
            ModuleSource::Code(bytes) => self.cache.get_module_from_code(id, bytes, symbols_url)?,
        };
        info!(module = id, valid = module.valid(), "module registered");
        Ok(ModuleSummary {
            id: id.to_string(),
            valid: module.valid(),
            source_scripts: module.source_scripts().to_vec(),
        })
    }

    /// Forget the module registered under `id`; returns whether it existed.
    ///
    /// Other ids aliasing the same content keep working.
    pub fn delete_raw_module(&mut self, id: &str) -> bool
    {
        self.cache.delete_module(id)
    }

    /// Source files referenced by the module's debug info.
    pub fn source_scripts(&self, id: &str) -> Result<Vec<String>>
    {
        Ok(self.module(id)?.source_scripts().to_vec())
    }

    /// Ids of registered modules whose debug info references `file`.
    #[must_use]
    pub fn modules_containing_script(&self, file: &str) -> Vec<String>
    {
        self.cache
            .find_modules_containing_source_script(file)
            .iter()
            .map(|module| module.id().to_string())
            .collect()
    }

    /// Code offsets in the module that correspond exactly to `file:line`.
    pub fn source_location_to_raw_location(&self, id: &str, file: &str, line: u32) -> Result<Vec<u64>>
    {
        let location = SourceLocation {
            file: file.to_string(),
            line,
            column: 0,
        };
        self.module(id)?.offsets_from_source_location(&location)
    }

    /// The source position covering the code offset, if any line-table row
    /// does.
    pub fn raw_location_to_source_location(&self, id: &str, offset: u64) -> Result<Vec<SourceLocation>>
    {
        self.module(id)?.source_location_from_offset(offset)
    }

    /// Variables visible at the code offset, locals and parameters first,
    /// then globals.
    pub fn list_variables_in_scope(&self, id: &str, offset: u64) -> Result<Vec<Variable>>
    {
        self.module(id)?.variables_in_scope(offset)
    }

    /// Build the formatter module that renders the named variable at
    /// `offset`.
    ///
    /// ## Errors
    ///
    /// `NotFound` for unknown modules, unknown variables, and types without
    /// a registered formatter; `Unsupported` for constructs the formatter
    /// cannot render; `Build` when a pipeline stage fails.
    pub fn evaluate_variable(&self, id: &str, offset: u64, name: &str) -> Result<Vec<u8>>
    {
        let module = self.module(id)?;
        let (descriptor, locations) = module.variable_type_and_locations(offset, name)?;
        let location = locations
            .first()
            .ok_or_else(|| EngineError::NotFound(format!("variable '{name}' has no location")))?;
        let compiler = FormatterCompiler::new(&self.registry, self.toolchain.as_ref());
        let program = compiler.generate(name, &descriptor, location)?;
        compiler.compile(&program)
    }

    /// Build the formatter module for an explicit typed location.
    ///
    /// The type is looked up by the name carried in `location`; the rendered
    /// value is named `value`.
    pub fn evaluate_location(&self, id: &str, location: &MemoryLocation) -> Result<Vec<u8>>
    {
        let module = self.module(id)?;
        let descriptor = module
            .find_type(&location.type_name)?
            .ok_or_else(|| EngineError::NotFound(format!("no type named '{}'", location.type_name)))?;
        let compiler = FormatterCompiler::new(&self.registry, self.toolchain.as_ref());
        let program = compiler.generate("value", &descriptor, location)?;
        compiler.compile(&program)
    }

    fn module(&self, id: &str) -> Result<Arc<DebugModule>>
    {
        self.cache
            .find_module(id)
            .ok_or_else(|| EngineError::NotFound(format!("module '{id}'")))
    }
}
