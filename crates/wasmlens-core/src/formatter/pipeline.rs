//! The formatter build pipeline.
//!
//! A generated program goes through four failable stages: resolve its
//! primitives against the runtime support library, generate target code to a
//! temporary object, run the target linker, and read the final module back.
//! Every stage reports its own name on failure, and intermediate artifacts
//! are scoped temp files deleted on every exit path.

use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use tracing::{debug, info};

use super::emit;
use super::program::{FormatterProgram, ENTRY_SYMBOL, LAYOUT_SYMBOLS};
use crate::error::{EngineError, Result};

pub(crate) fn build_error(stage: &'static str, err: impl Display) -> EngineError
{
    EngineError::Build {
        stage,
        message: err.to_string(),
    }
}

/// Declaration of one routine the runtime support library exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSymbolDecl
{
    /// Exported symbol name
    pub name: &'static str,
    /// C prototype used by the code generator
    pub declaration: &'static str,
    /// Pointer type of the staged-value argument, for value formatters
    pub value_param: Option<&'static str>,
}

/// The fixed runtime support library, described by its exported symbols.
///
/// Only the calling convention lives here; the bodies come from the
/// prebuilt runtime object linked in by the toolchain.
pub struct RuntimeLibrary
{
    symbols: Vec<RuntimeSymbolDecl>,
}

static BUILTIN_RUNTIME: Lazy<RuntimeLibrary> = Lazy::new(|| RuntimeLibrary {
    symbols: vec![
        RuntimeSymbolDecl {
            name: "format_int64_t",
            declaration: "int32_t format_int64_t(const int64_t *value, const char *name, char *buffer, uint32_t size);",
            value_param: Some("const int64_t *"),
        },
        RuntimeSymbolDecl {
            name: "format_int32_t",
            declaration: "int32_t format_int32_t(const int32_t *value, const char *name, char *buffer, uint32_t size);",
            value_param: Some("const int32_t *"),
        },
        RuntimeSymbolDecl {
            name: "format_int",
            declaration: "int32_t format_int(const int32_t *value, const char *name, char *buffer, uint32_t size);",
            value_param: Some("const int32_t *"),
        },
        RuntimeSymbolDecl {
            name: "format_int8_t",
            declaration: "int32_t format_int8_t(const int8_t *value, const char *name, char *buffer, uint32_t size);",
            value_param: Some("const int8_t *"),
        },
        RuntimeSymbolDecl {
            name: "format_string",
            declaration: "int32_t format_string(const uint32_t *value, const char *name, char *buffer, uint32_t size);",
            value_param: Some("const uint32_t *"),
        },
        RuntimeSymbolDecl {
            name: "format_begin_array",
            declaration: "int32_t format_begin_array(const char *name, const char *type, char *buffer, uint32_t size);",
            value_param: None,
        },
        RuntimeSymbolDecl {
            name: "format_sep",
            declaration: "int32_t format_sep(char *buffer, uint32_t size);",
            value_param: None,
        },
        RuntimeSymbolDecl {
            name: "format_end_array",
            declaration: "int32_t format_end_array(char *buffer, uint32_t size);",
            value_param: None,
        },
    ],
});

impl RuntimeLibrary
{
    pub fn builtin() -> &'static RuntimeLibrary
    {
        &BUILTIN_RUNTIME
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&RuntimeSymbolDecl>
    {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    /// Resolve every primitive a program calls; the `link-runtime` stage.
    pub(crate) fn link<'a>(&self, program: &'a FormatterProgram) -> Result<LinkedProgram<'a>>
    {
        let mut primitives = Vec::new();
        for symbol in program.required_primitives() {
            let Some(decl) = self.resolve(symbol) else {
                return Err(build_error("link-runtime", format!("unresolved runtime symbol '{symbol}'")));
            };
            primitives.push(*decl);
        }
        Ok(LinkedProgram { program, primitives })
    }
}

/// A program with its runtime primitives resolved, ready for codegen.
pub struct LinkedProgram<'a>
{
    pub program: &'a FormatterProgram,
    pub primitives: Vec<RuntimeSymbolDecl>,
}

impl LinkedProgram<'_>
{
    pub(crate) fn value_param(&self, symbol: &str) -> Option<&'static str>
    {
        self.primitives
            .iter()
            .find(|decl| decl.name == symbol)
            .and_then(|decl| decl.value_param)
    }
}

/// The target build steps: native code generation and the final link.
///
/// The production implementation shells out to a wasm toolchain; tests plug
/// in stubs so the pipeline itself stays exercisable without one.
pub trait Toolchain
{
    /// Generate target code for the linked program into `object`.
    fn codegen(&self, program: &LinkedProgram<'_>, object: &Path) -> Result<()>;

    /// Link `object` into the final loadable module at `output`.
    fn link(&self, object: &Path, output: &Path) -> Result<()>;
}

/// Run a program through codegen, link, and artifact read-back.
pub(crate) fn compile(program: &FormatterProgram, toolchain: &dyn Toolchain) -> Result<Vec<u8>>
{
    let linked = RuntimeLibrary::builtin().link(program)?;

    let object = tempfile::Builder::new()
        .prefix("wasmlens-fmt-")
        .suffix(".o")
        .tempfile()
        .map_err(|err| build_error("codegen", err))?;
    toolchain.codegen(&linked, object.path())?;

    let output = tempfile::Builder::new()
        .prefix("wasmlens-fmt-")
        .suffix(".wasm")
        .tempfile()
        .map_err(|err| build_error("link", err))?;
    toolchain.link(object.path(), output.path())?;

    let bytes = fs::read(output.path()).map_err(|err| build_error("read-artifact", err))?;
    info!(bytes = bytes.len(), "compiled formatter module");
    Ok(bytes)
}

/// Production toolchain driving `clang` and `wasm-ld` as external processes.
///
/// The runtime support library is linked in as a prebuilt wasm object; the
/// host memory-read import stays unresolved for the embedder to provide at
/// load time.
pub struct WasmToolchain
{
    clang: PathBuf,
    wasm_ld: PathBuf,
    runtime_object: PathBuf,
}

impl WasmToolchain
{
    pub fn new(runtime_object: impl Into<PathBuf>) -> Self
    {
        WasmToolchain {
            clang: PathBuf::from("clang"),
            wasm_ld: PathBuf::from("wasm-ld"),
            runtime_object: runtime_object.into(),
        }
    }

    #[must_use]
    pub fn with_clang(mut self, clang: impl Into<PathBuf>) -> Self
    {
        self.clang = clang.into();
        self
    }

    #[must_use]
    pub fn with_wasm_ld(mut self, wasm_ld: impl Into<PathBuf>) -> Self
    {
        self.wasm_ld = wasm_ld.into();
        self
    }
}

impl Toolchain for WasmToolchain
{
    fn codegen(&self, program: &LinkedProgram<'_>, object: &Path) -> Result<()>
    {
        let source = emit::render_c_source(program);
        let mut source_file = tempfile::Builder::new()
            .prefix("wasmlens-fmt-")
            .suffix(".c")
            .tempfile()
            .map_err(|err| build_error("codegen", err))?;
        source_file
            .write_all(source.as_bytes())
            .and_then(|()| source_file.flush())
            .map_err(|err| build_error("codegen", err))?;

        let result = Command::new(&self.clang)
            .arg("--target=wasm32-unknown-unknown")
            .arg("-nostdlib")
            .arg("-O1")
            .arg("-c")
            .arg("-o")
            .arg(object)
            .arg(source_file.path())
            .output()
            .map_err(|err| build_error("codegen", err))?;
        if !result.status.success() {
            return Err(build_error("codegen", String::from_utf8_lossy(&result.stderr)));
        }
        Ok(())
    }

    fn link(&self, object: &Path, output: &Path) -> Result<()>
    {
        let mut command = Command::new(&self.wasm_ld);
        command.arg(object).arg(&self.runtime_object);
        command.arg(format!("--export={ENTRY_SYMBOL}"));
        for symbol in LAYOUT_SYMBOLS {
            command.arg(format!("--export={symbol}"));
        }
        command
            .arg("--no-entry")
            .arg("--allow-undefined")
            .arg("--import-memory")
            .arg("-o")
            .arg(output);
        debug!(?command, "linking formatter module");

        let result = command.output().map_err(|err| build_error("link", err))?;
        if !result.status.success() {
            return Err(build_error("link", String::from_utf8_lossy(&result.stderr)));
        }
        Ok(())
    }
}
