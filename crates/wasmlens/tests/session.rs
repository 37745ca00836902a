//! Session-level behavior that needs no debug information: registration,
//! invalid modules, and deletion semantics.

use std::path::Path;

use wasmlens::{DebugSession, EngineError, ModuleSource, Result, SessionConfig, Toolchain};
use wasmlens_core::formatter::pipeline::LinkedProgram;

struct StubToolchain;

impl Toolchain for StubToolchain
{
    fn codegen(&self, _program: &LinkedProgram<'_>, object: &Path) -> Result<()>
    {
        std::fs::write(object, b"object")?;
        Ok(())
    }

    fn link(&self, _object: &Path, output: &Path) -> Result<()>
    {
        std::fs::write(output, b"\0asm\x01\0\0\0")?;
        Ok(())
    }
}

fn session() -> DebugSession
{
    DebugSession::new(SessionConfig::default(), Box::new(StubToolchain))
}

#[test]
fn test_unknown_module_id_is_not_found()
{
    let session = session();
    assert!(matches!(
        session.source_scripts("nope"),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        session.raw_location_to_source_location("nope", 0),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        session.list_variables_in_scope("nope", 0),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_invalid_bytes_register_as_invalid_module()
{
    let mut session = session();
    let summary = session
        .add_raw_module("broken", ModuleSource::Code(b"not a wasm module"), None)
        .unwrap();
    assert!(!summary.valid);
    assert!(summary.source_scripts.is_empty());

    // Queries against an invalid module answer empty, not with errors.
    assert_eq!(session.raw_location_to_source_location("broken", 0x10).unwrap(), vec![]);
    assert_eq!(session.list_variables_in_scope("broken", 0x10).unwrap(), vec![]);
    assert_eq!(
        session.source_location_to_raw_location("broken", "main.c", 3).unwrap(),
        Vec::<u64>::new()
    );
}

#[test]
fn test_evaluate_on_invalid_module_is_not_found()
{
    let mut session = session();
    session
        .add_raw_module("broken", ModuleSource::Code(&[0u8; 16]), None)
        .unwrap();
    assert!(matches!(
        session.evaluate_variable("broken", 0x10, "x"),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_delete_removes_only_the_id()
{
    let mut session = session();
    session
        .add_raw_module("first", ModuleSource::Code(b"shared bytes"), None)
        .unwrap();
    session
        .add_raw_module("second", ModuleSource::Code(b"shared bytes"), None)
        .unwrap();

    assert!(session.delete_raw_module("first"));
    assert!(!session.delete_raw_module("first"));

    // The alias keeps working after the original id is gone.
    assert!(session.source_scripts("second").is_ok());
    assert!(matches!(
        session.source_scripts("first"),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_reregistering_an_id_returns_the_cached_module()
{
    let mut session = session();
    let first = session
        .add_raw_module("m", ModuleSource::Code(b"bytes one"), None)
        .unwrap();
    // Same id with different bytes still answers from the cache.
    let second = session
        .add_raw_module("m", ModuleSource::Code(b"bytes two"), None)
        .unwrap();
    assert_eq!(first, second);
}
