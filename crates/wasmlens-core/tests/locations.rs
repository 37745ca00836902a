//! Line-table queries against the synthesized fixture.

mod common;

use std::sync::Arc;

use wasmlens_core::modules::DebugModule;
use wasmlens_core::{ModuleCache, SourceLocation};

fn fixture() -> Arc<DebugModule>
{
    let mut cache = ModuleCache::new();
    cache
        .get_module_from_code("fixture", &common::fixture_module_bytes(), None)
        .unwrap()
}

#[test]
fn test_source_scripts_are_deduplicated_support_files()
{
    let module = fixture();
    assert_eq!(module.source_scripts(), ["hello.c", "printf.h"]);
    assert!(module.references_source_script("hello.c"));
    assert!(module.references_source_script("printf.h"));
    assert!(!module.references_source_script("other.c"));
}

#[test]
fn test_offset_maps_to_covering_row()
{
    let module = fixture();
    assert_eq!(
        module.source_location_from_offset(0x72).unwrap(),
        [SourceLocation::new("hello.c", 4, 3)]
    );
    // Anywhere inside the covering interval reports the same row.
    assert_eq!(
        module.source_location_from_offset(0x7d).unwrap(),
        [SourceLocation::new("hello.c", 4, 3)]
    );
    assert_eq!(
        module.source_location_from_offset(0x60).unwrap(),
        [SourceLocation::new("hello.c", 3, 1)]
    );
}

#[test]
fn test_offsets_outside_all_sequences_have_no_location()
{
    let module = fixture();
    assert!(module.source_location_from_offset(0x5f).unwrap().is_empty());
    assert!(module.source_location_from_offset(0x90).unwrap().is_empty());
}

#[test]
fn test_sentinel_rows_are_filtered()
{
    // 0x84..0x90 is covered by a row whose line and column are 0.
    let module = fixture();
    assert!(module.source_location_from_offset(0x86).unwrap().is_empty());
}

#[test]
fn test_source_line_maps_to_offsets()
{
    let module = fixture();
    let offsets = module
        .offsets_from_source_location(&SourceLocation::new("hello.c", 4, 0))
        .unwrap();
    assert_eq!(offsets, [0x72]);

    let offsets = module
        .offsets_from_source_location(&SourceLocation::new("hello.c", 5, 0))
        .unwrap();
    assert_eq!(offsets, [0x7e]);
}

#[test]
fn test_offset_to_line_and_back_round_trips()
{
    let module = fixture();
    for offset in [0x60u64, 0x72, 0x7d] {
        let locations = module.source_location_from_offset(offset).unwrap();
        assert_eq!(locations.len(), 1);
        let offsets = module.offsets_from_source_location(&locations[0]).unwrap();
        let reported_line = locations[0].line;
        assert!(offsets.iter().any(|&candidate| {
            module
                .source_location_from_offset(candidate)
                .unwrap()
                .iter()
                .any(|location| location.line == reported_line)
        }));
    }
}

#[test]
fn test_bare_file_name_matches_and_wrong_directory_does_not()
{
    let module = fixture();
    // A query with a directory must match the recorded path exactly.
    let offsets = module
        .offsets_from_source_location(&SourceLocation::new("src/hello.c", 4, 0))
        .unwrap();
    assert!(offsets.is_empty());
}

#[test]
fn test_unknown_line_has_no_offsets()
{
    let module = fixture();
    let offsets = module
        .offsets_from_source_location(&SourceLocation::new("hello.c", 9, 0))
        .unwrap();
    assert!(offsets.is_empty());
}
