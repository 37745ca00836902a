//! Wasm module parsing and line-table queries.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gimli::{AttributeValue, ColumnType, Dwarf, EndianArcSlice, FileEntry, LineProgramHeader, Reader, RunTimeEndian, SectionId, Unit};
use object::{Object, ObjectSection};
use once_cell::sync::OnceCell;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{OwnedDwarf, OwnedReader};
use crate::error::{map_dwarf_error, Result};
use crate::types::SourceLocation;

const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Check the little-endian wasm magic (`"\0asm"`).
///
/// Anything shorter than 4 bytes or mismatching is simply not this format;
/// callers treat that as "no match", never as an error.
pub fn is_wasm_module(bytes: &[u8]) -> bool
{
    bytes.len() >= 4 && bytes[..4] == WASM_MAGIC
}

/// Debug sections carried in wasm custom sections. Clang emits the
/// dot-prefixed names; the bare aliases cover older toolchains.
const DWARF_SECTIONS: &[(&str, &[&str])] = &[
    (".debug_abbrev", &[".debug_abbrev", "debug_abbrev"]),
    (".debug_addr", &[".debug_addr", "debug_addr"]),
    (".debug_info", &[".debug_info", "debug_info"]),
    (".debug_line", &[".debug_line", "debug_line"]),
    (".debug_line_str", &[".debug_line_str", "debug_line_str"]),
    (".debug_ranges", &[".debug_ranges", "debug_ranges"]),
    (".debug_rnglists", &[".debug_rnglists", "debug_rnglists"]),
    (".debug_str", &[".debug_str", "debug_str"]),
    (".debug_str_offsets", &[".debug_str_offsets", "debug_str_offsets"]),
    (".debug_types", &[".debug_types", "debug_types"]),
    (".debug_loc", &[".debug_loc", "debug_loc"]),
    (".debug_loclists", &[".debug_loclists", "debug_loclists"]),
];

fn load_section_bytes(file: &object::File<'_>, names: &[&str]) -> Arc<[u8]>
{
    for name in names {
        if let Some(section) = file.section_by_name(name) {
            match section.uncompressed_data() {
                Ok(Cow::Borrowed(bytes)) => return Arc::<[u8]>::from(bytes.to_vec()),
                Ok(Cow::Owned(vec)) => return vec.into(),
                Err(err) => {
                    warn!(section = name, %err, "failed to read debug section");
                    return Arc::<[u8]>::from(Vec::new());
                }
            }
        }
    }

    Arc::<[u8]>::from(Vec::new())
}

/// A loaded wasm module with parsed DWARF state.
///
/// Construction never fails on malformed input: a module that is not wasm,
/// or whose debug sections cannot be decoded, still becomes a cache entry
/// with zero compile units. Callers must check [`DebugModule::valid`] after
/// every load.
pub struct DebugModule
{
    id: String,
    path: PathBuf,
    symbols_path: Option<PathBuf>,
    dwarf: OwnedDwarf,
    units: Vec<Unit<OwnedReader>>,
    scripts: OnceCell<Vec<String>>,
    // Keeps the backing file of a code-from-bytes load alive for the
    // module's lifetime; dropped (and deleted) with the module.
    _temp_file: Option<NamedTempFile>,
}

impl DebugModule
{
    pub(crate) fn load(
        id: &str,
        path: PathBuf,
        bytes: &[u8],
        symbols_path: Option<PathBuf>,
        temp_file: Option<NamedTempFile>,
    ) -> Self
    {
        let mut sections: HashMap<&'static str, Arc<[u8]>> = HashMap::new();
        let mut endian = RunTimeEndian::Little;

        if is_wasm_module(bytes) {
            match object::File::parse(bytes) {
                Ok(file) => {
                    if !file.is_little_endian() {
                        endian = RunTimeEndian::Big;
                    }
                    for (canonical, aliases) in DWARF_SECTIONS {
                        sections.insert(*canonical, load_section_bytes(&file, aliases));
                    }
                }
                Err(err) => {
                    warn!(module = id, %err, "failed to parse wasm container");
                }
            }
        } else {
            warn!(module = id, "not a wasm module, caching as invalid");
        }

        let section_for = |section: SectionId| -> OwnedReader {
            let data = sections
                .get(section.name())
                .cloned()
                .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
            EndianArcSlice::new(data, endian)
        };
        // Missing sections load as empty readers, so the loader is
        // infallible.
        let dwarf: OwnedDwarf = match Dwarf::load(|section| Ok::<_, Infallible>(section_for(section))) {
            Ok(dwarf) => dwarf,
            Err(never) => match never {},
        };

        let units = match Self::collect_units(&dwarf) {
            Ok(units) => units,
            Err(err) => {
                warn!(module = id, %err, "failed to parse compile units");
                Vec::new()
            }
        };
        debug!(module = id, units = units.len(), "loaded module");

        DebugModule {
            id: id.to_string(),
            path,
            symbols_path,
            dwarf,
            units,
            scripts: OnceCell::new(),
            _temp_file: temp_file,
        }
    }

    fn collect_units(dwarf: &OwnedDwarf) -> Result<Vec<Unit<OwnedReader>>>
    {
        let mut units = Vec::new();
        let mut headers = dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            units.push(
                dwarf
                    .unit(header)
                    .map_err(|err| map_dwarf_error("parsing compilation unit", err))?,
            );
        }
        Ok(units)
    }

    pub fn id(&self) -> &str
    {
        &self.id
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn symbols_path(&self) -> Option<&Path>
    {
        self.symbols_path.as_deref()
    }

    /// A module is valid iff it exposes at least one compile unit.
    ///
    /// Failed loads are cached as empty modules rather than absent entries,
    /// so this is the only way to tell the two apart.
    pub fn valid(&self) -> bool
    {
        !self.units.is_empty()
    }

    pub(crate) fn units(&self) -> &[Unit<OwnedReader>]
    {
        &self.units
    }

    /// All support files referenced by any compile unit, deduplicated,
    /// in line-table order.
    pub fn source_scripts(&self) -> &[String]
    {
        self.scripts
            .get_or_init(|| self.collect_source_scripts().unwrap_or_default())
            .as_slice()
    }

    fn collect_source_scripts(&self) -> Result<Vec<String>>
    {
        let mut seen = HashSet::new();
        let mut scripts = Vec::new();
        for unit in &self.units {
            let Some(program) = &unit.line_program else {
                continue;
            };
            let header = program.header();
            for file in header.file_names() {
                let path = self.render_file_entry(unit, header, file)?;
                if seen.insert(path.clone()) {
                    scripts.push(path);
                }
            }
        }
        Ok(scripts)
    }

    /// Whether any compile unit references `file` as a support file.
    pub fn references_source_script(&self, file: &str) -> bool
    {
        self.source_scripts().iter().any(|script| paths_match(script, file))
    }

    /// Map a code offset back to source positions.
    ///
    /// At most one result per compile unit, in compile-unit order. Entries
    /// whose line or column is the 0 sentinel are filtered out.
    pub fn source_location_from_offset(&self, offset: u64) -> Result<Vec<SourceLocation>>
    {
        let mut results = Vec::new();
        for unit in &self.units {
            let Some(program) = unit.line_program.clone() else {
                continue;
            };
            let mut rows = program.rows();
            // (address, file index, line, column) of the last non-end row.
            let mut previous: Option<(u64, u64, u64, u64)> = None;
            let mut matched = None;
            while let Some((_, row)) = rows
                .next_row()
                .map_err(|err| map_dwarf_error("walking line table", err))?
            {
                if let Some((address, file, line, column)) = previous.take() {
                    if address <= offset && offset < row.address() {
                        matched = Some((file, line, column));
                        break;
                    }
                }
                if !row.end_sequence() {
                    let line = row.line().map_or(0, std::num::NonZeroU64::get);
                    let column = match row.column() {
                        ColumnType::LeftEdge => 0,
                        ColumnType::Column(column) => column.get(),
                    };
                    previous = Some((row.address(), row.file_index(), line, column));
                }
            }

            let Some((file, line, column)) = matched else {
                continue;
            };
            if line == 0 || column == 0 {
                continue;
            }
            let header = rows.header();
            let Some(entry) = header.file(file) else {
                continue;
            };
            let path = self.render_file_entry(unit, header, entry)?;
            results.push(SourceLocation::new(path, line as u32, column as u16));
        }
        Ok(results)
    }

    /// Map `(file, line)` to the code offsets of every matching line-table
    /// row across all compile units.
    pub fn offsets_from_source_location(&self, location: &SourceLocation) -> Result<Vec<u64>>
    {
        let mut offsets: Vec<u64> = Vec::new();
        for unit in &self.units {
            let Some(program) = unit.line_program.clone() else {
                continue;
            };
            let mut rows = program.rows();
            while let Some((header, row)) = rows
                .next_row()
                .map_err(|err| map_dwarf_error("walking line table", err))?
            {
                if row.end_sequence() {
                    continue;
                }
                let Some(line) = row.line() else {
                    continue;
                };
                if line.get() != u64::from(location.line) {
                    continue;
                }
                let Some(entry) = header.file(row.file_index()) else {
                    continue;
                };
                let path = self.render_file_entry(unit, header, entry)?;
                if !paths_match(&path, &location.file) {
                    continue;
                }
                if offsets.last() != Some(&row.address()) {
                    offsets.push(row.address());
                }
            }
        }
        Ok(offsets)
    }

    fn render_file_entry(
        &self,
        unit: &Unit<OwnedReader>,
        header: &LineProgramHeader<OwnedReader>,
        entry: &FileEntry<OwnedReader>,
    ) -> Result<String>
    {
        let name = self.attr_to_string(unit, entry.path_name())?;
        if name.starts_with('/') {
            return Ok(name);
        }
        if let Some(directory) = entry.directory(header) {
            let directory = self.attr_to_string(unit, directory)?;
            if !directory.is_empty() && directory != "." {
                return Ok(format!("{directory}/{name}"));
            }
        }
        Ok(name)
    }

    pub(crate) fn attr_to_string(&self, unit: &Unit<OwnedReader>, value: AttributeValue<OwnedReader>) -> Result<String>
    {
        let reader = self
            .dwarf
            .attr_string(unit, value)
            .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
        let owned = match reader.to_string() {
            Ok(cow) => cow.into_owned(),
            Err(_) => reader
                .to_string_lossy()
                .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
                .into_owned(),
        };
        Ok(owned)
    }
}

/// Compare a line-table path against a query path. Queries without a
/// directory component match on the file name alone.
pub(crate) fn paths_match(candidate: &str, wanted: &str) -> bool
{
    if candidate == wanted {
        return true;
    }
    if wanted.contains('/') {
        return false;
    }
    candidate.rsplit('/').next() == Some(wanted)
}
