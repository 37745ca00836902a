//! DWARF type extraction into [`TypeDescriptor`] values.

use gimli::{constants, AttributeValue, DebuggingInformationEntry, Unit, UnitOffset};

use crate::error::{map_dwarf_error, EngineError, Result};
use crate::modules::{DebugModule, OwnedReader};
use crate::types::{FieldDescriptor, TypeDescriptor};

const MAX_TYPE_REF_DEPTH: usize = 32;

fn rename(descriptor: TypeDescriptor, new_name: String) -> TypeDescriptor
{
    match descriptor {
        TypeDescriptor::Scalar { byte_size, .. } => TypeDescriptor::Scalar {
            name: new_name,
            byte_size,
        },
        TypeDescriptor::Pointer { byte_size, .. } => TypeDescriptor::Pointer {
            name: new_name,
            byte_size,
        },
        TypeDescriptor::Array {
            element,
            length,
            incomplete,
            ..
        } => TypeDescriptor::Array {
            name: new_name,
            element,
            length,
            incomplete,
        },
        TypeDescriptor::Aggregate { byte_size, fields, .. } => TypeDescriptor::Aggregate {
            name: new_name,
            byte_size,
            fields,
        },
    }
}

impl DebugModule
{
    /// Look up a type by its canonical name across all compile units.
    ///
    /// Matches named type definitions (base types, typedefs, aggregates,
    /// enumerations); synthesized names like `int [4]` only come from
    /// variable lookups, not from this search.
    pub fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>>
    {
        for (unit_index, unit) in self.units().iter().enumerate() {
            let mut cursor = unit.entries();
            while let Some((_delta, entry)) = cursor
                .next_dfs()
                .map_err(|err| map_dwarf_error("traversing DIE tree", err))?
            {
                if !matches!(
                    entry.tag(),
                    constants::DW_TAG_base_type
                        | constants::DW_TAG_typedef
                        | constants::DW_TAG_structure_type
                        | constants::DW_TAG_class_type
                        | constants::DW_TAG_union_type
                        | constants::DW_TAG_enumeration_type
                ) {
                    continue;
                }
                let Some(candidate) = self.entry_name(unit, entry)? else {
                    continue;
                };
                if candidate != name {
                    continue;
                }
                let descriptor = self.descriptor_at(unit_index, entry.offset())?;
                return Ok(Some(descriptor));
            }
        }
        Ok(None)
    }

    /// Build the descriptor for the type DIE at `offset`.
    pub(crate) fn descriptor_at(&self, unit_index: usize, offset: UnitOffset) -> Result<TypeDescriptor>
    {
        let unit = &self.units()[unit_index];
        self.descriptor_at_depth(unit_index, unit, offset, 0)
    }

    fn descriptor_at_depth(
        &self,
        unit_index: usize,
        unit: &Unit<OwnedReader>,
        offset: UnitOffset,
        depth: usize,
    ) -> Result<TypeDescriptor>
    {
        if depth >= MAX_TYPE_REF_DEPTH {
            return Err(EngineError::Unsupported("type reference chain too deep".to_string()));
        }

        let entry = unit
            .entry(offset)
            .map_err(|err| map_dwarf_error("resolving type reference", err))?;

        match entry.tag() {
            constants::DW_TAG_base_type | constants::DW_TAG_enumeration_type => {
                let name = self
                    .entry_name(unit, &entry)?
                    .unwrap_or_else(|| String::from("<anonymous>"));
                Ok(TypeDescriptor::Scalar {
                    name,
                    byte_size: self.entry_byte_size(&entry)?.unwrap_or(0),
                })
            }
            constants::DW_TAG_pointer_type => {
                let byte_size = match self.entry_byte_size(&entry)? {
                    Some(size) => size,
                    None => u32::from(unit.encoding().address_size),
                };
                let name = match self.type_ref(&entry)? {
                    Some(pointee) => {
                        let inner = self.descriptor_at_depth(unit_index, unit, pointee, depth + 1)?;
                        format!("{} *", inner.name())
                    }
                    None => String::from("void *"),
                };
                Ok(TypeDescriptor::Pointer { name, byte_size })
            }
            constants::DW_TAG_typedef => {
                let Some(name) = self.entry_name(unit, &entry)? else {
                    return Err(EngineError::DebugInfo("typedef without a name".to_string()));
                };
                let Some(underlying) = self.type_ref(&entry)? else {
                    return Err(EngineError::DebugInfo(format!("typedef '{name}' without a type")));
                };
                let inner = self.descriptor_at_depth(unit_index, unit, underlying, depth + 1)?;
                Ok(rename(inner, name))
            }
            constants::DW_TAG_const_type | constants::DW_TAG_volatile_type => {
                let qualifier = if entry.tag() == constants::DW_TAG_const_type {
                    "const"
                } else {
                    "volatile"
                };
                let Some(underlying) = self.type_ref(&entry)? else {
                    return Err(EngineError::DebugInfo("qualified type without a type".to_string()));
                };
                let inner = self.descriptor_at_depth(unit_index, unit, underlying, depth + 1)?;
                let name = format!("{qualifier} {}", inner.name());
                Ok(rename(inner, name))
            }
            constants::DW_TAG_array_type => {
                let Some(element_offset) = self.type_ref(&entry)? else {
                    return Err(EngineError::DebugInfo("array without an element type".to_string()));
                };
                let element = self.descriptor_at_depth(unit_index, unit, element_offset, depth + 1)?;
                let length = self.array_length(unit, offset)?;
                let name = match length {
                    Some(length) => format!("{} [{length}]", element.name()),
                    None => format!("{} []", element.name()),
                };
                Ok(TypeDescriptor::Array {
                    name,
                    element: Box::new(element),
                    length: length.unwrap_or(0),
                    incomplete: length.is_none(),
                })
            }
            constants::DW_TAG_structure_type | constants::DW_TAG_class_type | constants::DW_TAG_union_type => {
                let name = self
                    .entry_name(unit, &entry)?
                    .unwrap_or_else(|| String::from("<anonymous>"));
                let byte_size = self.entry_byte_size(&entry)?.unwrap_or(0);
                let fields = self.collect_fields(unit_index, unit, offset, depth)?;
                Ok(TypeDescriptor::Aggregate {
                    name,
                    byte_size,
                    fields,
                })
            }
            other => Err(EngineError::Unsupported(format!("unhandled type category {other}"))),
        }
    }

    fn collect_fields(
        &self,
        unit_index: usize,
        unit: &Unit<OwnedReader>,
        offset: UnitOffset,
        depth: usize,
    ) -> Result<Vec<FieldDescriptor>>
    {
        let mut fields = Vec::new();
        let mut tree = unit
            .entries_tree(Some(offset))
            .map_err(|err| map_dwarf_error("building aggregate tree", err))?;
        let root = tree
            .root()
            .map_err(|err| map_dwarf_error("navigating aggregate root", err))?;
        let mut children = root.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating aggregate members", err))?
        {
            let entry = child.entry();
            if entry.tag() != constants::DW_TAG_member {
                continue;
            }
            let name = self
                .entry_name(unit, entry)?
                .unwrap_or_else(|| String::from("<anonymous>"));
            let Some(member_type) = self.type_ref(entry)? else {
                return Err(EngineError::DebugInfo(format!("member '{name}' without a type")));
            };
            let ty = self.descriptor_at_depth(unit_index, unit, member_type, depth + 1)?;
            let bit_offset = self.member_bit_offset(entry)?;
            fields.push(FieldDescriptor { name, ty, bit_offset });
        }
        Ok(fields)
    }

    fn array_length(&self, unit: &Unit<OwnedReader>, offset: UnitOffset) -> Result<Option<u64>>
    {
        let mut tree = unit
            .entries_tree(Some(offset))
            .map_err(|err| map_dwarf_error("building array tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating array root", err))?;
        let mut children = root.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating array subranges", err))?
        {
            let entry = child.entry();
            if entry.tag() != constants::DW_TAG_subrange_type {
                continue;
            }
            if let Some(attr) = entry
                .attr(constants::DW_AT_count)
                .map_err(|err| map_dwarf_error("reading DW_AT_count", err))?
            {
                if let Some(count) = attr.udata_value() {
                    return Ok(Some(count));
                }
            }
            if let Some(attr) = entry
                .attr(constants::DW_AT_upper_bound)
                .map_err(|err| map_dwarf_error("reading DW_AT_upper_bound", err))?
            {
                if let Some(upper) = attr.udata_value() {
                    return Ok(Some(upper + 1));
                }
            }
            return Ok(None);
        }
        Ok(None)
    }

    fn member_bit_offset(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> Result<u64>
    {
        if let Some(attr) = entry
            .attr(constants::DW_AT_data_bit_offset)
            .map_err(|err| map_dwarf_error("reading DW_AT_data_bit_offset", err))?
        {
            if let Some(bits) = attr.udata_value() {
                return Ok(bits);
            }
        }

        if let Some(attr) = entry
            .attr(constants::DW_AT_data_member_location)
            .map_err(|err| map_dwarf_error("reading DW_AT_data_member_location", err))?
        {
            if let Some(bytes) = attr.udata_value() {
                return Ok(bytes * 8);
            }
        }

        Ok(0)
    }

    fn type_ref(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> Result<Option<UnitOffset>>
    {
        match entry
            .attr_value(constants::DW_AT_type)
            .map_err(|err| map_dwarf_error("reading DW_AT_type", err))?
        {
            Some(AttributeValue::UnitRef(offset)) => Ok(Some(offset)),
            _ => Ok(None),
        }
    }

    fn entry_byte_size(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> Result<Option<u32>>
    {
        if let Some(attr) = entry
            .attr(constants::DW_AT_byte_size)
            .map_err(|err| map_dwarf_error("reading DW_AT_byte_size", err))?
        {
            if let Some(bytes) = attr.udata_value() {
                return Ok(Some(bytes as u32));
            }
        }
        Ok(None)
    }

    fn entry_name(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
    ) -> Result<Option<String>>
    {
        if let Some(attr) = entry
            .attr(constants::DW_AT_name)
            .map_err(|err| map_dwarf_error("reading DW_AT_name", err))?
        {
            return Ok(Some(self.attr_to_string(unit, attr.value())?));
        }
        Ok(None)
    }
}
