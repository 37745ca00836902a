//! Scope walking and variable lookup.

use gimli::{constants, AttributeValue, DebuggingInformationEntry, EntriesTreeNode, Reader, Unit, UnitOffset};
use tracing::debug;

use super::expr;
use crate::error::{map_dwarf_error, EngineError, Result};
use crate::modules::{DebugModule, OwnedReader};
use crate::types::{MemoryLocation, TypeDescriptor, Variable, VariableScope};

/// A variable found in the debug info, with everything later queries need:
/// the raw location expression and a handle to the type DIE.
pub(crate) struct VariableRef
{
    pub name: String,
    pub scope: VariableScope,
    pub type_name: String,
    pub unit_index: usize,
    pub type_offset: Option<UnitOffset>,
    pub location: Option<Vec<u8>>,
}

impl DebugModule
{
    /// All variables visible at `offset`: the containing function's
    /// parameters and locals (transitively through nested blocks that cover
    /// the offset), plus every module-level global.
    pub fn variables_in_scope(&self, offset: u64) -> Result<Vec<Variable>>
    {
        let mut refs = self.scope_variables(offset)?;
        let globals = self.global_variables()?;
        debug!(
            offset,
            scoped = refs.len(),
            globals = globals.len(),
            "resolved variables in scope"
        );
        refs.extend(globals);
        Ok(refs
            .into_iter()
            .map(|var| Variable {
                name: var.name,
                scope: var.scope,
                type_name: var.type_name,
            })
            .collect())
    }

    /// Resolve a variable's location expression at `offset`.
    ///
    /// ## Errors
    ///
    /// `NotFound` when no variable of that name is visible, or when the
    /// variable carries no location expression; `Unsupported` for opcodes
    /// outside the closed set.
    pub fn variable_locations(&self, offset: u64, name: &str) -> Result<Vec<MemoryLocation>>
    {
        let variable = self
            .find_variable(offset, name)?
            .ok_or_else(|| EngineError::NotFound(format!("variable '{name}' at offset {offset:#x}")))?;
        self.resolve_variable_location(&variable)
    }

    pub(crate) fn resolve_variable_location(&self, variable: &VariableRef) -> Result<Vec<MemoryLocation>>
    {
        let Some(bytes) = &variable.location else {
            return Err(EngineError::NotFound(format!(
                "variable '{}' has no location expression",
                variable.name
            )));
        };
        let address_size = self.units()[variable.unit_index].encoding().address_size;
        expr::interpret(bytes, address_size, &variable.type_name)
    }

    /// Everything formatter synthesis needs for one variable: its type
    /// descriptor and its resolved locations.
    ///
    /// ## Errors
    ///
    /// `NotFound` when no variable of that name is visible at `offset`;
    /// `Unsupported` when the variable has no type to describe.
    pub fn variable_type_and_locations(&self, offset: u64, name: &str) -> Result<(TypeDescriptor, Vec<MemoryLocation>)>
    {
        let variable = self
            .find_variable(offset, name)?
            .ok_or_else(|| EngineError::NotFound(format!("variable '{name}' at offset {offset:#x}")))?;
        let Some(type_offset) = variable.type_offset else {
            return Err(EngineError::Unsupported(format!("variable '{name}' has no type")));
        };
        let descriptor = self.descriptor_at(variable.unit_index, type_offset)?;
        let locations = self.resolve_variable_location(&variable)?;
        Ok((descriptor, locations))
    }

    /// Find one variable by name: scoped variables first, then globals.
    pub(crate) fn find_variable(&self, offset: u64, name: &str) -> Result<Option<VariableRef>>
    {
        for variable in self.scope_variables(offset)? {
            if variable.name == name {
                return Ok(Some(variable));
            }
        }
        for variable in self.global_variables()? {
            if variable.name == name {
                return Ok(Some(variable));
            }
        }
        Ok(None)
    }

    fn scope_variables(&self, offset: u64) -> Result<Vec<VariableRef>>
    {
        let mut variables = Vec::new();
        for (unit_index, unit) in self.units().iter().enumerate() {
            let mut tree = unit
                .entries_tree(None)
                .map_err(|err| map_dwarf_error("building DIE tree", err))?;
            let root = tree.root().map_err(|err| map_dwarf_error("navigating DIE root", err))?;
            let mut children = root.children();
            while let Some(node) = children
                .next()
                .map_err(|err| map_dwarf_error("iterating compile-unit children", err))?
            {
                if node.entry().tag() != constants::DW_TAG_subprogram {
                    continue;
                }
                if !self.entry_contains_offset(node.entry(), offset)? {
                    continue;
                }
                self.collect_scope(unit_index, unit, node, offset, &mut variables)?;
            }
        }
        Ok(variables)
    }

    fn collect_scope<'abbrev, 'unit, 'tree>(
        &self,
        unit_index: usize,
        unit: &Unit<OwnedReader>,
        node: EntriesTreeNode<'abbrev, 'unit, 'tree, OwnedReader>,
        offset: u64,
        variables: &mut Vec<VariableRef>,
    ) -> Result<()>
    {
        let mut children = node.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating scope children", err))?
        {
            match child.entry().tag() {
                constants::DW_TAG_variable => {
                    if let Some(variable) = self.build_ref(unit_index, unit, child.entry(), VariableScope::Local)? {
                        variables.push(variable);
                    }
                }
                constants::DW_TAG_formal_parameter => {
                    if let Some(variable) = self.build_ref(unit_index, unit, child.entry(), VariableScope::Parameter)? {
                        variables.push(variable);
                    }
                }
                constants::DW_TAG_lexical_block | constants::DW_TAG_inlined_subroutine => {
                    if self.entry_contains_offset(child.entry(), offset)? {
                        self.collect_scope(unit_index, unit, child, offset, variables)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn global_variables(&self) -> Result<Vec<VariableRef>>
    {
        let mut variables = Vec::new();
        for (unit_index, unit) in self.units().iter().enumerate() {
            let mut tree = unit
                .entries_tree(None)
                .map_err(|err| map_dwarf_error("building DIE tree", err))?;
            let root = tree.root().map_err(|err| map_dwarf_error("navigating DIE root", err))?;
            let mut children = root.children();
            while let Some(node) = children
                .next()
                .map_err(|err| map_dwarf_error("iterating compile-unit children", err))?
            {
                if node.entry().tag() != constants::DW_TAG_variable {
                    continue;
                }
                if let Some(variable) = self.build_ref(unit_index, unit, node.entry(), VariableScope::Global)? {
                    variables.push(variable);
                }
            }
        }
        Ok(variables)
    }

    /// PC-range containment. Entries without a `DW_AT_low_pc` (range lists,
    /// abstract origins) are treated as containing so their variables stay
    /// visible rather than silently vanishing.
    fn entry_contains_offset(&self, entry: &DebuggingInformationEntry<'_, '_, OwnedReader>, offset: u64) -> Result<bool>
    {
        let low = match entry
            .attr_value(constants::DW_AT_low_pc)
            .map_err(|err| map_dwarf_error("reading DW_AT_low_pc", err))?
        {
            Some(AttributeValue::Addr(address)) => address,
            Some(AttributeValue::Udata(address)) => address,
            _ => return Ok(true),
        };
        let high = match entry
            .attr_value(constants::DW_AT_high_pc)
            .map_err(|err| map_dwarf_error("reading DW_AT_high_pc", err))?
        {
            Some(AttributeValue::Addr(address)) => address,
            Some(AttributeValue::Udata(delta)) => low.saturating_add(delta),
            _ => return Ok(false),
        };
        Ok(offset >= low && offset < high)
    }

    fn build_ref(
        &self,
        unit_index: usize,
        unit: &Unit<OwnedReader>,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        scope: VariableScope,
    ) -> Result<Option<VariableRef>>
    {
        let Some(name_attr) = entry
            .attr_value(constants::DW_AT_name)
            .map_err(|err| map_dwarf_error("reading variable name", err))?
        else {
            return Ok(None);
        };
        let name = self.attr_to_string(unit, name_attr)?;

        let type_offset = match entry
            .attr_value(constants::DW_AT_type)
            .map_err(|err| map_dwarf_error("reading variable type", err))?
        {
            Some(AttributeValue::UnitRef(offset)) => Some(offset),
            _ => None,
        };
        let type_name = match type_offset {
            Some(offset) => self
                .descriptor_at(unit_index, offset)
                .map(|descriptor| descriptor.name().to_string())
                .unwrap_or_else(|_| String::from("<unknown>")),
            None => String::from("void"),
        };

        let location = match entry
            .attr_value(constants::DW_AT_location)
            .map_err(|err| map_dwarf_error("reading variable location", err))?
        {
            Some(AttributeValue::Exprloc(expression)) => Some(
                expression
                    .0
                    .to_slice()
                    .map_err(|err| map_dwarf_error("reading location expression", err))?
                    .into_owned(),
            ),
            _ => None,
        };

        Ok(Some(VariableRef {
            name,
            scope,
            type_name,
            unit_index,
            type_offset,
            location,
        }))
    }
}
