use std::collections::HashMap;

use async_graphql_parser::{
    types::{Field, FragmentSpread, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::Name;

use super::context::ExecutionContext;
use crate::{
    directive::DirectiveLocation,
    error::{ExecutionError, ValidationError},
    schema::MetaType,
};

/// Walks the whole selected operation before any resolver runs, fragments expanded
/// against their type condition.
///
/// Rejects what would otherwise only surface in some branches depending on the data:
/// unknown fields, fragments and directives, selection set mismatches, impossible type
/// conditions, fragment cycles and operations deeper than the configured maximum.
pub(crate) struct OperationWalker<'c, 'a> {
    ctx: &'c ExecutionContext<'a>,
    // Depth of a fragment doesn't depend on where it's spread.
    fragment_depths: HashMap<&'a str, usize>,
    visiting: Vec<&'a str>,
}

impl<'c, 'a> OperationWalker<'c, 'a> {
    pub(crate) fn new(ctx: &'c ExecutionContext<'a>) -> Self {
        OperationWalker {
            ctx,
            fragment_depths: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// Returns the depth of the operation, 1 for `{ a }`.
    pub(crate) fn walk_operation(mut self) -> Result<usize, ExecutionError> {
        let root = self.ctx.root_type()?;
        let Some(root) = self.ctx.schema.get(root.name()) else {
            return Ok(0);
        };

        let depth = self.walk_selection_set(root, &self.ctx.operation().selection_set.node)?;
        match self.ctx.config.max_depth {
            Some(max_depth) if depth > max_depth => Err(ValidationError::TooDeep {
                max_depth,
                location: self.ctx.operation_location().into(),
            }
            .into()),
            _ => Ok(depth),
        }
    }

    fn walk_selection_set(&mut self, parent: &'a MetaType, selection_set: &'a SelectionSet) -> Result<usize, ExecutionError> {
        let mut depth = 0;
        for selection in &selection_set.items {
            let selection_depth = match &selection.node {
                Selection::Field(field) => self.walk_field(parent, field)?,
                Selection::FragmentSpread(spread) => {
                    self.ctx
                        .is_included(&spread.node.directives, DirectiveLocation::FragmentSpread)?;
                    self.walk_fragment(parent, spread)?
                }
                Selection::InlineFragment(fragment) => {
                    self.ctx
                        .is_included(&fragment.node.directives, DirectiveLocation::InlineFragment)?;
                    let ty = match &fragment.node.type_condition {
                        Some(type_condition) => self.type_condition(parent, &type_condition.node.on)?,
                        None => parent,
                    };
                    self.walk_selection_set(ty, &fragment.node.selection_set.node)?
                }
            };
            depth = depth.max(selection_depth);
        }
        Ok(depth)
    }

    fn walk_field(&mut self, parent: &'a MetaType, field: &'a Positioned<Field>) -> Result<usize, ExecutionError> {
        self.ctx.is_included(&field.node.directives, DirectiveLocation::Field)?;

        let name = &field.node.name.node;
        let has_selection_set = !field.node.selection_set.node.items.is_empty();

        if name.as_str() == "__typename" {
            if has_selection_set {
                return Err(ValidationError::LeafSelectionSet {
                    name: name.to_string(),
                    ty: "String!".to_string(),
                    location: field.pos.into(),
                }
                .into());
            }
            return Ok(1);
        }

        let Some(definition) = parent.field_by_name(name) else {
            return Err(ValidationError::UnknownField {
                name: name.to_string(),
                parent: parent.name().to_string(),
                location: field.pos.into(),
            }
            .into());
        };
        let Some(ty) = self.ctx.schema.named_type(definition.ty()) else {
            return Err(ValidationError::UnknownType {
                name: definition.ty().to_string(),
                location: field.pos.into(),
            }
            .into());
        };

        match (ty.is_leaf(), has_selection_set) {
            (true, false) => Ok(1),
            (true, true) => Err(ValidationError::LeafSelectionSet {
                name: name.to_string(),
                ty: definition.ty().to_string(),
                location: field.pos.into(),
            }
            .into()),
            (false, false) => Err(ValidationError::MissingSelectionSet {
                name: name.to_string(),
                ty: definition.ty().to_string(),
                location: field.pos.into(),
            }
            .into()),
            (false, true) => Ok(1 + self.walk_selection_set(ty, &field.node.selection_set.node)?),
        }
    }

    fn walk_fragment(
        &mut self,
        parent: &'a MetaType,
        spread: &'a Positioned<FragmentSpread>,
    ) -> Result<usize, ExecutionError> {
        let name = spread.node.fragment_name.node.as_str();
        let Some(fragment) = self.ctx.fragment(name) else {
            return Err(ValidationError::UnknownFragment {
                name: name.to_string(),
                location: spread.pos.into(),
            }
            .into());
        };
        let ty = self.type_condition(parent, &fragment.node.type_condition.node.on)?;

        if let Some(depth) = self.fragment_depths.get(name) {
            return Ok(*depth);
        }
        if self.visiting.contains(&name) {
            return Err(ValidationError::FragmentCycle {
                name: name.to_string(),
                location: spread.pos.into(),
            }
            .into());
        }
        self.ctx
            .is_included(&fragment.node.directives, DirectiveLocation::FragmentDefinition)?;

        self.visiting.push(name);
        let depth = self.walk_selection_set(ty, &fragment.node.selection_set.node)?;
        self.visiting.pop();
        self.fragment_depths.insert(name, depth);

        Ok(depth)
    }

    fn type_condition(&self, parent: &MetaType, on: &'a Positioned<Name>) -> Result<&'a MetaType, ExecutionError> {
        let Some(ty) = self.ctx.schema.get(&on.node) else {
            return Err(ValidationError::UnknownType {
                name: on.node.to_string(),
                location: on.pos.into(),
            }
            .into());
        };
        if !self.ctx.schema.types_overlap(parent.name(), ty.name()) {
            return Err(ValidationError::IncompatibleFragment {
                type_condition: ty.name().to_string(),
                parent: parent.name().to_string(),
                location: on.pos.into(),
            }
            .into());
        }
        Ok(ty)
    }
}
