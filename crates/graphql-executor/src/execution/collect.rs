use async_graphql_parser::{
    types::{Field, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::Name;
use indexmap::IndexMap;

use super::context::ExecutionContext;
use crate::{
    directive::DirectiveLocation,
    error::{ExecutionError, ValidationError},
    schema::ObjectType,
};

/// Field nodes of one object level grouped by response key, in the order the keys first
/// appear in the document.
pub(crate) type CollectedFields<'a> = IndexMap<Name, Vec<&'a Positioned<Field>>>;

pub(crate) struct FieldCollector<'c, 'a> {
    ctx: &'c ExecutionContext<'a>,
}

impl<'c, 'a> FieldCollector<'c, 'a> {
    pub(crate) fn new(ctx: &'c ExecutionContext<'a>) -> Self {
        FieldCollector { ctx }
    }

    /// Collects the fields of `object` requested by all of `selection_sets`. Several sets
    /// happen when the same key was selected more than once on the parent.
    pub(crate) fn collect(
        &self,
        object: &ObjectType,
        selection_sets: impl IntoIterator<Item = &'a Positioned<SelectionSet>>,
    ) -> Result<CollectedFields<'a>, ExecutionError> {
        let mut fields = CollectedFields::new();
        for selection_set in selection_sets {
            self.collect_into(object, &selection_set.node, &mut fields)?;
        }
        Ok(fields)
    }

    fn collect_into(
        &self,
        object: &ObjectType,
        selection_set: &'a SelectionSet,
        fields: &mut CollectedFields<'a>,
    ) -> Result<(), ExecutionError> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    if !self.ctx.is_included(&field.node.directives, DirectiveLocation::Field)? {
                        continue;
                    }
                    fields
                        .entry(field.node.response_key().node.clone())
                        .or_default()
                        .push(field);
                }
                Selection::FragmentSpread(spread) => {
                    if !self
                        .ctx
                        .is_included(&spread.node.directives, DirectiveLocation::FragmentSpread)?
                    {
                        continue;
                    }
                    let name = &spread.node.fragment_name.node;
                    let Some(fragment) = self.ctx.fragment(name) else {
                        return Err(ValidationError::UnknownFragment {
                            name: name.to_string(),
                            location: spread.pos.into(),
                        }
                        .into());
                    };
                    if !self
                        .ctx
                        .is_included(&fragment.node.directives, DirectiveLocation::FragmentDefinition)?
                        || !self.applies(object, &fragment.node.type_condition.node.on.node)
                    {
                        continue;
                    }
                    self.collect_into(object, &fragment.node.selection_set.node, fields)?;
                }
                Selection::InlineFragment(fragment) => {
                    if !self
                        .ctx
                        .is_included(&fragment.node.directives, DirectiveLocation::InlineFragment)?
                    {
                        continue;
                    }
                    if let Some(type_condition) = &fragment.node.type_condition {
                        if !self.applies(object, &type_condition.node.on.node) {
                            continue;
                        }
                    }
                    self.collect_into(object, &fragment.node.selection_set.node, fields)?;
                }
            }
        }
        Ok(())
    }

    /// Whether a fragment with this type condition applies to a value of type `object`.
    fn applies(&self, object: &ObjectType, type_condition: &str) -> bool {
        object.name() == type_condition || self.ctx.schema.is_possible_type(type_condition, object.name())
    }
}
