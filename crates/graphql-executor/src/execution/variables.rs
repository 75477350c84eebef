use std::collections::BTreeMap;

use async_graphql_parser::{types::VariableDefinition, Positioned};
use async_graphql_value::{ConstValue, Name};

use crate::{
    error::{ExecutionError, InputValueError, Location, ValidationError},
    request::Variables,
    schema::{named_type, Schema},
};

/// Variable values of the selected operation, coerced against their declared types once
/// when the request starts.
#[derive(Debug, Default)]
pub(crate) struct VariableResolver {
    values: BTreeMap<Name, ConstValue>,
}

impl VariableResolver {
    pub(crate) fn new(
        schema: &Schema,
        definitions: &[Positioned<VariableDefinition>],
        supplied: &Variables,
    ) -> Result<Self, ExecutionError> {
        let mut values = BTreeMap::new();

        for Positioned { pos, node: definition } in definitions {
            let name = &definition.name.node;
            let ty = &definition.var_type.node;
            let location = Location::from(*pos);

            match schema.named_type(ty) {
                None => {
                    return Err(ValidationError::UnknownType {
                        name: named_type(ty).to_string(),
                        location: definition.var_type.pos.into(),
                    }
                    .into())
                }
                Some(meta) if !meta.is_input() => {
                    return Err(ValidationError::NonInputVariable {
                        name: name.to_string(),
                        ty: ty.to_string(),
                        location,
                    }
                    .into())
                }
                Some(_) => {}
            }

            let value = match supplied.get(name) {
                Some(value) => value.clone(),
                None => match &definition.default_value {
                    Some(default) => default.node.clone(),
                    // Coercion rejects the null if the type is non-null.
                    None => ConstValue::Null,
                },
            };

            let value = schema
                .translator()
                .coerce_input(schema, ty, value)
                .map_err(|source| ExecutionError::Variable {
                    name: name.to_string(),
                    location,
                    source,
                })?;
            values.insert(name.clone(), value);
        }

        Ok(VariableResolver { values })
    }

    pub(crate) fn get(&self, name: &str) -> Result<&ConstValue, InputValueError> {
        self.values.get(name).ok_or_else(|| InputValueError::UnknownVariable {
            name: name.to_string(),
        })
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &Name> {
        self.values.keys()
    }
}
