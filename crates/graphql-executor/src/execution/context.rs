use std::collections::HashMap;

use async_graphql_parser::{
    types::{Directive, DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition, OperationType},
    Pos, Positioned,
};
use async_graphql_value::{ConstValue, Name, Value};
use itertools::Itertools;

use super::{
    collect::FieldCollector, scope::FieldScope, validation::OperationWalker, variables::VariableResolver, Abort,
};
use crate::{
    config::ExecutorConfig,
    directive::{DirectiveLocation, DirectiveSpec, ValueProducer},
    error::{ErrorPath, ExecutionError, InputValueError, UnsupportedConstructError, ValidationError},
    request::Request,
    response::Response,
    schema::{ArgumentValues, InputValueDefinition, ObjectType, ResolvedValue, Schema},
};

/// Per-request state: the selected operation, its coerced variables and the fragments of
/// the document. Nothing in it changes once built.
pub(crate) struct ExecutionContext<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) config: &'a ExecutorConfig,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    operation_name: Option<&'a Name>,
    operation: &'a Positioned<OperationDefinition>,
    variables: VariableResolver,
    root_value: &'a ResolvedValue,
}

/// A directive occurrence with its coerced arguments.
pub(crate) struct BoundDirective<'a> {
    pub(crate) spec: &'a DirectiveSpec,
    pub(crate) arguments: ArgumentValues,
    pub(crate) pos: Pos,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(schema: &'a Schema, config: &'a ExecutorConfig, request: &'a Request) -> Result<Self, ExecutionError> {
        let (operation_name, operation) = select_operation(&request.document, request.operation_name())?;

        let mut ctx = ExecutionContext {
            schema,
            config,
            fragments: &request.document.fragments,
            operation_name,
            operation,
            variables: VariableResolver::default(),
            root_value: &request.root_value,
        };
        ctx.root_type()?;

        ctx.variables = VariableResolver::new(schema, &operation.node.variable_definitions, &request.variables)?;
        tracing::debug!(
            operation.name = operation_name.map(Name::as_str),
            variables = %ctx.variables.names().join(", "),
            "Operation selected"
        );

        ctx.resolve_directives(&operation.node.directives, DirectiveLocation::Query)?;
        for definition in &operation.node.variable_definitions {
            ctx.resolve_directives(&definition.node.directives, DirectiveLocation::VariableDefinition)?;
        }

        let depth = OperationWalker::new(&ctx).walk_operation()?;
        tracing::debug!(depth, "Operation validated");

        Ok(ctx)
    }

    pub(crate) fn operation_name(&self) -> Option<&'a str> {
        self.operation_name.map(Name::as_str)
    }

    pub(crate) fn operation_type(&self) -> OperationType {
        self.operation.node.ty
    }

    pub(crate) fn operation_location(&self) -> Pos {
        self.operation.pos
    }

    pub(crate) fn operation(&self) -> &'a OperationDefinition {
        &self.operation.node
    }

    /// Only queries are executed.
    pub(crate) fn root_type(&self) -> Result<&'a ObjectType, ValidationError> {
        match self.operation.node.ty {
            OperationType::Query => self.schema.query_type().ok_or_else(|| ValidationError::UnknownType {
                name: self.schema.query_type_name().to_string(),
                location: self.operation.pos.into(),
            }),
            ty => Err(ValidationError::UnsupportedOperation {
                ty,
                location: self.operation.pos.into(),
            }),
        }
    }

    pub(crate) fn fragment(&self, name: &str) -> Option<&'a Positioned<FragmentDefinition>> {
        self.fragments.get(name)
    }

    pub(crate) async fn execute(&self) -> Result<Response, ExecutionError> {
        let root = self.root_type()?;
        let fields = FieldCollector::new(self).collect(root, [&self.operation.node.selection_set])?;
        let scope = FieldScope::new(self, root, self.root_value.clone(), ErrorPath::default());

        let mut errors = Vec::new();
        let data = match scope.get_object(fields, &mut errors).await {
            Ok(data) => data,
            Err(Abort::NullPropagation) => ConstValue::Null,
            Err(Abort::Fatal(err)) => return Err(err),
        };
        tracing::debug!(errors = errors.len(), "Operation executed");

        Ok(Response::new(data, errors))
    }

    /// Native value of a document value: literals through the translator, lists element by
    /// element and variables from the coerced variable values.
    pub(crate) fn get_value(&self, value: &Value, pos: Pos) -> Result<ConstValue, ExecutionError> {
        if let Some(value) = self.schema.translator().literal_value(value) {
            return Ok(value);
        }
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| self.get_value(item, pos))
                .collect::<Result<Vec<_>, _>>()
                .map(ConstValue::List),
            Value::Variable(name) => Ok(self.variables.get(name)?.clone()),
            Value::Object(_) => Err(UnsupportedConstructError {
                construct: "Object values",
                location: Some(pos.into()),
            }
            .into()),
            _ => Err(UnsupportedConstructError {
                construct: "Values of this kind",
                location: Some(pos.into()),
            }
            .into()),
        }
    }

    /// Coerces the document arguments into the declared parameters, in declaration order.
    pub(crate) fn fetch_argument_values(
        &self,
        parameters: &[InputValueDefinition],
        arguments: &[(Positioned<Name>, Positioned<Value>)],
    ) -> Result<ArgumentValues, ExecutionError> {
        if let Some((unknown, _)) = arguments
            .iter()
            .find(|(name, _)| !parameters.iter().any(|parameter| parameter.name == name.node))
        {
            return Err(InputValueError::UnknownArgument {
                name: unknown.node.to_string(),
            }
            .into());
        }

        let mut values = ArgumentValues::default();
        for parameter in parameters {
            let supplied = arguments.iter().find(|(name, _)| name.node == parameter.name);
            let value = match (supplied, &parameter.default_value) {
                (Some((_, value)), _) => {
                    let value = self.get_value(&value.node, value.pos)?;
                    self.schema
                        .translator()
                        .coerce_input(self.schema, &parameter.ty, value)
                        .map_err(|source| InputValueError::InvalidArgument {
                            name: parameter.name.to_string(),
                            source: Box::new(source),
                        })?
                }
                // Coerced when the schema was built.
                (None, Some(default)) => default.clone(),
                (None, None) if parameter.ty.nullable => ConstValue::Null,
                (None, None) => {
                    return Err(InputValueError::MissingArgument {
                        name: parameter.name.to_string(),
                        expected: parameter.ty.to_string(),
                    }
                    .into())
                }
            };
            values.push(parameter.name.clone(), value);
        }

        Ok(values)
    }

    /// Looks up every directive and coerces its arguments. Unknown directives, directives
    /// used where they aren't allowed and invalid arguments abort the request.
    pub(crate) fn resolve_directives(
        &self,
        directives: &[Positioned<Directive>],
        location: DirectiveLocation,
    ) -> Result<Vec<BoundDirective<'a>>, ExecutionError> {
        directives
            .iter()
            .map(|Positioned { pos, node: directive }| {
                let name = &directive.name.node;
                let Some(spec) = self.schema.directives().get(name) else {
                    return Err(ValidationError::UnknownDirective {
                        name: name.to_string(),
                        location: (*pos).into(),
                    }
                    .into());
                };
                if !spec.is_allowed_at(location) {
                    return Err(ValidationError::MisplacedDirective {
                        name: name.to_string(),
                        directive_location: location,
                        location: (*pos).into(),
                    }
                    .into());
                }
                let arguments = self
                    .fetch_argument_values(spec.arguments(), &directive.arguments)
                    .map_err(|err| ValidationError::InvalidDirective {
                        name: name.to_string(),
                        message: err.to_string(),
                        location: (*pos).into(),
                    })?;
                Ok(BoundDirective {
                    spec: spec.as_ref(),
                    arguments,
                    pos: *pos,
                })
            })
            .collect()
    }

    /// Logical AND of the inclusion predicates of `directives`.
    pub(crate) fn is_included(
        &self,
        directives: &[Positioned<Directive>],
        location: DirectiveLocation,
    ) -> Result<bool, ExecutionError> {
        let mut included = true;
        for directive in self.resolve_directives(directives, location)? {
            included &= directive
                .spec
                .includes(&directive.arguments, self.schema)
                .map_err(|message| ValidationError::InvalidDirective {
                    name: directive.spec.name().to_string(),
                    message,
                    location: directive.pos.into(),
                })?;
        }
        Ok(included)
    }

    /// Lets every wrapping directive of a field replace its value producer, in document
    /// order: the first directive wraps the resolver, the next wraps the result and so on.
    pub(crate) fn wrap_producer(
        &self,
        producer: ValueProducer,
        parent: &ResolvedValue,
        directives: &[Positioned<Directive>],
    ) -> Result<ValueProducer, ExecutionError> {
        Ok(self
            .resolve_directives(directives, DirectiveLocation::Field)?
            .into_iter()
            .fold(producer, |producer, directive| {
                directive.spec.wrap(producer, parent, &directive.arguments)
            }))
    }
}

fn select_operation<'d>(
    document: &'d ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<(Option<&'d Name>, &'d Positioned<OperationDefinition>), ValidationError> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), None) => Ok((None, operation)),
        (DocumentOperations::Single(_), Some(name)) => Err(ValidationError::UnknownOperation(name.to_string())),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .get_key_value(name)
            .map(|(name, operation)| (Some(name), operation))
            .ok_or_else(|| ValidationError::UnknownOperation(name.to_string())),
        (DocumentOperations::Multiple(operations), None) => {
            let mut operations = operations.iter();
            match (operations.next(), operations.next()) {
                (Some((name, operation)), None) => Ok((Some(name), operation)),
                (None, _) => Err(ValidationError::MissingOperation),
                (Some(_), Some(_)) => Err(ValidationError::MissingOperationName),
            }
        }
    }
}
