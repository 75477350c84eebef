use std::sync::Arc;

use async_graphql_parser::{
    types::{BaseType, Field, Type},
    Pos, Positioned,
};
use async_graphql_value::{ConstValue, Name};
use futures::{
    future::{self, BoxFuture},
    stream, StreamExt,
};
use futures_util::FutureExt;
use indexmap::IndexMap;

use super::{
    collect::{CollectedFields, FieldCollector},
    context::ExecutionContext,
    Abort,
};
use crate::{
    directive::ValueProducer,
    error::{ErrorCode, ErrorPath, ExecutionError, GraphqlError, ResolverError, ValidationError},
    schema::{FieldDefinition, MetaType, ObjectType, ResolvedValue, Resolver, ResolverContext},
};

/// Resolves the fields of one object value.
pub(crate) struct FieldScope<'a> {
    ctx: &'a ExecutionContext<'a>,
    object: &'a ObjectType,
    value: ResolvedValue,
    path: ErrorPath,
}

impl<'a> FieldScope<'a> {
    pub(crate) fn new(ctx: &'a ExecutionContext<'a>, object: &'a ObjectType, value: ResolvedValue, path: ErrorPath) -> Self {
        FieldScope {
            ctx,
            object,
            value,
            path,
        }
    }

    /// Resolves every collected field, at most `concurrency_limit` at a time. Keys and
    /// errors keep the collection order whatever order the resolvers finish in.
    pub(crate) async fn get_object(
        &self,
        fields: CollectedFields<'a>,
        errors: &mut Vec<GraphqlError>,
    ) -> Result<ConstValue, Abort> {
        let futures: Vec<_> = fields
            .into_iter()
            .map(move |(key, nodes)| async move {
                let mut field_errors = Vec::new();
                let value = self.resolve_field(&key, &nodes, &mut field_errors).await;
                (key, value, field_errors)
            })
            .collect();
        let resolved = stream::iter(futures)
            .buffered(self.ctx.config.effective_concurrency())
            .collect::<Vec<_>>()
            .await;

        let mut object = IndexMap::with_capacity(resolved.len());
        let mut null_propagated = false;
        for (key, value, field_errors) in resolved {
            errors.extend(field_errors);
            match value {
                Ok(value) => {
                    object.insert(key, value);
                }
                Err(Abort::NullPropagation) => null_propagated = true,
                Err(fatal @ Abort::Fatal(_)) => return Err(fatal),
            }
        }

        if null_propagated {
            return Err(Abort::NullPropagation);
        }
        Ok(ConstValue::Object(object))
    }

    async fn resolve_field(
        &self,
        key: &Name,
        nodes: &[&'a Positioned<Field>],
        errors: &mut Vec<GraphqlError>,
    ) -> Result<ConstValue, Abort> {
        let Some(node) = nodes.first().copied() else {
            return Ok(ConstValue::Null);
        };
        let name = &node.node.name.node;
        let path = self.path.child(key);

        if name.as_str() == "__typename" {
            return self.resolve_typename(node, path, errors).await;
        }

        let Some(field) = self.object.field_by_name(name) else {
            return Err(Abort::Fatal(
                ValidationError::UnknownField {
                    name: name.to_string(),
                    parent: self.object.name().to_string(),
                    location: node.pos.into(),
                }
                .into(),
            ));
        };

        tracing::trace!(path = %path, "Resolving field");
        let value = match self.produce_value(field, node).await {
            Ok(value) => value,
            Err(err) if err.is_fatal() => return Err(Abort::Fatal(err)),
            Err(err) => {
                errors.push(field_error(err, node.pos, &path));
                return null_or_propagate(field.ty());
            }
        };

        self.complete_value(field, field.ty(), nodes, value, path, errors).await
    }

    /// `__typename` goes through the wrapping directives of the field like any other field.
    async fn resolve_typename(
        &self,
        node: &'a Positioned<Field>,
        path: ErrorPath,
        errors: &mut Vec<GraphqlError>,
    ) -> Result<ConstValue, Abort> {
        let typename = ResolvedValue::new(serde_json::Value::String(self.object.name().to_string()));
        let producer: ValueProducer = Box::new(move || future::ready(Ok::<_, ResolverError>(typename)).boxed());

        let value = match self.run_producer(producer, node).await {
            Ok(value) => value,
            Err(err) if err.is_fatal() => return Err(Abort::Fatal(err)),
            Err(err) => {
                errors.push(field_error(err, node.pos, &path));
                return Err(Abort::NullPropagation);
            }
        };

        match value.take() {
            serde_json::Value::String(typename) => Ok(ConstValue::String(typename)),
            other => {
                errors.push(
                    GraphqlError::new(
                        format!("String! cannot represent value of {}.__typename: {other}", self.object.name()),
                        ErrorCode::ResolverError,
                    )
                    .with_location(node.pos)
                    .with_path(path),
                );
                Err(Abort::NullPropagation)
            }
        }
    }

    /// Binds the arguments, lets the field directives wrap the resolver and runs it.
    async fn produce_value(
        &self,
        field: &'a FieldDefinition,
        node: &'a Positioned<Field>,
    ) -> Result<ResolvedValue, ExecutionError> {
        let arguments = self
            .ctx
            .fetch_argument_values(field.arguments(), &node.node.arguments)?;

        let producer: ValueProducer = match field.resolver() {
            Resolver::Parent => {
                let value = self.value.get_field(field.name());
                Box::new(move || future::ready(Ok::<_, ResolverError>(value)).boxed())
            }
            Resolver::Custom(resolver) => {
                let resolver = Arc::clone(resolver);
                let context = ResolverContext {
                    field_name: Name::new(field.name()),
                    parent: self.value.clone(),
                    arguments: arguments.clone(),
                };
                Box::new(move || resolver(context))
            }
        };
        self.run_producer(producer, node).await
    }

    async fn run_producer(
        &self,
        producer: ValueProducer,
        node: &'a Positioned<Field>,
    ) -> Result<ResolvedValue, ExecutionError> {
        let producer = self.ctx.wrap_producer(producer, &self.value, &node.node.directives)?;
        Ok(producer().await?)
    }

    /// Shapes `value` after `ty`. A null that can't be kept at this position is returned
    /// as [`Abort::NullPropagation`] for the parent to handle.
    fn complete_value<'s>(
        &'s self,
        field: &'a FieldDefinition,
        ty: &'a Type,
        nodes: &'s [&'a Positioned<Field>],
        value: ResolvedValue,
        path: ErrorPath,
        errors: &'s mut Vec<GraphqlError>,
    ) -> BoxFuture<'s, Result<ConstValue, Abort>> {
        async move {
            let pos = nodes.first().map(|node| node.pos).unwrap_or_default();

            let completed = if value.is_null() {
                if !ty.nullable {
                    errors.push(
                        GraphqlError::new(
                            format!(
                                "Cannot return null for non-nullable field {}.{}.",
                                self.object.name(),
                                field.name()
                            ),
                            ErrorCode::ResolverError,
                        )
                        .with_location(pos)
                        .with_path(path),
                    );
                }
                Err(Abort::NullPropagation)
            } else {
                match &ty.base {
                    BaseType::List(item_ty) => self.complete_list(field, item_ty, nodes, value, path, errors).await,
                    BaseType::Named(name) => match self.ctx.schema.get(name) {
                        None => Err(Abort::Fatal(
                            ValidationError::UnknownType {
                                name: name.to_string(),
                                location: pos.into(),
                            }
                            .into(),
                        )),
                        Some(MetaType::Object(object)) => self.complete_object(object, nodes, value, path, errors).await,
                        Some(meta) if meta.is_abstract() => {
                            self.complete_abstract(field, meta, nodes, value, path, errors).await
                        }
                        Some(meta) => {
                            match self
                                .ctx
                                .schema
                                .translator()
                                .serialize_leaf(self.ctx.schema, meta, value.take())
                            {
                                Ok(value) => Ok(value),
                                Err(message) => {
                                    errors.push(
                                        GraphqlError::new(message, ErrorCode::ResolverError)
                                            .with_location(pos)
                                            .with_path(path),
                                    );
                                    Err(Abort::NullPropagation)
                                }
                            }
                        }
                    },
                }
            };

            match completed {
                Err(Abort::NullPropagation) if ty.nullable => Ok(ConstValue::Null),
                completed => completed,
            }
        }
        .boxed()
    }

    async fn complete_list(
        &self,
        field: &'a FieldDefinition,
        item_ty: &'a Type,
        nodes: &[&'a Positioned<Field>],
        value: ResolvedValue,
        path: ErrorPath,
        errors: &mut Vec<GraphqlError>,
    ) -> Result<ConstValue, Abort> {
        let Some(items) = value.item_iter().map(Iterator::collect::<Vec<_>>) else {
            let pos = nodes.first().map(|node| node.pos).unwrap_or_default();
            errors.push(
                GraphqlError::new(
                    format!(
                        "Expected a list for field {}.{}, found: {}",
                        self.object.name(),
                        field.name(),
                        value.data_resolved()
                    ),
                    ErrorCode::ResolverError,
                )
                .with_location(pos)
                .with_path(path),
            );
            return Err(Abort::NullPropagation);
        };

        let completed = stream::iter(items.into_iter().enumerate().map(move |(index, item)| {
            let path = path.child(index);
            async move {
                let mut item_errors = Vec::new();
                let value = self
                    .complete_value(field, item_ty, nodes, item, path, &mut item_errors)
                    .await;
                (value, item_errors)
            }
        }))
        .buffered(self.ctx.config.effective_concurrency())
        .collect::<Vec<_>>()
        .await;

        let mut list = Vec::with_capacity(completed.len());
        let mut null_propagated = false;
        for (value, item_errors) in completed {
            errors.extend(item_errors);
            match value {
                Ok(value) => list.push(value),
                Err(Abort::NullPropagation) => null_propagated = true,
                Err(fatal @ Abort::Fatal(_)) => return Err(fatal),
            }
        }

        if null_propagated {
            return Err(Abort::NullPropagation);
        }
        Ok(ConstValue::List(list))
    }

    async fn complete_object(
        &self,
        object: &'a ObjectType,
        nodes: &[&'a Positioned<Field>],
        value: ResolvedValue,
        path: ErrorPath,
        errors: &mut Vec<GraphqlError>,
    ) -> Result<ConstValue, Abort> {
        let fields = FieldCollector::new(self.ctx)
            .collect(object, nodes.iter().map(|&node| &node.node.selection_set))
            .map_err(Abort::Fatal)?;

        FieldScope::new(self.ctx, object, value, path)
            .get_object(fields, errors)
            .await
    }

    /// Finds the concrete object type of a value typed as an interface or union, from its
    /// `__typename` or else from the type resolver of the abstract type.
    async fn complete_abstract(
        &self,
        field: &'a FieldDefinition,
        ty: &'a MetaType,
        nodes: &[&'a Positioned<Field>],
        value: ResolvedValue,
        path: ErrorPath,
        errors: &mut Vec<GraphqlError>,
    ) -> Result<ConstValue, Abort> {
        let schema = self.ctx.schema;
        let typename = value
            .typename()
            .map(str::to_string)
            .or_else(|| ty.type_resolver().and_then(|resolve| resolve(&value)));

        let message = match typename.as_deref().map(|name| (name, schema.object(name))) {
            Some((_, Some(object))) if schema.is_possible_type(ty.name(), object.name()) => {
                return self.complete_object(object, nodes, value, path, errors).await;
            }
            Some((name, _)) => format!("Runtime object type '{name}' is not a possible type for '{}'.", ty.name()),
            None => format!(
                "Abstract type '{}' must resolve to an object type at runtime for field {}.{}.",
                ty.name(),
                self.object.name(),
                field.name()
            ),
        };

        let pos = nodes.first().map(|node| node.pos).unwrap_or_default();
        errors.push(
            GraphqlError::new(message, ErrorCode::ResolverError)
                .with_location(pos)
                .with_path(path),
        );
        Err(Abort::NullPropagation)
    }
}

fn null_or_propagate(ty: &Type) -> Result<ConstValue, Abort> {
    if ty.nullable {
        Ok(ConstValue::Null)
    } else {
        Err(Abort::NullPropagation)
    }
}

fn field_error(err: ExecutionError, pos: Pos, path: &ErrorPath) -> GraphqlError {
    let mut error = GraphqlError::from(err).with_path(path.clone());
    if error.locations.is_empty() {
        error = error.with_location(pos);
    }
    error
}
