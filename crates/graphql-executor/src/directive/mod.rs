//! Directives as data: a registry of immutable specs, each with the locations it may be
//! used at, its arguments, an optional inclusion predicate and an optional resolver wrap.

mod builtin;

use std::sync::Arc;

use async_graphql_value::Name;
use indexmap::IndexMap;

use crate::schema::{ArgumentValues, InputValueDefinition, ResolvedValue, ResolverFuture, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
}

/// Deferred production of a field value. Calling it runs the resolver.
pub type ValueProducer = Box<dyn FnOnce() -> ResolverFuture + Send>;

/// Decides from the coerced arguments whether the selection is kept. An `Err` is reported
/// as an invalid use of the directive.
pub type IncludePredicate = Arc<dyn Fn(&ArgumentValues, &Schema) -> Result<bool, String> + Send + Sync>;

/// Replaces the producer of a field value with another one, given the parent value and
/// the coerced directive arguments.
pub type WrapHook = Arc<dyn Fn(ValueProducer, &ResolvedValue, &ArgumentValues) -> ValueProducer + Send + Sync>;

pub struct DirectiveSpec {
    name: Name,
    description: Option<String>,
    locations: Vec<DirectiveLocation>,
    arguments: Vec<InputValueDefinition>,
    include: Option<IncludePredicate>,
    wrap: Option<WrapHook>,
}

impl std::fmt::Debug for DirectiveSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("locations", &self.locations)
            .field("arguments", &self.arguments)
            .field("include", &self.include.is_some())
            .field("wrap", &self.wrap.is_some())
            .finish_non_exhaustive()
    }
}

impl DirectiveSpec {
    pub fn new(name: &str, locations: impl IntoIterator<Item = DirectiveLocation>) -> Self {
        DirectiveSpec {
            name: Name::new(name),
            description: None,
            locations: locations.into_iter().collect(),
            arguments: Vec::new(),
            include: None,
            wrap: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn include_if(
        mut self,
        predicate: impl Fn(&ArgumentValues, &Schema) -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        self.include = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn wrap_resolver(
        mut self,
        hook: impl Fn(ValueProducer, &ResolvedValue, &ArgumentValues) -> ValueProducer + Send + Sync + 'static,
    ) -> Self {
        self.wrap = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[InputValueDefinition] {
        &self.arguments
    }

    pub(crate) fn arguments_mut(&mut self) -> &mut [InputValueDefinition] {
        &mut self.arguments
    }

    pub fn is_allowed_at(&self, location: DirectiveLocation) -> bool {
        self.locations.contains(&location)
    }

    /// Evaluates the inclusion predicate, a directive without one keeps the selection.
    pub fn includes(&self, arguments: &ArgumentValues, schema: &Schema) -> Result<bool, String> {
        match &self.include {
            Some(predicate) => predicate(arguments, schema),
            None => Ok(true),
        }
    }

    /// Applies the wrap hook, a directive without one returns `producer` unchanged.
    pub fn wrap(&self, producer: ValueProducer, parent: &ResolvedValue, arguments: &ArgumentValues) -> ValueProducer {
        match &self.wrap {
            Some(hook) => hook(producer, parent, arguments),
            None => producer,
        }
    }
}

/// `@skip` and `@include`.
pub(crate) fn builtins() -> [DirectiveSpec; 2] {
    [builtin::skip(), builtin::include()]
}

#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry(IndexMap<Name, Arc<DirectiveSpec>>);

impl DirectiveRegistry {
    pub(crate) fn register(&mut self, directive: DirectiveSpec) {
        self.0.insert(directive.name.clone(), Arc::new(directive));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DirectiveSpec>> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveSpec> {
        self.0.values().map(AsRef::as_ref)
    }
}
