use std::{future::Future, sync::Arc};

use async_graphql_value::{ConstValue, Name};
use futures::future::BoxFuture;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;

use crate::error::ResolverError;

pub type ResolverFuture = BoxFuture<'static, Result<ResolvedValue, ResolverError>>;

/// Invocation adapter of a field resolver, built once with the schema.
pub type ResolverFn = Arc<dyn Fn(ResolverContext) -> ResolverFuture + Send + Sync>;

/// Picks the concrete object type of a value returned for an interface or union field.
pub type TypeResolverFn = Arc<dyn Fn(&ResolvedValue) -> Option<String> + Send + Sync>;

/// How the value of a field is produced.
#[derive(Clone, Default)]
pub enum Resolver {
    /// Reads the property named after the field from the parent value.
    #[default]
    Parent,
    Custom(ResolverFn),
}

impl Resolver {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResolvedValue, ResolverError>> + Send + 'static,
    {
        Resolver::Custom(Arc::new(move |ctx| f(ctx).boxed()))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolver::Parent => f.write_str("Parent"),
            Resolver::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// What a resolver gets to work with: the value of the enclosing object and its coerced
/// arguments.
#[derive(Debug, Clone)]
pub struct ResolverContext {
    pub field_name: Name,
    pub parent: ResolvedValue,
    pub arguments: ArgumentValues,
}

impl ResolverContext {
    /// Deserializes the argument `name` into `T`, `None` when it is null.
    pub fn arg<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ResolverError> {
        self.arguments.get_as(name)
    }
}

/// Coerced argument values, in the order the resolver declared its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentValues(Vec<(Name, ConstValue)>);

impl ArgumentValues {
    pub(crate) fn push(&mut self, name: Name, value: ConstValue) {
        self.0.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.0
            .iter()
            .find(|(argument, _)| argument.as_str() == name)
            .map(|(_, value)| value)
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ResolverError> {
        match self.get(name) {
            None | Some(ConstValue::Null) => Ok(None),
            Some(value) => {
                let json = value.clone().into_json()?;
                Ok(Some(serde_json::from_value(json)?))
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &ConstValue)> {
        self.0.iter().map(|(name, value)| (name, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Native value produced by a resolver.
///
/// Children of an object field receive it as their parent value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValue {
    data_resolved: Arc<serde_json::Value>,
}

impl ResolvedValue {
    pub fn new(value: serde_json::Value) -> Self {
        ResolvedValue {
            data_resolved: Arc::new(value),
        }
    }

    pub fn null() -> Self {
        ResolvedValue::default()
    }

    pub fn data_resolved(&self) -> &serde_json::Value {
        &self.data_resolved
    }

    pub fn is_null(&self) -> bool {
        self.data_resolved.is_null()
    }

    /// Value of the property `name`, null if absent or if this isn't an object.
    pub fn get_field(&self, name: &str) -> ResolvedValue {
        self.data_resolved
            .get(name)
            .cloned()
            .map(ResolvedValue::new)
            .unwrap_or_default()
    }

    pub fn item_iter(&self) -> Option<impl Iterator<Item = ResolvedValue> + '_> {
        self.data_resolved
            .as_array()
            .map(|items| items.iter().cloned().map(ResolvedValue::new))
    }

    /// The `__typename` property, if the value carries one.
    pub fn typename(&self) -> Option<&str> {
        self.data_resolved.get("__typename")?.as_str()
    }

    pub fn take(self) -> serde_json::Value {
        Arc::try_unwrap(self.data_resolved).unwrap_or_else(|value| (*value).clone())
    }
}

impl From<serde_json::Value> for ResolvedValue {
    fn from(value: serde_json::Value) -> Self {
        ResolvedValue::new(value)
    }
}
