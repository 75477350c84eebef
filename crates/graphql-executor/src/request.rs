use std::{collections::BTreeMap, ops::Deref};

use async_graphql_parser::types::ExecutableDocument;
use async_graphql_value::{ConstValue, Name};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::ResolvedValue;

/// Variables supplied with a request, keyed by declared variable name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<Name, ConstValue>);

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(
            <Option<BTreeMap<Name, ConstValue>>>::deserialize(deserializer)?.unwrap_or_default(),
        ))
    }
}

impl Variables {
    /// Entries of an object value, empty for anything else.
    #[must_use]
    pub fn from_value(value: ConstValue) -> Self {
        match value {
            ConstValue::Object(obj) => Self(obj.into_iter().collect()),
            _ => Self::default(),
        }
    }

    /// Entries of a JSON object, empty for anything else.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        ConstValue::from_json(value).map(Self::from_value).unwrap_or_default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<ConstValue>) -> Self {
        self.0.insert(Name::new(name), value.into());
        self
    }
}

impl Deref for Variables {
    type Target = BTreeMap<Name, ConstValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A parsed document together with what is needed to pick and run one of its operations.
#[derive(Debug, Clone)]
pub struct Request {
    pub document: ExecutableDocument,
    pub operation_name: Option<String>,
    pub variables: Variables,
    /// Parent value of the root fields.
    pub root_value: ResolvedValue,
}

impl Request {
    pub fn new(document: ExecutableDocument) -> Self {
        Request {
            document,
            operation_name: None,
            variables: Variables::default(),
            root_value: ResolvedValue::null(),
        }
    }

    /// Parses `query` with the GraphQL parser and wraps the resulting document.
    pub fn parse(query: impl AsRef<str>) -> Result<Self, async_graphql_parser::Error> {
        async_graphql_parser::parse_query(query).map(Self::new)
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_root_value(mut self, root_value: impl Into<ResolvedValue>) -> Self {
        self.root_value = root_value.into();
        self
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }
}
