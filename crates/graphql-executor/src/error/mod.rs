mod code;
mod path;

use std::borrow::Cow;

use async_graphql_parser::{types::OperationType, Pos};
use async_graphql_value::ConstValue;

pub use code::*;
pub use path::*;

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Line and column of a node in the executed document, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Everything that can go wrong while executing a request.
///
/// Validation and variable errors are fatal: no data is produced. The remaining kinds are
/// caught at the boundary of the field that raised them and turned into a [`GraphqlError`]
/// next to a null value.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Variable ${name} got an invalid value: {source}")]
    Variable {
        name: String,
        location: Location,
        #[source]
        source: InputValueError,
    },
    #[error(transparent)]
    Coercion(#[from] InputValueError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    UnsupportedConstruct(#[from] UnsupportedConstructError),
}

impl ExecutionError {
    pub fn code(&self) -> ErrorCode {
        self.into()
    }

    /// Whether this error aborts the whole request rather than a single field.
    pub fn is_fatal(&self) -> bool {
        self.code().is_request_error()
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            ExecutionError::Validation(err) => err.location(),
            ExecutionError::Variable { location, .. } => Some(*location),
            ExecutionError::UnsupportedConstruct(err) => err.location,
            ExecutionError::Coercion(_) | ExecutionError::Resolver(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Must provide an operation.")]
    MissingOperation,
    #[error("Must provide operation name if query contains multiple operations.")]
    MissingOperationName,
    #[error("Unknown operation named '{0}'.")]
    UnknownOperation(String),
    #[error("Can only execute queries, found a {ty} operation.")]
    UnsupportedOperation { ty: OperationType, location: Location },
    #[error("Unknown fragment named '{name}'.")]
    UnknownFragment { name: String, location: Location },
    #[error("Fragment '{name}' cannot spread itself.")]
    FragmentCycle { name: String, location: Location },
    #[error("Fragment cannot be spread here as objects of type '{parent}' can never be of type '{type_condition}'.")]
    IncompatibleFragment {
        type_condition: String,
        parent: String,
        location: Location,
    },
    #[error("Unknown type '{name}'.")]
    UnknownType { name: String, location: Location },
    #[error("Cannot query field '{name}' on type '{parent}'.")]
    UnknownField {
        name: String,
        parent: String,
        location: Location,
    },
    #[error("Field '{name}' of type '{ty}' must have a selection of subfields.")]
    MissingSelectionSet { name: String, ty: String, location: Location },
    #[error("Field '{name}' must not have a selection since type '{ty}' has no subfields.")]
    LeafSelectionSet { name: String, ty: String, location: Location },
    #[error("Unknown directive '@{name}'.")]
    UnknownDirective { name: String, location: Location },
    #[error("Directive '@{name}' may not be used on {directive_location}.")]
    MisplacedDirective {
        name: String,
        directive_location: crate::directive::DirectiveLocation,
        location: Location,
    },
    #[error("Invalid usage of directive '@{name}': {message}")]
    InvalidDirective {
        name: String,
        message: String,
        location: Location,
    },
    #[error("Variable ${name} cannot be of non-input type '{ty}'.")]
    NonInputVariable { name: String, ty: String, location: Location },
    #[error("Query is nested too deep, the maximum depth is {max_depth}.")]
    TooDeep { max_depth: usize, location: Location },
}

impl ValidationError {
    pub fn location(&self) -> Option<Location> {
        match self {
            ValidationError::MissingOperation
            | ValidationError::MissingOperationName
            | ValidationError::UnknownOperation(_) => None,
            ValidationError::UnsupportedOperation { location, .. }
            | ValidationError::UnknownFragment { location, .. }
            | ValidationError::FragmentCycle { location, .. }
            | ValidationError::IncompatibleFragment { location, .. }
            | ValidationError::UnknownType { location, .. }
            | ValidationError::UnknownField { location, .. }
            | ValidationError::MissingSelectionSet { location, .. }
            | ValidationError::LeafSelectionSet { location, .. }
            | ValidationError::UnknownDirective { location, .. }
            | ValidationError::MisplacedDirective { location, .. }
            | ValidationError::InvalidDirective { location, .. }
            | ValidationError::NonInputVariable { location, .. }
            | ValidationError::TooDeep { location, .. } => Some(*location),
        }
    }
}

/// A value that could not be coerced into the type it was declared with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InputValueError {
    #[error("Found a null where we expected a {expected}{path}")]
    UnexpectedNull { expected: String, path: ValuePath },
    #[error("Found a {actual} value where we expected a {expected} scalar{path}")]
    IncorrectScalarType {
        actual: ValueKind,
        expected: String,
        path: ValuePath,
    },
    #[error("Found value {actual} which cannot be coerced into a {expected} scalar{path}")]
    IncorrectScalarValue {
        actual: String,
        expected: String,
        path: ValuePath,
    },
    #[error("Found a {actual} value where we expected a {r#enum} enum value{path}")]
    IncorrectEnumValueType {
        r#enum: String,
        actual: ValueKind,
        path: ValuePath,
    },
    #[error("Unknown enum value '{value}' for enum {r#enum}{path}")]
    UnknownEnumValue {
        r#enum: String,
        value: String,
        path: ValuePath,
    },
    #[error("Type '{name}' is not a known input type{path}")]
    UnknownInputType { name: String, path: ValuePath },
    #[error("Unknown variable ${name}")]
    UnknownVariable { name: String },
    #[error("Missing required argument '{name}' of type {expected}")]
    MissingArgument { name: String, expected: String },
    #[error("Unknown argument '{name}'")]
    UnknownArgument { name: String },
    #[error("Invalid value for argument '{name}': {source}")]
    InvalidArgument {
        name: String,
        #[source]
        source: Box<InputValueError>,
    },
}

/// Position inside a (possibly nested) input value, rendered as ` at path '.0.1'`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(Vec<usize>);

impl ValuePath {
    pub(crate) fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl std::fmt::Display for ValuePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(" at path '")?;
        for index in &self.0 {
            write!(f, ".{index}")?;
        }
        f.write_str("'")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ValueKind {
    String,
    Integer,
    Enum,
    Float,
    Object,
    Boolean,
    List,
    Null,
    Binary,
}

impl From<&ConstValue> for ValueKind {
    fn from(value: &ConstValue) -> Self {
        match value {
            ConstValue::Null => ValueKind::Null,
            ConstValue::Number(number) if number.is_f64() => ValueKind::Float,
            ConstValue::Number(_) => ValueKind::Integer,
            ConstValue::String(_) => ValueKind::String,
            ConstValue::Boolean(_) => ValueKind::Boolean,
            ConstValue::Binary(_) => ValueKind::Binary,
            ConstValue::Enum(_) => ValueKind::Enum,
            ConstValue::List(_) => ValueKind::List,
            ConstValue::Object(_) => ValueKind::Object,
        }
    }
}

/// Failure reported by a field resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResolverError {
    message: Cow<'static, str>,
}

impl ResolverError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        ResolverError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        ResolverError::new(message)
    }
}

impl From<&'static str> for ResolverError {
    fn from(message: &'static str) -> Self {
        ResolverError::new(message)
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        ResolverError::new(err.to_string())
    }
}

/// A document construct this executor does not implement.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{construct} are not supported by this executor.")]
pub struct UnsupportedConstructError {
    pub construct: &'static str,
    pub location: Option<Location>,
}

/// An error as it appears in the `errors` list of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlError {
    pub message: Cow<'static, str>,
    pub code: ErrorCode,
    pub locations: Vec<Location>,
    pub path: Option<ErrorPath>,
}

impl GraphqlError {
    pub fn new(message: impl Into<Cow<'static, str>>, code: ErrorCode) -> Self {
        GraphqlError {
            message: message.into(),
            code,
            locations: Vec::new(),
            path: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<Location>) -> Self {
        self.locations.push(location.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: ErrorPath) -> Self {
        self.path = Some(path);
        self
    }
}

impl From<ExecutionError> for GraphqlError {
    fn from(err: ExecutionError) -> Self {
        let location = err.location();
        let mut error = GraphqlError::new(err.to_string(), err.code());
        error.locations.extend(location);
        error
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl serde::Serialize for GraphqlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        #[derive(serde::Serialize)]
        struct Extensions {
            code: ErrorCode,
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", &self.message)?;
        if !self.locations.is_empty() {
            map.serialize_entry("locations", &self.locations)?;
        }
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        map.serialize_entry("extensions", &Extensions { code: self.code })?;
        map.end()
    }
}
