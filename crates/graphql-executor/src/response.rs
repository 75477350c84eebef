use async_graphql_value::ConstValue;

use crate::error::{ExecutionError, GraphqlError};

/// Result of executing a request.
///
/// `data` is absent only when the request failed before execution started. A null that
/// propagated up to the root produces `Some(ConstValue::Null)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ConstValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl Response {
    pub fn new(data: ConstValue, errors: Vec<GraphqlError>) -> Self {
        Response {
            data: Some(data),
            errors,
        }
    }

    pub fn from_errors(errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        Response {
            data: None,
            errors: errors.into_iter().collect(),
        }
    }

    /// Converts the response into the JSON that would be sent over the wire.
    pub fn into_json(self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl From<ExecutionError> for Response {
    fn from(err: ExecutionError) -> Self {
        Response::from_errors([GraphqlError::from(err)])
    }
}
