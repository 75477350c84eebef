//! Executes GraphQL query documents against a schema whose fields are bound to async
//! resolvers.
//!
//! ```ignore
//! let schema = Schema::build("Query")
//!     .register(ObjectType::new("Query").field(
//!         FieldDefinition::new("hello", "String!").resolve(|_| async { Ok(json!("world").into()) }),
//!     ))
//!     .finish()?;
//! let response = execute(&schema, Request::parse("{ hello }")?).await?;
//! ```

mod config;
pub mod directive;
pub mod error;
mod execution;
mod request;
mod response;
pub mod schema;

#[cfg(test)]
mod tests;

pub use async_graphql_parser as parser;
pub use async_graphql_value::{ConstValue, Name};
pub use config::ExecutorConfig;
pub use directive::{DirectiveLocation, DirectiveRegistry, DirectiveSpec, ValueProducer};
pub use error::{ErrorCode, ErrorPath, ExecutionError, GraphqlError};
pub use execution::{execute, execute_with_config, Executor};
pub use request::{Request, Variables};
pub use response::Response;
pub use schema::{
    ArgumentValues, EnumType, FieldDefinition, InputValueDefinition, InterfaceType, ObjectType, ResolvedValue,
    Resolver, ResolverContext, ScalarType, Schema, SchemaBuilder, SchemaError, TypeTranslator, UnionType,
};
