//! Runs the selected operation of a request against a [`Schema`].
//!
//! Everything happens inside the single future returned by [`Executor::execute`]: sibling
//! fields and list items are resolved through bounded, order-preserving streams and no task
//! is spawned. Dropping that future cancels every resolver still in flight.

mod collect;
mod context;
mod scope;
mod validation;
mod variables;

use std::sync::Arc;

use tracing::{field, info_span, Instrument, Span};

use crate::{
    config::ExecutorConfig,
    error::{ExecutionError, ExecutionResult},
    request::Request,
    response::Response,
    schema::Schema,
};

use self::context::ExecutionContext;

/// Why a value could not be completed.
pub(crate) enum Abort {
    /// The value is null at a non-null position; the error is already recorded and the
    /// nearest nullable ancestor becomes null.
    NullPropagation,
    /// The whole request fails.
    Fatal(ExecutionError),
}

/// Executes requests against a shared schema.
#[derive(Debug, Clone)]
pub struct Executor {
    schema: Arc<Schema>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(schema: Arc<Schema>) -> Self {
        Executor {
            schema,
            config: ExecutorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes the operation selected by `request`.
    ///
    /// Fails only for request errors (validation and variables), in which case nothing was
    /// executed. Field errors are part of the returned [`Response`].
    pub async fn execute(&self, request: Request) -> ExecutionResult<Response> {
        execute_with_config(&self.schema, &self.config, request).await
    }
}

/// Executes `request` with the default configuration.
pub async fn execute(schema: &Schema, request: Request) -> ExecutionResult<Response> {
    execute_with_config(schema, &ExecutorConfig::default(), request).await
}

pub async fn execute_with_config(
    schema: &Schema,
    config: &ExecutorConfig,
    request: Request,
) -> ExecutionResult<Response> {
    let span = info_span!("execute", "operation.name" = field::Empty, "operation.type" = field::Empty);
    async {
        let ctx = ExecutionContext::new(schema, config, &request).inspect_err(|err| {
            tracing::debug!(error = %err, "Request rejected");
        })?;

        let span = Span::current();
        if let Some(name) = ctx.operation_name() {
            span.record("operation.name", name);
        }
        span.record("operation.type", field::display(ctx.operation_type()));

        ctx.execute().await
    }
    .instrument(span)
    .await
}
