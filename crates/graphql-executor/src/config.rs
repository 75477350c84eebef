#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Maximum number of sibling fields or list items resolved concurrently within one
    /// selection set. 1 resolves them one after the other. 32 by default.
    pub concurrency_limit: usize,
    /// Maximum nesting of fields in an operation, fragments included. Unlimited by default.
    pub max_depth: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 32,
            max_depth: None,
        }
    }
}

impl ExecutorConfig {
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency_limit.max(1)
    }
}
