use serde::{Serialize, Deserialize};
use crate::error::{ScoutResult, ScoutError};

/// What the builder does when a single corpus item cannot be read or embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole build on the first failing item. Nothing is written.
    Strict,
    /// Skip the item, record it in the failure report and keep going.
    Lenient,
}

/// Parameters for one run of the embedding builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Only index the first `limit` corpus items.
    pub limit: Option<usize>,
    /// Recompute the index even if the stored one already covers the corpus.
    pub force: bool,
    pub failure_policy: FailurePolicy,
    /// Number of decoded images handed to the embedder per call.
    pub batch_size: usize,
}

impl BuildConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> ScoutResult<()> {
        if self.batch_size == 0 {
            return Err(ScoutError::Configuration("batch_size must be greater than 0".to_string()));
        }
        if self.limit == Some(0) {
            return Err(ScoutError::Configuration("limit must be greater than 0 when set".to_string()));
        }
        Ok(())
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            limit: None,
            force: false,
            failure_policy: FailurePolicy::Lenient,
            batch_size: 32,
        }
    }
}
