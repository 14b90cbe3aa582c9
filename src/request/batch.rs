//! Batch execution over the coordinator.

use super::coordinator::RequestCoordinator;
use super::options::RequestOptions;
use crate::Result;
use serde_json::Value;

/// One element of a [`RequestCoordinator::batch_request`] call.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub url: String,
    pub options: RequestOptions,
}

impl BatchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl RequestCoordinator {
    /// Issue every request concurrently and return settled results in input
    /// order. Each element goes through [`optimized_request`], so duplicate
    /// fingerprints within one batch still share a single transport.
    ///
    /// [`optimized_request`]: RequestCoordinator::optimized_request
    pub async fn batch_request(&self, requests: Vec<BatchRequest>) -> Vec<Result<Value>> {
        let futures: Vec<_> = requests
            .iter()
            .map(|req| self.optimized_request(&req.url, req.options.clone()))
            .collect();
        futures::future::join_all(futures).await
    }
}
