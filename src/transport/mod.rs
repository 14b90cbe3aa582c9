//! Network transport seam.
//!
//! The coordinator talks to the network exclusively through the
//! [`Transport`] trait, so tests can substitute counting or failing
//! implementations without a server.

mod http;

pub use http::HttpTransport;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// One fully-described network operation.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
}

impl TransportRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: None,
            headers: HashMap::new(),
        }
    }
}

/// A single network attempt. Implementations classify failures into the
/// crate error taxonomy and never retry internally; retry policy lives in
/// [`crate::request::RetryPolicy`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &TransportRequest) -> Result<Value>;

    fn name(&self) -> &'static str;
}
