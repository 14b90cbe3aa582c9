//! Per-request options.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Every recognized knob for [`optimized_request`], fully enumerated with
/// its default. There are deliberately no catch-all fields.
///
/// [`optimized_request`]: crate::request::RequestCoordinator::optimized_request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method; part of the request fingerprint.
    pub method: String,
    /// JSON body; part of the request fingerprint.
    pub body: Option<Value>,
    /// Extra headers. Not part of the fingerprint.
    pub headers: HashMap<String, String>,
    /// Cache lifetime for this call's result; the store default applies
    /// when unset.
    pub ttl: Option<Duration>,
    /// Invalidation tags attached to the cached result.
    pub tags: HashSet<String>,
    /// Retry budget override; the coordinator's policy default applies
    /// when unset.
    pub max_retries: Option<u32>,
    /// This caller's cancellation token. Canceling it aborts only this
    /// caller's wait; shared transport dies only with its last waiter.
    pub cancel: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            body: None,
            headers: HashMap::new(),
            ttl: None,
            tags: HashSet::new(),
            max_retries: None,
            cancel: None,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
