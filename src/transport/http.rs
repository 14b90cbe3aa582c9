use super::{Transport, TransportRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// reqwest-backed transport with response classification.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let timeout = Duration::from_secs(
            env::var("REQCACHE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(
                env::var("REQCACHE_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(30),
        }
    }

    fn classify_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else if e.is_builder() {
            Error::Configuration(e.to_string())
        } else {
            Error::TransientNetwork(e.to_string())
        }
    }

    /// Pull a human-readable message out of an error body. Providers differ;
    /// we check the common `{"error": {"message": ...}}` and `{"message": ...}`
    /// shapes before falling back to the raw body.
    fn error_message_from_body(body: &str) -> String {
        if let Ok(json) = serde_json::from_str::<Value>(body) {
            if let Some(msg) = json
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
            {
                return msg.to_string();
            }
            if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
        body.to_string()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &TransportRequest) -> Result<Value> {
        let client_request_id = Uuid::new_v4().to_string();

        let mut req = match request.method.to_uppercase().as_str() {
            "POST" => self.client.post(&request.url),
            "PUT" => self.client.put(&request.url),
            "PATCH" => self.client.patch(&request.url),
            "DELETE" => self.client.delete(&request.url),
            _ => self.client.get(&request.url),
        };

        if let Some(body) = &request.body {
            req = req.json(body);
        }
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }
        // Correlation id so applications can link logs to responses.
        req = req.header("x-request-id", &client_request_id);

        let resp = req.send().await.map_err(|e| self.classify_send_error(e))?;
        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = Self::error_message_from_body(&body);
            debug!(
                http_status = status,
                url = %request.url,
                request_id = %client_request_id,
                "request failed"
            );
            return Err(if status >= 500 {
                Error::HttpServer { status, message }
            } else {
                Error::HttpClient { status, message }
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_nested_error_shape() {
        let body = r#"{"error": {"message": "rate limited"}, "message": "outer"}"#;
        assert_eq!(HttpTransport::error_message_from_body(body), "rate limited");
    }

    #[test]
    fn test_error_message_falls_back_to_flat_then_raw() {
        assert_eq!(
            HttpTransport::error_message_from_body(r#"{"message": "nope"}"#),
            "nope"
        );
        assert_eq!(
            HttpTransport::error_message_from_body("plain text failure"),
            "plain text failure"
        );
    }
}
