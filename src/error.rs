use std::time::Duration;
use thiserror::Error;

/// Unified error type for the request-optimization layer.
///
/// Every failure a caller can observe is one of these variants; the retry
/// controller consults [`Error::is_retryable`] and nothing else when deciding
/// whether an attempt may be repeated.
///
/// The type is `Clone` so a single settled outcome can be delivered to every
/// waiter joined on the same in-flight request.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Caller-initiated cancellation. Never retried; delivered only to the
    /// canceling waiter.
    #[error("request aborted by caller")]
    Aborted,

    /// Per-attempt deadline exceeded.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Connectivity failure (DNS resolution, connection reset, refused).
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// HTTP 4xx response. The parsed server message is preserved.
    #[error("HTTP {status} client error: {message}")]
    HttpClient { status: u16, message: String },

    /// HTTP 5xx response.
    #[error("HTTP {status} server error: {message}")]
    HttpServer { status: u16, message: String },

    /// Response body could not be parsed as the expected format.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalidation pattern failed to compile as a regular expression.
    #[error("invalid invalidation pattern: {0}")]
    InvalidPattern(String),

    /// Malformed URL or invalid option values, rejected before transport.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The retry budget was spent. Wraps the final retryable failure so
    /// callers still see its classification.
    #[error("retry budget exhausted after {attempts} attempts: {source}")]
    RetryExhausted { attempts: u32, source: Box<Error> },
}

impl Error {
    /// Whether the retry controller may repeat the attempt that produced
    /// this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::TransientNetwork(_) | Error::HttpServer { .. }
        )
    }

    /// HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpClient { status, .. } | Error::HttpServer { status, .. } => Some(*status),
            Error::RetryExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The final underlying error once the retry budget is spent, or the
    /// error itself otherwise.
    pub fn last(&self) -> &Error {
        match self {
            Error::RetryExhausted { source, .. } => source.last(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(Error::TransientNetwork("reset".into()).is_retryable());
        assert!(Error::HttpServer {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!Error::Aborted.is_retryable());
        assert!(!Error::HttpClient {
            status: 404,
            message: "not found".into()
        }
        .is_retryable());
        assert!(!Error::Serialization("bad json".into()).is_retryable());
        assert!(!Error::Configuration("bad url".into()).is_retryable());
    }

    #[test]
    fn test_exhausted_preserves_classification() {
        let err = Error::RetryExhausted {
            attempts: 4,
            source: Box::new(Error::HttpServer {
                status: 502,
                message: "bad gateway".into(),
            }),
        };
        assert_eq!(err.status(), Some(502));
        assert!(matches!(err.last(), Error::HttpServer { status: 502, .. }));
        // The wrapper itself is terminal.
        assert!(!err.is_retryable());
    }
}
