//! # reqcache-rs
//!
//! 客户端自适应缓存与请求优化层：对网络操作结果进行记忆化，并发去重、退避重试，
//! 并根据网络质量自适应调整请求行为。
//!
//! A client-side adaptive cache and request-optimization layer: a generic
//! store that memoizes the results of network operations, enforces
//! freshness via TTL, bounds memory via pluggable eviction policies,
//! deduplicates concurrent identical requests, retries transient failures
//! with backoff, and adapts request behavior to network quality.
//!
//! ## Core Guarantees
//!
//! - **TTL correctness**: an expired entry is never returned; it is deleted
//!   lazily on access and swept periodically.
//! - **Bounded memory**: the store never exceeds its capacity once a
//!   `set`-plus-eviction cycle completes.
//! - **Single-flight**: at most one concurrent transport per request
//!   fingerprint; every joined waiter observes the same outcome.
//! - **Classified failures**: callers see the error taxonomy in [`Error`],
//!   with HTTP status and server message preserved.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reqcache::{CacheConfig, CacheHandle, RequestCoordinator, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> reqcache::Result<()> {
//!     let cache = CacheHandle::new(CacheConfig::new().with_max_size(500));
//!     let coordinator = RequestCoordinator::http(cache.clone())?;
//!
//!     let user = coordinator
//!         .optimized_request(
//!             "https://api.example.com/users/1",
//!             RequestOptions::new().with_tag("users"),
//!         )
//!         .await?;
//!     println!("{user}");
//!
//!     // Later: drop everything tagged "users" in one call.
//!     cache.invalidate_by_tags(&["users"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL store, eviction policies, tag/pattern invalidation |
//! | [`request`] | Coordinator, single-flight table, retry/backoff |
//! | [`transport`] | `Transport` trait and the reqwest implementation |
//! | [`quality`] | Connection-quality adapter and profiles |
//! | [`sweep`] | Periodic expired-entry sweeper |

pub mod cache;
pub mod error;
pub mod quality;
pub mod request;
pub mod sweep;
pub mod transport;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheEntry, CacheHandle, CacheStats, CacheStore, EvictionPolicy, Fingerprint,
    SetOptions,
};
pub use error::Error;
pub use quality::{ConnectionProfile, NetworkSample, PayloadFidelity, QualityMonitor, QualityTier};
pub use request::{BatchRequest, RequestCoordinator, RequestOptions, RetryPolicy};
pub use sweep::Sweeper;
pub use transport::{HttpTransport, Transport, TransportRequest};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
