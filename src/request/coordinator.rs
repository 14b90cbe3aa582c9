//! Request coordinator: cache-aside reads, single-flight dedup, write-back.

use super::options::RequestOptions;
use super::pending::{JoinOutcome, PendingTable, Settlement};
use super::retry::RetryPolicy;
use crate::cache::{CacheHandle, Fingerprint, SetOptions};
use crate::quality::{ConnectionProfile, QualityMonitor};
use crate::transport::{HttpTransport, Transport, TransportRequest};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Orchestrates memoized network requests.
///
/// Read path: cache → pending table → transport. A fresh cache entry is
/// returned without touching the network; a request already in flight for
/// the same fingerprint is joined rather than re-sent; only a true miss
/// spawns transport (with retry), whose result is written back and fanned
/// out to every waiter.
pub struct RequestCoordinator {
    cache: CacheHandle,
    pending: Arc<PendingTable>,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    quality: Option<Arc<QualityMonitor>>,
}

impl RequestCoordinator {
    pub fn new(cache: CacheHandle, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache,
            pending: Arc::new(PendingTable::new()),
            transport,
            retry: RetryPolicy::default(),
            quality: None,
        }
    }

    /// Convenience constructor wiring the default [`HttpTransport`].
    pub fn http(cache: CacheHandle) -> Result<Self> {
        Ok(Self::new(cache, Arc::new(HttpTransport::new()?)))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Attach a quality monitor; [`active_profile`] then follows it.
    ///
    /// [`active_profile`]: RequestCoordinator::active_profile
    pub fn with_quality_monitor(mut self, monitor: Arc<QualityMonitor>) -> Self {
        self.quality = Some(monitor);
        self
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }

    /// Profile polling callers should currently use. The high-quality
    /// profile applies when no monitor is attached.
    pub fn active_profile(&self) -> ConnectionProfile {
        self.quality
            .as_ref()
            .map(|monitor| monitor.profile())
            .unwrap_or_else(ConnectionProfile::high)
    }

    /// Number of fingerprints currently in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Perform (or join, or answer from cache) one logical request.
    ///
    /// Guarantees at most one concurrent transport per fingerprint; all
    /// waiters joined before settlement observe the same outcome.
    /// Successful responses are cached under the requested TTL and tags;
    /// failures are never cached.
    pub async fn optimized_request(&self, url: &str, options: RequestOptions) -> Result<Value> {
        Url::parse(url).map_err(|e| Error::Configuration(format!("invalid url `{url}`: {e}")))?;

        let fingerprint = Fingerprint::new(&options.method, url, options.body.as_ref());
        let key = fingerprint.cache_key().to_string();

        if let Some(value) = self.cache.get(&key) {
            debug!(fingerprint = %fingerprint, "cache hit");
            return Ok(value);
        }

        match self.pending.join(&key) {
            JoinOutcome::Leader { rx, cancel } => {
                self.spawn_transport(&fingerprint, url, &options, cancel);
                self.await_settlement(rx, options.cancel, &key).await
            }
            JoinOutcome::Follower { rx } => {
                debug!(fingerprint = %fingerprint, "joined in-flight request");
                self.await_settlement(rx, options.cancel, &key).await
            }
        }
    }

    /// Run transport in its own task so one waiter's departure never tears
    /// down work other waiters still depend on.
    fn spawn_transport(
        &self,
        fingerprint: &Fingerprint,
        url: &str,
        options: &RequestOptions,
        cancel: CancellationToken,
    ) {
        let transport = Arc::clone(&self.transport);
        let retry = self.retry.clone();
        let cache = self.cache.clone();
        let pending = Arc::clone(&self.pending);
        let max_retries = options.max_retries.unwrap_or(retry.max_retries);
        let key = fingerprint.cache_key().to_string();

        let mut request = TransportRequest::new(&options.method, url);
        request.body = options.body.clone();
        request.headers = options.headers.clone();

        let mut set_opts = SetOptions::new().with_tags(options.tags.clone());
        if let Some(ttl) = options.ttl {
            set_opts = set_opts.with_ttl(ttl);
        }

        tokio::spawn(async move {
            let outcome = retry
                .execute(max_retries, &cancel, || {
                    let transport = Arc::clone(&transport);
                    let request = request.clone();
                    async move { transport.execute(&request).await }
                })
                .await;

            if let Ok(value) = &outcome {
                cache.set(&key, value.clone(), set_opts);
            }
            // On Aborted the last waiter already removed the entry and this
            // settle is a no-op.
            pending.settle(&key, outcome);
        });
    }

    async fn await_settlement(
        &self,
        mut rx: broadcast::Receiver<Settlement>,
        cancel: Option<CancellationToken>,
        key: &str,
    ) -> Result<Value> {
        match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => {
                    self.pending.leave(key);
                    Err(Error::Aborted)
                }
                settled = rx.recv() => Self::unwrap_settlement(settled),
            },
            None => Self::unwrap_settlement(rx.recv().await),
        }
    }

    fn unwrap_settlement(
        settled: std::result::Result<Settlement, broadcast::error::RecvError>,
    ) -> Result<Value> {
        match settled {
            Ok(outcome) => outcome,
            // Sender dropped without settling: the transport task died.
            Err(_) => Err(Error::TransientNetwork(
                "in-flight request dropped before settling".into(),
            )),
        }
    }
}
