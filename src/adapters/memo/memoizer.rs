//! Per-client response cache.
//!
//! A [`Memoizer`] owns the moka cache for one client identity. A
//! [`MemoizedClient`] pairs a concrete client with the memoizer registered
//! for its identity and routes read calls through it.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::fingerprint::Fingerprint;
use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::models::MemoConfig;
use crate::domain::ports::{ServiceClient, ServiceRequest};

/// Counters describing a memoizer's activity since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Reads routed through the memoizer
    pub requests: u64,
    /// Reads that reached the upstream client
    pub upstream_calls: u64,
    /// Responses currently cached
    pub entries: u64,
}

/// Response cache for a single client identity.
pub struct Memoizer {
    namespace: String,
    coalesce_in_flight: bool,
    cache: Cache<Fingerprint, Arc<Value>>,
    requests: AtomicU64,
    upstream_calls: AtomicU64,
}

impl fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoizer")
            .field("namespace", &self.namespace)
            .field("coalesce_in_flight", &self.coalesce_in_flight)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Memoizer {
    pub fn new(namespace: impl Into<String>, config: &MemoConfig) -> Self {
        let cache = Cache::builder().max_capacity(config.max_entries).build();
        Self {
            namespace: namespace.into(),
            coalesce_in_flight: config.coalesce_in_flight,
            cache,
            requests: AtomicU64::new(0),
            upstream_calls: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Return the cached response for `request`, or run `fetch` and cache
    /// its successful result.
    ///
    /// A failed fetch is returned unchanged and leaves no entry behind.
    pub async fn get_or_fetch<Fut>(
        &self,
        request: &ServiceRequest,
        fetch: Fut,
    ) -> AuditResult<Arc<Value>>
    where
        Fut: Future<Output = AuditResult<Value>>,
    {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let key = Fingerprint::of(request);

        if self.coalesce_in_flight {
            let upstream_calls = &self.upstream_calls;
            return self
                .cache
                .try_get_with(key, async move {
                    upstream_calls.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        namespace = %self.namespace,
                        operation = %request.operation,
                        fingerprint = ?key,
                        "memo miss"
                    );
                    fetch.await.map(Arc::new)
                })
                .await
                .map_err(Arc::unwrap_or_clone);
        }

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(
                namespace = %self.namespace,
                operation = %request.operation,
                "memo hit"
            );
            return Ok(cached);
        }

        self.upstream_calls.fetch_add(1, Ordering::Relaxed);
        let response = Arc::new(fetch.await?);
        self.cache.insert(key, Arc::clone(&response)).await;
        Ok(response)
    }

    /// Whether a response for `request` is currently cached.
    pub fn contains(&self, request: &ServiceRequest) -> bool {
        self.cache.contains_key(&Fingerprint::of(request))
    }

    /// Drop every cached response.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> MemoStats {
        self.cache.run_pending_tasks().await;
        MemoStats {
            requests: self.requests.load(Ordering::Relaxed),
            upstream_calls: self.upstream_calls.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }
}

/// A service client whose read calls go through a shared [`Memoizer`].
///
/// Only idempotent reads may use [`send`](Self::send); mutating calls must
/// use [`send_uncached`](Self::send_uncached) so they are always executed.
pub struct MemoizedClient<C: ?Sized> {
    client: Arc<C>,
    memoizer: Arc<Memoizer>,
}

impl<C: ?Sized> Clone for MemoizedClient<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            memoizer: Arc::clone(&self.memoizer),
        }
    }
}

impl<C: ?Sized> fmt::Debug for MemoizedClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizedClient")
            .field("namespace", &self.memoizer.namespace)
            .finish()
    }
}

impl<C: ServiceClient + ?Sized> MemoizedClient<C> {
    pub(crate) fn new(client: Arc<C>, memoizer: Arc<Memoizer>) -> Self {
        Self { client, memoizer }
    }

    /// Issue a read, answering from cache when an identical call was seen.
    pub async fn send(&self, request: &ServiceRequest) -> AuditResult<Arc<Value>> {
        self.memoizer
            .get_or_fetch(request, self.client.send(request))
            .await
    }

    /// Issue a read and deserialize the response.
    pub async fn send_as<T: DeserializeOwned>(&self, request: &ServiceRequest) -> AuditResult<T> {
        let response = self.send(request).await?;
        T::deserialize(response.as_ref())
            .map_err(|e| AuditError::client_call(&request.operation, e.to_string()))
    }

    /// Issue a call directly, bypassing the cache.
    pub async fn send_uncached(&self, request: &ServiceRequest) -> AuditResult<Value> {
        self.client.send(request).await
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn memoizer(&self) -> &Arc<Memoizer> {
        &self.memoizer
    }

    pub fn namespace(&self) -> &str {
        self.memoizer.namespace()
    }
}
