//! Registry of memoizers keyed by client identity.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::memoizer::{MemoizedClient, Memoizer};
use crate::domain::models::MemoConfig;
use crate::domain::ports::ServiceClient;

/// Holds at most one [`Memoizer`] per client namespace.
///
/// Construct one per process and share it (behind an `Arc`) with every
/// rule. [`reset`](Self::reset) empties the caches but keeps the
/// namespace-to-memoizer mapping, so a new audit pass reads fresh data
/// while identity is preserved.
#[derive(Debug, Default)]
pub struct MemoRegistry {
    config: MemoConfig,
    memoizers: RwLock<HashMap<String, Arc<Memoizer>>>,
}

impl MemoRegistry {
    pub fn new(config: MemoConfig) -> Self {
        Self {
            config,
            memoizers: RwLock::new(HashMap::new()),
        }
    }

    /// Wrap `client` with the memoizer registered for its namespace.
    pub fn memo<C: ServiceClient + ?Sized>(&self, client: Arc<C>) -> MemoizedClient<C> {
        let namespace = client.namespace();
        self.memo_with_namespace(client, namespace)
    }

    /// Wrap `client` with the memoizer registered under an explicit
    /// namespace.
    pub fn memo_with_namespace<C: ServiceClient + ?Sized>(
        &self,
        client: Arc<C>,
        namespace: impl Into<String>,
    ) -> MemoizedClient<C> {
        let memoizer = self.memoizer(namespace.into());
        MemoizedClient::new(client, memoizer)
    }

    /// Memoizer for `namespace`, created when absent.
    pub fn memoizer(&self, namespace: impl Into<String>) -> Arc<Memoizer> {
        let namespace = namespace.into();
        if let Some(existing) = self
            .memoizers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&namespace)
        {
            return Arc::clone(existing);
        }

        let mut memoizers = self.memoizers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(memoizers.entry(namespace).or_insert_with_key(|ns| {
            tracing::debug!(namespace = %ns, "registering memoizer");
            Arc::new(Memoizer::new(ns.clone(), &self.config))
        }))
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .memoizers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.memoizers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear every memoizer's cached responses.
    pub async fn reset(&self) {
        let memoizers: Vec<Arc<Memoizer>> = self
            .memoizers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for memoizer in &memoizers {
            memoizer.clear().await;
        }
        tracing::info!(memoizers = memoizers.len(), "memoized calls reset");
    }
}
