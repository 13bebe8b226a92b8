//! Process-wide cache for the resolved runtime configuration.
//!
//! The cache holds at most one value.  It is filled lazily by the first
//! successful `rpc_configuration` call and emptied according to the
//! configured [`CachePolicy`] or by an explicit [`SettingsCache::invalidate`].
//!
//! Every invalidation bumps a generation counter.  A reader that missed the
//! cache records the generation before loading the file and hands it back to
//! [`SettingsCache::store_if_current`]; if an invalidation happened in
//! between, the freshly resolved value is returned to that reader but not
//! cached.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::config::CachePolicy;

/// Flat key → JSON value map handed to the daemon RPC client.
pub type RuntimeConfiguration = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Default)]
struct Slot {
    value: Option<Arc<RuntimeConfiguration>>,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct SettingsCache {
    policy: CachePolicy,
    slot: RwLock<Slot>,
}

impl SettingsCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            slot: RwLock::new(Slot::default()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns the cached configuration, if any.
    pub async fn get(&self) -> Option<Arc<RuntimeConfiguration>> {
        self.slot.read().await.value.clone()
    }

    /// Number of invalidations so far.
    pub async fn generation(&self) -> u64 {
        self.slot.read().await.generation
    }

    /// Stores `config` only if no invalidation happened since `generation`
    /// was read.  The handle is returned either way.
    pub async fn store_if_current(
        &self,
        config: RuntimeConfiguration,
        generation: u64,
    ) -> Arc<RuntimeConfiguration> {
        let config = Arc::new(config);
        let mut slot = self.slot.write().await;
        if slot.generation == generation {
            slot.value = Some(Arc::clone(&config));
        } else {
            debug!(
                read_at = generation,
                current = slot.generation,
                "configuration changed while resolving; not caching"
            );
        }
        config
    }

    /// Empties the cache and bumps the generation.  Returns `true` if a value
    /// was dropped.
    pub async fn invalidate(&self) -> bool {
        let mut slot = self.slot.write().await;
        slot.generation = slot.generation.wrapping_add(1);
        let dropped = slot.value.take().is_some();
        if dropped {
            debug!("runtime configuration cache invalidated");
        }
        dropped
    }

    /// Applies the cache policy after the configuration file was rewritten.
    pub async fn on_write(&self) {
        match self.policy {
            CachePolicy::InvalidateOnWrite => {
                self.invalidate().await;
            }
            CachePolicy::KeepUntilRestart => {
                debug!("configuration file changed; keeping cached runtime configuration");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuntimeConfiguration {
        serde_json::json!({"rpcport": 51735})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    async fn fill(cache: &SettingsCache) -> Arc<RuntimeConfiguration> {
        let generation = cache.generation().await;
        cache.store_if_current(sample(), generation).await
    }

    #[tokio::test]
    async fn test_new_cache_is_empty() {
        let cache = SettingsCache::new(CachePolicy::default());
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_fill_then_get_returns_same_value() {
        // Arrange
        let cache = SettingsCache::new(CachePolicy::InvalidateOnWrite);

        // Act
        let stored = fill(&cache).await;
        let cached = cache.get().await.expect("cached");

        // Assert
        assert!(Arc::ptr_eq(&stored, &cached));
    }

    #[tokio::test]
    async fn test_invalidate_on_write_drops_value() {
        let cache = SettingsCache::new(CachePolicy::InvalidateOnWrite);
        fill(&cache).await;

        cache.on_write().await;

        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_keep_until_restart_survives_writes() {
        let cache = SettingsCache::new(CachePolicy::KeepUntilRestart);
        fill(&cache).await;

        cache.on_write().await;

        assert!(cache.get().await.is_some());
    }

    #[tokio::test]
    async fn test_store_if_current_caches_when_nothing_changed() {
        let cache = SettingsCache::new(CachePolicy::InvalidateOnWrite);
        let generation = cache.generation().await;

        let stored = cache.store_if_current(sample(), generation).await;

        let cached = cache.get().await.expect("cached");
        assert!(Arc::ptr_eq(&stored, &cached));
    }

    #[tokio::test]
    async fn test_store_if_current_skips_value_resolved_before_a_write() {
        // Arrange: a reader misses the cache, then a save invalidates it
        let cache = SettingsCache::new(CachePolicy::InvalidateOnWrite);
        let generation = cache.generation().await;
        cache.on_write().await;

        // Act: the reader finishes with what it loaded before the write
        let returned = cache.store_if_current(sample(), generation).await;

        // Assert
        assert_eq!(returned["rpcport"], serde_json::json!(51735));
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_on_empty_cache_still_bumps_generation() {
        let cache = SettingsCache::new(CachePolicy::InvalidateOnWrite);
        let before = cache.generation().await;

        assert!(!cache.invalidate().await);

        assert_ne!(cache.generation().await, before);
    }

    #[tokio::test]
    async fn test_explicit_invalidate_works_under_every_policy() {
        for policy in [CachePolicy::InvalidateOnWrite, CachePolicy::KeepUntilRestart] {
            let cache = SettingsCache::new(policy);
            fill(&cache).await;
            assert!(cache.invalidate().await);
            assert!(!cache.invalidate().await);
        }
    }
}
