use crate::device::DeviceKey;
use crate::EmbedderKind;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

pub type CacheKey = (EmbedderKind, DeviceKey);

/// How many loaded models a [`ModelCache`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Keep every model for the life of the cache.
    #[default]
    Unbounded,
    /// Keep the most recently used `n` models.
    Lru(NonZeroUsize),
}

/// Loaded models keyed by `(variant, device)`.
///
/// Owned by whoever extracts embeddings; nothing is global. Hit and miss
/// counters make reuse observable.
#[derive(Debug)]
pub struct ModelCache<M> {
    policy: CachePolicy,
    // least recently used first
    entries: Vec<(CacheKey, Arc<M>)>,
    hits: u64,
    misses: u64,
}

impl<M> Default for ModelCache<M> {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl<M> ModelCache<M> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached model for `key`, or build it with `load`.
    ///
    /// A failed load is counted as a miss and leaves the cache unchanged.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: CacheKey, load: F) -> Result<Arc<M>, E>
    where
        F: FnOnce() -> Result<M, E>,
    {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.hits += 1;
            let entry = self.entries.remove(pos);
            let model = Arc::clone(&entry.1);
            self.entries.push(entry);
            return Ok(model);
        }
        self.misses += 1;
        let model = Arc::new(load()?);
        if let CachePolicy::Lru(capacity) = self.policy {
            while self.entries.len() >= capacity.get() {
                let (evicted, _) = self.entries.remove(0);
                debug!("Evicting {:?} from the model cache", evicted);
            }
        }
        self.entries.push((key, Arc::clone(&model)));
        Ok(model)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
    pub fn hits(&self) -> u64 {
        self.hits
    }
    pub fn misses(&self) -> u64 {
        self.misses
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Drop every model and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T6: CacheKey = (EmbedderKind::ESM2_T6_8M, DeviceKey::Cpu);
    const T12: CacheKey = (EmbedderKind::ESM2_T12_35M, DeviceKey::Cpu);
    const T30: CacheKey = (EmbedderKind::ESM2_T30_150M, DeviceKey::Cpu);

    fn load(cache: &mut ModelCache<String>, key: CacheKey) -> Arc<String> {
        cache
            .get_or_try_insert_with(key, || Ok::<_, ()>(format!("{:?}", key)))
            .unwrap()
    }

    #[test]
    fn test_hits_and_misses() {
        let mut cache = ModelCache::default();
        let first = load(&mut cache, T6);
        let second = load(&mut cache, T6);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        load(&mut cache, (EmbedderKind::ESM2_T6_8M, DeviceKey::Cuda(0)));
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ModelCache::new(CachePolicy::Lru(NonZeroUsize::new(2).unwrap()));
        load(&mut cache, T6);
        load(&mut cache, T12);
        load(&mut cache, T6);
        load(&mut cache, T30);
        assert!(cache.contains(&T6));
        assert!(!cache.contains(&T12));
        assert!(cache.contains(&T30));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_load_not_cached() {
        let mut cache: ModelCache<String> = ModelCache::default();
        let result = cache.get_or_try_insert_with(T6, || Err("no weights"));
        assert_eq!(result, Err("no weights"));
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_clear_resets() {
        let mut cache = ModelCache::default();
        load(&mut cache, T6);
        load(&mut cache, T6);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!((cache.hits(), cache.misses()), (0, 0));
    }
}
