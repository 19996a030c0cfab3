use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: usize = 512;

/// In-memory tile cache keyed by tile URL, with LRU eviction. Keying by URL
/// keeps tiles from different base layers apart.
#[derive(Debug)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<String, Arc<Vec<u8>>>>>,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().ok()?.get(url).cloned()
    }

    pub fn insert(&self, url: String, data: Vec<u8>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(url, Arc::new(data));
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.contains(url))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().ok().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for TileCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_cache_basic_operations() {
        let cache = TileCache::new(2);
        assert!(cache.is_empty());

        cache.insert("http://a/1/0/0.png".to_string(), vec![1, 2, 3]);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("http://a/1/0/0.png"));
        assert_eq!(*cache.get("http://a/1/0/0.png").unwrap(), vec![1, 2, 3]);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_tile_cache_lru_eviction() {
        let cache = TileCache::new(2);
        cache.insert("one".to_string(), vec![1]);
        cache.insert("two".to_string(), vec![2]);
        cache.insert("three".to_string(), vec![3]);

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("one"));
        assert!(cache.contains("two"));
        assert!(cache.contains("three"));
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let cache = TileCache::new(0);
        cache.insert("x".to_string(), vec![0]);
        assert!(cache.contains("x"));
    }
}
