//! A small async TTL cache fronting the geocoding and forecast calls.
//!
//! Geocoding answers are stable for days and the forecast for half an
//! hour, so a plain map with per-entry deadlines is enough. Expired
//! entries are dropped lazily on access.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (Instant, V)>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), default_ttl }
    }

    /// Fetch a live entry; expired entries are removed and report a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((deadline, value)) if Instant::now() < *deadline => {
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().await.remove(key);
        None
    }

    pub async fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let deadline = Instant::now() + ttl;
        self.entries.write().await.insert(key, (deadline, value));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("tokyo".to_string(), 1u32).await;
        assert_eq!(cache.get(&"tokyo".to_string()).await, Some(1));
    }

    #[tokio::test]
    async fn miss_after_expiry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache
            .insert_with_ttl("tokyo".to_string(), 1u32, Duration::from_nanos(1))
            .await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get(&"tokyo".to_string()).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn overwrite_refreshes_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), 1u32).await;
        cache.insert("k".to_string(), 2u32).await;
        assert_eq!(cache.get(&"k".to_string()).await, Some(2));
        assert_eq!(cache.len().await, 1);
    }
}
