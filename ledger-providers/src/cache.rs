use dashmap::DashMap;
use std::{fmt::Debug, hash::Hash, time::Duration};
use tokio::time::Instant;

/// A thread-safe key/value store whose entries may expire.
///
/// Implementations must be safe to call from many tasks at once; they make no
/// promise about ordering between concurrent writers to the same key.
pub trait Cache<K, V>: Debug + Send + Sync {
    /// Returns the live value for `key`, if any
    fn get(&self, key: &K) -> Option<V>;

    /// Stores `value` without expiry
    fn set(&self, key: K, value: V);

    /// Stores `value` until `ttl` has elapsed
    fn set_with_expire(&self, key: K, value: V, ttl: Duration);

    /// Removes `key`, returning its value if it was live
    fn remove(&self, key: &K) -> Option<V>;
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// In-memory [`Cache`] backed by a concurrent dashmap. Expired entries are
/// dropped lazily on access or explicitly with [`MemoryCache::purge_expired`].
#[derive(Debug)]
pub struct MemoryCache<K: Eq + Hash, V> {
    entries: DashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self { entries: DashMap::new() }
    }
}

impl<K: Eq + Hash, V> MemoryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Debug + Send + Sync,
    V: Clone + Debug + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone())
            }
        }
        // the read guard must be gone before taking the shard's write lock
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    fn set(&self, key: K, value: V) {
        self.entries.insert(key, Entry { value, expires_at: None });
    }

    fn set_with_expire(&self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries.insert(key, Entry { value, expires_at });
    }

    fn remove(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries.remove(key).and_then(|(_, entry)| (!entry.is_expired(now)).then_some(entry.value))
    }
}
