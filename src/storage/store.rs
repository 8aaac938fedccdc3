//! Thread-Safe Key-Value Store with Lazy Expiry
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: keys are spread over 64 shards, each behind its own
//!    `RwLock`, so connections touching different keys rarely contend.
//! 2. **Lazy Expiry only**: an expired record is removed by the `get` that
//!    finds it. Nothing sweeps in the background, so an expired record may
//!    stay in memory until the key is next read.
//! 3. **Concrete payload**: a record stores the SET value as `Bytes`.
//!
//! ## Lock Discipline
//!
//! `set` holds the shard write lock for the whole overwrite. `get` looks the
//! key up under the read lock; if the record turned out to be expired it takes
//! the write lock, checks expiry again and only then deletes. Every operation
//! on a key is therefore linearizable and no reader can observe a
//! half-deleted record.

use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// Number of shards for the store.
const NUM_SHARDS: usize = 64;

/// A stored value with an optional expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub value: Bytes,
    /// None = never expires
    pub expires_at: Option<Instant>,
}

impl Record {
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// A `ttl` too large to represent as an `Instant` never expires.
    pub fn with_ttl(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// A record is expired once its expiry instant has been reached.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<Bytes, Record>>,
}

impl Shard {
    // A panic while holding the lock cannot leave a record half-written
    // (HashMap::insert/remove are the only mutations), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Record>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Record>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Operation counters, see [`Store::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Records physically present, including expired ones not yet read
    pub keys: usize,
    pub get_ops: u64,
    pub set_ops: u64,
    /// Records removed by lazy expiry
    pub expired: u64,
}

/// The process-wide key-value store.
///
/// Created once at startup and shared across connections behind an `Arc`.
///
/// # Example
///
/// ```
/// use lexkv::storage::Store;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let store = Store::new();
/// store.set(Bytes::from("name"), Bytes::from("lex"));
/// assert_eq!(store.get(b"name"), Some(Bytes::from("lex")));
///
/// store.set_with_ttl(Bytes::from("gone"), Bytes::from("soon"), Duration::ZERO);
/// assert_eq!(store.get(b"gone"), None);
/// ```
pub struct Store {
    shards: Vec<Shard>,
    get_count: AtomicU64,
    set_count: AtomicU64,
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shards", &self.shards.len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| Shard::default()).collect(),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    fn insert(&self, key: Bytes, record: Record) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);
        let mut data = self.shard(&key).write();
        data.insert(key, record).is_none()
    }

    /// Sets a key that never expires, replacing any previous record.
    ///
    /// Returns `true` if the key was new.
    pub fn set(&self, key: Bytes, value: Bytes) -> bool {
        self.insert(key, Record::new(value))
    }

    /// Sets a key that expires after `ttl`, replacing any previous record.
    ///
    /// A zero `ttl` produces a record that is already expired.
    pub fn set_with_ttl(&self, key: Bytes, value: Bytes, ttl: Duration) -> bool {
        self.insert(key, Record::with_ttl(value, ttl))
    }

    /// Gets the value for a key, deleting it first if it has expired.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        let shard = self.shard(key);

        {
            let data = shard.read();
            match data.get(key) {
                None => return None,
                Some(record) if !record.is_expired() => return Some(record.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check: the key may have been overwritten or removed between the locks
        let mut data = shard.write();
        match data.get(key) {
            None => return None,
            Some(record) if !record.is_expired() => return Some(record.value.clone()),
            Some(_) => {}
        }

        data.remove(key);
        self.expired_count.fetch_add(1, Ordering::Relaxed);
        trace!(key = %String::from_utf8_lossy(key), "Lazily expired key");
        None
    }

    /// Returns true if a record is physically present, expired or not.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.shard(key).read().contains_key(key)
    }

    /// Number of records physically present.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len(),
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_get() {
        let store = Store::new();
        assert!(store.set(Bytes::from("key"), Bytes::from("value")));
        assert_eq!(store.get(b"key"), Some(Bytes::from("value")));
    }

    #[test]
    fn test_get_missing() {
        let store = Store::new();
        assert_eq!(store.get(b"missing"), None);
    }

    #[test]
    fn test_overwrite() {
        let store = Store::new();
        assert!(store.set(Bytes::from("key"), Bytes::from("v1")));
        assert!(!store.set(Bytes::from("key"), Bytes::from("v2")));
        assert_eq!(store.get(b"key"), Some(Bytes::from("v2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite_clears_ttl() {
        let store = Store::new();
        store.set_with_ttl(Bytes::from("key"), Bytes::from("v1"), Duration::ZERO);
        store.set(Bytes::from("key"), Bytes::from("v2"));
        assert_eq!(store.get(b"key"), Some(Bytes::from("v2")));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let store = Store::new();
        store.set(Bytes::from("key"), Bytes::from("value"));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(store.get(b"key"), Some(Bytes::from("value")));
        assert_eq!(store.get(b"key"), Some(Bytes::from("value")));
    }

    #[test]
    fn test_zero_ttl_expires_on_get() {
        let store = Store::new();
        store.set_with_ttl(Bytes::from("key"), Bytes::from("value"), Duration::ZERO);

        // Still physically present until accessed
        assert!(store.contains_key(b"key"));
        assert_eq!(store.len(), 1);

        assert_eq!(store.get(b"key"), None);
        assert!(!store.contains_key(b"key"));
        assert!(store.is_empty());
        assert_eq!(store.stats().expired, 1);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let store = Store::new();
        store.set_with_ttl(
            Bytes::from("key"),
            Bytes::from("value"),
            Duration::from_millis(u64::MAX),
        );
        assert_eq!(store.get(b"key"), Some(Bytes::from("value")));
    }

    #[test]
    fn test_ttl_elapses() {
        let store = Store::new();
        store.set_with_ttl(
            Bytes::from("key"),
            Bytes::from("value"),
            Duration::from_millis(30),
        );
        assert_eq!(store.get(b"key"), Some(Bytes::from("value")));

        thread::sleep(Duration::from_millis(60));
        assert_eq!(store.get(b"key"), None);
        assert!(!store.contains_key(b"key"));
    }

    #[test]
    fn test_stats() {
        let store = Store::new();
        store.set(Bytes::from("a"), Bytes::from("1"));
        store.set(Bytes::from("b"), Bytes::from("2"));
        store.get(b"a");
        store.get(b"c");

        let stats = store.stats();
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.set_ops, 2);
        assert_eq!(stats.get_ops, 2);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_concurrent_sets_same_key() {
        let store = Arc::new(Store::new());
        let v1 = Bytes::from("a".repeat(4096));
        let v2 = Bytes::from("b".repeat(4096));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let value = if i % 2 == 0 { v1.clone() } else { v2.clone() };
                thread::spawn(move || {
                    for _ in 0..500 {
                        store.set(Bytes::from("key"), value.clone());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let value = store.get(b"key").unwrap();
        assert!(value == v1 || value == v2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_get_during_expiry() {
        let store = Arc::new(Store::new());
        for i in 0..100 {
            store.set_with_ttl(
                Bytes::from(format!("key:{}", i)),
                Bytes::from("value"),
                Duration::ZERO,
            );
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        assert_eq!(store.get(format!("key:{}", i).as_bytes()), None);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.is_empty());
        assert_eq!(store.stats().expired, 100);
    }
}
