use hashers::fnv::FNV1aHasher64;
use std::{fmt, hash::Hasher};
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Number of lock shards used by [`AccountLocker::default`]
pub const DEFAULT_LOCK_SHARDS: usize = 16;

/// Serializes work per sender through a fixed table of async mutexes.
///
/// A sender key maps to `fnv1a_64(key) % shards`. Two senders that land on
/// the same shard serialize against each other even though their sequences
/// are independent. That costs throughput, never correctness. Raise the
/// shard count if many senders are active at once.
///
/// Acquisition waits for as long as it takes and cannot fail. The returned
/// [`LockHandle`] releases the shard when dropped, including while a panic
/// unwinds through its owner.
pub struct AccountLocker {
    shards: Box<[Mutex<()>]>,
}

impl AccountLocker {
    /// Creates a locker with `shards` mutexes. A count of zero is treated as one.
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Mutex::new(())).collect();
        Self { shards }
    }

    pub fn shards(&self) -> usize {
        self.shards.len()
    }

    /// The shard `key` is serialized on
    pub fn shard_index(&self, key: &str) -> usize {
        let mut hasher = FNV1aHasher64::default();
        hasher.write(key.as_bytes());
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Waits until the shard of `key` is free and takes it
    pub async fn lock(&self, key: &str) -> LockHandle<'_> {
        let shard = self.shard_index(key);
        trace!(shard, key, "waiting for account lock");
        let guard = self.shards[shard].lock().await;
        trace!(shard, key, "acquired account lock");
        LockHandle { _guard: guard, shard }
    }

    /// Takes the shard of `key` if nobody holds it
    pub fn try_lock(&self, key: &str) -> Option<LockHandle<'_>> {
        let shard = self.shard_index(key);
        let guard = self.shards[shard].try_lock().ok()?;
        Some(LockHandle { _guard: guard, shard })
    }
}

impl Default for AccountLocker {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_SHARDS)
    }
}

impl fmt::Debug for AccountLocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountLocker").field("shards", &self.shards.len()).finish()
    }
}

/// Exclusive hold on one lock shard. Dropping it unlocks.
#[must_use = "the shard is released as soon as the handle is dropped"]
pub struct LockHandle<'a> {
    _guard: MutexGuard<'a, ()>,
    shard: usize,
}

impl LockHandle<'_> {
    pub fn shard(&self) -> usize {
        self.shard
    }

    /// Releases the shard. Same as dropping the handle.
    pub fn unlock(self) {}
}

impl Drop for LockHandle<'_> {
    fn drop(&mut self) {
        trace!(shard = self.shard, "released account lock");
    }
}

impl fmt::Debug for LockHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle").field("shard", &self.shard).finish()
    }
}
