use ledger_core::types::{Account, AccountResponse, Address};
use ledger_providers::{query_json, Cache, ChainTransport, MemoryCache, ProviderError};
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, instrument};

/// Path of the account query served by the auth module
pub const DEFAULT_ACCOUNT_QUERY_PATH: &str = "custom/auth/account";

#[derive(Serialize)]
struct AccountQuery<'a> {
    address: &'a str,
}

/// Hands out account numbers and sequences without a chain round-trip per
/// transaction.
///
/// The cache holds, per address, the sequence the next transaction should
/// use. A miss reads the account from the chain; every handed-out sequence
/// moves the cached value forward by one. After a stale-sequence rejection
/// the entry is invalidated so the next call re-reads the chain.
///
/// Handed-out sequences strictly increase with one exception: [`rewind`]
/// hands a sequence out again when the transaction that used it never
/// reached the chain (built too large, refused by the node as too large, or
/// failed before broadcast). No sequence the chain has seen is reused.
///
/// [`rewind`]: AccountSequencer::rewind
///
/// The sequencer does not serialize callers itself. Callers must hold the
/// sender's [`LockHandle`](crate::LockHandle) across `next_sequence` and the
/// broadcast that uses its result, otherwise two callers can be handed the
/// same sequence.
pub struct AccountSequencer<T> {
    transport: T,
    cache: Arc<dyn Cache<String, Account>>,
    ttl: Duration,
    query_path: String,
}

impl<T: ChainTransport> AccountSequencer<T> {
    /// A sequencer with its own in-memory cache
    pub fn new(transport: T, ttl: Duration) -> Self {
        Self::with_cache(transport, Arc::new(MemoryCache::new()), ttl)
    }

    /// A sequencer storing accounts in `cache`, which may be shared
    pub fn with_cache(transport: T, cache: Arc<dyn Cache<String, Account>>, ttl: Duration) -> Self {
        Self { transport, cache, ttl, query_path: DEFAULT_ACCOUNT_QUERY_PATH.to_owned() }
    }

    #[must_use]
    pub fn query_path(mut self, path: impl Into<String>) -> Self {
        self.query_path = path.into();
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the `(account_number, sequence)` to sign the next transaction
    /// of `address` with, and reserves that sequence.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn next_sequence(&self, address: &Address) -> Result<(u64, u64), ProviderError> {
        let key = address.to_string();
        let account = match self.cache.get(&key) {
            Some(account) => {
                debug!(sequence = account.sequence, "account cache hit");
                account
            }
            None => {
                let account = self.fetch(address).await?;
                debug!(
                    account_number = account.account_number,
                    sequence = account.sequence,
                    "account cache miss, read from chain"
                );
                account
            }
        };

        let (account_number, sequence) = (account.account_number, account.sequence);
        self.store(address, account_number, sequence + 1);
        Ok((account_number, sequence))
    }

    /// Forgets the cached account of `address`
    pub fn invalidate(&self, address: &Address) {
        if self.cache.remove(&address.to_string()).is_some() {
            debug!(%address, "invalidated cached account");
        }
    }

    /// Hands `sequence` out again on the next call. Used when a reserved
    /// sequence never reached the chain.
    pub fn rewind(&self, address: &Address, account_number: u64, sequence: u64) {
        debug!(%address, sequence, "rewinding cached sequence");
        self.store(address, account_number, sequence);
    }

    /// Reads the account from the chain, replacing whatever is cached
    pub async fn query_account(&self, address: &Address) -> Result<Account, ProviderError> {
        let account = self.fetch(address).await?;
        self.store(address, account.account_number, account.sequence);
        Ok(account)
    }

    /// The cached account of `address`, if it is still live
    pub fn cached(&self, address: &Address) -> Option<Account> {
        self.cache.get(&address.to_string())
    }

    /// Reads the account from the chain without touching the cache
    pub(crate) async fn fetch(&self, address: &Address) -> Result<Account, ProviderError> {
        let key = address.to_string();
        let response: AccountResponse =
            query_json(&self.transport, &self.query_path, &AccountQuery { address: &key }).await?;
        Ok(response.into_account(*address))
    }

    fn store(&self, address: &Address, account_number: u64, sequence: u64) {
        let mut account = Account::new(*address, account_number, sequence);
        account.cached_at = Some(std::time::Instant::now());
        self.cache.set_with_expire(address.to_string(), account, self.ttl);
    }
}

impl<T: Clone> Clone for AccountSequencer<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            cache: self.cache.clone(),
            ttl: self.ttl,
            query_path: self.query_path.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AccountSequencer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSequencer")
            .field("transport", &self.transport)
            .field("cache", &self.cache)
            .field("ttl", &self.ttl)
            .field("query_path", &self.query_path)
            .finish()
    }
}
