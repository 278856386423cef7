mod params;
pub use params::{SubmitParams, DEFAULT_GAS};

use crate::{
    error::{SubmitError, SubmitFailure},
    locker::AccountLocker,
    planner::{BatchPlanner, Chunk},
    sequencer::AccountSequencer,
    SubmitterConfig,
};
use futures_util::FutureExt;
use ledger_core::{
    codec::{JsonCodec, TxCodec},
    types::{
        serde_helpers::deserialize_stringified_u64_or_zero, Account, Address, Msg, StdSignDoc,
        StdTx, TxResponse,
    },
};
use ledger_providers::{Broadcaster, Cache, ChainTransport, MemoryCache, ProviderError};
use ledger_signers::KeyManager;
use serde::Deserialize;
use std::{any::Any, collections::VecDeque, fmt, future::Future, panic::AssertUnwindSafe, sync::Arc};
use tracing::{debug, error, instrument, trace_span, warn};
use tracing_futures::Instrument;

/// Where a chunk is in its way to the chain
enum Stage {
    /// Reserving the next sequence of the sender
    Sequencing,
    /// Building, signing and encoding the transaction
    Signing { account_number: u64, sequence: u64 },
    /// Waiting for the node's verdict
    Broadcasting { account_number: u64, sequence: u64, frame: Vec<u8> },
    Done(TxResponse),
}

enum ChunkOutcome {
    Broadcast(TxResponse),
    /// The chunk is too large to send; nothing was broadcast for it
    Oversized(usize),
}

#[derive(Deserialize)]
struct SimulateResponse {
    gas_info: GasInfo,
}

#[derive(Deserialize)]
struct GasInfo {
    #[serde(deserialize_with = "deserialize_stringified_u64_or_zero")]
    gas_used: u64,
}

/// Turns message lists into sequenced, size-bounded, signed transactions and
/// submits them with bounded retries.
///
/// Submissions from the same sender are serialized through the
/// [`AccountLocker`]; submissions from different senders run in parallel
/// unless their addresses share a lock shard. Within one submission the
/// chunks are broadcast in order with strictly increasing sequences.
///
/// ```no_run
/// use ledger_core::types::{Msg, RawMsg};
/// use ledger_middleware::{SubmitParams, Submitter, SubmitterConfig};
/// use ledger_providers::Http;
/// use ledger_signers::LocalKeyring;
/// use serde_json::json;
/// use std::str::FromStr;
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = LocalKeyring::new();
/// keys.generate("alice")?;
///
/// let transport = Http::from_str("http://localhost:26657")?;
/// let submitter = Submitter::new(transport, keys, SubmitterConfig::new("testnet-1"));
///
/// let msgs: Vec<Box<dyn Msg>> =
///     vec![Box::new(RawMsg::new("bank/MsgSend", json!({ "to": "bob", "amount": "10" })))];
/// let responses = submitter.submit(&msgs, &SubmitParams::new("alice", "")).await?;
/// println!("{}", responses[0].hash);
/// # Ok(())
/// # }
/// ```
pub struct Submitter<T, K, C = JsonCodec> {
    transport: Arc<T>,
    keys: Arc<K>,
    codec: Arc<C>,
    locker: Arc<AccountLocker>,
    sequencer: AccountSequencer<Arc<T>>,
    broadcaster: Broadcaster<Arc<T>>,
    config: Arc<SubmitterConfig>,
}

impl<T, K> Submitter<T, K, JsonCodec>
where
    T: ChainTransport,
    K: KeyManager,
{
    /// A submitter with its own lock table and account cache
    pub fn new(transport: T, keys: K, config: SubmitterConfig) -> Self {
        let locker = Arc::new(AccountLocker::new(config.lock_shards));
        Self::with_parts(transport, keys, config, locker, Arc::new(MemoryCache::new()))
    }

    /// A submitter that shares its lock table and account cache with others.
    ///
    /// Every submitter sending for the same accounts must share both, or
    /// they will hand out the same sequences.
    pub fn with_parts(
        transport: T,
        keys: K,
        config: SubmitterConfig,
        locker: Arc<AccountLocker>,
        cache: Arc<dyn Cache<String, Account>>,
    ) -> Self {
        let transport = Arc::new(transport);
        let sequencer =
            AccountSequencer::with_cache(transport.clone(), cache, config.account_ttl_duration())
                .query_path(config.account_query_path.clone());
        let broadcaster = Broadcaster::new(transport.clone(), config.broadcast_timeout_duration());
        Self {
            transport,
            keys: Arc::new(keys),
            codec: Arc::new(JsonCodec),
            locker,
            sequencer,
            broadcaster,
            config: Arc::new(config),
        }
    }
}

impl<T, K, C> Submitter<T, K, C>
where
    T: ChainTransport,
    K: KeyManager,
    C: TxCodec,
{
    /// Replaces the codec turning sign docs and transactions into bytes
    pub fn with_codec<D: TxCodec>(self, codec: D) -> Submitter<T, K, D> {
        Submitter {
            transport: self.transport,
            keys: self.keys,
            codec: Arc::new(codec),
            locker: self.locker,
            sequencer: self.sequencer,
            broadcaster: self.broadcaster,
            config: self.config,
        }
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn locker(&self) -> &Arc<AccountLocker> {
        &self.locker
    }

    pub fn sequencer(&self) -> &AccountSequencer<Arc<T>> {
        &self.sequencer
    }

    /// Submits `msgs` on behalf of `params.from`.
    ///
    /// The messages are split into as many transactions as the configured
    /// count and size limits require, and the results come back in message
    /// order. On failure the [`SubmitFailure`] still carries the results of
    /// the transactions that were accepted before it.
    #[instrument(skip_all, fields(from = %params.from, msgs = msgs.len()))]
    pub async fn submit(
        &self,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
    ) -> Result<Vec<TxResponse>, SubmitFailure> {
        let mut completed = Vec::with_capacity(msgs.len());
        let result = self
            .guarded(async {
                validate(msgs)?;
                let address = self.resolve(params).await?;
                self.locked(&address, self.run(&address, msgs, params, &mut completed)).await
            })
            .await;
        match result {
            Ok(()) => Ok(completed),
            Err(error) => Err(SubmitFailure { error, completed }),
        }
    }

    /// Signs every chunk of `msgs` without broadcasting anything.
    ///
    /// The account is read from the chain and the chunks get consecutive
    /// sequences starting at its current one. The sequence cache is left
    /// alone, so frames signed here do not disturb later submissions; they
    /// are only valid if nothing else is sent from the account before them.
    #[instrument(skip_all, fields(from = %params.from, msgs = msgs.len()))]
    pub async fn build_and_sign(
        &self,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
    ) -> Result<Vec<Vec<u8>>, SubmitError> {
        self.guarded(async {
            validate(msgs)?;
            let address = self.resolve(params).await?;
            self.locked(&address, self.sign_all(&address, msgs, params)).await
        })
        .await
    }

    /// The account of the key `name` as the chain currently sees it. The
    /// sequence cache is refreshed with the answer.
    pub async fn query_account(&self, name: &str, password: &str) -> Result<Account, SubmitError> {
        self.guarded(async {
            let address = self.keys.resolve(name, password).await.map_err(|err| {
                SubmitError::Resolution { name: name.to_owned(), source: Box::new(err) }
            })?;
            self.locked(&address, async {
                self.sequencer.query_account(&address).await.map_err(|source| {
                    SubmitError::Sequencing { address: address.to_string(), source }
                })
            })
            .await
        })
        .await
    }

    async fn resolve(&self, params: &SubmitParams) -> Result<Address, SubmitError> {
        self.keys.resolve(&params.from, &params.password).await.map_err(|err| {
            SubmitError::Resolution { name: params.from.clone(), source: Box::new(err) }
        })
    }

    /// Contains panics raised before the sender's lock is taken, in message
    /// validation or key resolution, and reports them as [`SubmitError::Panic`].
    async fn guarded<F, R>(&self, body: F) -> Result<R, SubmitError>
    where
        F: Future<Output = Result<R, SubmitError>>,
    {
        AssertUnwindSafe(body).catch_unwind().await.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!(panic = %message, "submission panicked before taking the account lock");
            Err(SubmitError::Panic(message))
        })
    }

    /// Runs `critical` while holding the lock of `address`. A panic inside is
    /// contained and reported as [`SubmitError::Panic`]. The cached sequence
    /// is dropped before the lock is released, so the next holder reads the
    /// chain again.
    async fn locked<F, R>(&self, address: &Address, critical: F) -> Result<R, SubmitError>
    where
        F: Future<Output = Result<R, SubmitError>>,
    {
        let key = address.to_string();
        let _handle = self.locker.lock(&key).await;
        AssertUnwindSafe(critical).catch_unwind().await.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!(panic = %message, address = %key, "submission panicked, cached sequence dropped");
            // a sequence may have been reserved and never broadcast
            self.sequencer.invalidate(address);
            Err(SubmitError::Panic(message))
        })
    }

    async fn run(
        &self,
        address: &Address,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
        completed: &mut Vec<TxResponse>,
    ) -> Result<(), SubmitError> {
        let mut max_count = self.config.effective_max_msgs();
        let mut plan: VecDeque<Chunk> = BatchPlanner::plan(msgs.len(), 0, max_count).into();

        while let Some(chunk) = plan.pop_front() {
            let span = trace_span!("chunk", start = chunk.start, end = chunk.end);
            let outcome =
                self.run_chunk(address, &msgs[chunk.range()], params).instrument(span).await?;
            match outcome {
                ChunkOutcome::Broadcast(response) => completed.push(response),
                ChunkOutcome::Oversized(size) => {
                    max_count = self.shrink(chunk, size)?;
                    plan = BatchPlanner::plan(msgs.len(), chunk.start, max_count).into();
                }
            }
        }
        Ok(())
    }

    /// Drives one chunk until the chain accepted it, it turned out too large,
    /// or an error ended the submission.
    async fn run_chunk(
        &self,
        address: &Address,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
    ) -> Result<ChunkOutcome, SubmitError> {
        let try_threshold = self.config.effective_try_threshold();
        let mut attempts = 0;
        let mut stage = Stage::Sequencing;

        loop {
            stage = match stage {
                Stage::Sequencing => {
                    let (account_number, sequence) =
                        self.sequencer.next_sequence(address).await.map_err(|source| {
                            SubmitError::Sequencing { address: address.to_string(), source }
                        })?;
                    Stage::Signing { account_number, sequence }
                }
                Stage::Signing { account_number, sequence } => {
                    let frame = match self
                        .sign_chunk(address, msgs, params, account_number, sequence)
                        .await
                    {
                        Ok(frame) => frame,
                        Err(err) => {
                            self.sequencer.rewind(address, account_number, sequence);
                            return Err(err)
                        }
                    };
                    if frame.len() > self.config.max_tx_bytes {
                        debug!(size = frame.len(), limit = self.config.max_tx_bytes, "chunk too large");
                        self.sequencer.rewind(address, account_number, sequence);
                        return Ok(ChunkOutcome::Oversized(frame.len()))
                    }
                    Stage::Broadcasting { account_number, sequence, frame }
                }
                Stage::Broadcasting { account_number, sequence, frame } => {
                    let size = frame.len();
                    debug!(sequence, msgs = msgs.len(), size, "broadcasting chunk");
                    match self.broadcaster.send(frame, params.mode).await {
                        Ok(response) => Stage::Done(response),
                        Err(err) if err.is_stale_sequence() => {
                            attempts += 1;
                            self.sequencer.invalidate(address);
                            if attempts >= try_threshold {
                                return Err(SubmitError::StaleSequenceExhausted {
                                    attempts,
                                    source: err,
                                })
                            }
                            warn!(sequence, attempts, "stale sequence, retrying chunk");
                            Stage::Sequencing
                        }
                        Err(err) if err.is_too_large() => {
                            debug!(size, "node rejected chunk as too large");
                            self.sequencer.rewind(address, account_number, sequence);
                            return Ok(ChunkOutcome::Oversized(size))
                        }
                        Err(err) => {
                            // the node may or may not have consumed the sequence
                            self.sequencer.invalidate(address);
                            return Err(err.into())
                        }
                    }
                }
                Stage::Done(response) => return Ok(ChunkOutcome::Broadcast(response)),
            };
        }
    }

    fn shrink(&self, chunk: Chunk, size: usize) -> Result<usize, SubmitError> {
        let max_count = BatchPlanner::shrink(chunk.len()).ok_or(SubmitError::SizeExceeded {
            index: chunk.start,
            size,
            limit: self.config.max_tx_bytes,
        })?;
        debug!(start = chunk.start, max_count, "replanning remaining messages");
        Ok(max_count)
    }

    async fn sign_all(
        &self,
        address: &Address,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
    ) -> Result<Vec<Vec<u8>>, SubmitError> {
        let account = self.sequencer.fetch(address).await.map_err(|source| {
            SubmitError::Sequencing { address: address.to_string(), source }
        })?;

        let mut sequence = account.sequence;
        let mut frames = Vec::new();
        let mut max_count = self.config.effective_max_msgs();
        let mut plan: VecDeque<Chunk> = BatchPlanner::plan(msgs.len(), 0, max_count).into();
        while let Some(chunk) = plan.pop_front() {
            let frame = self
                .sign_chunk(address, &msgs[chunk.range()], params, account.account_number, sequence)
                .await?;
            if frame.len() > self.config.max_tx_bytes {
                max_count = self.shrink(chunk, frame.len())?;
                plan = BatchPlanner::plan(msgs.len(), chunk.start, max_count).into();
                continue
            }
            frames.push(frame);
            sequence += 1;
        }
        Ok(frames)
    }

    /// Signs and encodes `msgs` as one transaction, simulating it first if
    /// the caller asked for simulated gas
    async fn sign_chunk(
        &self,
        address: &Address,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
        account_number: u64,
        sequence: u64,
    ) -> Result<Vec<u8>, SubmitError> {
        let frame =
            self.sign_frame(address, msgs, params, params.gas, account_number, sequence).await?;
        if !params.simulate {
            return Ok(frame)
        }

        let gas = self.simulate(frame).await?;
        self.sign_frame(address, msgs, params, gas, account_number, sequence).await
    }

    async fn sign_frame(
        &self,
        address: &Address,
        msgs: &[Box<dyn Msg>],
        params: &SubmitParams,
        gas: u64,
        account_number: u64,
        sequence: u64,
    ) -> Result<Vec<u8>, SubmitError> {
        let doc = StdSignDoc::new(
            self.config.chain_id.as_str(),
            account_number,
            sequence,
            params.fee_with_gas(gas),
            params.memo.as_str(),
            msgs,
        )?;
        let sign_bytes = self.codec.encode_sign_doc(&doc)?;
        let signature = self
            .keys
            .sign(address, &params.password, &sign_bytes)
            .await
            .map_err(|err| SubmitError::Signing(Box::new(err)))?;

        let tx = StdTx::new(doc, signature.to_std_signature(account_number, sequence));
        Ok(self.codec.encode_tx(&tx)?)
    }

    /// Gas the node used to execute `frame`, scaled by the configured
    /// adjustment and rounded up
    async fn simulate(&self, frame: Vec<u8>) -> Result<u64, SubmitError> {
        let raw = self
            .transport
            .query(&self.config.simulate_path, frame)
            .await
            .map_err(SubmitError::Simulation)?;
        let response: SimulateResponse = serde_json::from_slice(&raw)
            .map_err(|err| SubmitError::Simulation(ProviderError::from(err)))?;

        let gas = (response.gas_info.gas_used as f64 * self.config.gas_adjustment).ceil() as u64;
        debug!(gas_used = response.gas_info.gas_used, gas, "simulated chunk");
        Ok(gas)
    }
}

impl<T, K, C> Clone for Submitter<T, K, C> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            keys: self.keys.clone(),
            codec: self.codec.clone(),
            locker: self.locker.clone(),
            sequencer: self.sequencer.clone(),
            broadcaster: self.broadcaster.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T: fmt::Debug, K: fmt::Debug, C: fmt::Debug> fmt::Debug for Submitter<T, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("transport", &self.transport)
            .field("keys", &self.keys)
            .field("codec", &self.codec)
            .field("locker", &self.locker)
            .field("config", &self.config)
            .finish()
    }
}

fn validate(msgs: &[Box<dyn Msg>]) -> Result<(), SubmitError> {
    if msgs.is_empty() {
        return Err(SubmitError::NoMessages)
    }
    for (index, msg) in msgs.iter().enumerate() {
        msg.validate_basic().map_err(|source| SubmitError::Validation { index, source })?;
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
