use ledger_core::types::{BroadcastMode, Coin, Fee};
use std::fmt;

/// Gas limit used when the caller does not set one
pub const DEFAULT_GAS: u64 = 200_000;

/// Who sends a batch of messages and how it is paid for and broadcast.
///
/// ```
/// use ledger_core::types::{BroadcastMode, Coin};
/// use ledger_middleware::SubmitParams;
///
/// let params = SubmitParams::new("alice", "hunter2")
///     .gas(300_000)
///     .coin(Coin::new(5000, "stake"))
///     .memo("payroll")
///     .mode(BroadcastMode::Sync);
/// assert_eq!(params.fee().gas, 300_000);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SubmitParams {
    /// Name of the sender's key
    pub from: String,
    pub password: String,
    /// Gas limit of every chunk, replaced by the simulated value when
    /// `simulate` is set
    pub gas: u64,
    /// Coins paid per chunk. Its gas field is overwritten by `gas`.
    pub fee: Fee,
    pub memo: String,
    pub mode: BroadcastMode,
    /// Simulate each chunk first and sign it with the gas it used
    pub simulate: bool,
}

impl SubmitParams {
    pub fn new(from: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            password: password.into(),
            gas: DEFAULT_GAS,
            fee: Fee::default(),
            memo: String::new(),
            mode: BroadcastMode::default(),
            simulate: false,
        }
    }

    #[must_use]
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    /// Adds a coin to the fee paid by every chunk
    #[must_use]
    pub fn coin(mut self, coin: Coin) -> Self {
        self.fee = self.fee.coin(coin);
        self
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: BroadcastMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// The fee with the configured gas limit
    pub fn fee(&self) -> Fee {
        self.fee_with_gas(self.gas)
    }

    pub(crate) fn fee_with_gas(&self, gas: u64) -> Fee {
        self.fee.clone().gas(gas)
    }
}

impl fmt::Debug for SubmitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitParams")
            .field("from", &self.from)
            .field("password", &"<redacted>")
            .field("gas", &self.gas)
            .field("fee", &self.fee)
            .field("memo", &self.memo)
            .field("mode", &self.mode)
            .field("simulate", &self.simulate)
            .finish()
    }
}
