use super::serde_helpers::stringified_u64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of a single denomination. Amounts stay strings so arbitrarily
/// large integers survive the round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl fmt::Display, denom: impl Into<String>) -> Self {
        Self { denom: denom.into(), amount: amount.to_string() }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// The fee attached to a transaction: the coins paid and the gas limit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    #[serde(with = "stringified_u64")]
    pub gas: u64,
}

impl Fee {
    /// A fee with the given gas limit and no coins
    pub fn new(gas: u64) -> Self {
        Self { amount: Vec::new(), gas }
    }

    /// Adds a coin to the fee amount
    #[must_use]
    pub fn coin(mut self, coin: Coin) -> Self {
        self.amount.push(coin);
        self
    }

    /// Sets the gas limit
    #[must_use]
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }
}
