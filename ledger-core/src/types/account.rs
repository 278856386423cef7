use super::{serde_helpers::stringified_u64, Address};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// An on-chain account as seen by the client: its stable account number and
/// the replay-protection sequence the chain expects next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    #[serde(with = "stringified_u64")]
    pub account_number: u64,
    #[serde(with = "stringified_u64")]
    pub sequence: u64,
    /// When this value was stored locally. `None` for values fresh from the chain.
    #[serde(skip)]
    pub cached_at: Option<Instant>,
}

impl Account {
    pub fn new(address: Address, account_number: u64, sequence: u64) -> Self {
        Self { address, account_number, sequence, cached_at: None }
    }
}

/// The account fields a node reports. Extra fields such as public keys or
/// balances are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BaseAccount {
    #[serde(with = "stringified_u64")]
    pub account_number: u64,
    #[serde(with = "stringified_u64")]
    pub sequence: u64,
}

/// The body returned by an account query. Nodes either return the account
/// fields directly or wrap them in a `{ "type": .., "value": .. }` envelope.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AccountResponse {
    Typed {
        #[serde(rename = "type")]
        kind: String,
        value: BaseAccount,
    },
    Plain(BaseAccount),
}

impl AccountResponse {
    /// Attaches the queried address to the decoded account fields
    pub fn into_account(self, address: Address) -> Account {
        let base = match self {
            AccountResponse::Typed { value, .. } => value,
            AccountResponse::Plain(value) => value,
        };
        Account::new(address, base.account_number, base.sequence)
    }
}
