mod address;
pub use address::{Address, ParseAddressError};

mod account;
pub use account::{Account, AccountResponse, BaseAccount};

mod fee;
pub use fee::{Coin, Fee};

mod msg;
pub use msg::{Msg, RawMsg, ValidationError};

mod tx;
pub use tx::{BroadcastMode, ParseModeError, StdSignDoc, StdSignature, StdTx, TypedMsg};

mod response;
pub use response::{Attribute, Event, TxResponse};

pub mod serde_helpers;
