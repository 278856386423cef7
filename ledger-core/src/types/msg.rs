use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Thrown when a message fails its own stateless validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// An application-level message carried by a transaction.
///
/// Every business module implements this for its request types. The
/// submission pipeline treats messages as opaque: it only validates them,
/// asks for their JSON value and places them into a transaction.
pub trait Msg: fmt::Debug + Send + Sync {
    /// The registered type name of the message, e.g. `bank/MsgSend`
    fn msg_type(&self) -> &str;

    /// Stateless checks that do not require chain access
    fn validate_basic(&self) -> Result<(), ValidationError>;

    /// The message body as it appears in the sign doc and the transaction
    fn to_value(&self) -> Result<Value, serde_json::Error>;
}

/// A pre-built message: a type name and its JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMsg {
    msg_type: String,
    value: Value,
}

impl RawMsg {
    pub fn new(msg_type: impl Into<String>, value: Value) -> Self {
        Self { msg_type: msg_type.into(), value }
    }
}

impl Msg for RawMsg {
    fn msg_type(&self) -> &str {
        &self.msg_type
    }

    fn validate_basic(&self) -> Result<(), ValidationError> {
        if self.msg_type.trim().is_empty() {
            return Err(ValidationError::new("message type must not be empty"))
        }
        if !self.value.is_object() {
            return Err(ValidationError::new(format!(
                "{} body must be a JSON object",
                self.msg_type
            )))
        }
        Ok(())
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(self.value.clone())
    }
}
