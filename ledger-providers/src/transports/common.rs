// Code adapted from: https://github.com/althea-net/guac_rs/tree/master/web3/src/jsonrpc

use serde::{Deserialize, Serialize};
use serde_json::{value::RawValue, Value};
use std::fmt;
use thiserror::Error;

/// A JSON-RPC 2.0 error
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub struct JsonRpcError {
    /// The error code
    pub code: i64,
    /// The error message
    pub message: String,
    /// Additional data
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    /// The error message followed by the `data` field when it is a string.
    /// Nodes tend to put the interesting part of the reason in `data`.
    pub fn detail(&self) -> String {
        match &self.data {
            Some(Value::String(data)) => format!("{}: {}", self.message, data),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {}, message: {}, data: {:?})", self.code, self.message, self.data)
    }
}

fn is_zst<T>(_t: &T) -> bool {
    std::mem::size_of::<T>() == 0
}

#[derive(Serialize, Deserialize, Debug)]
/// A JSON-RPC request
pub struct Request<'a, T> {
    id: u64,
    jsonrpc: &'a str,
    method: &'a str,
    #[serde(skip_serializing_if = "is_zst")]
    params: T,
}

impl<'a, T> Request<'a, T> {
    /// Creates a new JSON RPC request
    pub fn new(id: u64, method: &'a str, params: T) -> Self {
        Self { id, jsonrpc: "2.0", method, params }
    }
}

/// A JSON-RPC response. Exactly one of `result` and `error` is expected;
/// the id is not checked since every request gets its own HTTP exchange.
#[derive(Deserialize, Debug)]
pub struct Response<'a> {
    #[serde(borrow, default)]
    result: Option<&'a RawValue>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

impl<'a> Response<'a> {
    /// The raw result, or the error the node returned
    pub fn into_result(self) -> Result<&'a RawValue, Option<JsonRpcError>> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(Some(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(None),
        }
    }
}
