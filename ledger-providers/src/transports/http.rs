use super::common::{JsonRpcError, Request, Response};
use crate::{errors::ProviderError, BroadcastResponse, ChainTransport};
use async_trait::async_trait;
use ledger_core::{
    types::{serde_helpers::deserialize_stringified_u64_or_zero, BroadcastMode, Event},
    utils::{base64_decode, base64_encode},
};
use reqwest::{header::HeaderValue, Client, Error as ReqwestError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::{
    fmt::Debug,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};
use thiserror::Error;
use tracing::trace;
use tracing_futures::Instrument;
use url::Url;

/// A JSON-RPC client for a ledger node's HTTP endpoint.
///
/// Queries go through `abci_query`; broadcasts use `broadcast_tx_async`,
/// `broadcast_tx_sync` or `broadcast_tx_commit` depending on the mode.
///
/// # Example
///
/// ```no_run
/// use ledger_providers::{ChainTransport, Http};
/// use std::str::FromStr;
///
/// # async fn foo() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Http::from_str("http://localhost:26657")?;
/// let raw = provider.query("custom/auth/account", br#"{"address":"00"}"#.to_vec()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Provider {
    id: AtomicU64,
    client: Client,
    url: Url,
}

#[derive(Error, Debug)]
/// Error thrown when sending an HTTP request
pub enum ClientError {
    /// Thrown if the request failed
    #[error(transparent)]
    ReqwestError(#[from] ReqwestError),
    #[error(transparent)]
    /// Thrown if the node answered with a JSON-RPC error
    JsonRpcError(#[from] JsonRpcError),

    #[error("Deserialization Error: {err}. Response: {text}")]
    /// Serde JSON Error
    SerdeJson {
        /// Underlying error
        err: serde_json::Error,
        /// The contents of the HTTP response that could not be deserialized
        text: String,
    },
}

impl From<ClientError> for ProviderError {
    fn from(src: ClientError) -> Self {
        match src {
            ClientError::ReqwestError(err) => ProviderError::HTTPError(err),
            _ => ProviderError::JsonRpcClientError(Box::new(src)),
        }
    }
}

impl crate::RpcError for ClientError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        if let ClientError::JsonRpcError(err) = self {
            Some(err)
        } else {
            None
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            ClientError::SerdeJson { err, .. } => Some(err),
            _ => None,
        }
    }
}

impl Provider {
    /// Initializes a new HTTP Client
    ///
    /// # Example
    ///
    /// ```
    /// use ledger_providers::Http;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://localhost:26657").unwrap();
    /// let provider = Http::new(url);
    /// ```
    pub fn new(url: impl Into<Url>) -> Self {
        Self::new_with_client(url, Client::new())
    }

    /// Initializes a new HTTP Client which sends `authorization` with every request
    pub fn new_with_auth(
        url: impl Into<Url>,
        authorization: &str,
    ) -> Result<Self, HttpClientError> {
        let mut auth_value = HeaderValue::from_str(authorization)?;
        auth_value.set_sensitive(true);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self::new_with_client(url, client))
    }

    /// Allows to customize the provider by providing your own http client
    pub fn new_with_client(url: impl Into<Url>, client: reqwest::Client) -> Self {
        Self { id: AtomicU64::new(1), client, url: url.into() }
    }

    /// The Url to which requests are made
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sends a request with the provided JSON-RPC method and parameters
    pub async fn request<T, R>(&self, method: &str, params: T) -> Result<R, ClientError>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let next_id = self.id.fetch_add(1, Ordering::SeqCst);
        let span = tracing::trace_span!("rpc", method = method, id = next_id);
        async move {
            trace!(params = ?params, "tx");
            let payload = Request::new(next_id, method, params);

            let res = self.client.post(self.url.as_ref()).json(&payload).send().await?;
            let body = res.bytes().await?;

            let response: Response<'_> = serde_json::from_slice(&body).map_err(|err| {
                ClientError::SerdeJson { err, text: String::from_utf8_lossy(&body).to_string() }
            })?;
            let raw = match response.into_result() {
                Ok(raw) => raw,
                Err(Some(error)) => return Err(error.into()),
                Err(None) => {
                    return Err(ClientError::SerdeJson {
                        err: serde::de::Error::custom("response has neither result nor error"),
                        text: String::from_utf8_lossy(&body).to_string(),
                    })
                }
            };
            trace!(rx = %raw.get());

            serde_json::from_str(raw.get())
                .map_err(|err| ClientError::SerdeJson { err, text: raw.to_string() })
        }
        .instrument(span)
        .await
    }
}

fn rpc_method(mode: BroadcastMode) -> &'static str {
    match mode {
        BroadcastMode::Async => "broadcast_tx_async",
        BroadcastMode::Sync => "broadcast_tx_sync",
        BroadcastMode::Commit => "broadcast_tx_commit",
    }
}

#[derive(Deserialize, Debug)]
struct AbciQuery {
    response: AbciQueryResponse,
}

#[derive(Deserialize, Debug)]
struct AbciQueryResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
    #[serde(default)]
    value: Option<String>,
}

/// Result of `broadcast_tx_async` and `broadcast_tx_sync`
#[derive(Deserialize, Debug)]
struct CheckResult {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    codespace: String,
    #[serde(default)]
    log: String,
    hash: String,
}

#[derive(Deserialize, Debug, Default)]
struct ExecResult {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    codespace: String,
    #[serde(default)]
    log: String,
    #[serde(default, deserialize_with = "deserialize_stringified_u64_or_zero")]
    gas_wanted: u64,
    #[serde(default, deserialize_with = "deserialize_stringified_u64_or_zero")]
    gas_used: u64,
    #[serde(default)]
    events: Vec<Event>,
}

/// Result of `broadcast_tx_commit`
#[derive(Deserialize, Debug)]
struct CommitResult {
    #[serde(default)]
    check_tx: ExecResult,
    #[serde(default)]
    deliver_tx: ExecResult,
    hash: String,
    #[serde(default, deserialize_with = "deserialize_stringified_u64_or_zero")]
    height: u64,
}

impl From<CheckResult> for BroadcastResponse {
    fn from(res: CheckResult) -> Self {
        Self {
            hash: res.hash,
            code: res.code,
            codespace: res.codespace,
            log: res.log,
            ..Default::default()
        }
    }
}

impl From<CommitResult> for BroadcastResponse {
    fn from(res: CommitResult) -> Self {
        // a transaction refused at admission never reaches execution
        let exec = if res.check_tx.code != 0 { res.check_tx } else { res.deliver_tx };
        Self {
            hash: res.hash,
            height: res.height,
            code: exec.code,
            codespace: exec.codespace,
            log: exec.log,
            gas_wanted: exec.gas_wanted,
            gas_used: exec.gas_used,
            events: exec.events,
        }
    }
}

#[async_trait]
impl ChainTransport for Provider {
    async fn query(&self, path: &str, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let params =
            json!({ "path": path, "data": hex::encode(data), "height": "0", "prove": false });
        let res: AbciQuery = self.request("abci_query", params).await?;
        if res.response.code != 0 {
            return Err(ProviderError::QueryFailed {
                path: path.to_owned(),
                code: res.response.code,
                log: res.response.log,
            })
        }
        match res.response.value {
            Some(value) => Ok(base64_decode(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn broadcast(
        &self,
        tx: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<BroadcastResponse, ProviderError> {
        let params = json!({ "tx": base64_encode(tx) });
        let method = rpc_method(mode);
        let response: BroadcastResponse = match mode {
            BroadcastMode::Async | BroadcastMode::Sync => {
                self.request::<_, CheckResult>(method, params).await?.into()
            }
            BroadcastMode::Commit => self.request::<_, CommitResult>(method, params).await?.into(),
        };
        Ok(response)
    }
}

impl FromStr for Provider {
    type Err = url::ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(src)?;
        Ok(Provider::new(url))
    }
}

impl Clone for Provider {
    fn clone(&self) -> Self {
        Self { id: AtomicU64::new(1), client: self.client.clone(), url: self.url.clone() }
    }
}

#[derive(Error, Debug)]
/// Error thrown when dealing with Http clients
pub enum HttpClientError {
    /// Thrown if unable to build headers for client
    #[error(transparent)]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// Thrown if unable to build client
    #[error(transparent)]
    ClientBuild(#[from] reqwest::Error),
}
