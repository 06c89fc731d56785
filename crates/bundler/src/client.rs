use crate::chain::with_timeout;
use async_trait::async_trait;
use autobridge_primitives::{
    constants::bundler::{
        CALL_USER_OPERATION, ESTIMATE_USER_OPERATION_GAS, REQUEST_TIMEOUT, SEND_USER_OPERATION,
    },
    AutoBridgeError, AutoBridgeResult, BundlerConfig, JsonRpcErrorObject, UserOperation,
    UserOperationGasEstimation,
};
use ethers::{types::Address, utils::to_checksum};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, trace};

/// JSON-RPC request
#[derive(Debug, Serialize)]
pub struct Request<T> {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: T,
}

/// JSON-RPC response, either `result` or `error` is set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

/// Raw bundler response to a submission
pub type BundlerResponse = Response<Value>;

impl<T> Response<T> {
    /// Turns an error response into a bundler error, keeping code, message and data
    pub fn into_result(self) -> AutoBridgeResult<Self> {
        match self.error {
            Some(err) => Err(AutoBridgeError::Bundler(err)),
            None => Ok(self),
        }
    }
}

/// Options of a user operation submission
#[derive(Clone, Debug, Default)]
pub struct SubmitOptions {
    /// Simulate with `eth_callUserOperation` instead of submitting
    pub dry_run: bool,
    /// Overrides the client's request timeout
    pub timeout: Option<Duration>,
}

impl SubmitOptions {
    pub fn method(&self) -> &'static str {
        if self.dry_run {
            CALL_USER_OPERATION
        } else {
            SEND_USER_OPERATION
        }
    }
}

/// Bundler JSON-RPC methods used by the execution pipeline
#[async_trait]
pub trait BundlerApi: Send + Sync {
    /// Gas limits the bundler estimates for the user operation
    async fn estimate_user_operation_gas(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
    ) -> AutoBridgeResult<UserOperationGasEstimation>;

    /// Submits (or simulates) the signed user operation
    ///
    /// # Returns
    /// * `AutoBridgeResult<BundlerResponse>` - The raw response, a bundler error carrying the
    ///   original error object, or a timeout
    async fn send_user_operation(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
        options: &SubmitOptions,
    ) -> AutoBridgeResult<BundlerResponse>;
}

/// HTTP JSON-RPC client of an ERC-4337 bundler
#[derive(Debug)]
pub struct BundlerClient {
    bundler_url: String,
    http: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl BundlerClient {
    pub fn new(bundler_url: impl Into<String>) -> Self {
        Self {
            bundler_url: bundler_url.into(),
            http: reqwest::Client::new(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &BundlerConfig) -> Self {
        Self::new(config.bundler_url.clone())
    }

    /// Sets the default request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bundler_url(&self) -> &str {
        &self.bundler_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts a user operation method, `params = [userOp, entryPoint]`
    async fn call(
        &self,
        method: &str,
        user_operation: &UserOperation,
        entry_point: &Address,
        timeout: Duration,
    ) -> AutoBridgeResult<Response<Value>> {
        let user_operation = serde_json::to_value(user_operation).map_err(|err| {
            AutoBridgeError::invariant(format!("Failed to serialize user operation: {err}"))
        })?;
        let req = Request {
            jsonrpc: "2.0".into(),
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            method: method.into(),
            params: (user_operation, to_checksum(entry_point, None)),
        };

        trace!("Sending {method} request to {}: {req:?}", self.bundler_url);

        with_timeout(method, timeout, self.post(&req)).await
    }

    async fn post<T: Serialize + Sync>(&self, req: &Request<T>) -> AutoBridgeResult<Response<Value>> {
        let res = self
            .http
            .post(&self.bundler_url)
            .json(req)
            .send()
            .await
            .map_err(|err| AutoBridgeError::transport(format!("{} request failed: {err}", req.method)))?;
        let status = res.status();
        let body = res.text().await.map_err(|err| {
            AutoBridgeError::transport(format!("Failed to read bundler response (HTTP {status}): {err}"))
        })?;

        debug!("Bundler response to {} (HTTP {status}): {body}", req.method);

        serde_json::from_str::<Response<Value>>(&body).map_err(|err| {
            AutoBridgeError::transport(format!(
                "Bundler returned a non JSON-RPC response (HTTP {status}): {err}"
            ))
        })
    }
}

#[async_trait]
impl BundlerApi for BundlerClient {
    async fn estimate_user_operation_gas(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
    ) -> AutoBridgeResult<UserOperationGasEstimation> {
        let res = self
            .call(ESTIMATE_USER_OPERATION_GAS, user_operation, entry_point, self.timeout)
            .await?
            .into_result()?;
        let result = res.result.ok_or_else(|| {
            AutoBridgeError::transport("Bundler gas estimation response has no result")
        })?;

        serde_json::from_value(result).map_err(|err| {
            AutoBridgeError::transport(format!("Invalid gas estimation response: {err}"))
        })
    }

    async fn send_user_operation(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
        options: &SubmitOptions,
    ) -> AutoBridgeResult<BundlerResponse> {
        let timeout = options.timeout.unwrap_or(self.timeout);
        self.call(options.method(), user_operation, entry_point, timeout).await?.into_result()
    }
}
