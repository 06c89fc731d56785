//! Error taxonomy shared by the planning, encoding and execution pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, time::Duration};
use thiserror::Error;

/// Result type used across the pipeline
pub type AutoBridgeResult<T> = Result<T, AutoBridgeError>;

/// Error object returned by a JSON-RPC server, kept exactly as received
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    /// JSON-RPC error code
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Optional structured payload (revert data, simulation traces ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if let Some(data) = &self.data {
            write!(f, " data: {data}")?;
        }
        Ok(())
    }
}

/// Errors raised while planning, encoding, building, or submitting a route
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AutoBridgeError {
    /// Malformed caller input (amounts, unknown chains or tokens, missing pool config)
    #[error("invalid input: {message}")]
    InputValidation { message: String },

    /// Missing or malformed configuration (endpoints, addresses)
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Network failure while talking to an RPC endpoint or bundler
    #[error("transport error: {message}")]
    Transport { message: String },

    /// A network call did not complete in time
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    /// Structured error returned by the bundler
    #[error("bundler error: {0}")]
    Bundler(JsonRpcErrorObject),

    /// An internally built object failed its own checks
    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    /// The injected signer failed to produce a signature
    #[error("signer error: {message}")]
    Signer { message: String },
}

impl AutoBridgeError {
    /// Whether a caller may retry the failed call with a fresh plan and build
    pub fn is_retryable(&self) -> bool {
        matches!(self, AutoBridgeError::Transport { .. } | AutoBridgeError::Timeout { .. })
    }

    pub fn input(message: impl Into<String>) -> Self {
        AutoBridgeError::InputValidation { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AutoBridgeError::Configuration { message: message.into() }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        AutoBridgeError::InvariantViolation { message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        AutoBridgeError::Transport { message: message.into() }
    }
}
