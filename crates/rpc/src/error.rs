use autobridge_primitives::AutoBridgeError;
use jsonrpsee::types::{error::ErrorCode, ErrorObject, ErrorObjectOwned};

/// Generic server error, used for configuration and transport failures
pub const SERVER_ERROR: i32 = -32000;

/// A wrapper for the [ErrorObjectOwned](ErrorObjectOwned) type.
pub struct JsonRpcError(pub ErrorObjectOwned);

impl From<JsonRpcError> for ErrorObjectOwned {
    fn from(err: JsonRpcError) -> Self {
        err.0
    }
}

impl From<AutoBridgeError> for JsonRpcError {
    /// Maps the pipeline error taxonomy onto JSON-RPC error objects
    ///
    /// Bundler errors keep their original code, message and data.
    fn from(err: AutoBridgeError) -> Self {
        let message = err.to_string();
        JsonRpcError(match err {
            AutoBridgeError::InputValidation { .. } => {
                ErrorObject::owned(ErrorCode::InvalidParams.code(), message, None::<bool>)
            }
            AutoBridgeError::InvariantViolation { .. } => {
                ErrorObject::owned(ErrorCode::InternalError.code(), message, None::<bool>)
            }
            AutoBridgeError::Bundler(err) => ErrorObject::owned(
                i32::try_from(err.code).unwrap_or(SERVER_ERROR),
                err.message,
                err.data,
            ),
            AutoBridgeError::Configuration { .. } |
            AutoBridgeError::Transport { .. } |
            AutoBridgeError::Timeout { .. } |
            AutoBridgeError::Signer { .. } => ErrorObject::owned(SERVER_ERROR, message, None::<bool>),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobridge_primitives::JsonRpcErrorObject;
    use serde_json::json;

    fn code(err: AutoBridgeError) -> i32 {
        ErrorObjectOwned::from(JsonRpcError::from(err)).code()
    }

    #[test]
    fn error_codes() {
        assert_eq!(code(AutoBridgeError::input("Invalid amount: abc")), -32602);
        assert_eq!(code(AutoBridgeError::invariant("sourceSwap.minAmountOut")), -32603);
        assert_eq!(code(AutoBridgeError::config("Environment variable BASE_BUNDLER_URL")), -32000);
        assert_eq!(code(AutoBridgeError::transport("connection refused")), -32000);
    }

    #[test]
    fn bundler_error_passthrough() {
        let err: ErrorObjectOwned = JsonRpcError::from(AutoBridgeError::Bundler(JsonRpcErrorObject {
            code: -32500,
            message: "AA21 didn't pay prefund".into(),
            data: Some(json!("0x")),
        }))
        .into();
        assert_eq!(err.code(), -32500);
        assert_eq!(err.message(), "AA21 didn't pay prefund");
        assert_eq!(err.data().map(|data| data.get()), Some("\"0x\""));
    }

    #[test]
    fn input_message_is_kept() {
        let err: ErrorObjectOwned =
            JsonRpcError::from(AutoBridgeError::input("Unknown chain: solana")).into();
        assert_eq!(err.message(), "invalid input: Unknown chain: solana");
    }
}
