//! User operation overrides (optional fields)

use super::UserOperation;
use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// User operation fields pinned by the caller
///
/// Every field that is set takes absolute precedence over defaults, chain reads and bundler
/// estimates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationOverrides {
    #[serde(default)]
    pub nonce: Option<U256>,
    #[serde(default)]
    pub init_code: Option<Bytes>,
    #[serde(default)]
    pub call_gas_limit: Option<U256>,
    #[serde(default)]
    pub verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub pre_verification_gas: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub paymaster_and_data: Option<Bytes>,
    #[serde(default)]
    pub signature: Option<Bytes>,
}

impl UserOperationOverrides {
    /// Whether both fee fields are pinned (no latest block is needed then)
    pub fn has_fees(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }

    /// Init code override, if it is non-empty
    pub fn non_empty_init_code(&self) -> Option<&Bytes> {
        self.init_code.as_ref().filter(|code| !code.is_empty())
    }

    /// Writes every pinned field into the user operation
    pub fn apply(&self, user_operation: UserOperation) -> UserOperation {
        UserOperation {
            sender: user_operation.sender,
            nonce: self.nonce.unwrap_or(user_operation.nonce),
            init_code: self.non_empty_init_code().cloned().unwrap_or(user_operation.init_code),
            call_data: user_operation.call_data,
            call_gas_limit: self.call_gas_limit.unwrap_or(user_operation.call_gas_limit),
            verification_gas_limit: self
                .verification_gas_limit
                .unwrap_or(user_operation.verification_gas_limit),
            pre_verification_gas: self
                .pre_verification_gas
                .unwrap_or(user_operation.pre_verification_gas),
            max_fee_per_gas: self.max_fee_per_gas.unwrap_or(user_operation.max_fee_per_gas),
            max_priority_fee_per_gas: self
                .max_priority_fee_per_gas
                .unwrap_or(user_operation.max_priority_fee_per_gas),
            paymaster_and_data: self
                .paymaster_and_data
                .clone()
                .unwrap_or(user_operation.paymaster_and_data),
            signature: self.signature.clone().unwrap_or(user_operation.signature),
        }
    }
}
