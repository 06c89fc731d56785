//! Basic transaction type for account abstraction (ERC-4337)

mod hash;
mod overrides;

use crate::utils::{as_checksum_addr, as_hex_quantity, parse_quantity};
use ethers::{
    abi::AbiEncode,
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
pub use hash::UserOperationHash;
pub use overrides::UserOperationOverrides;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::ops::Deref;

/// Structured-data prefix of the user operation hash
const HASH_PREFIX: [u8; 2] = [0x19, 0x01];

/// User operation
///
/// Integer fields are serialized as 0x-prefixed lowercase hex quantities, which is the wire format
/// bundlers expect.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (anti replay protection)
    #[serde(serialize_with = "as_hex_quantity")]
    pub nonce: U256,

    /// Init code for the account (needed if account not yet deployed and needs to be created)
    pub init_code: Bytes,

    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,

    /// The amount of gas to allocate for the main execution call
    #[serde(serialize_with = "as_hex_quantity")]
    pub call_gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    #[serde(serialize_with = "as_hex_quantity")]
    pub verification_gas_limit: U256,

    /// The amount of gas to pay bundler to compensate for the pre-verification execution and
    /// calldata
    #[serde(serialize_with = "as_hex_quantity")]
    pub pre_verification_gas: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    #[serde(serialize_with = "as_hex_quantity")]
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    #[serde(serialize_with = "as_hex_quantity")]
    pub max_priority_fee_per_gas: U256,

    /// Address of paymaster sponsoring the user operation, followed by extra data to send to the
    /// paymaster (can be empty)
    pub paymaster_and_data: Bytes,

    /// Data passed to the account along with the nonce during the verification step
    pub signature: Bytes,
}

/// User operation without signature (helper for packing user operation)
#[derive(EthAbiCodec, EthAbiType)]
struct UserOperationNoSignature {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: H256,
    pub call_data: H256,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: H256,
}

impl From<&UserOperation> for UserOperationNoSignature {
    fn from(value: &UserOperation) -> Self {
        Self {
            sender: value.sender,
            nonce: value.nonce,
            init_code: keccak256(value.init_code.deref()).into(),
            call_data: keccak256(value.call_data.deref()).into(),
            call_gas_limit: value.call_gas_limit,
            verification_gas_limit: value.verification_gas_limit,
            pre_verification_gas: value.pre_verification_gas,
            max_fee_per_gas: value.max_fee_per_gas,
            max_priority_fee_per_gas: value.max_priority_fee_per_gas,
            paymaster_and_data: keccak256(value.paymaster_and_data.deref()).into(),
        }
    }
}

/// Domain part of the hash: entry point, chain id and the inner hash
#[derive(EthAbiCodec, EthAbiType)]
struct UserOperationDomain {
    pub entry_point: Address,
    pub chain_id: U256,
    pub inner: H256,
}

impl UserOperation {
    /// Packs the user operation without signature to bytes (used for calculating the hash)
    pub fn pack_without_signature(&self) -> Bytes {
        UserOperationNoSignature::from(self).encode().into()
    }

    /// Calculates the hash the account signs
    ///
    /// `keccak256(0x1901 ‖ abi.encode(entryPoint, chainId, keccak256(packed)))`, where `packed`
    /// is [pack_without_signature](UserOperation::pack_without_signature). This is what the
    /// deployed accounts verify signatures against.
    ///
    /// # Arguments
    /// * `entry_point` - The entry point contract address
    /// * `chain_id` - The chain id of the network the user operation is submitted to
    ///
    /// # Returns
    /// * `UserOperationHash` - The hash of the user operation
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> UserOperationHash {
        let inner = H256::from(keccak256(self.pack_without_signature().deref()));
        let domain =
            UserOperationDomain { entry_point: *entry_point, chain_id: chain_id.into(), inner };
        let preimage = [HASH_PREFIX.to_vec(), domain.encode()].concat();
        H256::from(keccak256(preimage)).into()
    }

    /// Replaces gas limits with bundler estimates, unless the caller pinned a value
    ///
    /// # Arguments
    /// * `estimation` - Gas limits reported by the bundler
    /// * `overrides` - Caller-supplied values (take precedence over estimates)
    ///
    /// # Returns
    /// * `Self` - The user operation with merged gas limits
    pub fn merge_gas_estimation(
        self,
        estimation: &UserOperationGasEstimation,
        overrides: &UserOperationOverrides,
    ) -> Self {
        Self {
            call_gas_limit: overrides.call_gas_limit.unwrap_or(estimation.call_gas_limit),
            verification_gas_limit: overrides
                .verification_gas_limit
                .unwrap_or(estimation.verification_gas_limit),
            pre_verification_gas: overrides
                .pre_verification_gas
                .unwrap_or(estimation.pre_verification_gas),
            ..self
        }
    }

    // Builder pattern helpers

    /// Sets the sender of the user operation
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Sets the nonce of the user operation
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the init code of the user operation
    pub fn init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = init_code;
        self
    }

    /// Sets the call data of the user operation
    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    /// Sets the call gas limit of the user operation
    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = call_gas_limit;
        self
    }

    /// Sets the verification gas limit of the user operation
    pub fn verification_gas_limit(mut self, verification_gas_limit: U256) -> Self {
        self.verification_gas_limit = verification_gas_limit;
        self
    }

    /// Sets the pre-verification gas of the user operation
    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Sets the max fee per gas of the user operation
    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self
    }

    /// Sets the max priority fee per gas of the user operation
    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Sets the paymaster and data of the user operation
    pub fn paymaster_and_data(mut self, paymaster_and_data: Bytes) -> Self {
        self.paymaster_and_data = paymaster_and_data;
        self
    }

    /// Sets the signature of the user operation
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }
}

/// Signed user operation with its hash
///
/// Only read access is exposed, a signed user operation can no longer change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUserOperation {
    hash: UserOperationHash,
    user_operation: UserOperation,
}

impl SignedUserOperation {
    /// Attaches the signature verbatim
    pub fn new(user_operation: UserOperation, hash: UserOperationHash, signature: Bytes) -> Self {
        Self { hash, user_operation: user_operation.signature(signature) }
    }

    pub fn hash(&self) -> UserOperationHash {
        self.hash
    }

    pub fn user_operation(&self) -> &UserOperation {
        &self.user_operation
    }

    pub fn into_inner(self) -> UserOperation {
        self.user_operation
    }
}

impl Deref for SignedUserOperation {
    type Target = UserOperation;

    fn deref(&self) -> &Self::Target {
        &self.user_operation
    }
}

impl AsRef<UserOperation> for SignedUserOperation {
    fn as_ref(&self) -> &UserOperation {
        &self.user_operation
    }
}

/// Gas estimations for user operation (returned from the RPC endpoint eth_estimateUserOperationGas)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimation {
    #[serde(serialize_with = "as_hex_quantity")]
    pub pre_verification_gas: U256,
    #[serde(serialize_with = "as_hex_quantity")]
    pub verification_gas_limit: U256,
    #[serde(serialize_with = "as_hex_quantity")]
    pub call_gas_limit: U256,
}

impl<'de> Deserialize<'de> for UserOperationGasEstimation {
    /// Some bundlers report `verificationGas` instead of `verificationGasLimit`
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let fields = value
            .as_object()
            .ok_or_else(|| de::Error::custom(format!("expected gas estimation object, got {value}")))?;
        let verification = fields.get("verificationGasLimit").or_else(|| fields.get("verificationGas"));
        Ok(Self {
            pre_verification_gas: parse_quantity(fields.get("preVerificationGas"))
                .map_err(de::Error::custom)?,
            verification_gas_limit: parse_quantity(verification).map_err(de::Error::custom)?,
            call_gas_limit: parse_quantity(fields.get("callGasLimit")).map_err(de::Error::custom)?,
        })
    }
}
