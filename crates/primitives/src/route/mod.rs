//! Route plan: source swap, cross-chain bridge and optional destination swap

mod validate;

use crate::utils::{as_checksum_addr_opt, decimal_u256_opt};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};
pub use validate::{is_decimal_amount, ValidationIssue};

/// Swap/bridge request the planner turns into a [RoutePlan](RoutePlan)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub src_chain: String,
    pub dst_chain: String,
    pub token_in: String,
    pub token_out: String,
    /// Decimal string in whole token units (e.g. "1.5")
    pub amount_in: String,
    pub recipient: String,
}

/// Quote for moving `amount_in` of `token_in` on `src_chain` into `token_out` on `dst_chain`
///
/// A plan is immutable once validated. Adjustments build a new plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// Expiry time (milliseconds since epoch)
    pub expires_at: u64,
    pub src_chain: String,
    pub dst_chain: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub recipient: String,
    pub source_swap: SwapLeg,
    pub bridge: BridgePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_swap: Option<SwapLeg>,
    pub quote: QuoteBreakdown,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RoutePlan {
    /// Quote lifetime in whole seconds
    pub fn ttl_seconds(&self) -> u64 {
        self.expires_at.saturating_sub(self.created_at) / 1000
    }

    /// Swap legs in execution order
    pub fn legs(&self) -> impl Iterator<Item = &SwapLeg> {
        std::iter::once(&self.source_swap).chain(self.destination_swap.iter())
    }
}

/// Single swap on one chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapLeg {
    pub chain_slug: String,
    pub dex: String,
    pub pool_id: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub min_amount_out: String,
    /// Decimal string, 0 means no price limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqrt_price_limit_x96: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HookConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Pool hook configuration of a swap leg
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_aware_fee: Option<BridgeAwareFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_shield: Option<GasShield>,
}

/// Extra fee charged by the bridge-aware fee hook
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeAwareFee {
    pub extra_fee_bps: u16,
    pub max_fee_bps: u16,
    /// Price timestamp (seconds since epoch)
    pub price_timestamp: u64,
    pub ttl_seconds: u64,
}

/// Gas skim taken by the gas shield hook
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasShield {
    pub skim_bps: u16,
    /// Vault receiving the skim, unset (or zero) falls back to the configured default
    #[serde(
        default,
        serialize_with = "as_checksum_addr_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_vault: Option<Address>,
}

/// Bridge protocols
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum BridgeProtocol {
    #[serde(rename = "layerzero-v2")]
    #[strum(serialize = "layerzero-v2")]
    LayerZeroV2,
    #[serde(rename = "local-demo")]
    #[strum(serialize = "local-demo")]
    LocalDemo,
}

/// Who pays the bridge fee
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeeSource {
    /// Taken out of the bridged amount
    #[default]
    Embedded,
    Sponsor,
    User,
}

/// Cross-chain transfer of the settlement token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgePayload {
    pub protocol: BridgeProtocol,
    /// Whether the token is an omnichain fungible token
    #[serde(default)]
    pub oft: bool,
    pub src_chain: String,
    pub dst_chain: String,
    pub token: String,
    pub amount: String,
    pub min_amount_out: String,
    pub recipient: String,
    pub dest_token: String,
    pub slippage_bps: u16,
    #[serde(default, skip_serializing_if = "BridgeMetadata::is_empty")]
    pub metadata: BridgeMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<BridgeFee>,
}

/// Fee embedded in the route
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFee {
    pub token: String,
    pub amount: String,
    #[serde(default)]
    pub source: FeeSource,
}

/// Protocol-specific bridge metadata
///
/// Passed to the executor unchanged. Missing numerics default to zero, missing addresses to the
/// zero address and missing byte strings to empty bytes. Unrecognized keys are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMetadata {
    /// Native messaging fee (wei, decimal string on the wire)
    #[serde(default, with = "decimal_u256_opt", skip_serializing_if = "Option::is_none")]
    pub native_fee_wei: Option<U256>,
    /// LayerZero token fee (decimal string on the wire)
    #[serde(default, with = "decimal_u256_opt", skip_serializing_if = "Option::is_none")]
    pub lz_token_fee_wei: Option<U256>,
    /// Destination endpoint id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_eid: Option<u32>,
    #[serde(
        default,
        serialize_with = "as_checksum_addr_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub dest_executor: Option<Address>,
    /// Messaging options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_payload: Option<Bytes>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BridgeMetadata {
    pub fn is_empty(&self) -> bool {
        self == &BridgeMetadata::default()
    }

    pub fn native_fee(&self) -> U256 {
        self.native_fee_wei.unwrap_or_default()
    }

    pub fn lz_token_fee(&self) -> U256 {
        self.lz_token_fee_wei.unwrap_or_default()
    }

    pub fn dest_executor(&self) -> Address {
        self.dest_executor.unwrap_or_default()
    }
}

/// What the user receives
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBreakdown {
    pub amount_out: String,
    pub min_amount_out: String,
    pub extra_fee_bps: u16,
    pub gas_vault_bps: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_fee_usd: Option<f64>,
    /// Price timestamp (seconds since epoch)
    pub price_timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bridge_metadata_passthrough() {
        let metadata: BridgeMetadata = serde_json::from_value(json!({
            "nativeFeeWei": "1000000000000000",
            "dstEid": 40232,
            "options": "0x0003",
            "gasLimit": 200000
        }))
        .unwrap();
        assert_eq!(metadata.native_fee(), U256::from(1_000_000_000_000_000u64));
        assert_eq!(metadata.lz_token_fee(), U256::zero());
        assert_eq!(metadata.dst_eid, Some(40232));
        assert_eq!(metadata.dest_executor(), Address::zero());
        assert_eq!(metadata.extra.get("gasLimit"), Some(&json!(200000)));

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["nativeFeeWei"], json!("1000000000000000"));
        assert_eq!(value["gasLimit"], json!(200000));
        assert!(value.get("lzTokenFeeWei").is_none());
    }

    #[test]
    fn protocol_and_fee_source_names() {
        assert_eq!(
            serde_json::to_value(BridgeProtocol::LayerZeroV2).unwrap(),
            json!("layerzero-v2")
        );
        assert_eq!("local-demo".parse::<BridgeProtocol>().unwrap(), BridgeProtocol::LocalDemo);
        assert!(serde_json::from_value::<BridgeProtocol>(json!("wormhole")).is_err());
        assert_eq!(FeeSource::default().to_string(), "embedded");
        assert_eq!(serde_json::from_value::<FeeSource>(json!("sponsor")).unwrap(), FeeSource::Sponsor);
    }
}
