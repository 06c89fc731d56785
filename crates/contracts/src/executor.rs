//! Wallet executor route input and `executeRoute` calldata
//!
//! The structs are tokenized in declaration order, which must follow the tuple layout of
//! [EXECUTE_ROUTE_SIGNATURE](EXECUTE_ROUTE_SIGNATURE). Solidity `uint24`/`int24` fields are held in
//! `u32`/`i32` and `uint160` in `U256`, their ABI encoding is the same 32-byte word.

use ethers::{
    abi::{self, Tokenizable},
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, Selector, I256, U256},
    utils::id,
};
use lazy_static::lazy_static;

/// Canonical signature of the wallet executor entry point
pub const EXECUTE_ROUTE_SIGNATURE: &str = "executeRoute((address,address,uint256,(bool,uint256,uint256,uint8,bytes32,bytes32),(bool,(address,address,uint24,int24,address),(bool,int256,uint160),(uint16,uint16,uint64,uint64,uint128),(address,uint16,uint16),uint256),(uint32,address,bytes,(uint128,uint128),address,(address,(bool,address,(address,address,uint24,int24,address),(bool,int256,uint160),bytes,uint256),uint64,uint64,bytes))))";

lazy_static! {
    pub static ref EXECUTE_ROUTE_SELECTOR: Selector = id(EXECUTE_ROUTE_SIGNATURE);
}

/// Uniswap v4 pool key
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    /// uint24
    pub fee: u32,
    /// int24
    pub tick_spacing: i32,
    pub hooks: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct SwapParams {
    pub zero_for_one: bool,
    pub amount_specified: I256,
    /// uint160
    pub sqrt_price_limit_x96: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct Permit {
    pub use_permit: bool,
    pub value: U256,
    pub deadline: U256,
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct BridgeFeeConfig {
    pub extra_fee_bps: u16,
    pub max_fee_bps: u16,
    pub quote_timestamp: u64,
    pub ttl: u64,
    pub native_fee: u128,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct GasFeeConfig {
    pub vault: Address,
    pub skim_bps: u16,
    pub max_skim_bps: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct SourceSwap {
    pub execute: bool,
    pub pool_key: PoolKey,
    pub swap_params: SwapParams,
    pub bridge_fee: BridgeFeeConfig,
    pub gas_fee: GasFeeConfig,
    pub min_amount_out: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct MessagingFee {
    pub native_fee: u128,
    pub lz_token_fee: u128,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct DestSwap {
    pub execute: bool,
    pub token_out: Address,
    pub pool_key: PoolKey,
    pub swap_params: SwapParams,
    pub hook_data: Bytes,
    pub min_amount_out: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct DestPayload {
    pub recipient: Address,
    pub dest_swap: DestSwap,
    pub quote_timestamp: u64,
    pub ttl: u64,
    pub price_payload: Bytes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct BridgeParams {
    pub dst_eid: u32,
    pub dest_executor: Address,
    pub options: Bytes,
    pub fee: MessagingFee,
    pub refund_address: Address,
    pub dest_payload: DestPayload,
}

/// Argument of `executeRoute`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct RouteInput {
    pub user: Address,
    pub token_in: Address,
    pub amount_in: U256,
    pub permit: Permit,
    pub source_swap: SourceSwap,
    pub bridge: BridgeParams,
}

impl RouteInput {
    /// ABI-encoded `executeRoute(route)` call
    pub fn execute_route_call_data(&self) -> Bytes {
        let mut data = EXECUTE_ROUTE_SELECTOR.to_vec();
        data.extend(abi::encode(&[self.clone().into_token()]));
        data.into()
    }
}
