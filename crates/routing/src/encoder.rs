//! Route encoder: maps a route plan onto the wallet executor's route input

use crate::units::{parse_amount, parse_units};
use autobridge_contracts::executor::{
    BridgeFeeConfig, BridgeParams, DestPayload, DestSwap, GasFeeConfig, MessagingFee, Permit,
    PoolKey, RouteInput, SourceSwap, SwapParams,
};
use autobridge_primitives::{
    config::Env, AutoBridgeError, AutoBridgeResult, ChainRegistry, PoolConfig, RoutePlan, SwapLeg,
};
use ethers::types::{Address, Bytes, I256, U256};
use std::{str::FromStr, sync::Arc};
use tracing::debug;

/// Pool key of the pair, with `currency0 < currency1`
///
/// Byte order of addresses equals the order of their lowercase hex strings, so the key does not
/// depend on checksum casing or on the swap direction.
pub fn derive_pool_key(input: Address, output: Address, pool: &PoolConfig) -> PoolKey {
    let (currency0, currency1) = if input < output { (input, output) } else { (output, input) };
    PoolKey {
        currency0,
        currency1,
        fee: pool.fee,
        tick_spacing: pool.tick_spacing,
        hooks: pool.hook,
    }
}

/// Exact-input swap parameters, `zeroForOne` iff the input token is `currency0`
pub fn derive_swap_params(
    pool_key: &PoolKey,
    input: Address,
    amount_in: U256,
    sqrt_price_limit_x96: Option<&str>,
) -> AutoBridgeResult<SwapParams> {
    Ok(SwapParams {
        zero_for_one: input == pool_key.currency0,
        amount_specified: to_i256(amount_in)?,
        sqrt_price_limit_x96: parse_sqrt_price_limit(sqrt_price_limit_x96)?,
    })
}

fn to_i256(value: U256) -> AutoBridgeResult<I256> {
    if value > I256::MAX.into_raw() {
        return Err(AutoBridgeError::invariant(format!("{value} does not fit into int256")));
    }
    Ok(I256::from_raw(value))
}

fn to_u128(value: U256, field: &str) -> AutoBridgeResult<u128> {
    u128::try_from(value)
        .map_err(|_| AutoBridgeError::invariant(format!("{field} {value} does not fit into uint128")))
}

fn parse_sqrt_price_limit(limit: Option<&str>) -> AutoBridgeResult<U256> {
    let Some(limit) = limit.filter(|limit| !limit.is_empty()) else {
        return Ok(U256::zero());
    };
    let value = U256::from_dec_str(limit).map_err(|_| {
        AutoBridgeError::invariant(format!("Invalid sqrtPriceLimitX96: {limit}"))
    })?;
    if value.bits() > 160 {
        return Err(AutoBridgeError::invariant(format!("sqrtPriceLimitX96 {limit} exceeds uint160")));
    }
    Ok(value)
}

/// Encodes validated route plans for the wallet executor contract
#[derive(Clone, Debug)]
pub struct RouteEncoder {
    registry: Arc<ChainRegistry>,
    pool: PoolConfig,
}

impl RouteEncoder {
    pub fn new(registry: Arc<ChainRegistry>, pool: PoolConfig) -> Self {
        Self { registry, pool }
    }

    /// Creates an encoder with the pool configuration read from the environment
    pub fn from_env(registry: Arc<ChainRegistry>, env: &Env) -> AutoBridgeResult<Self> {
        Ok(Self::new(registry, PoolConfig::from_env(env)?))
    }

    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool
    }

    fn token_address(&self, chain: &str, symbol: &str) -> AutoBridgeResult<(Address, u8)> {
        let token = self.registry.token(chain, symbol)?;
        if token.address.is_zero() {
            return Err(AutoBridgeError::input(format!(
                "Token {symbol} has no configured address for {chain}"
            )));
        }
        Ok((token.address, token.decimals))
    }

    /// Maps the plan onto the route input of `executeRoute`
    ///
    /// # Arguments
    /// * `plan` - Validated route plan, executed on `plan.src_chain`
    /// * `smart_account` - Account executing the route, also the refund address
    /// * `paymaster` - Last fallback of the gas vault
    ///
    /// # Returns
    /// * `AutoBridgeResult<RouteInput>` - The route input, an input error for unknown tokens or
    ///   an invariant violation if a value overflows its ABI type
    pub fn encode(
        &self,
        plan: &RoutePlan,
        smart_account: Address,
        paymaster: Address,
    ) -> AutoBridgeResult<RouteInput> {
        let chain = plan.src_chain.as_str();
        let leg = &plan.source_swap;

        let (token_in, token_in_decimals) = self.token_address(chain, &plan.token_in)?;
        let (swap_in, swap_in_decimals) = self.token_address(chain, &leg.token_in)?;
        let (swap_out, swap_out_decimals) = self.token_address(chain, &leg.token_out)?;

        let amount_in = parse_units(&plan.amount_in, token_in_decimals)?;
        let pool_key = derive_pool_key(swap_in, swap_out, &self.pool);
        let swap_params = derive_swap_params(
            &pool_key,
            swap_in,
            parse_amount(&leg.amount_in, swap_in_decimals)?,
            leg.sqrt_price_limit_x96.as_deref(),
        )?;
        let min_amount_out = parse_amount(&leg.min_amount_out, swap_out_decimals)?;

        let metadata = &plan.bridge.metadata;
        let native_fee = to_u128(metadata.native_fee(), "nativeFeeWei")?;
        let lz_token_fee = to_u128(metadata.lz_token_fee(), "lzTokenFeeWei")?;

        let hooks = leg.hooks.clone().unwrap_or_default();
        let skim_bps = hooks.gas_shield.as_ref().map(|shield| shield.skim_bps).unwrap_or_default();
        let gas_vault = hooks
            .gas_shield
            .as_ref()
            .and_then(|shield| shield.gas_vault)
            .filter(|vault| !vault.is_zero())
            .or(self.pool.gas_vault)
            .unwrap_or(paymaster);

        let quote_timestamp = plan.quote.price_timestamp;
        let ttl = plan.ttl_seconds();
        let bridge_fee = match &hooks.bridge_aware_fee {
            Some(fee) => BridgeFeeConfig {
                extra_fee_bps: fee.extra_fee_bps,
                max_fee_bps: fee.max_fee_bps,
                quote_timestamp: fee.price_timestamp,
                ttl: fee.ttl_seconds,
                native_fee,
            },
            None => BridgeFeeConfig { quote_timestamp, ttl, native_fee, ..Default::default() },
        };

        let recipient = Address::from_str(&plan.recipient).map_err(|_| {
            AutoBridgeError::input(format!("Invalid recipient address: {}", plan.recipient))
        })?;

        let route = RouteInput {
            user: smart_account,
            token_in,
            amount_in,
            permit: Permit::default(),
            source_swap: SourceSwap {
                execute: leg.token_in != leg.token_out,
                pool_key,
                swap_params,
                bridge_fee,
                gas_fee: GasFeeConfig {
                    vault: gas_vault,
                    skim_bps,
                    max_skim_bps: skim_bps.max(self.pool.max_skim_floor_bps),
                },
                min_amount_out,
            },
            bridge: BridgeParams {
                dst_eid: metadata.dst_eid.unwrap_or_default(),
                dest_executor: metadata.dest_executor(),
                options: metadata.options.clone().unwrap_or_default(),
                fee: MessagingFee { native_fee, lz_token_fee },
                refund_address: smart_account,
                dest_payload: DestPayload {
                    recipient,
                    dest_swap: self.dest_swap(&plan.dst_chain, plan.destination_swap.as_ref())?,
                    quote_timestamp,
                    ttl,
                    price_payload: metadata.price_payload.clone().unwrap_or_default(),
                },
            },
        };

        debug!(
            "Encoded route {:?} for {smart_account:?}: amount in {}, gas vault {gas_vault:?}, native fee {native_fee}",
            plan.id, route.amount_in
        );

        Ok(route)
    }

    fn dest_swap(&self, chain: &str, leg: Option<&SwapLeg>) -> AutoBridgeResult<DestSwap> {
        let Some(leg) = leg else {
            return Ok(DestSwap {
                execute: false,
                token_out: Address::zero(),
                pool_key: PoolKey {
                    currency0: Address::zero(),
                    currency1: Address::zero(),
                    fee: self.pool.fee,
                    tick_spacing: self.pool.tick_spacing,
                    hooks: self.pool.hook,
                },
                swap_params: SwapParams {
                    zero_for_one: true,
                    amount_specified: I256::zero(),
                    sqrt_price_limit_x96: U256::zero(),
                },
                hook_data: Bytes::default(),
                min_amount_out: U256::zero(),
            });
        };

        let (token_in, token_in_decimals) = self.token_address(chain, &leg.token_in)?;
        let (token_out, token_out_decimals) = self.token_address(chain, &leg.token_out)?;
        let pool_key = derive_pool_key(token_in, token_out, &self.pool);
        let swap_params = derive_swap_params(
            &pool_key,
            token_in,
            parse_amount(&leg.amount_in, token_in_decimals)?,
            leg.sqrt_price_limit_x96.as_deref(),
        )?;

        Ok(DestSwap {
            execute: true,
            token_out,
            pool_key,
            swap_params,
            hook_data: Bytes::default(),
            min_amount_out: parse_amount(&leg.min_amount_out, token_out_decimals)?,
        })
    }
}
