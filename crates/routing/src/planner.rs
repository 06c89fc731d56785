//! Route planner: quotes a source swap, a bridge transfer and a destination swap

use crate::units::{apply_bps, format_units, parse_amount, parse_units, scale_decimals};
use autobridge_primitives::{
    constants::{
        planner::{
            BRIDGE_TOKEN, DEX, EXTRA_FEE_BPS, GAS_VAULT_BPS, MAX_EXTRA_FEE_BPS,
            MAX_GAS_SHIELD_SKIM_BPS, MAX_SLIPPAGE_BPS, MAX_TTL_SECONDS, OFT_TOKEN, SLIPPAGE_BPS,
            TTL_SECONDS,
        },
    },
    AutoBridgeError, AutoBridgeResult, BridgeAwareFee, BridgeFee, BridgePayload, BridgeProtocol,
    ChainRegistry, FeeSource, GasShield, HookConfig, QuoteBreakdown, RoutePlan, RouteRequest,
    SwapLeg,
};
use ethers::{types::U256, utils::keccak256};
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use strum_macros::{Display, EnumString};
use tracing::{debug, trace};

/// How the planner shapes a route
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanStrategy {
    /// Source swap, bridge and destination swap with fees
    #[default]
    Standard,
    /// Standard amounts, executed as source swap and bridge only: no extra fee, no gas skim,
    /// no destination swap and a source swap bounded by its own input
    Simplified,
}

/// Route planner settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    /// Settlement token bridged between the chains
    pub bridge_token: String,
    pub extra_fee_bps: u16,
    pub gas_vault_bps: u16,
    pub slippage_bps: u16,
    pub ttl_seconds: u64,
    pub strategy: PlanStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            bridge_token: BRIDGE_TOKEN.into(),
            extra_fee_bps: EXTRA_FEE_BPS,
            gas_vault_bps: GAS_VAULT_BPS,
            slippage_bps: SLIPPAGE_BPS,
            ttl_seconds: TTL_SECONDS,
            strategy: PlanStrategy::Standard,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> AutoBridgeResult<()> {
        if self.bridge_token.is_empty() {
            return Err(AutoBridgeError::config("Bridge token must be set"));
        }
        if self.extra_fee_bps > MAX_EXTRA_FEE_BPS {
            return Err(AutoBridgeError::config(format!(
                "Extra fee {} bps exceeds the maximum of {MAX_EXTRA_FEE_BPS} bps",
                self.extra_fee_bps
            )));
        }
        if self.gas_vault_bps > MAX_GAS_SHIELD_SKIM_BPS {
            return Err(AutoBridgeError::config(format!(
                "Gas vault fee {} bps exceeds the maximum of {MAX_GAS_SHIELD_SKIM_BPS} bps",
                self.gas_vault_bps
            )));
        }
        if self.slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(AutoBridgeError::config(format!(
                "Slippage {} bps exceeds the maximum of {MAX_SLIPPAGE_BPS} bps",
                self.slippage_bps
            )));
        }
        if self.ttl_seconds == 0 || self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(AutoBridgeError::config(format!(
                "Quote TTL must be between 1 and {MAX_TTL_SECONDS} seconds, got {}",
                self.ttl_seconds
            )));
        }
        Ok(())
    }

    /// Extra fee and gas vault fee charged on chain at the configured strategy
    fn charged_fees(&self) -> (u16, u16) {
        match self.strategy {
            PlanStrategy::Standard => (self.extra_fee_bps, self.gas_vault_bps),
            PlanStrategy::Simplified => (0, 0),
        }
    }
}

/// Milliseconds since the unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}

/// Base-unit amounts of a quote
#[derive(Debug)]
struct Amounts {
    fee_src: U256,
    after_fees: U256,
    dest_bridge: U256,
    bridge_min: U256,
    dest_min: U256,
}

/// Plans routes against a read-only registry
///
/// Planning is a pure function of the request, the registry, the config and the clock, so a
/// planner is shared freely between concurrent requests.
#[derive(Clone, Debug)]
pub struct RoutePlanner {
    registry: Arc<ChainRegistry>,
    config: PlannerConfig,
}

impl RoutePlanner {
    /// Creates a planner, rejecting out-of-range settings
    pub fn new(registry: Arc<ChainRegistry>, config: PlannerConfig) -> AutoBridgeResult<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a route at the current time
    pub fn plan(&self, request: &RouteRequest) -> AutoBridgeResult<RoutePlan> {
        self.plan_at(request, now_ms())
    }

    /// Plans a route as of `now` (milliseconds since epoch)
    ///
    /// # Returns
    /// * `AutoBridgeResult<RoutePlan>` - A validated plan, an input error for unknown chains,
    ///   tokens or malformed amounts, or an invariant violation if the plan fails its own checks
    pub fn plan_at(&self, request: &RouteRequest, now: u64) -> AutoBridgeResult<RoutePlan> {
        let bridge_token = self.config.bridge_token.as_str();
        let src_chain = self.registry.chain(&request.src_chain)?;
        let dst_chain = self.registry.chain(&request.dst_chain)?;
        let src_token = self.registry.token(&request.src_chain, &request.token_in)?;
        let dst_token = self.registry.token(&request.dst_chain, &request.token_out)?;
        let src_bridge = self.registry.token(&request.src_chain, bridge_token)?;
        let dst_bridge = self.registry.token(&request.dst_chain, bridge_token)?;

        let slippage_bps = self.config.slippage_bps;

        let amount_in = parse_units(&request.amount_in, src_token.decimals)?;
        let bridge_units = scale_decimals(amount_in, src_token.decimals, src_bridge.decimals)?;
        let after_fees =
            apply_bps(bridge_units, self.config.extra_fee_bps + self.config.gas_vault_bps)?;
        let fee_src = amount_in
            - scale_decimals(after_fees, src_bridge.decimals, src_token.decimals)?;
        let dest_bridge = scale_decimals(after_fees, src_bridge.decimals, dst_bridge.decimals)?;
        let bridge_min = apply_bps(dest_bridge, slippage_bps)?;
        let dest_ideal = scale_decimals(dest_bridge, dst_bridge.decimals, dst_token.decimals)?;
        let dest_min = apply_bps(dest_ideal, slippage_bps)?;
        let amounts = Amounts { fee_src, after_fees, dest_bridge, bridge_min, dest_min };
        trace!("Quote amounts for {request:?}: {amounts:?}");

        let created_at = now;
        let expires_at = now + self.config.ttl_seconds * 1000;
        let price_timestamp = now / 1000;
        let hooks = self.hooks(price_timestamp);

        let source_swap = SwapLeg {
            chain_slug: request.src_chain.clone(),
            dex: DEX.into(),
            pool_id: pool_id(&request.token_in, bridge_token),
            token_in: request.token_in.clone(),
            token_out: bridge_token.into(),
            amount_in: request.amount_in.clone(),
            min_amount_out: match self.config.strategy {
                PlanStrategy::Standard => format_units(amounts.after_fees, src_bridge.decimals)?,
                PlanStrategy::Simplified => request.amount_in.clone(),
            },
            sqrt_price_limit_x96: None,
            hooks: Some(hooks.clone()),
            notes: vec![format!("Swap on {}", src_chain.name)],
        };

        let destination_swap = match self.config.strategy {
            PlanStrategy::Standard => Some(SwapLeg {
                chain_slug: request.dst_chain.clone(),
                dex: DEX.into(),
                pool_id: pool_id(bridge_token, &request.token_out),
                token_in: bridge_token.into(),
                token_out: request.token_out.clone(),
                amount_in: format_units(amounts.dest_bridge, dst_bridge.decimals)?,
                min_amount_out: format_units(amounts.dest_min, dst_token.decimals)?,
                sqrt_price_limit_x96: None,
                hooks: Some(hooks),
                notes: vec![format!("Swap on {}", dst_chain.name)],
            }),
            PlanStrategy::Simplified => None,
        };

        let bridge = BridgePayload {
            protocol: BridgeProtocol::LayerZeroV2,
            oft: bridge_token == OFT_TOKEN,
            src_chain: request.src_chain.clone(),
            dst_chain: request.dst_chain.clone(),
            token: bridge_token.into(),
            amount: format_units(amounts.after_fees, src_bridge.decimals)?,
            min_amount_out: format_units(amounts.bridge_min, dst_bridge.decimals)?,
            recipient: request.recipient.clone(),
            dest_token: bridge_token.into(),
            slippage_bps,
            metadata: Default::default(),
            fee: Some(BridgeFee {
                token: request.token_in.clone(),
                amount: format_units(amounts.fee_src, src_token.decimals)?,
                source: FeeSource::Embedded,
            }),
        };

        let amount_out = format_units(amounts.dest_min, dst_token.decimals)?;
        let min_amount_out = match self.config.strategy {
            PlanStrategy::Standard => amount_out.clone(),
            PlanStrategy::Simplified => bridge.min_amount_out.clone(),
        };
        let (extra_fee_bps, gas_vault_bps) = self.config.charged_fees();

        let plan = RoutePlan {
            id: Some(plan_id(request, created_at)?),
            created_at,
            expires_at,
            src_chain: request.src_chain.clone(),
            dst_chain: request.dst_chain.clone(),
            token_in: request.token_in.clone(),
            token_out: request.token_out.clone(),
            amount_in: request.amount_in.clone(),
            recipient: request.recipient.clone(),
            source_swap,
            bridge,
            destination_swap,
            quote: QuoteBreakdown {
                amount_out,
                min_amount_out,
                extra_fee_bps,
                gas_vault_bps,
                bridge_fee_usd: None,
                price_timestamp,
            },
            warnings: vec![],
        };

        plan.ensure_valid()?;
        self.check_leg_bounds(&plan)?;

        debug!(
            "Planned route {:?}: {} {} on {} -> {} {} on {}",
            plan.id,
            plan.amount_in,
            plan.token_in,
            plan.src_chain,
            plan.quote.min_amount_out,
            plan.token_out,
            plan.dst_chain
        );

        Ok(plan)
    }

    fn hooks(&self, price_timestamp: u64) -> HookConfig {
        let (extra_fee_bps, skim_bps) = self.config.charged_fees();
        HookConfig {
            bridge_aware_fee: Some(BridgeAwareFee {
                extra_fee_bps,
                max_fee_bps: self.config.extra_fee_bps * 2,
                price_timestamp,
                ttl_seconds: self.config.ttl_seconds,
            }),
            gas_shield: Some(GasShield { skim_bps, gas_vault: None }),
        }
    }

    /// Checks `minAmountOut <= amountIn` of every leg, both in the input token's base units
    fn check_leg_bounds(&self, plan: &RoutePlan) -> AutoBridgeResult<()> {
        for leg in plan.legs() {
            let token_in = self.registry.token(&leg.chain_slug, &leg.token_in)?;
            let token_out = self.registry.token(&leg.chain_slug, &leg.token_out)?;
            let amount_in = parse_amount(&leg.amount_in, token_in.decimals)?;
            let min_out = scale_decimals(
                parse_amount(&leg.min_amount_out, token_out.decimals)?,
                token_out.decimals,
                token_in.decimals,
            )?;
            if min_out > amount_in {
                return Err(AutoBridgeError::invariant(format!(
                    "Leg {} min amount out {} exceeds amount in {}",
                    leg.pool_id, leg.min_amount_out, leg.amount_in
                )));
            }
        }
        Ok(())
    }
}

fn pool_id(token_in: &str, token_out: &str) -> String {
    format!("{token_in}-{token_out}").to_lowercase()
}

/// `plan-{createdAt}-{first 4 bytes of keccak(request)}`
fn plan_id(request: &RouteRequest, created_at: u64) -> AutoBridgeResult<String> {
    let encoded = serde_json::to_vec(request)
        .map_err(|err| AutoBridgeError::invariant(format!("Failed to encode request: {err}")))?;
    let digest = keccak256(encoded);
    let suffix: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("plan-{created_at}-{suffix}"))
}
