use super::{BridgePayload, HookConfig, QuoteBreakdown, RoutePlan, SwapLeg};
use crate::{
    constants::{bps::DENOMINATOR, planner::DEX, planner::MAX_GAS_SHIELD_SKIM_BPS},
    error::AutoBridgeError,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref AMOUNT: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("Regex rules valid");
}

/// Whether the string is a plain decimal amount (digits, optional single '.', no sign or exponent)
pub fn is_decimal_amount(value: &str) -> bool {
    AMOUNT.is_match(value)
}

/// A single problem found while validating a route plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field (e.g. `sourceSwap.minAmountOut`)
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue { path: path.into(), message: message.into() });
    }

    fn amount(&mut self, path: &str, value: &str) {
        if !is_decimal_amount(value) {
            self.push(path, "amount must be a decimal string");
        }
    }

    fn bps(&mut self, path: &str, value: u16) {
        if u64::from(value) > DENOMINATOR {
            self.push(path, "value must be <= 10000 (100%)");
        }
    }

    fn non_empty(&mut self, path: &str, value: &str) {
        if value.is_empty() {
            self.push(path, "must not be empty");
        }
    }
}

impl RoutePlan {
    /// Checks the plan against its schema
    ///
    /// # Returns
    /// * `Result<(), Vec<ValidationIssue>>` - Every issue found (not only the first one)
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Issues::default();

        if self.expires_at == 0 {
            issues.push("expiresAt", "must be positive");
        }
        if self.expires_at <= self.created_at {
            issues.push("expiresAt", "must be later than createdAt");
        }
        issues.non_empty("srcChain", &self.src_chain);
        issues.non_empty("dstChain", &self.dst_chain);
        issues.non_empty("tokenIn", &self.token_in);
        issues.non_empty("tokenOut", &self.token_out);
        issues.non_empty("recipient", &self.recipient);
        issues.amount("amountIn", &self.amount_in);

        validate_leg(&mut issues, "sourceSwap", &self.source_swap);
        if let Some(leg) = &self.destination_swap {
            validate_leg(&mut issues, "destinationSwap", leg);
        }
        validate_bridge(&mut issues, &self.bridge);
        validate_quote(&mut issues, &self.quote);

        if issues.0.is_empty() {
            Ok(())
        } else {
            Err(issues.0)
        }
    }

    /// Validates a plan this crate built itself, a failure is a defect
    pub fn ensure_valid(&self) -> Result<(), AutoBridgeError> {
        self.validate().map_err(|issues| {
            AutoBridgeError::invariant(
                issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
            )
        })
    }
}

fn validate_leg(issues: &mut Issues, path: &str, leg: &SwapLeg) {
    issues.non_empty(&format!("{path}.chainSlug"), &leg.chain_slug);
    if leg.dex != DEX {
        issues.push(format!("{path}.dex"), format!("unsupported dex {}", leg.dex));
    }
    issues.non_empty(&format!("{path}.poolId"), &leg.pool_id);
    issues.non_empty(&format!("{path}.tokenIn"), &leg.token_in);
    issues.non_empty(&format!("{path}.tokenOut"), &leg.token_out);
    issues.amount(&format!("{path}.amountIn"), &leg.amount_in);
    issues.amount(&format!("{path}.minAmountOut"), &leg.min_amount_out);
    if let Some(limit) = &leg.sqrt_price_limit_x96 {
        if !limit.chars().all(|c| c.is_ascii_digit()) || limit.is_empty() {
            issues.push(format!("{path}.sqrtPriceLimitX96"), "must be an unsigned integer");
        }
    }
    if let Some(hooks) = &leg.hooks {
        validate_hooks(issues, &format!("{path}.hooks"), hooks);
    }
}

fn validate_hooks(issues: &mut Issues, path: &str, hooks: &HookConfig) {
    if let Some(fee) = &hooks.bridge_aware_fee {
        issues.bps(&format!("{path}.bridgeAwareFee.extraFeeBps"), fee.extra_fee_bps);
        issues.bps(&format!("{path}.bridgeAwareFee.maxFeeBps"), fee.max_fee_bps);
        if fee.ttl_seconds == 0 {
            issues.push(format!("{path}.bridgeAwareFee.ttlSeconds"), "must be positive");
        }
    }
    if let Some(shield) = &hooks.gas_shield {
        if shield.skim_bps > MAX_GAS_SHIELD_SKIM_BPS {
            issues.push(
                format!("{path}.gasShield.skimBps"),
                format!("value must be <= {MAX_GAS_SHIELD_SKIM_BPS}"),
            );
        }
    }
}

fn validate_bridge(issues: &mut Issues, bridge: &BridgePayload) {
    issues.non_empty("bridge.srcChain", &bridge.src_chain);
    issues.non_empty("bridge.dstChain", &bridge.dst_chain);
    issues.non_empty("bridge.token", &bridge.token);
    issues.non_empty("bridge.recipient", &bridge.recipient);
    issues.non_empty("bridge.destToken", &bridge.dest_token);
    issues.amount("bridge.amount", &bridge.amount);
    issues.amount("bridge.minAmountOut", &bridge.min_amount_out);
    issues.bps("bridge.slippageBps", bridge.slippage_bps);
    if let Some(fee) = &bridge.fee {
        issues.non_empty("bridge.fee.token", &fee.token);
        issues.amount("bridge.fee.amount", &fee.amount);
    }
}

fn validate_quote(issues: &mut Issues, quote: &QuoteBreakdown) {
    issues.amount("quote.amountOut", &quote.amount_out);
    issues.amount("quote.minAmountOut", &quote.min_amount_out);
    issues.bps("quote.extraFeeBps", quote.extra_fee_bps);
    issues.bps("quote.gasVaultBps", quote.gas_vault_bps);
    if let Some(usd) = quote.bridge_fee_usd {
        if usd.is_nan() || usd < 0.0 {
            issues.push("quote.bridgeFeeUsd", "must be non-negative");
        }
    }
}
