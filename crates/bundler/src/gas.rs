//! Post-processing of bundler gas estimates

use autobridge_primitives::{
    constants::gas::{
        CALL_GAS_MULTIPLIER, MAX_CALL_GAS_LIMIT, MAX_VERIFICATION_GAS_LIMIT, MIN_CALL_GAS_LIMIT,
        MIN_VERIFICATION_GAS_LIMIT, PRE_VERIFICATION_GAS_MULTIPLIER, VERIFICATION_GAS_MULTIPLIER,
    },
    UserOperation, UserOperationGasEstimation,
};
use ethers::types::U256;

/// Safety multipliers (percent) applied to bundler estimates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMultipliers {
    pub call_gas: u64,
    pub verification: u64,
    pub pre_verification: u64,
}

impl Default for GasMultipliers {
    fn default() -> Self {
        Self {
            call_gas: CALL_GAS_MULTIPLIER,
            verification: VERIFICATION_GAS_MULTIPLIER,
            pre_verification: PRE_VERIFICATION_GAS_MULTIPLIER,
        }
    }
}

impl GasMultipliers {
    /// Scales every estimate up, rounding up
    pub fn apply(&self, estimation: &UserOperationGasEstimation) -> UserOperationGasEstimation {
        UserOperationGasEstimation {
            call_gas_limit: mul_percent_ceil(estimation.call_gas_limit, self.call_gas),
            verification_gas_limit: mul_percent_ceil(
                estimation.verification_gas_limit,
                self.verification,
            ),
            pre_verification_gas: mul_percent_ceil(
                estimation.pre_verification_gas,
                self.pre_verification,
            ),
        }
    }
}

fn mul_percent_ceil(value: U256, percent: u64) -> U256 {
    let scaled = value.saturating_mul(percent.into());
    let (quotient, remainder) = scaled.div_mod(100.into());
    if remainder.is_zero() {
        quotient
    } else {
        quotient + 1
    }
}

/// Gas limits outside the accepted bounds, empty if all limits are fine
pub fn validate_gas_limits(uo: &UserOperation) -> Vec<String> {
    let mut violations = vec![];
    let call: (U256, U256) = (MIN_CALL_GAS_LIMIT.into(), MAX_CALL_GAS_LIMIT.into());
    let verification: (U256, U256) = (MIN_VERIFICATION_GAS_LIMIT.into(), MAX_VERIFICATION_GAS_LIMIT.into());

    if uo.call_gas_limit < call.0 || uo.call_gas_limit > call.1 {
        violations.push(format!(
            "callGasLimit {} is outside [{}, {}]",
            uo.call_gas_limit, call.0, call.1
        ));
    }
    if uo.verification_gas_limit < verification.0 || uo.verification_gas_limit > verification.1 {
        violations.push(format!(
            "verificationGasLimit {} is outside [{}, {}]",
            uo.verification_gas_limit, verification.0, verification.1
        ));
    }

    violations
}

/// Upper bound of what the user operation can cost, `(call + verification + preVerification) *
/// maxFeePerGas`
pub fn max_gas_cost(uo: &UserOperation) -> U256 {
    uo.call_gas_limit
        .saturating_add(uo.verification_gas_limit)
        .saturating_add(uo.pre_verification_gas)
        .saturating_mul(uo.max_fee_per_gas)
}
