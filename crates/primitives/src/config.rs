//! Configuration records resolved once from an environment snapshot

use crate::{
    constants::{
        encoder::{MAX_POOL_FEE, MAX_SKIM_FLOOR_BPS, POOL_FEE, TICK_SPACING},
        env::{GAS_VAULT_ADDRESS, POOL_FEE as POOL_FEE_ENV, POOL_HOOK_ADDRESS, POOL_TICK_SPACING,
            PUBLIC_PREFIX},
    },
    error::{AutoBridgeError, AutoBridgeResult},
    registry::ChainConfig,
    utils::as_checksum_addr,
};
use ethers::types::Address;
use serde::Serialize;
use std::{collections::HashMap, str::FromStr};
use tracing::warn;

/// Snapshot of environment variables
pub type Env = HashMap<String, String>;

/// Takes a snapshot of the process environment
pub fn env_snapshot() -> Env {
    std::env::vars().collect()
}

/// `NEXT_PUBLIC_` prefixed alias of a variable
pub fn public_alias(name: &str) -> String {
    format!("{PUBLIC_PREFIX}{name}")
}

/// Value of the variable or its public alias, empty values count as unset
pub fn lookup_env<'a>(env: &'a Env, name: &str) -> Option<&'a str> {
    [name.to_string(), public_alias(name)]
        .iter()
        .filter_map(|key| env.get(key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// Value of a required variable
///
/// # Returns
/// * `AutoBridgeResult<&str>` - The value or a configuration error naming the variable
pub fn require_env<'a>(env: &'a Env, name: &str) -> AutoBridgeResult<&'a str> {
    lookup_env(env, name).ok_or_else(|| {
        AutoBridgeError::config(format!(
            "Environment variable {name} is required (aliases checked: {})",
            public_alias(name)
        ))
    })
}

fn require_address(env: &Env, name: &str) -> AutoBridgeResult<Address> {
    let value = require_env(env, name)?;
    Address::from_str(value).map_err(|_| {
        AutoBridgeError::config(format!(
            "Environment variable {name} is not a valid address: {value}"
        ))
    })
}

/// Bundler endpoint and the contract addresses of one chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    pub chain_slug: String,
    pub bundler_url: String,
    #[serde(serialize_with = "as_checksum_addr")]
    pub paymaster: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub wallet_executor: Address,
}

impl BundlerConfig {
    /// Resolves the bundler configuration of a chain
    ///
    /// # Arguments
    /// * `chain_slug` - Registry slug of the chain
    /// * `chain` - Chain configuration naming the environment variables
    /// * `env` - Environment snapshot
    ///
    /// # Returns
    /// * `AutoBridgeResult<Self>` - Fails with a configuration error naming the first missing
    ///   variable
    pub fn from_env(chain_slug: &str, chain: &ChainConfig, env: &Env) -> AutoBridgeResult<Self> {
        let bundler_url = require_env(env, &chain.erc4337.bundler_env)?.to_string();
        let paymaster = require_address(env, &chain.erc4337.paymaster_env)?;
        let wallet_executor = require_address(env, &chain.erc4337.wallet_executor_env)?;

        Ok(Self {
            chain_slug: chain_slug.to_string(),
            bundler_url,
            paymaster,
            entry_point: chain.erc4337.entry_point,
            wallet_executor,
        })
    }
}

/// Pool parameters used by the route encoder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Hook contract attached to every pool
    pub hook: Address,
    /// Pool fee (hundredths of a bip)
    pub fee: u32,
    pub tick_spacing: i32,
    /// Default gas vault, used when the hook config names none
    pub gas_vault: Option<Address>,
    /// Lower bound of the max skim handed to the executor
    pub max_skim_floor_bps: u16,
}

impl PoolConfig {
    pub fn new(hook: Address) -> Self {
        Self {
            hook,
            fee: POOL_FEE,
            tick_spacing: TICK_SPACING,
            gas_vault: None,
            max_skim_floor_bps: MAX_SKIM_FLOOR_BPS,
        }
    }

    /// Reads the pool configuration from the environment
    ///
    /// A missing hook address is an input error, the encoder never defaults it.
    pub fn from_env(env: &Env) -> AutoBridgeResult<Self> {
        let hook = lookup_env(env, POOL_HOOK_ADDRESS)
            .and_then(|value| Address::from_str(value).ok())
            .ok_or_else(|| {
                AutoBridgeError::input(format!(
                    "{POOL_HOOK_ADDRESS} (or {}) is required to build route calldata",
                    public_alias(POOL_HOOK_ADDRESS)
                ))
            })?;

        let mut config = Self::new(hook);

        if let Some(value) = lookup_env(env, POOL_FEE_ENV) {
            config.fee = value
                .parse::<u32>()
                .ok()
                .filter(|fee| *fee <= MAX_POOL_FEE)
                .ok_or_else(|| AutoBridgeError::input(format!("Invalid pool fee: {value}")))?;
        }

        if let Some(value) = lookup_env(env, POOL_TICK_SPACING) {
            // int24
            config.tick_spacing = value
                .parse::<i32>()
                .ok()
                .filter(|spacing| (-(1 << 23)..(1 << 23)).contains(spacing))
                .ok_or_else(|| {
                    AutoBridgeError::input(format!("Invalid pool tick spacing: {value}"))
                })?;
        }

        if let Some(value) = lookup_env(env, GAS_VAULT_ADDRESS) {
            match Address::from_str(value) {
                Ok(vault) if !vault.is_zero() => config.gas_vault = Some(vault),
                _ => warn!("Ignoring invalid {GAS_VAULT_ADDRESS}: {value}"),
            }
        }

        Ok(config)
    }

    /// Sets the max skim floor
    pub fn with_max_skim_floor_bps(mut self, bps: u16) -> AutoBridgeResult<Self> {
        if bps > 10_000 {
            return Err(AutoBridgeError::config(format!(
                "Max skim floor must be <= 10000 bps, got {bps}"
            )));
        }
        self.max_skim_floor_bps = bps;
        Ok(self)
    }

    pub fn with_gas_vault(mut self, gas_vault: Address) -> Self {
        self.gas_vault = Some(gas_vault).filter(|vault| !vault.is_zero());
        self
    }
}
