//! Chain and token registry

use crate::{
    config::{lookup_env, BundlerConfig, Env},
    error::{AutoBridgeError, AutoBridgeResult},
    utils::as_checksum_addr,
};
use alloy_chains::{Chain, NamedChain};
use ethers::types::Address;
use expanded_pathbuf::ExpandedPathBuf;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs};

lazy_static! {
    static ref SLUG: Regex = Regex::new(r"^[a-z0-9-]+$").expect("Regex rules valid");
    static ref BUILTIN: ChainRegistry =
        ChainRegistry::from_json(include_str!("../res/registry.json"))
            .expect("Built-in registry valid");
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    pub symbol: String,
    pub decimals: u8,
}

/// Account abstraction (ERC-4337) settings of a chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc4337Config {
    /// Env variable holding the bundler URL
    pub bundler_env: String,
    /// Env variable holding the paymaster address
    pub paymaster_env: String,
    /// Env variable holding the wallet executor address
    pub wallet_executor_env: String,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerZeroConfig {
    pub endpoint_env: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    /// Env variable holding the RPC endpoint
    pub rpc_env: String,
    pub native_currency: NativeCurrency,
    pub erc4337: Erc4337Config,
    pub layer_zero: LayerZeroConfig,
}

impl ChainConfig {
    /// Well-known chain, if the chain id is one
    pub fn named(&self) -> Option<NamedChain> {
        Chain::from_id(self.chain_id).named()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    #[serde(serialize_with = "as_checksum_addr")]
    pub address: Address,
    pub decimals: u8,
    /// Env variable holding the Pyth price feed id
    pub pyth_price_env: String,
}

/// Environment variable the registry refers to that is not set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingEnvVar {
    pub chain: String,
    pub env_var: String,
    pub context: String,
}

/// Read-only chain and token metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRegistry {
    chains: BTreeMap<String, ChainConfig>,
    tokens: BTreeMap<String, BTreeMap<String, TokenConfig>>,
}

impl ChainRegistry {
    /// Registry shipped with the crate (base-sepolia, optimism-sepolia and arbitrum-sepolia)
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_json(json: &str) -> AutoBridgeResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| AutoBridgeError::config(format!("Invalid registry document: {err}")))
    }

    /// Loads the registry from a JSON file
    pub fn load(path: &ExpandedPathBuf) -> AutoBridgeResult<Self> {
        let json = fs::read_to_string(path.to_path_buf()).map_err(|err| {
            AutoBridgeError::config(format!("Failed to read registry {}: {err}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn chain(&self, slug: &str) -> AutoBridgeResult<&ChainConfig> {
        self.chains
            .get(slug)
            .ok_or_else(|| AutoBridgeError::input(format!("Chain config not found for slug: {slug}")))
    }

    pub fn token(&self, slug: &str, symbol: &str) -> AutoBridgeResult<&TokenConfig> {
        self.tokens.get(slug).and_then(|tokens| tokens.get(symbol)).ok_or_else(|| {
            AutoBridgeError::input(format!("Token {symbol} not defined for chain {slug}"))
        })
    }

    /// Every chain with its slug
    pub fn chains(&self) -> impl Iterator<Item = (&str, &ChainConfig)> {
        self.chains.iter().map(|(slug, chain)| (slug.as_str(), chain))
    }

    /// Tokens of a chain
    pub fn tokens(&self, slug: &str) -> AutoBridgeResult<&BTreeMap<String, TokenConfig>> {
        self.tokens
            .get(slug)
            .ok_or_else(|| AutoBridgeError::input(format!("Tokens not defined for chain {slug}")))
    }

    /// Resolves the bundler configuration of a chain from the environment
    pub fn bundler_config(&self, slug: &str, env: &Env) -> AutoBridgeResult<BundlerConfig> {
        BundlerConfig::from_env(slug, self.chain(slug)?, env)
    }

    /// Checks every chain and token entry
    ///
    /// # Returns
    /// * `Result<(), Vec<String>>` - All problems found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = vec![];

        for (slug, chain) in &self.chains {
            if chain.chain_id == 0 {
                errors.push(format!("{slug}: chainId must be a positive integer"));
            }
            if chain.rpc_env.trim().is_empty() {
                errors.push(format!("{slug}: rpcEnv must be a non-empty string"));
            }
            if chain.erc4337.bundler_env.trim().is_empty() {
                errors.push(format!("{slug}: erc4337.bundlerEnv must be set"));
            }
            if chain.erc4337.paymaster_env.trim().is_empty() {
                errors.push(format!("{slug}: erc4337.paymasterEnv must be set"));
            }
            if chain.layer_zero.endpoint_env.trim().is_empty() {
                errors.push(format!("{slug}: layerZero.endpointEnv must be set"));
            }
            if chain.native_currency.decimals == 0 || chain.native_currency.decimals > 36 {
                errors.push(format!("{slug}: nativeCurrency.decimals must be between 1 and 36"));
            }
            if !SLUG.is_match(slug) {
                errors.push(format!(
                    "{slug}: chain slug must contain only lowercase letters, numbers, and hyphens"
                ));
            }
        }

        for (slug, tokens) in &self.tokens {
            for (symbol, token) in tokens {
                if token.decimals > 36 {
                    errors.push(format!("{slug}.{symbol}: decimals must be between 0 and 36"));
                }
                if token.pyth_price_env.is_empty() {
                    errors.push(format!("{slug}.{symbol}: pythPriceEnv must be set"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Environment variables the registry refers to that are unset in `env`
    pub fn missing_env_vars(&self, env: &Env) -> Vec<MissingEnvVar> {
        let mut required = vec![];

        for (slug, chain) in &self.chains {
            let name = &chain.name;
            for (env_var, context) in [
                (&chain.rpc_env, format!("{name} RPC")),
                (&chain.erc4337.bundler_env, format!("{name} ERC-4337 bundler")),
                (&chain.erc4337.paymaster_env, format!("{name} paymaster")),
                (&chain.layer_zero.endpoint_env, format!("{name} LayerZero endpoint")),
            ] {
                required.push(MissingEnvVar { chain: slug.clone(), env_var: env_var.clone(), context });
            }
        }

        for (slug, tokens) in &self.tokens {
            let name = self.chains.get(slug).map(|chain| chain.name.as_str()).unwrap_or(slug.as_str());
            for (symbol, token) in tokens {
                required.push(MissingEnvVar {
                    chain: slug.clone(),
                    env_var: token.pyth_price_env.clone(),
                    context: format!("{name} {symbol} Pyth price id"),
                });
            }
        }

        required.into_iter().filter(|item| lookup_env(env, &item.env_var).is_none()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{entry_point, supported_chains::CHAINS};
    use std::str::FromStr;

    #[test]
    fn builtin_registry_is_valid() {
        let registry = ChainRegistry::builtin();
        assert_eq!(registry.validate(), Ok(()));

        let named: Vec<_> = registry.chains().filter_map(|(_, chain)| chain.named()).collect();
        assert_eq!(named.len(), CHAINS.len());
        for chain in CHAINS {
            assert!(named.contains(&chain), "{chain:?}");
        }

        let entry_point = Address::from_str(entry_point::ADDRESS).unwrap();
        assert!(registry.chains().all(|(_, chain)| chain.erc4337.entry_point == entry_point));
    }

    #[test]
    fn lookups() {
        let registry = ChainRegistry::builtin();
        let base = registry.chain("base-sepolia").unwrap();
        assert_eq!(base.chain_id, 84532);
        assert_eq!(base.erc4337.bundler_env, "BASE_BUNDLER_URL");

        let weth = registry.token("arbitrum-sepolia", "WETH").unwrap();
        assert_eq!(weth.decimals, 18);
        assert_eq!(
            weth.address,
            Address::from_str("0x980B62Da83eFf3D4576C647993b0c1D7faf17c73").unwrap()
        );
        assert_eq!(registry.token("base-sepolia", "USDCx").unwrap().decimals, 6);
        assert_eq!(registry.tokens("optimism-sepolia").unwrap().len(), 4);
    }

    #[test]
    fn unknown_lookups_fail_loudly() {
        let registry = ChainRegistry::builtin();
        assert_eq!(
            registry.chain("solana").unwrap_err(),
            AutoBridgeError::input("Chain config not found for slug: solana")
        );
        assert_eq!(
            registry.token("base-sepolia", "DOGE").unwrap_err(),
            AutoBridgeError::input("Token DOGE not defined for chain base-sepolia")
        );
    }

    #[test]
    fn validate_collects_all_errors() {
        let registry = ChainRegistry::from_json(
            r#"{
                "chains": {
                    "Bad_Slug": {
                        "chainId": 0,
                        "name": "Bad",
                        "rpcEnv": " ",
                        "nativeCurrency": {"symbol": "ETH", "decimals": 0},
                        "erc4337": {
                            "bundlerEnv": "",
                            "paymasterEnv": "PM",
                            "walletExecutorEnv": "EXEC",
                            "entryPoint": "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"
                        },
                        "layerZero": {"endpointEnv": ""}
                    }
                },
                "tokens": {
                    "Bad_Slug": {
                        "TKN": {"address": "0x0000000000000000000000000000000000000001", "decimals": 40, "pythPriceEnv": ""}
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            registry.validate().unwrap_err(),
            vec![
                "Bad_Slug: chainId must be a positive integer",
                "Bad_Slug: rpcEnv must be a non-empty string",
                "Bad_Slug: erc4337.bundlerEnv must be set",
                "Bad_Slug: layerZero.endpointEnv must be set",
                "Bad_Slug: nativeCurrency.decimals must be between 1 and 36",
                "Bad_Slug: chain slug must contain only lowercase letters, numbers, and hyphens",
                "Bad_Slug.TKN: decimals must be between 0 and 36",
                "Bad_Slug.TKN: pythPriceEnv must be set",
            ]
        );
    }

    #[test]
    fn missing_env_vars_accepts_public_alias() {
        let registry = ChainRegistry::builtin();
        let all = registry.missing_env_vars(&Env::new());
        // 4 chain variables and 4 price feeds per chain
        assert_eq!(all.len(), 3 * 8);

        let env: Env = [
            ("BASE_SEPOLIA_RPC".to_string(), "http://localhost:8545".to_string()),
            ("NEXT_PUBLIC_BASE_BUNDLER_URL".to_string(), "http://localhost:3000".to_string()),
            ("PAYMASTER_ADDRESS".to_string(), String::new()),
        ]
        .into_iter()
        .collect();
        let missing = registry.missing_env_vars(&env);
        assert_eq!(missing.len(), all.len() - 2);
        assert!(missing.iter().all(|m| m.env_var != "BASE_BUNDLER_URL"));
        let paymaster = missing.iter().find(|m| m.env_var == "PAYMASTER_ADDRESS").unwrap();
        assert_eq!(paymaster.context, "Base Sepolia paymaster");
        assert_eq!(paymaster.chain, "base-sepolia");
        assert!(missing.iter().any(|m| m.context == "Base Sepolia USDCx Pyth price id"));
    }
}
