//! Route planning and account abstraction (ERC-4337)-related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
    /// Nonce key used for route user operations
    pub const NONCE_KEY: u64 = 0;
}

/// Basis points arithmetic
pub mod bps {
    /// 100%
    pub const DENOMINATOR: u64 = 10_000;
}

/// Route planner defaults
pub mod planner {
    /// Settlement token bridged between chains
    pub const BRIDGE_TOKEN: &str = "USDX";
    /// Token that is bridged as an omnichain fungible token
    pub const OFT_TOKEN: &str = "USDX";
    /// Quote time to live (in seconds)
    pub const TTL_SECONDS: u64 = 60;
    pub const MAX_TTL_SECONDS: u64 = 300;
    pub const EXTRA_FEE_BPS: u16 = 40;
    pub const MAX_EXTRA_FEE_BPS: u16 = 500;
    pub const GAS_VAULT_BPS: u16 = 10;
    pub const SLIPPAGE_BPS: u16 = 50;
    pub const MAX_SLIPPAGE_BPS: u16 = 1000;
    /// Dex tag of every swap leg
    pub const DEX: &str = "uniswap-v4";
    /// Largest skim accepted by the gas shield hook
    pub const MAX_GAS_SHIELD_SKIM_BPS: u16 = 500;
}

/// Route encoder defaults
pub mod encoder {
    pub const POOL_FEE: u32 = 3_000;
    pub const MAX_POOL_FEE: u32 = 65_535;
    pub const TICK_SPACING: i32 = 60;
    /// Lower bound of the max skim handed to the executor contract
    pub const MAX_SKIM_FLOOR_BPS: u16 = 100;
}

/// User operation builder defaults
pub mod user_operation {
    /// 1.5 gwei
    pub const PRIORITY_FEE_PER_GAS: u64 = 1_500_000_000;
    pub const CALL_GAS_LIMIT: u64 = 900_000;
    pub const VERIFICATION_GAS_LIMIT: u64 = 550_000;
    pub const PRE_VERIFICATION_GAS: u64 = 120_000;
}

/// Gas limit sanity bounds
pub mod gas {
    pub const MIN_CALL_GAS_LIMIT: u64 = 21_000;
    pub const MAX_CALL_GAS_LIMIT: u64 = 10_000_000;
    pub const MIN_VERIFICATION_GAS_LIMIT: u64 = 10_000;
    pub const MAX_VERIFICATION_GAS_LIMIT: u64 = 2_000_000;
    /// Safety multipliers (percent)
    pub const CALL_GAS_MULTIPLIER: u64 = 110;
    pub const VERIFICATION_GAS_MULTIPLIER: u64 = 120;
    pub const PRE_VERIFICATION_GAS_MULTIPLIER: u64 = 100;
}

/// Bundler JSON-RPC
pub mod bundler {
    pub const ESTIMATE_USER_OPERATION_GAS: &str = "eth_estimateUserOperationGas";
    pub const SEND_USER_OPERATION: &str = "eth_sendUserOperation";
    /// Dry-run variant of `eth_sendUserOperation`
    pub const CALL_USER_OPERATION: &str = "eth_callUserOperation";
    /// Default request timeout (in seconds)
    pub const REQUEST_TIMEOUT: u64 = 30;
}

/// Environment variables
pub mod env {
    /// Prefix accepted as an alias for every configuration variable
    pub const PUBLIC_PREFIX: &str = "NEXT_PUBLIC_";
    pub const POOL_HOOK_ADDRESS: &str = "POOL_HOOK_ADDRESS";
    pub const POOL_FEE: &str = "POOL_FEE";
    pub const POOL_TICK_SPACING: &str = "POOL_TICK_SPACING";
    pub const GAS_VAULT_ADDRESS: &str = "GAS_VAULT_ADDRESS";
}

/// Routing service defaults
pub mod rpc {
    pub const LISTEN_ADDRESS: &str = "127.0.0.1:4000";
    pub const SRC_CHAIN: &str = "base-sepolia";
    pub const DST_CHAIN: &str = "optimism-sepolia";
    pub const TOKEN_IN: &str = "WETH";
    pub const TOKEN_OUT: &str = "USDCx";
    pub const AMOUNT_IN: &str = "1";
    pub const RECIPIENT: &str = "0x000000000000000000000000000000000000dEaD";
}

/// Chains shipped in the default registry
pub mod supported_chains {
    use alloy_chains::NamedChain;

    pub const CHAINS: [NamedChain; 3] =
        [NamedChain::BaseSepolia, NamedChain::OptimismSepolia, NamedChain::ArbitrumSepolia];
}
