use crate::{
    launch::load_registry,
    utils::{parse_address, parse_duration, parse_h256, parse_u256},
};
use autobridge_bundler::{AccountFactory, BuildRequest, ExecuteOptions};
use autobridge_metrics::label::LabelValue;
use autobridge_primitives::{
    constants::{
        planner::{BRIDGE_TOKEN, EXTRA_FEE_BPS, GAS_VAULT_BPS, SLIPPAGE_BPS, TTL_SECONDS},
        rpc::{AMOUNT_IN, DST_CHAIN, LISTEN_ADDRESS, RECIPIENT, SRC_CHAIN, TOKEN_IN, TOKEN_OUT},
    },
    ChainRegistry, RouteRequest, UserOperationOverrides,
};
use autobridge_routing::{PlanStrategy, PlannerConfig};
use clap::Parser;
use ethers::types::{Address, H256, U256};
use expanded_pathbuf::ExpandedPathBuf;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Route request CLI args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct RouteArgs {
    /// Registry slug of the source chain.
    #[clap(long, default_value = SRC_CHAIN)]
    pub src_chain: String,

    /// Registry slug of the destination chain.
    #[clap(long, default_value = DST_CHAIN)]
    pub dst_chain: String,

    /// Symbol of the token spent on the source chain.
    #[clap(long, default_value = TOKEN_IN)]
    pub token_in: String,

    /// Symbol of the token received on the destination chain.
    #[clap(long, default_value = TOKEN_OUT)]
    pub token_out: String,

    /// Human readable amount of `token_in` (e.g. `1.5`).
    #[clap(long = "amount", default_value = AMOUNT_IN)]
    pub amount_in: String,

    /// Receiver of the route output.
    #[clap(long, default_value = RECIPIENT)]
    pub recipient: String,
}

impl From<RouteArgs> for RouteRequest {
    fn from(args: RouteArgs) -> Self {
        Self {
            src_chain: args.src_chain,
            dst_chain: args.dst_chain,
            token_in: args.token_in,
            token_out: args.token_out,
            amount_in: args.amount_in,
            recipient: args.recipient,
        }
    }
}

/// Route planner CLI args
#[derive(Debug, Clone, Parser)]
pub struct PlannerArgs {
    /// Path to a chain registry JSON file, the built-in registry is used if not set.
    #[clap(long)]
    pub registry: Option<ExpandedPathBuf>,

    /// Settlement token bridged between the chains.
    #[clap(long, default_value = BRIDGE_TOKEN)]
    pub bridge_token: String,

    /// Extra fee (in basis points) charged on the source swap.
    #[clap(long, default_value_t = EXTRA_FEE_BPS)]
    pub extra_fee_bps: u16,

    /// Share of the extra fee (in basis points) sent to the gas vault.
    #[clap(long, default_value_t = GAS_VAULT_BPS)]
    pub gas_vault_bps: u16,

    /// Slippage tolerance (in basis points).
    #[clap(long, default_value_t = SLIPPAGE_BPS)]
    pub slippage_bps: u16,

    /// Quote time to live in seconds.
    #[clap(long, default_value_t = TTL_SECONDS)]
    pub ttl: u64,

    /// Execute a source swap and a bridge transfer only (no on-chain extra fee or gas skim, no
    /// destination swap).
    #[clap(long, env = "SIMPLIFY_SWAP_FLOW")]
    pub simplified: bool,
}

impl PlannerArgs {
    /// Loads the chain registry
    pub fn registry(&self) -> eyre::Result<ChainRegistry> {
        load_registry(self.registry.as_ref())
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            bridge_token: self.bridge_token.clone(),
            extra_fee_bps: self.extra_fee_bps,
            gas_vault_bps: self.gas_vault_bps,
            slippage_bps: self.slippage_bps,
            ttl_seconds: self.ttl,
            strategy: if self.simplified { PlanStrategy::Simplified } else { PlanStrategy::Standard },
        }
    }
}

/// Route execution CLI args
#[derive(Debug, Clone, Parser)]
pub struct ExecuteArgs {
    /// Smart account executing the route.
    #[clap(long, env = "SMART_ACCOUNT", value_parser=parse_address)]
    pub smart_account: Address,

    /// Path to the mnemonic file of the smart account owner.
    #[clap(long)]
    pub mnemonic_file: ExpandedPathBuf,

    /// Ethereum execution client RPC endpoint of the source chain.
    ///
    /// Defaults to the RPC variable the registry names for the source chain.
    #[clap(long)]
    pub eth_client_address: Option<String>,

    /// Account factory, set only if the smart account is not deployed yet.
    #[clap(long, env = "ACCOUNT_FACTORY_ADDRESS", value_parser=parse_address)]
    pub factory: Option<Address>,

    /// Salt passed to the account factory.
    #[clap(long = "factory.salt", default_value = "0", value_parser=parse_h256)]
    pub salt: H256,

    /// Owner passed to the account factory, defaults to the mnemonic owner.
    #[clap(long = "factory.owner", env = "SMART_OWNER", value_parser=parse_address)]
    pub factory_owner: Option<Address>,

    /// Simulate the submission instead of sending the user operation.
    #[clap(long)]
    pub dry_run: bool,

    /// Bundler request timeout in seconds.
    #[clap(long, default_value = "30", value_parser=parse_duration)]
    pub timeout: Duration,

    /// Scale the bundler gas estimates by the safety multipliers.
    #[clap(long)]
    pub safety_buffer: bool,

    #[clap(long, value_parser=parse_u256)]
    pub nonce: Option<U256>,

    #[clap(long, value_parser=parse_u256)]
    pub call_gas_limit: Option<U256>,

    #[clap(long, value_parser=parse_u256)]
    pub verification_gas_limit: Option<U256>,

    #[clap(long, value_parser=parse_u256)]
    pub pre_verification_gas: Option<U256>,

    #[clap(long, value_parser=parse_u256)]
    pub max_fee_per_gas: Option<U256>,

    #[clap(long, value_parser=parse_u256)]
    pub max_priority_fee_per_gas: Option<U256>,
}

impl ExecuteArgs {
    pub fn overrides(&self) -> UserOperationOverrides {
        UserOperationOverrides {
            nonce: self.nonce,
            call_gas_limit: self.call_gas_limit,
            verification_gas_limit: self.verification_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            ..Default::default()
        }
    }

    pub fn build_request(&self, owner: Address) -> BuildRequest {
        BuildRequest {
            smart_account: self.smart_account,
            owner,
            factory: self.factory.map(|address| AccountFactory {
                address,
                salt: self.salt,
                owner: self.factory_owner,
                init_code: None,
            }),
            overrides: self.overrides(),
        }
    }

    pub fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            dry_run: self.dry_run,
            timeout: Some(self.timeout),
            apply_safety_buffer: self.safety_buffer,
            ..Default::default()
        }
    }
}

/// Routing service CLI args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct RpcArgs {
    /// Address the routing service listens on.
    #[clap(long = "http.listen-address", default_value = LISTEN_ADDRESS)]
    pub listen_address: String,

    /// Configures the http rpc cors domains, separated by comma.
    #[clap(long = "http.corsdomain", value_delimiter = ',', default_value = "*")]
    pub http_corsdomain: Vec<String>,
}

/// Metrics CLI args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct MetricsArgs {
    /// Expose Prometheus metrics.
    #[clap(long = "metrics")]
    pub enable_metrics: bool,

    #[clap(long = "metrics.addr", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub listen_addr: IpAddr,

    #[clap(long = "metrics.port", default_value_t = 3030)]
    pub port: u16,

    /// Global labels attached to every metric, in the form `label=value`.
    #[clap(long = "metrics.label", value_delimiter = ',')]
    pub labels: Vec<LabelValue>,
}

impl MetricsArgs {
    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }
}
