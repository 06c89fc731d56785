//! AutoBridge primitive types
//!
//! This crate contains the route and account abstraction (ERC-4337) primitive types, the chain
//! registry, configuration records and helper functions shared by the other crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod provider;
pub mod registry;
pub mod route;
mod user_operation;
pub mod utils;
mod wallet;

pub use config::{BundlerConfig, Env, PoolConfig};
pub use error::{AutoBridgeError, AutoBridgeResult, JsonRpcErrorObject};
pub use registry::{ChainConfig, ChainRegistry, MissingEnvVar, TokenConfig};
pub use route::{
    BridgeAwareFee, BridgeFee, BridgeMetadata, BridgePayload, BridgeProtocol, FeeSource, GasShield,
    HookConfig, QuoteBreakdown, RoutePlan, RouteRequest, SwapLeg, ValidationIssue,
};
pub use user_operation::{
    SignedUserOperation, UserOperation, UserOperationGasEstimation, UserOperationHash,
    UserOperationOverrides,
};
pub use utils::get_address;
pub use wallet::{UserOperationSigner, Wallet};
