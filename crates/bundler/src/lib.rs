//! Bundler is a crate for building route user operations and sending them to an ERC-4337
//! bundler
mod builder;
mod chain;
mod client;
mod executor;
pub mod gas;
pub mod metrics;

pub use builder::{
    route_batch_call_data, AccountFactory, BuildRequest, RouteContext, UserOperationBuilder,
};
pub use chain::{ChainReader, EthereumClient};
pub use client::{BundlerApi, BundlerClient, BundlerResponse, Request, Response, SubmitOptions};
pub use executor::{
    ExecuteOptions, ExecutionError, ExecutionResult, ExecutionStage, RouteExecutor,
};
pub use gas::GasMultipliers;
