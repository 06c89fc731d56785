//! Utils for creating ethers providers

use ethers::{
    providers::{Http, Middleware, Provider, Ws},
    types::Chain,
};
use std::time::Duration;

/// Creates ethers provider with HTTP connection
pub async fn create_http_provider(addr: &str) -> eyre::Result<Provider<Http>> {
    let provider = Provider::<Http>::try_from(addr)?;

    let chain_id = provider.get_chainid().await?;

    Ok(provider.interval(if chain_id == Chain::Dev.into() {
        Duration::from_millis(5u64)
    } else {
        Duration::from_millis(500u64)
    }))
}

/// Creates ethers provider with WebSockets connection
pub async fn create_ws_provider(addr: &str) -> eyre::Result<Provider<Ws>> {
    let provider = Provider::<Ws>::connect_with_reconnects(addr, usize::MAX).await?;
    Ok(provider)
}

/// Whether the RPC endpoint should be reached over WebSockets
pub fn is_ws_endpoint(addr: &str) -> bool {
    addr.starts_with("ws://") || addr.starts_with("wss://")
}
