pub use super::gen::EntryPointAPI;
use autobridge_primitives::{AutoBridgeError, AutoBridgeResult};
use ethers::{
    prelude::ContractError,
    providers::Middleware,
    types::{Address, U256},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    address: Address,
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let entry_point_api = EntryPointAPI::new(address, eth_client);
        Self { address, entry_point_api }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Next nonce of the sender in the `key` sequence
    ///
    /// # Returns
    /// * `AutoBridgeResult<U256>` - The nonce, a transport error if the call fails or reverts
    pub async fn get_nonce(&self, address: &Address, key: U256) -> AutoBridgeResult<U256> {
        self.entry_point_api.get_nonce(*address, key).call().await.map_err(call_error)
    }
}

/// Maps a failed view call to a transport error, with the revert reason when there is one
fn call_error<M: Middleware>(err: ContractError<M>) -> AutoBridgeError {
    match err.decode_revert::<String>() {
        Some(reason) => AutoBridgeError::transport(format!("entry point call reverted: {reason}")),
        None => AutoBridgeError::transport(format!("entry point call failed: {err}")),
    }
}
