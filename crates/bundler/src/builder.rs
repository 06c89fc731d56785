//! Builds the unsigned user operation that executes a route from a smart account

use crate::chain::ChainReader;
use autobridge_contracts::{
    account_factory_api::CreateAccountCall, smart_account_api::ExecuteBatchCall,
    token_api::{ApproveCall, TransferCall},
    RouteInput,
};
use autobridge_primitives::{
    constants::{
        entry_point::NONCE_KEY,
        user_operation::{
            CALL_GAS_LIMIT, PRE_VERIFICATION_GAS, PRIORITY_FEE_PER_GAS, VERIFICATION_GAS_LIMIT,
        },
    },
    utils::as_checksum_addr,
    AutoBridgeError, AutoBridgeResult, BundlerConfig, RoutePlan, UserOperation,
    UserOperationOverrides,
};
use autobridge_routing::RouteEncoder;
use ethers::{
    abi::AbiEncode,
    types::{Address, Bytes, H256, U256},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Account factory used to deploy a counterfactual smart account
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountFactory {
    pub address: Address,
    pub salt: H256,
    /// Owner passed to `createAccount`, defaults to the operation owner
    pub owner: Option<Address>,
    /// Raw factory call data, replaces `createAccount(owner, salt)`
    pub init_code: Option<Bytes>,
}

impl AccountFactory {
    /// `factory ‖ createAccount(owner, salt)` (or `factory ‖ init_code`)
    pub fn init_code(&self, owner: Address) -> Bytes {
        let call_data = match &self.init_code {
            Some(init_code) => init_code.to_vec(),
            None => CreateAccountCall { owner: self.owner.unwrap_or(owner), salt: self.salt.0 }
                .encode(),
        };
        [self.address.as_bytes().to_vec(), call_data].concat().into()
    }
}

/// Who executes the route and how the user operation may deviate from the defaults
#[derive(Clone, Debug, Default)]
pub struct BuildRequest {
    pub smart_account: Address,
    pub owner: Address,
    /// Set only for accounts that are not deployed yet
    pub factory: Option<AccountFactory>,
    pub overrides: UserOperationOverrides,
}

/// Unsigned user operation together with everything it was built from
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteContext {
    pub user_operation: UserOperation,
    #[serde(skip)]
    pub route: RouteInput,
    /// `executeRoute(route)`
    pub executor_call_data: Bytes,
    /// `executeBatch(...)` run by the smart account
    pub account_call_data: Bytes,
    /// Native value forwarded to the executor (bridge messaging fee)
    pub call_value: U256,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub wallet_executor: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub paymaster: Address,
}

/// Batch of the smart account: reset allowance, approve max, transfer the input amount to the
/// executor and call `executeRoute`
///
/// The allowance is reset first for tokens that reject changing a non-zero allowance.
pub fn route_batch_call_data(
    route: &RouteInput,
    wallet_executor: Address,
    executor_call_data: Bytes,
    call_value: U256,
) -> Bytes {
    let approve_reset = ApproveCall { spender: wallet_executor, amount: U256::zero() };
    let approve_max = ApproveCall { spender: wallet_executor, amount: U256::MAX };
    let transfer = TransferCall { to: wallet_executor, amount: route.amount_in };

    ExecuteBatchCall {
        targets: vec![route.token_in, route.token_in, route.token_in, wallet_executor],
        values: vec![U256::zero(), U256::zero(), U256::zero(), call_value],
        data: vec![
            approve_reset.encode().into(),
            approve_max.encode().into(),
            transfer.encode().into(),
            executor_call_data,
        ],
    }
    .encode()
    .into()
}

/// Builds route user operations for one chain
pub struct UserOperationBuilder<C: ChainReader> {
    config: BundlerConfig,
    encoder: Arc<RouteEncoder>,
    chain: Arc<C>,
}

impl<C: ChainReader> UserOperationBuilder<C> {
    pub fn new(config: BundlerConfig, encoder: Arc<RouteEncoder>, chain: Arc<C>) -> Self {
        Self { config, encoder, chain }
    }

    pub fn config(&self) -> &BundlerConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    /// Builds the unsigned user operation of the route
    ///
    /// The nonce and the latest base fee are read concurrently on every build. Overrides take
    /// precedence over both and over the default gas limits.
    ///
    /// # Arguments
    /// * `plan` - Route plan whose source chain is the builder's chain
    /// * `request` - Smart account, owner, optional factory and overrides
    ///
    /// # Returns
    /// * `AutoBridgeResult<RouteContext>` - The route context
    pub async fn build(
        &self,
        plan: &RoutePlan,
        request: &BuildRequest,
    ) -> AutoBridgeResult<RouteContext> {
        if plan.src_chain != self.config.chain_slug {
            return Err(AutoBridgeError::input(format!(
                "Route plan source chain {} does not match bundler chain {}",
                plan.src_chain, self.config.chain_slug
            )));
        }

        let BundlerConfig { entry_point, paymaster, wallet_executor, .. } = self.config;
        let overrides = &request.overrides;

        let route = self.encoder.encode(plan, request.smart_account, paymaster)?;
        let executor_call_data = route.execute_route_call_data();
        let call_value = U256::from(route.bridge.fee.native_fee);
        let account_call_data =
            route_batch_call_data(&route, wallet_executor, executor_call_data.clone(), call_value);

        let (nonce, (max_fee_per_gas, max_priority_fee_per_gas)) = tokio::try_join!(
            self.nonce(request.smart_account, overrides),
            self.fees(overrides)
        )?;

        let init_code = request
            .factory
            .as_ref()
            .map(|factory| factory.init_code(request.owner))
            .unwrap_or_default();

        let user_operation = overrides.apply(
            UserOperation::default()
                .sender(request.smart_account)
                .nonce(nonce)
                .init_code(init_code)
                .call_data(account_call_data.clone())
                .call_gas_limit(CALL_GAS_LIMIT.into())
                .verification_gas_limit(VERIFICATION_GAS_LIMIT.into())
                .pre_verification_gas(PRE_VERIFICATION_GAS.into())
                .max_fee_per_gas(max_fee_per_gas)
                .max_priority_fee_per_gas(max_priority_fee_per_gas)
                .paymaster_and_data(paymaster.as_bytes().to_vec().into()),
        );

        debug!(
            "Built user operation for {:?}: nonce {}, max fee {}, call value {call_value}",
            user_operation.sender, user_operation.nonce, user_operation.max_fee_per_gas
        );
        trace!("User operation: {user_operation:?}");

        Ok(RouteContext {
            user_operation,
            route,
            executor_call_data,
            account_call_data,
            call_value,
            entry_point,
            wallet_executor,
            paymaster,
        })
    }

    async fn nonce(
        &self,
        smart_account: Address,
        overrides: &UserOperationOverrides,
    ) -> AutoBridgeResult<U256> {
        match overrides.nonce {
            Some(nonce) => Ok(nonce),
            None => {
                self.chain.get_nonce(self.config.entry_point, smart_account, NONCE_KEY.into()).await
            }
        }
    }

    /// `(maxFeePerGas, maxPriorityFeePerGas)`, `maxFeePerGas = 2 * baseFee + priorityFee`
    async fn fees(&self, overrides: &UserOperationOverrides) -> AutoBridgeResult<(U256, U256)> {
        if let (Some(max_fee), Some(priority_fee)) =
            (overrides.max_fee_per_gas, overrides.max_priority_fee_per_gas)
        {
            return Ok((max_fee, priority_fee));
        }

        let base_fee = self.chain.latest_base_fee().await?;
        let priority_fee = overrides.max_priority_fee_per_gas.unwrap_or(PRIORITY_FEE_PER_GAS.into());
        let max_fee = overrides
            .max_fee_per_gas
            .unwrap_or_else(|| base_fee.saturating_mul(2.into()).saturating_add(priority_fee));

        Ok((max_fee, priority_fee))
    }
}
