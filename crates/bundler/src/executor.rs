//! Route execution pipeline: plan, build, estimate, hash, sign and submit

use crate::{
    builder::{BuildRequest, RouteContext, UserOperationBuilder},
    chain::ChainReader,
    client::{BundlerApi, BundlerResponse, SubmitOptions},
    gas::{max_gas_cost, validate_gas_limits, GasMultipliers},
    metrics::{record_estimate, record_submit},
};
use autobridge_primitives::{
    AutoBridgeError, AutoBridgeResult, RoutePlan, RouteRequest, SignedUserOperation,
    UserOperationGasEstimation, UserOperationHash, UserOperationSigner,
};
use autobridge_routing::RoutePlanner;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Stage of the execution pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionStage {
    Plan,
    Build,
    Estimate,
    Hash,
    Sign,
    Submit,
}

/// Pipeline error annotated with the stage that failed
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{stage} stage failed: {kind}")]
pub struct ExecutionError {
    pub stage: ExecutionStage,
    #[source]
    pub kind: AutoBridgeError,
}

impl ExecutionError {
    pub fn new(stage: ExecutionStage, kind: AutoBridgeError) -> Self {
        Self { stage, kind }
    }

    /// Whether the caller may retry with a fresh plan and build
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

trait AtStage<T> {
    fn at(self, stage: ExecutionStage) -> Result<T, ExecutionError>;
}

impl<T> AtStage<T> for AutoBridgeResult<T> {
    fn at(self, stage: ExecutionStage) -> Result<T, ExecutionError> {
        self.map_err(|kind| ExecutionError::new(stage, kind))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExecuteOptions {
    /// Simulate the submission instead of sending the user operation
    pub dry_run: bool,
    /// Submission timeout, the bundler client's default if unset
    pub timeout: Option<Duration>,
    /// Scale the bundler estimates by `multipliers` before merging them
    pub apply_safety_buffer: bool,
    pub multipliers: GasMultipliers,
}

/// Everything a successful execution produced
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub user_operation: SignedUserOperation,
    pub user_operation_hash: UserOperationHash,
    pub context: RouteContext,
    pub response: BundlerResponse,
    pub gas_estimation: UserOperationGasEstimation,
}

/// Runs routes from a smart account through the bundler of the source chain
///
/// Stages run strictly in sequence and nothing is retried internally: a failed call leaves no
/// state behind and may be retried by the caller with a fresh plan.
pub struct RouteExecutor<C, B, S>
where
    C: ChainReader,
    B: BundlerApi,
    S: UserOperationSigner,
{
    chain_id: u64,
    planner: Arc<RoutePlanner>,
    builder: UserOperationBuilder<C>,
    bundler: Arc<B>,
    signer: Arc<S>,
}

impl<C, B, S> RouteExecutor<C, B, S>
where
    C: ChainReader,
    B: BundlerApi,
    S: UserOperationSigner,
{
    /// Create a route executor
    ///
    /// # Arguments
    /// * `planner` - Route planner, its registry resolves the chain id of the builder's chain
    /// * `builder` - User operation builder of the source chain
    /// * `bundler` - Bundler of the source chain
    /// * `signer` - Signer of the smart account owner
    ///
    /// # Returns
    /// * `AutoBridgeResult<Self>` - A configuration error if the builder's chain is unknown
    pub fn new(
        planner: Arc<RoutePlanner>,
        builder: UserOperationBuilder<C>,
        bundler: Arc<B>,
        signer: Arc<S>,
    ) -> AutoBridgeResult<Self> {
        let slug = &builder.config().chain_slug;
        let chain_id = planner
            .registry()
            .chain(slug)
            .map_err(|_| AutoBridgeError::config(format!("Unsupported chain: {slug}")))?
            .chain_id;

        Ok(Self { chain_id, planner, builder, bundler, signer })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn planner(&self) -> &Arc<RoutePlanner> {
        &self.planner
    }

    pub fn builder(&self) -> &UserOperationBuilder<C> {
        &self.builder
    }

    /// Plans the request and executes the resulting route
    pub async fn quote_and_execute(
        &self,
        request: &RouteRequest,
        build: &BuildRequest,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult, ExecutionError> {
        let plan = self.planner.plan(request).at(ExecutionStage::Plan)?;
        self.execute(&plan, build, options).await
    }

    /// Executes a route plan
    ///
    /// # Arguments
    /// * `plan` - Route plan starting on the executor's chain
    /// * `build` - Smart account, owner, optional factory and overrides
    /// * `options` - Dry run, submission timeout and gas safety buffer
    ///
    /// # Returns
    /// * `Result<ExecutionResult, ExecutionError>` - The signed user operation, its hash, the
    ///   route context, the raw bundler response and the gas estimation, or the error of the
    ///   failed stage with the original error payload
    pub async fn execute(
        &self,
        plan: &RoutePlan,
        build: &BuildRequest,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult, ExecutionError> {
        info!("Executing route {:?} from {:?}", plan.id, build.smart_account);

        let context = self.builder.build(plan, build).await.at(ExecutionStage::Build)?;
        let entry_point = context.entry_point;

        let estimate = self
            .bundler
            .estimate_user_operation_gas(&context.user_operation, &entry_point)
            .await;
        record_estimate(&estimate);
        let estimate = estimate.at(ExecutionStage::Estimate)?;
        debug!("Bundler gas estimation: {estimate:?}");

        let gas_estimation = if options.apply_safety_buffer {
            options.multipliers.apply(&estimate)
        } else {
            estimate
        };
        let user_operation = context
            .user_operation
            .clone()
            .merge_gas_estimation(&gas_estimation, &build.overrides);

        for violation in validate_gas_limits(&user_operation) {
            warn!("User operation gas limit out of bounds: {violation}");
        }
        info!("Max gas cost of the user operation: {} wei", max_gas_cost(&user_operation));

        let chain_id = self.builder.chain().chain_id().await.at(ExecutionStage::Hash)?;
        if chain_id != self.chain_id {
            return Err(ExecutionError::new(
                ExecutionStage::Hash,
                AutoBridgeError::config(format!(
                    "Chain id {chain_id} reported by the RPC endpoint does not match chain id {} of {}",
                    self.chain_id,
                    self.builder.config().chain_slug
                )),
            ));
        }
        let hash = user_operation.hash(&entry_point, chain_id);

        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|err| AutoBridgeError::Signer { message: err.to_string() })
            .at(ExecutionStage::Sign)?;
        let user_operation = SignedUserOperation::new(user_operation, hash, signature);

        let submit = SubmitOptions { dry_run: options.dry_run, timeout: options.timeout };
        let response = self
            .bundler
            .send_user_operation(user_operation.user_operation(), &entry_point, &submit)
            .await;
        record_submit(&response, options.dry_run);
        let response = response.at(ExecutionStage::Submit)?;

        info!(
            "User operation {hash} {} via {}: {:?}",
            if options.dry_run { "simulated" } else { "submitted" },
            submit.method(),
            response.result
        );

        Ok(ExecutionResult {
            user_operation,
            user_operation_hash: hash,
            context,
            response,
            gas_estimation,
        })
    }
}
