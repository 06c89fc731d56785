use super::args::{ExecuteArgs, MetricsArgs, PlannerArgs, RouteArgs, RpcArgs};
use crate::launch::{create_planner, execute_route, launch_metrics, launch_rpc, load_registry};
use autobridge_primitives::{config::env_snapshot, RoutePlan, RouteRequest};
use clap::Parser;
use expanded_pathbuf::ExpandedPathBuf;
use std::future::pending;
use tracing::{info, warn};

/// Quote a route and print the plan
#[derive(Debug, Parser)]
pub struct QuoteCommand {
    #[clap(flatten)]
    route: RouteArgs,

    #[clap(flatten)]
    planner: PlannerArgs,
}

impl QuoteCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        let (_, planner) = create_planner(&self.planner)?;
        let plan = planner.plan(&RouteRequest::from(self.route))?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        Ok(())
    }
}

/// Validate a route plan stored as JSON
#[derive(Debug, Parser)]
pub struct ValidateCommand {
    /// Path to the route plan.
    #[clap(long)]
    plan: ExpandedPathBuf,
}

impl ValidateCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        let plan: RoutePlan =
            serde_json::from_str(&std::fs::read_to_string(self.plan.to_path_buf())?)?;

        let id = plan.id.clone().unwrap_or_default();
        match plan.validate() {
            Ok(()) => {
                info!("Route plan {id:?} is valid");
                Ok(())
            }
            Err(issues) => {
                for issue in issues.iter() {
                    warn!("{issue}");
                }
                Err(eyre::eyre!("Route plan {id:?} has {} issue(s)", issues.len()))
            }
        }
    }
}

/// Check that every environment variable the chain registry refers to is set
#[derive(Debug, Parser)]
pub struct CheckEnvCommand {
    /// Path to a chain registry JSON file, the built-in registry is used if not set.
    #[clap(long)]
    registry: Option<ExpandedPathBuf>,
}

impl CheckEnvCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        let registry = load_registry(self.registry.as_ref())?;

        let missing = registry.missing_env_vars(&env_snapshot());
        if missing.is_empty() {
            info!("All environment variables are set");
            return Ok(());
        }

        for var in missing.iter() {
            warn!("{} is not set ({} {})", var.env_var, var.chain, var.context);
        }
        Err(eyre::eyre!("{} environment variable(s) missing", missing.len()))
    }
}

/// Quote a route and execute it from a smart account
#[derive(Debug, Parser)]
pub struct ExecuteCommand {
    #[clap(flatten)]
    route: RouteArgs,

    #[clap(flatten)]
    planner: PlannerArgs,

    #[clap(flatten)]
    execute: ExecuteArgs,

    #[clap(flatten)]
    metrics: MetricsArgs,
}

impl ExecuteCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        launch_metrics(&self.metrics)?;

        let res = execute_route(self.route, self.planner, self.execute, env_snapshot()).await?;
        println!("{}", serde_json::to_string_pretty(&res)?);
        Ok(())
    }
}

/// Start the routing service
#[derive(Debug, Parser)]
pub struct RpcCommand {
    #[clap(flatten)]
    planner: PlannerArgs,

    #[clap(flatten)]
    rpc: RpcArgs,

    #[clap(flatten)]
    metrics: MetricsArgs,
}

impl RpcCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        launch_metrics(&self.metrics)?;

        let (_handle, _) = launch_rpc(self.planner, self.rpc, env_snapshot()).await?;

        pending().await
    }
}
