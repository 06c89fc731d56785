use crate::utils::run_until_ctrl_c;
use clap::{value_parser, Parser, Subcommand};
use std::panic;

pub mod args;
pub mod commands;

/// The main AutoBridge CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "AutoBridge", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Quote a cross-chain route
    #[command(name = "quote")]
    Quote(commands::QuoteCommand),

    /// Validate a route plan
    #[command(name = "validate")]
    Validate(commands::ValidateCommand),

    /// Check the environment variables the chain registry refers to
    #[command(name = "check-env")]
    CheckEnv(commands::CheckEnvCommand),

    /// Quote a route and execute it as a sponsored user operation
    #[command(name = "execute")]
    Execute(Box<commands::ExecuteCommand>),

    /// Start the routing service
    #[command(name = "rpc")]
    Rpc(commands::RpcCommand),
}

pub fn run() -> eyre::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let rust_log = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},autobridge={}", cli.get_log_level()),
        Err(_) => format!("autobridge={}", cli.get_log_level()),
    };
    std::env::set_var("RUST_LOG", rust_log);
    tracing_subscriber::fmt::init();

    std::thread::Builder::new()
        .spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

            let task = async move {
                match cli.command {
                    Commands::Quote(command) => command.execute(),
                    Commands::Validate(command) => command.execute(),
                    Commands::CheckEnv(command) => command.execute(),
                    Commands::Execute(command) => command.execute().await,
                    Commands::Rpc(command) => command.execute().await,
                }
            };

            rt.block_on(run_until_ctrl_c(task))?;
            Ok(())
        })?
        .join()
        .unwrap_or_else(|e| panic::resume_unwind(e))
}
