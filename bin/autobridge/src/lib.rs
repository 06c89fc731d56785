//! AutoBridge command line: route quoting, validation, execution and the routing service
pub mod cli;
pub mod launch;
pub mod utils;
