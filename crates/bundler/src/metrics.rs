use autobridge_primitives::AutoBridgeError;
use metrics::{counter, describe_counter};

pub const ESTIMATE_SUCCESS: &str = "autobridge_bundler_estimate_success";
pub const ESTIMATE_ERROR: &str = "autobridge_bundler_estimate_error";
pub const SUBMIT_SUCCESS: &str = "autobridge_bundler_submit_success";
pub const SUBMIT_ERROR: &str = "autobridge_bundler_submit_error";

pub fn describe_execution_metrics() {
    describe_counter!(ESTIMATE_SUCCESS, "The number of successful gas estimations");
    describe_counter!(ESTIMATE_ERROR, "The number of failed gas estimations");
    describe_counter!(SUBMIT_SUCCESS, "The number of user operations accepted by the bundler");
    describe_counter!(SUBMIT_ERROR, "The number of rejected or failed user operation submissions");
}

fn error_label(err: &AutoBridgeError) -> &'static str {
    match err {
        AutoBridgeError::InputValidation { .. } => "input",
        AutoBridgeError::Configuration { .. } => "configuration",
        AutoBridgeError::Transport { .. } => "transport",
        AutoBridgeError::Timeout { .. } => "timeout",
        AutoBridgeError::Bundler(_) => "bundler",
        AutoBridgeError::InvariantViolation { .. } => "invariant",
        AutoBridgeError::Signer { .. } => "signer",
    }
}

pub(crate) fn record_estimate<T>(res: &Result<T, AutoBridgeError>) {
    match res {
        Ok(_) => counter!(ESTIMATE_SUCCESS).increment(1),
        Err(err) => counter!(ESTIMATE_ERROR, "error" => error_label(err)).increment(1),
    }
}

pub(crate) fn record_submit<T>(res: &Result<T, AutoBridgeError>, dry_run: bool) {
    let mode = if dry_run { "dry_run" } else { "send" };
    match res {
        Ok(_) => counter!(SUBMIT_SUCCESS, "mode" => mode).increment(1),
        Err(err) => {
            counter!(SUBMIT_ERROR, "mode" => mode, "error" => error_label(err)).increment(1)
        }
    }
}
