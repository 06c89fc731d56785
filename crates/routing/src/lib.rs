//! Route planning and encoding
//!
//! The [RoutePlanner](RoutePlanner) quotes a source swap, a bridge transfer and an optional
//! destination swap. The [RouteEncoder](RouteEncoder) turns the plan into the typed route input of
//! the wallet executor contract.

pub mod encoder;
pub mod planner;
pub mod units;

pub use encoder::{derive_pool_key, derive_swap_params, RouteEncoder};
pub use planner::{now_ms, PlanStrategy, PlannerConfig, RoutePlanner};
