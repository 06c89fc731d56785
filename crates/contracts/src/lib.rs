//! Smart contract interfaces used by the route execution pipeline

pub mod entry_point;
pub mod executor;
mod gen;

pub use entry_point::EntryPoint;
pub use executor::{RouteInput, EXECUTE_ROUTE_SELECTOR, EXECUTE_ROUTE_SIGNATURE};
pub use gen::{
    account_factory_api, smart_account_api, token_api, AccountFactoryAPI, SmartAccountAPI,
    TokenAPI,
};
