//! Integration tests for the labtrack metadata store

mod cli_route;
mod config_integration;
mod edit_session;
mod end_to_end;
mod store_integration;
mod test_utils;

pub use test_utils::{with_xdg_env, write_file};
