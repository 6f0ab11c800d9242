pub mod config;
pub mod filters;
pub mod monitor_api;
pub mod observability;
pub mod query;
pub mod types;
