pub mod address;
pub mod api;
pub mod cli;
pub mod filter_state;
pub mod metrics;
pub mod orchestrator;
pub mod panel;
pub mod session;
pub mod sources;

#[cfg(test)]
pub(crate) mod testing;
