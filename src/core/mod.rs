pub mod adapter;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod engine;
pub mod recent;
#[cfg(test)]
pub mod testing;
pub mod vanity;
