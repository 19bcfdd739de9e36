pub mod admin;
pub mod api;
pub mod browse;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod render;
pub mod translation;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
