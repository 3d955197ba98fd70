//! Application configuration module.
//!
//! Locates and loads the TOML config file holding API endpoint overrides.

#[allow(clippy::module_inception)]
mod config;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
