//! biff-core — server config parsing and the schedule types served to nodes.

pub mod config;
pub mod types;

pub use config::{ConfigError, ConfigResult, ServerConfig, ServerSection};
pub use types::*;
