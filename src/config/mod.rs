//! Configuration module for Comment-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use comment_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Upstream gateway: {}", config.client.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, RetryConfig, StreamConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
