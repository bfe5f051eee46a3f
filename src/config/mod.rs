//! Configuration module for the crash restarter.
//!
//! This module handles parsing, validation, and access to configuration
//! settings: the panel credentials, the optional operator webhook, and the
//! list of monitored servers. Configurations are loaded from files or
//! strings in JSON format.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use crash_restarter::config::{Config, validate_config};
//!
//! let config = Config::from_file("config.json").unwrap();
//! validate_config(&config).unwrap();
//! println!("Monitoring {} servers", config.servers.len());
//! ```
mod parser;
pub mod validator;

pub use parser::{Config, PanelConfig, ServerEntry};
pub use validator::validate_config;
