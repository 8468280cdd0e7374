//! Configuration module for ferrous-dsync
//!
//! This module contains all configuration structures organized by domain:
//! - `root`: Main configuration and CLI overrides
//! - `resolver`: Resolver used for DSYNC discovery and parent lookups
//! - `keygen`: Key generation defaults and SIG(0) validity
//! - `delegation`: Delegation sync scheme preference and timers
//! - `zone`: Served zones and their options
//! - `logging`: Logging settings
//! - `database`: Key store database
//! - `errors`: Configuration errors

pub mod database;
pub mod delegation;
pub mod errors;
pub mod keygen;
pub mod logging;
pub mod resolver;
pub mod root;
pub mod zone;

pub use database::DatabaseConfig;
pub use delegation::DelegationSyncConfig;
pub use errors::ConfigError;
pub use keygen::KeygenConfig;
pub use logging::LoggingConfig;
pub use resolver::ResolverConfig;
pub use root::{CliOverrides, Config};
pub use zone::{ZoneConfig, ZoneOption};
