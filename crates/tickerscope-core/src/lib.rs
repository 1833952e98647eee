//! Shared configuration for the tickerscope workspace.
//!
//! Everything the analysis pipeline, server and CLI read from the process
//! environment is parsed and validated here, once, into an [`AppConfig`].

mod app_config;
mod config;

use thiserror::Error;

pub use app_config::{
    AppConfig, BatchLimits, ConfidenceBand, DeterminationMode, DeviceClass, Environment,
};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
