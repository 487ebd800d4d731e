pub mod app_config;
pub mod config;
pub mod routes;
pub mod states;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use routes::{BusRecord, BusType, RouteDescriptor, ScrapeStatus, NOT_AVAILABLE};
pub use states::{load_states, StateConfig, StatesFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read states file {path}: {source}")]
    StatesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse states file: {0}")]
    StatesFileParse(#[source] serde_yaml::Error),

    #[error("states config validation failed: {0}")]
    Validation(String),
}
