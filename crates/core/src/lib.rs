pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    Config, ConfigError, DEFAULT_FENCE_TAGS, DEFAULT_TIMEOUT_SECS, DuplicatePolicy, ExecConfig, ExtractConfig,
    FailurePolicy, LoggingConfig, SessionConfig, SkillsConfig,
};
pub use error::{Error, Result};
