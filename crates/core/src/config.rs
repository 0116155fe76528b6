use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default timeout applied to every executed command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Fence tags recognized as executable when no `[extract]` override is given.
pub const DEFAULT_FENCE_TAGS: &[&str] = &["bash", "sh", "shell", "zsh", "console", "terminal", "cmd", "command"];

/// How the registry resolves two skill directories declaring the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the descriptor found first in scan order (default)
    #[default]
    FirstWins,
    /// Replace the earlier descriptor with the later one, keeping its position
    LastWins,
}

impl DuplicatePolicy {
    pub const VALUES: &[DuplicatePolicy] = &[DuplicatePolicy::FirstWins, DuplicatePolicy::LastWins];

    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::FirstWins => "first-wins",
            DuplicatePolicy::LastWins => "last-wins",
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-wins" => Ok(DuplicatePolicy::FirstWins),
            "last-wins" => Ok(DuplicatePolicy::LastWins),
            _ => Err(crate::Error::Config(ConfigError::InvalidDuplicatePolicy(s.to_string()).to_string())),
        }
    }
}

/// What happens to the remaining commands of a turn after one of them fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Run every extracted command regardless of earlier failures (default)
    #[default]
    Continue,
    /// Skip the remaining commands once one fails
    #[serde(alias = "stop")]
    StopOnFailure,
}

impl FailurePolicy {
    pub const VALUES: &[FailurePolicy] = &[FailurePolicy::Continue, FailurePolicy::StopOnFailure];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Continue => "continue",
            FailurePolicy::StopOnFailure => "stop-on-failure",
        }
    }

    /// Whether a failure under this policy halts the turn
    pub fn halts_on_failure(&self) -> bool {
        matches!(self, FailurePolicy::StopOnFailure)
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "stop" | "stop-on-failure" => Ok(FailurePolicy::StopOnFailure),
            _ => Err(crate::Error::Config(ConfigError::InvalidFailurePolicy(s.to_string()).to_string())),
        }
    }
}

/// `[skills]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkillsConfig {
    /// Root directory holding one subdirectory per skill
    pub root: PathBuf,
    /// Documentation filenames recognized inside a skill directory, in priority order
    pub doc_files: Vec<String>,
    /// Name collision handling
    pub on_duplicate: DuplicatePolicy,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("skills"), doc_files: vec!["SKILL.md".to_string()], on_duplicate: DuplicatePolicy::default() }
    }
}

/// `[extract]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Fence tags whose blocks are treated as executable
    pub tags: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { tags: DEFAULT_FENCE_TAGS.iter().map(|t| t.to_string()).collect() }
    }
}

/// `[exec]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// Hard limit for a single command, in seconds
    pub timeout_secs: u64,
    /// Program names that put a command into interpreter mode
    pub interpreters: Vec<String>,
    /// Activation script of an isolated runtime (e.g. `.venv/bin/activate`)
    pub activation: Option<PathBuf>,
    /// Behaviour after a failed command within one turn
    pub on_failure: FailurePolicy,
    /// Working directory for executed commands (default: process cwd)
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables merged into the child environment
    pub env: HashMap<String, String>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            interpreters: vec!["python".to_string(), "python3".to_string()],
            activation: None,
            on_failure: FailurePolicy::default(),
            working_dir: None,
            env: HashMap::new(),
        }
    }
}

impl ExecConfig {
    /// Activation path resolved against `base` when relative, made absolute against the
    /// process directory so it stays valid once a command runs inside `base`.
    pub fn activation_path(&self, base: &Path) -> Option<PathBuf> {
        self.activation.as_ref().map(|p| {
            let joined = if p.is_absolute() { p.clone() } else { base.join(p) };
            std::path::absolute(&joined).unwrap_or(joined)
        })
    }
}

/// `[session]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Upper bound on model turns per session
    pub max_turns: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_turns: 8 }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when `SKILLRUN_LOG` / `RUST_LOG` are unset
    pub level: String,
    /// stderr format: `pretty`, `json` or `compact`
    pub format: String,
    /// Also write JSON logs to a daily-rotated file
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "pretty".to_string(), file: false }
    }
}

/// Root configuration structure for skillrun.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub skills: SkillsConfig,
    pub extract: ExtractConfig,
    pub exec: ExecConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).map_err(|e| crate::Error::Config(ConfigError::from(e).to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() { Self::from_file(path) } else { Ok(Self::default()) }
    }

    /// Timeout as a [`std::time::Duration`]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.exec.timeout_secs)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        use crate::Error;

        if self.exec.timeout_secs == 0 {
            return Err(Error::Config(ConfigError::NonPositive("exec.timeout_secs").to_string()));
        }
        if self.session.max_turns == 0 {
            return Err(Error::Config(ConfigError::NonPositive("session.max_turns").to_string()));
        }
        if self.exec.interpreters.iter().all(|i| i.trim().is_empty()) {
            return Err(Error::Config(ConfigError::Empty("exec.interpreters").to_string()));
        }
        if self.skills.doc_files.is_empty() {
            return Err(Error::Config(ConfigError::Empty("skills.doc_files").to_string()));
        }

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# skillrun configuration example
# Copy this file to skillrun.toml and customize as needed

[skills]
# Directory containing one subdirectory per skill
root = "skills"
# Documentation files recognized in a skill directory
doc_files = ["SKILL.md"]
# Name collisions: "first-wins" or "last-wins"
on_duplicate = "first-wins"

[extract]
# Fence tags whose blocks are executed line by line
tags = ["bash", "sh", "shell", "zsh", "console", "terminal", "cmd", "command"]

[exec]
timeout_secs = 300
interpreters = ["python", "python3"]
# Isolated runtime activated before interpreter-mode commands (optional)
# activation = ".venv/bin/activate"
# After a failed command: "continue" or "stop-on-failure"
on_failure = "continue"
# working_dir = "/path/to/workspace"

# [exec.env]
# WORKSPACE_TOKEN = "..."

[session]
max_turns = 8

[logging]
level = "warn"
format = "pretty"
file = false
"#
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid duplicate policy
    #[error("invalid duplicate policy: {0}")]
    InvalidDuplicatePolicy(String),

    /// Invalid failure policy
    #[error("invalid failure policy: {0}")]
    InvalidFailurePolicy(String),

    /// Value must be greater than zero
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    /// List must not be empty
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err.to_string())
    }
}
