//! Isolated runtime activation.
//!
//! Interpreter-mode commands may run inside an isolated runtime (a virtualenv, a conda
//! prefix) that is activated by a platform-specific script. The activation and the command
//! share a single shell invocation so the activated variables reach the command.

use std::path::{Path, PathBuf};

/// How an activation script is brought into the shell running the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStrategy {
    /// `. '<script>' && <command>` under `sh -c`
    PosixSource,
    /// `call "<script>" && <command>` under `cmd /C`
    WindowsCall,
}

impl ActivationStrategy {
    /// Strategy for the host platform.
    pub fn native() -> Self {
        if cfg!(windows) { ActivationStrategy::WindowsCall } else { ActivationStrategy::PosixSource }
    }

    /// Quote a single word for this strategy's shell.
    pub fn quote(&self, word: &str) -> String {
        match self {
            ActivationStrategy::PosixSource => format!("'{}'", word.replace('\'', r"'\''")),
            ActivationStrategy::WindowsCall => format!("\"{}\"", word.replace('"', "\"\"")),
        }
    }

    /// Command line that activates `script` and then runs `command`.
    pub fn wrap(&self, script: &Path, command: &str) -> String {
        let quoted = self.quote(&script.to_string_lossy());
        match self {
            ActivationStrategy::PosixSource => format!(". {quoted} && {command}"),
            ActivationStrategy::WindowsCall => format!("call {quoted} && {command}"),
        }
    }
}

impl Default for ActivationStrategy {
    fn default() -> Self {
        Self::native()
    }
}

/// Optional isolated runtime consulted for interpreter-mode commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentContext {
    /// Activation script; `None` runs commands against the host environment
    pub activation: Option<PathBuf>,
    pub strategy: ActivationStrategy,
}

impl EnvironmentContext {
    /// No isolated runtime.
    pub fn none() -> Self {
        Self::default()
    }

    /// Activate the runtime at `path` with the native strategy.
    pub fn with_activation(path: impl Into<PathBuf>) -> Self {
        Self { activation: Some(path.into()), strategy: ActivationStrategy::native() }
    }

    pub fn with_strategy(mut self, strategy: ActivationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Prefix `command` with the activation step when the activation script exists.
    ///
    /// A configured but missing script is logged and the command runs unwrapped.
    pub fn apply(&self, command: &str) -> String {
        match &self.activation {
            Some(script) if script.is_file() => self.strategy.wrap(script, command),
            Some(script) => {
                tracing::warn!(
                    activation = %script.display(),
                    "activation script not found, running without isolated runtime"
                );
                command.to_string()
            }
            None => command.to_string(),
        }
    }
}
