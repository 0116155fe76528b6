use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use skillrun_core::logging::{sanitize_path, truncate_for_log};
use skillrun_core::{Config, DEFAULT_TIMEOUT_SECS, ExecConfig};

use crate::environment::EnvironmentContext;
use crate::invocation::Invocation;
use crate::runner::{ExecutionOutcome, ShellRunner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("script '{script}' not found in any skill directory under {}", root.display())]
    ScriptNotFound { script: String, root: PathBuf },
}

/// Runs extracted commands, resolving interpreter scripts against the skill root.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    skills_root: PathBuf,
    environment: EnvironmentContext,
    interpreters: Vec<String>,
    runner: ShellRunner,
}

impl ProcessExecutor {
    pub fn new(skills_root: impl Into<PathBuf>) -> Self {
        Self {
            skills_root: skills_root.into(),
            environment: EnvironmentContext::none(),
            interpreters: ExecConfig::default().interpreters,
            runner: ShellRunner::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Executor for `config`, with a relative activation path resolved against `working_dir`.
    pub fn from_config(config: &Config, working_dir: &Path) -> Self {
        let environment = match config.exec.activation_path(working_dir) {
            Some(path) => EnvironmentContext::with_activation(path),
            None => EnvironmentContext::none(),
        };

        Self {
            skills_root: config.skills.root.clone(),
            environment,
            interpreters: config.exec.interpreters.clone(),
            runner: ShellRunner::new(config.timeout()).with_env(config.exec.env.clone()),
        }
    }

    pub fn with_skills_root(mut self, skills_root: impl Into<PathBuf>) -> Self {
        self.skills_root = skills_root.into();
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentContext) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.runner = self.runner.with_env(env);
        self
    }

    pub fn with_interpreters(mut self, interpreters: Vec<String>) -> Self {
        self.interpreters = interpreters;
        self
    }

    pub fn skills_root(&self) -> &Path {
        &self.skills_root
    }

    pub fn environment(&self) -> &EnvironmentContext {
        &self.environment
    }

    pub fn timeout(&self) -> Duration {
        self.runner.timeout()
    }

    pub fn classify(&self, command: &str) -> Invocation {
        Invocation::classify(command, &self.interpreters)
    }

    /// Final shell command line for `invocation`.
    ///
    /// Interpreter scripts are resolved to absolute paths and wrapped in the runtime
    /// activation, if any. Shell commands pass through untouched.
    pub fn prepare(&self, invocation: &Invocation) -> Result<String, ExecError> {
        match invocation {
            Invocation::Shell { raw } => Ok(raw.clone()),
            Invocation::Interpreter { interpreter, script, args } => {
                let resolved = skillrun_skills::locate(script, &self.skills_root).ok_or_else(|| {
                    ExecError::ScriptNotFound { script: script.clone(), root: self.skills_root.clone() }
                })?;

                let quoted = self.environment.strategy.quote(&resolved.to_string_lossy());
                let line = if args.is_empty() {
                    format!("{interpreter} {quoted}")
                } else {
                    format!("{interpreter} {quoted} {args}")
                };
                Ok(self.environment.apply(&line))
            }
        }
    }

    /// Run one extracted command in `working_dir`.
    ///
    /// An interpreter script that cannot be resolved fails without spawning anything.
    pub async fn run(&self, command: &str, working_dir: &Path) -> ExecutionOutcome {
        let invocation = self.classify(command);
        tracing::debug!(command, interpreter_mode = invocation.is_interpreter(), "routing command");

        let line = match self.prepare(&invocation) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "not running command");
                return ExecutionOutcome::failure(e.to_string());
            }
        };

        tracing::info!(command = %line, cwd = %sanitize_path(working_dir), "running command");
        let outcome = self.runner.run(&line, working_dir).await;
        if !outcome.success {
            tracing::debug!(
                stderr = %truncate_for_log(&outcome.stderr, 200),
                "command failed"
            );
        }
        outcome
    }
}
