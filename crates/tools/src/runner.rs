//! Low-level child process runner shared by both execution modes.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use skillrun_core::DEFAULT_TIMEOUT_SECS;

/// Result of running one command.
///
/// Every failure mode (non-zero exit, timeout, launch error, unresolved script) is
/// reported through this value with `success == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Exit code, absent when the process never ran or was killed by a signal
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl ExecutionOutcome {
    /// Failure that happened before or instead of running a process.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.into(),
            exit_code: None,
            timed_out: false,
            duration_ms: 0,
        }
    }

    fn timeout(timeout: Duration, elapsed: Duration) -> Self {
        Self {
            timed_out: true,
            duration_ms: elapsed.as_millis() as u64,
            ..Self::failure(format!("Command timed out after {} seconds", timeout.as_secs()))
        }
    }
}

/// Runs command lines through the platform shell with a hard timeout.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
    env: HashMap<String, String>,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS), env: HashMap::new() }
    }
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, env: HashMap::new() }
    }

    /// Extra variables merged over the inherited environment.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command_line` in `working_dir`, capturing both output streams.
    ///
    /// On timeout the child (and on Unix its whole process group) is killed before this
    /// returns.
    pub async fn run(&self, command_line: &str, working_dir: &Path) -> ExecutionOutcome {
        let started = Instant::now();

        let mut cmd = shell_command(command_line);
        cmd.current_dir(working_dir)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(error = %e, cwd = %working_dir.display(), "failed to launch command");
                return ExecutionOutcome::failure(format!("Failed to execute command '{}': {}", command_line, e));
            }
        };
        let pid = child.id();

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code();
                let outcome = ExecutionOutcome {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    exit_code,
                    timed_out: false,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
                tracing::debug!(?exit_code, duration_ms = outcome.duration_ms, "command finished");
                outcome
            }
            Ok(Err(e)) => ExecutionOutcome::failure(format!("Failed to collect output of '{}': {}", command_line, e)),
            Err(_) => {
                kill_process_group(pid);
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "command timed out and was killed");
                ExecutionOutcome::timeout(self.timeout, started.elapsed())
            }
        }
    }
}

fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }
}

/// Kill whatever is left of the child's process group.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child via process_group(0).
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(pid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cwd() -> std::path::PathBuf {
        std::env::temp_dir()
    }

    #[tokio::test]
    async fn test_run_success() {
        let outcome = ShellRunner::default().run("echo 'Hello, shell!'", &cwd()).await;
        assert!(outcome.success);
        assert_eq!(outcome.stdout, "Hello, shell!\n");
        assert_eq!(outcome.exit_code, Some(0));
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let outcome = ShellRunner::default().run("echo oops >&2; exit 42", &cwd()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(42));
        assert_eq!(outcome.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_run_uses_working_dir() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "here").unwrap();
        let outcome = ShellRunner::default().run("cat marker.txt", temp.path()).await;
        assert!(outcome.success);
        assert_eq!(outcome.stdout, "here");
    }

    #[tokio::test]
    async fn test_run_merges_env() {
        let env = HashMap::from([("SKILLRUN_TEST_VALUE".to_string(), "42".to_string())]);
        let outcome = ShellRunner::default().with_env(env).run("echo $SKILLRUN_TEST_VALUE", &cwd()).await;
        assert_eq!(outcome.stdout.trim(), "42");
    }

    #[tokio::test]
    async fn test_run_launch_failure() {
        let outcome = ShellRunner::default().run("echo hi", Path::new("/nonexistent/working/dir")).await;
        assert!(!outcome.success);
        assert!(outcome.stderr.contains("Failed to execute command"));
        assert_eq!(outcome.exit_code, None);
    }

    #[tokio::test]
    async fn test_run_timeout_kills_child() {
        let temp = tempfile::tempdir().unwrap();
        let marker = temp.path().join("survived");
        let command = format!("sleep 2; touch '{}'", marker.display());

        let started = Instant::now();
        let outcome = ShellRunner::new(Duration::from_millis(300)).run(&command, temp.path()).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!outcome.success);
        assert!(outcome.timed_out);
        assert!(outcome.stderr.contains("timed out"));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists(), "child kept running after timeout");
    }
}
