#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use skillrun_core::Config;
use skillrun_tools::{ActivationStrategy, EnvironmentContext, ProcessExecutor};
use tempfile::TempDir;

fn write_skill_script(root: &Path, skill: &str, script: &str, body: &str) {
    let dir = root.join(skill);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(script), body).unwrap();
}

fn sh_executor(root: &Path) -> ProcessExecutor {
    ProcessExecutor::new(root).with_interpreters(vec!["sh".to_string()])
}

#[tokio::test]
async fn test_missing_script_fails_without_spawning() {
    let root = TempDir::new().unwrap();
    let marker = root.path().join("activated");
    let activate = root.path().join("activate");
    fs::write(&activate, format!("touch '{}'\n", marker.display())).unwrap();

    let executor = sh_executor(root.path())
        .with_environment(EnvironmentContext::with_activation(&activate).with_strategy(ActivationStrategy::PosixSource));
    let outcome = executor.run("sh missing_script.sh", root.path()).await;

    assert!(!outcome.success);
    assert!(outcome.stderr.contains("missing_script.sh"));
    assert_eq!(outcome.exit_code, None);
    assert!(!outcome.timed_out);
    assert!(!marker.exists(), "activation ran although the script was never resolved");
}

#[tokio::test]
async fn test_python_missing_script_reports_name() {
    let root = TempDir::new().unwrap();
    let outcome = ProcessExecutor::new(root.path()).run("python missing_script.py", root.path()).await;
    assert!(!outcome.success);
    assert!(outcome.stderr.contains("missing_script.py"));
}

#[tokio::test]
async fn test_interpreter_script_found_in_other_skill() {
    let root = TempDir::new().unwrap();
    write_skill_script(root.path(), "shared-helpers", "greet.sh", "echo \"hello $1 from $(basename \"$PWD\")\"\n");
    fs::create_dir_all(root.path().join("caller")).unwrap();

    let work = TempDir::new().unwrap();
    let outcome = sh_executor(root.path()).run("sh greet.sh world", work.path()).await;

    assert!(outcome.success, "stderr: {}", outcome.stderr);
    let expected_dir = work.path().file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(outcome.stdout.trim(), format!("hello world from {expected_dir}"));
}

#[tokio::test]
async fn test_activation_reaches_the_script() {
    let root = TempDir::new().unwrap();
    write_skill_script(root.path(), "env-probe", "probe.sh", "echo \"venv=$SKILLRUN_VENV\"\n");
    let activate = root.path().join("activate");
    fs::write(&activate, "export SKILLRUN_VENV=isolated\n").unwrap();

    let executor = sh_executor(root.path())
        .with_environment(EnvironmentContext::with_activation(&activate).with_strategy(ActivationStrategy::PosixSource));
    let outcome = executor.run("sh probe.sh", root.path()).await;

    assert!(outcome.success, "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout.trim(), "venv=isolated");
}

#[tokio::test]
async fn test_relative_working_dir_activation_from_config() {
    let temp = TempDir::new_in(".").unwrap();
    let base = temp.path().strip_prefix(std::env::current_dir().unwrap()).unwrap();
    assert!(base.is_relative());

    write_skill_script(&base.join("skills"), "env-probe", "probe.sh", "echo \"venv=$SKILLRUN_VENV\"\n");
    let work = base.join("work");
    fs::create_dir_all(work.join(".venv/bin")).unwrap();
    fs::write(work.join(".venv/bin/activate"), "export SKILLRUN_VENV=isolated\n").unwrap();

    let mut config = Config::default();
    config.skills.root = base.join("skills");
    config.exec.activation = Some(".venv/bin/activate".into());
    config.exec.interpreters = vec!["sh".to_string()];

    let executor = ProcessExecutor::from_config(&config, &work);
    assert!(executor.environment().activation.as_ref().unwrap().is_absolute());

    let outcome = executor.run("sh probe.sh", &work).await;
    assert!(outcome.success, "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout.trim(), "venv=isolated");
}

#[tokio::test]
async fn test_activation_skipped_for_shell_commands() {
    let root = TempDir::new().unwrap();
    let activate = root.path().join("activate");
    fs::write(&activate, "export SKILLRUN_VENV=isolated\n").unwrap();

    let executor = sh_executor(root.path())
        .with_environment(EnvironmentContext::with_activation(&activate).with_strategy(ActivationStrategy::PosixSource));
    let outcome = executor.run("echo \"venv=${SKILLRUN_VENV:-host}\"", root.path()).await;

    assert_eq!(outcome.stdout.trim(), "venv=host");
}

#[tokio::test]
async fn test_missing_activation_runs_directly() {
    let root = TempDir::new().unwrap();
    write_skill_script(root.path(), "env-probe", "probe.sh", "echo ran\n");

    let executor = sh_executor(root.path()).with_environment(
        EnvironmentContext::with_activation(root.path().join("no-such-activate"))
            .with_strategy(ActivationStrategy::PosixSource),
    );
    let outcome = executor.run("sh probe.sh", root.path()).await;
    assert!(outcome.success);
    assert_eq!(outcome.stdout, "ran\n");
}

#[tokio::test]
async fn test_non_zero_exit_captures_stderr() {
    let root = TempDir::new().unwrap();
    write_skill_script(root.path(), "broken", "fail.sh", "echo 'bad input' >&2\nexit 3\n");

    let outcome = sh_executor(root.path()).run("sh fail.sh", root.path()).await;
    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, Some(3));
    assert_eq!(outcome.stderr, "bad input\n");
}

#[tokio::test]
async fn test_extra_env_is_merged() {
    let root = TempDir::new().unwrap();
    let env = [("SKILLRUN_TOKEN".to_string(), "abc".to_string())].into_iter().collect();
    let outcome = sh_executor(root.path()).with_env(env).run("printf %s \"$SKILLRUN_TOKEN\"", root.path()).await;
    assert_eq!(outcome.stdout, "abc");
}

#[tokio::test]
async fn test_never_ending_command_times_out_without_orphans() {
    let root = TempDir::new().unwrap();
    let marker = root.path().join("grandchild-survived");
    let command = format!("(sleep 2; touch '{}') & while true; do sleep 1; done", marker.display());

    let executor = sh_executor(root.path()).with_timeout(Duration::from_millis(500));
    let started = Instant::now();
    let outcome = executor.run(&command, root.path()).await;
    let elapsed = started.elapsed();

    assert!(!outcome.success);
    assert!(outcome.timed_out);
    assert!(outcome.stderr.starts_with("Command timed out after"));
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(2));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!marker.exists(), "background child outlived the timeout");
}
