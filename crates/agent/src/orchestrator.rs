//! Per-turn pipeline: trigger detection, command extraction and sequential execution.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use skillrun_core::{Config, FailurePolicy};
use skillrun_skills::{FenceGrammar, SkillRegistry};
use skillrun_tools::{ExecutionOutcome, ProcessExecutor};

const SYSTEM_PREAMBLE: &str = "You are an agent that completes tasks by invoking skills. \
Each command you write in a fenced block is executed and its output is returned to you in the next message.";

/// One executed command and its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRun {
    pub command: String,
    pub outcome: ExecutionOutcome,
}

/// Everything that happened while processing one agent reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// Skill named in the reply, if any
    pub triggered: Option<String>,
    /// Full documentation of the triggered skill, only the first time it is triggered
    pub skill_doc: Option<String>,
    /// Commands that ran, in extraction order
    pub results: Vec<CommandRun>,
    /// Commands not run because an earlier command failed
    pub skipped: Vec<String>,
}

impl TurnReport {
    /// Nothing to tell the agent: no new documentation and no commands.
    pub fn is_idle(&self) -> bool {
        self.skill_doc.is_none() && self.results.is_empty() && self.skipped.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|run| run.outcome.success) && self.skipped.is_empty()
    }

    /// Plain-text message fed back to the agent on its next turn.
    pub fn feedback(&self) -> String {
        let mut out = String::new();

        if let (Some(name), Some(doc)) = (&self.triggered, &self.skill_doc) {
            let _ = writeln!(out, "## Skill documentation: {name}\n\n{}\n", doc.trim_end());
        }

        if !self.results.is_empty() {
            out.push_str("## Command results\n");
            for run in &self.results {
                let _ = write!(out, "\n### `{}`\n{}\n", run.command, format_outcome(&run.outcome));
            }
        }

        if !self.skipped.is_empty() {
            out.push_str("\n## Skipped after a failure\n");
            for command in &self.skipped {
                let _ = writeln!(out, "- `{command}`");
            }
        }

        out.trim_end().to_string()
    }
}

fn format_outcome(outcome: &ExecutionOutcome) -> String {
    if outcome.timed_out {
        return outcome.stderr.clone();
    }

    match outcome.exit_code {
        Some(code) if !outcome.success => format!(
            "Command failed with exit code {}\n\nSTDERR:\n{}\n\nSTDOUT:\n{}",
            code, outcome.stderr, outcome.stdout
        ),
        None if !outcome.success => format!("Command could not be run: {}", outcome.stderr),
        _ if !outcome.stderr.is_empty() => {
            format!("Command completed with warnings\n\nSTDERR:\n{}\n\nSTDOUT:\n{}", outcome.stderr, outcome.stdout)
        }
        _ if outcome.stdout.is_empty() => "Command completed with no output".to_string(),
        _ => outcome.stdout.clone(),
    }
}

/// Drives the skill pipeline for each agent turn.
#[derive(Debug)]
pub struct Orchestrator {
    registry: Arc<SkillRegistry>,
    executor: ProcessExecutor,
    grammar: FenceGrammar,
    on_failure: FailurePolicy,
    surfaced: HashSet<String>,
}

impl Orchestrator {
    /// Scripts are always resolved against the root `registry` was scanned from.
    pub fn new(
        registry: Arc<SkillRegistry>, executor: ProcessExecutor, grammar: FenceGrammar, on_failure: FailurePolicy,
    ) -> Self {
        let executor = executor.with_skills_root(registry.root());
        Self { registry, executor, grammar, on_failure, surfaced: HashSet::new() }
    }

    pub fn from_config(registry: Arc<SkillRegistry>, config: &Config, working_dir: &Path) -> Self {
        let executor = ProcessExecutor::from_config(config, working_dir);
        Self::new(registry, executor, FenceGrammar::from(&config.extract), config.exec.on_failure)
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &ProcessExecutor {
        &self.executor
    }

    /// Instructions for the agent: a fixed preamble followed by the skill catalog.
    pub fn system_prompt(&self) -> String {
        let catalog = self.registry.render_prompt();
        if catalog.is_empty() { SYSTEM_PREAMBLE.to_string() } else { format!("{SYSTEM_PREAMBLE}\n\n{catalog}") }
    }

    /// Process one agent reply.
    ///
    /// Commands run one at a time in extraction order. Under
    /// [`FailurePolicy::StopOnFailure`] the commands after the first failure are reported
    /// as skipped instead of run.
    pub async fn process_turn(&mut self, text: &str, working_dir: &Path) -> TurnReport {
        let mut report = TurnReport::default();

        if let Some(skill) = self.registry.detect(text) {
            report.triggered = Some(skill.name.clone());
            if self.surfaced.insert(skill.name.clone()) {
                tracing::info!(skill = %skill.name, "surfacing skill documentation");
                report.skill_doc = Some(skill.full_content.clone());
            }
        }

        let commands = self.grammar.extract(text);
        tracing::debug!(count = commands.len(), "extracted commands");

        let mut commands = commands.into_iter();
        for command in commands.by_ref() {
            let outcome = self.executor.run(&command, working_dir).await;
            let failed = !outcome.success;
            report.results.push(CommandRun { command, outcome });

            if failed && self.on_failure.halts_on_failure() {
                break;
            }
        }
        report.skipped = commands.collect();
        if !report.skipped.is_empty() {
            tracing::warn!(skipped = report.skipped.len(), "skipping remaining commands after failure");
        }

        report
    }

    /// Forget which skills have had their documentation surfaced.
    pub fn reset_surfaced(&mut self) {
        self.surfaced.clear();
    }
}
