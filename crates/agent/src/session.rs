use serde::Serialize;
use std::path::Path;

use skillrun_core::{Error, Result};

use crate::message::Message;
use crate::model::AgentModel;
use crate::orchestrator::{Orchestrator, TurnReport};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// The agent replied without naming a new skill or writing commands
    Idle,
    /// The turn limit was reached
    MaxTurns,
}

/// Full record of a session
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub messages: Vec<Message>,
    pub turns: Vec<TurnReport>,
    pub stop: StopReason,
}

impl Transcript {
    /// Last assistant reply, if the model produced any.
    pub fn final_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::message::Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// Agent loop: model reply, turn processing, feedback, repeat.
pub struct Session {
    orchestrator: Orchestrator,
    max_turns: usize,
}

impl Session {
    pub fn new(orchestrator: Orchestrator, max_turns: usize) -> Self {
        Self { orchestrator, max_turns }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Run `task` to completion against `model`.
    ///
    /// Stops once a turn is idle or after `max_turns` model replies. Only a model error is
    /// returned as `Err`; failed commands are part of the transcript.
    pub async fn run(&mut self, model: &mut dyn AgentModel, task: &str, working_dir: &Path) -> Result<Transcript> {
        let mut messages = vec![Message::system(self.orchestrator.system_prompt()), Message::user(task)];
        let mut turns = Vec::new();

        for turn in 1..=self.max_turns {
            let reply = model.respond(&messages).await.map_err(|e| match e {
                Error::Model(_) => e,
                other => Error::Model(other.to_string()),
            })?;
            messages.push(Message::assistant(reply.as_str()));

            let report = self.orchestrator.process_turn(&reply, working_dir).await;
            tracing::info!(
                turn,
                triggered = report.triggered.as_deref().unwrap_or(""),
                commands = report.results.len(),
                skipped = report.skipped.len(),
                "turn processed"
            );

            if report.is_idle() {
                turns.push(report);
                return Ok(Transcript { messages, turns, stop: StopReason::Idle });
            }

            messages.push(Message::user(report.feedback()));
            turns.push(report);
        }

        tracing::warn!(max_turns = self.max_turns, "session reached its turn limit");
        Ok(Transcript { messages, turns, stop: StopReason::MaxTurns })
    }
}
