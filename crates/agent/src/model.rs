//! The boundary to the driving language model.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use skillrun_core::{Error, Result};

use crate::message::Message;

/// Produces the agent's next free-form reply from the conversation so far.
#[async_trait::async_trait]
pub trait AgentModel: Send {
    async fn respond(&mut self, messages: &[Message]) -> Result<String>;
}

/// One scripted reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResponse {
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ReplayFile {
    #[serde(default)]
    responses: Vec<ReplayResponse>,
}

/// Model that replays scripted responses in order, for deterministic runs.
///
/// Once the script is exhausted every further call returns a reply with no commands in it,
/// which ends a session on the next turn.
#[derive(Debug, Clone, Default)]
pub struct ReplayModel {
    responses: Vec<ReplayResponse>,
    current: usize,
}

impl ReplayModel {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let responses = responses.into_iter().map(|r| ReplayResponse { content: r.into() }).collect();
        Self { responses, current: 0 }
    }

    /// Parse a replay script of `[[responses]]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ReplayFile =
            toml::from_str(content).map_err(|e| Error::Parse(format!("invalid replay script: {}", e)))?;
        Ok(Self { responses: file.responses, current: 0 })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let model = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), responses = model.len(), "loaded replay script");
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Responses not yet replayed
    pub fn remaining(&self) -> usize {
        self.responses.len().saturating_sub(self.current)
    }
}

#[async_trait::async_trait]
impl AgentModel for ReplayModel {
    async fn respond(&mut self, _messages: &[Message]) -> Result<String> {
        let index = self.current;
        self.current += 1;

        match self.responses.get(index) {
            Some(response) => Ok(response.content.clone()),
            None => {
                tracing::debug!(requested = index + 1, available = self.responses.len(), "replay script exhausted");
                Ok(format!(
                    "No more replay responses configured (requested: {}, available: {})",
                    index + 1,
                    self.responses.len()
                ))
            }
        }
    }
}
