//! Core types for the skills catalog.
//!
//! A skill is a directory under the skill root holding a SKILL.md file (header block plus
//! free-form documentation) and zero or more helper scripts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Parsed metadata and documentation for one skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillDescriptor {
    /// Identifier declared in the header, expected unique within a registry
    pub name: String,

    /// One-line summary shown to the agent
    pub description: String,

    /// Semantic version (defaults to 1.0.0)
    #[serde(default)]
    pub version: String,

    /// For filtering/discovery
    #[serde(default)]
    pub tags: Vec<String>,

    /// Directory holding the documentation file and scripts
    pub source_dir: PathBuf,

    /// Path to the documentation file itself
    pub doc_path: PathBuf,

    /// Complete documentation text, header included
    pub full_content: String,

    /// Helper scripts found next to the documentation file
    #[serde(default)]
    pub scripts: Vec<SkillScript>,
}

impl SkillDescriptor {
    /// Documentation body without the header block.
    pub fn body(&self) -> &str {
        crate::parser::split_header(&self.full_content)
            .map(|(_, body)| body.trim())
            .unwrap_or(self.full_content.as_str())
    }

    /// Find a script of this skill by file name.
    pub fn script(&self, name: &str) -> Option<&SkillScript> {
        self.scripts.iter().find(|s| s.name == name)
    }
}

/// An executable file shipped in a skill directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillScript {
    /// File name (e.g. "classify_files_by_size.py")
    pub name: String,

    /// Path to the script
    pub path: PathBuf,

    /// Script language/type
    pub script_type: ScriptType,
}

/// The type of script based on file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScriptType {
    Bash,
    JavaScript,
    Python,
    Unknown,
}

impl ScriptType {
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "sh" => ScriptType::Bash,
                "js" => ScriptType::JavaScript,
                "py" => ScriptType::Python,
                _ => ScriptType::Unknown,
            })
            .unwrap_or(ScriptType::Unknown)
    }
}

/// Errors that can occur when loading a single skill.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Skill not found: {0}")]
    NotFound(String),

    #[error("Invalid skill header: {0}")]
    InvalidHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;

impl From<SkillError> for skillrun_core::Error {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::Io(e) => skillrun_core::Error::Io(e),
            other => skillrun_core::Error::Skill(other.to_string()),
        }
    }
}
