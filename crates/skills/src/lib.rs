//! Skill catalog for the skillrun orchestrator.
//!
//! Skills are discovered once from the immediate subdirectories of a skill root. Each one
//! carries a SKILL.md file whose header declares a name and a one-line description. The
//! catalog is rendered into the agent's instructions, consulted to detect which skill the
//! agent is talking about, and used to resolve script filenames referenced by commands.

mod extract;
mod locate;
mod parser;
mod prompt;
mod registry;
mod trigger;
mod types;

pub use extract::{FenceGrammar, FencedBlock, extract, fenced_blocks};
pub use locate::locate;
pub use parser::parse_skill;
pub use prompt::render;
pub use registry::{ScanOptions, SkillRegistry};
pub use trigger::{detect, mentions_skill, normalize_name};
pub use types::{Result, ScriptType, SkillDescriptor, SkillError, SkillScript};
