//! Extraction of executable commands from agent-written markdown.
//!
//! Grammar:
//! - A fence is a line whose trimmed form starts with three backticks. The first word after
//!   the backticks is the block's tag. Any fence line inside an open block closes it.
//! - Tagged block with a recognized tag: every non-blank, non-`#` line is a command, with a
//!   leading `$ ` or `> ` prompt marker removed.
//! - Untagged block: only lines starting with a prompt marker are commands.
//! - Blocks with any other tag are ignored.
//! - A block left open runs to the end of the text.
//!
//! Commands from tagged blocks come first, then those from untagged blocks; duplicates are
//! dropped keeping the first occurrence.

use std::collections::HashSet;

use skillrun_core::{DEFAULT_FENCE_TAGS, ExtractConfig};

const FENCE: &str = "```";
const PROMPT_MARKERS: &[&str] = &["$ ", "> "];

/// A fenced region of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Lowercased first word of the info string, if any
    pub tag: Option<String>,
    /// Body lines, fences excluded
    pub lines: Vec<&'a str>,
    /// Whether a closing fence was found
    pub terminated: bool,
}

/// The set of fence tags treated as executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceGrammar {
    tags: Vec<String>,
}

impl Default for FenceGrammar {
    fn default() -> Self {
        Self::new(DEFAULT_FENCE_TAGS)
    }
}

impl From<&ExtractConfig> for FenceGrammar {
    fn from(config: &ExtractConfig) -> Self {
        Self::new(&config.tags)
    }
}

impl FenceGrammar {
    pub fn new<T: AsRef<str>>(tags: impl IntoIterator<Item = T>) -> Self {
        let tags = tags.into_iter().map(|t| t.as_ref().trim().to_lowercase()).filter(|t| !t.is_empty());
        Self { tags: tags.collect() }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether a block with this tag is executable.
    pub fn is_executable_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| *t == tag)
    }

    /// Ordered, deduplicated commands found in `text`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let blocks = fenced_blocks(text);

        let tagged = blocks
            .iter()
            .filter(|b| b.tag.as_deref().is_some_and(|t| self.is_executable_tag(t)))
            .flat_map(|b| b.lines.iter().filter_map(|line| tagged_command(line)));

        let untagged = blocks
            .iter()
            .filter(|b| b.tag.is_none())
            .flat_map(|b| b.lines.iter().filter_map(|line| untagged_command(line)));

        let mut seen = HashSet::new();
        tagged.chain(untagged).filter(|cmd| seen.insert(cmd.clone())).collect()
    }
}

/// Extract commands using the default tag set.
pub fn extract(text: &str) -> Vec<String> {
    FenceGrammar::default().extract(text)
}

/// Split `text` into its fenced blocks, in order of appearance.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<FencedBlock<'_>> = None;

    for line in text.lines() {
        if let Some(info) = fence_info(line) {
            match current.take() {
                Some(mut block) => {
                    block.terminated = true;
                    blocks.push(block);
                }
                None => {
                    let tag = info.split_whitespace().next().map(str::to_lowercase);
                    current = Some(FencedBlock { tag, lines: Vec::new(), terminated: false });
                }
            }
            continue;
        }

        if let Some(block) = current.as_mut() {
            block.lines.push(line);
        }
    }

    if let Some(block) = current {
        tracing::debug!(tag = ?block.tag, "unterminated fenced block runs to end of text");
        blocks.push(block);
    }

    blocks
}

/// Info string of a fence line, or `None` when the line is not a fence.
fn fence_info(line: &str) -> Option<&str> {
    let info = line.trim().strip_prefix(FENCE)?.trim_start_matches('`').trim();
    // backticks in the info string mean inline code, not a fence
    (!info.contains('`')).then_some(info)
}

fn strip_prompt(line: &str) -> Option<&str> {
    PROMPT_MARKERS.iter().find_map(|marker| line.strip_prefix(marker))
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}

fn tagged_command(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || is_comment(line) {
        return None;
    }

    let command = strip_prompt(line).unwrap_or(line).trim();
    (!command.is_empty() && !is_comment(command)).then(|| command.to_string())
}

fn untagged_command(line: &str) -> Option<String> {
    let command = strip_prompt(line.trim())?.trim();
    (!command.is_empty() && !is_comment(command)).then(|| command.to_string())
}
