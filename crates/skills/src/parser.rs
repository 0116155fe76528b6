//! Parser for skill documentation files.
//!
//! Format:
//! ```markdown
//! ---
//! name: file-size-classification
//! description: Classify the files of a directory by size.
//! version: 1.0.0
//! tags: [files, report]
//! ---
//!
//! # File Size Classification
//! ...
//! ```
//!
//! The header block must open on the very first line. It is read as YAML; when that fails
//! (unquoted colons in a description are common) each line is split on its first colon.

use crate::types::{Result, ScriptType, SkillDescriptor, SkillError, SkillScript};
use std::fs;
use std::path::Path;

const HEADER_MARKER: &str = "---";

/// Parse the documentation file `doc_path` of the skill living in `skill_dir`.
pub fn parse_skill(skill_dir: &Path, doc_path: &Path) -> Result<SkillDescriptor> {
    if !doc_path.is_file() {
        return Err(SkillError::NotFound(doc_path.display().to_string()));
    }

    let content = fs::read_to_string(doc_path)?;
    let header = parse_header(&content)?;
    let scripts = discover_scripts(skill_dir, doc_path)?;

    Ok(SkillDescriptor {
        name: header.name,
        description: header.description,
        version: header.version.unwrap_or_else(|| "1.0.0".to_string()),
        tags: header.tags.unwrap_or_default(),
        source_dir: skill_dir.to_path_buf(),
        doc_path: doc_path.to_path_buf(),
        full_content: content,
        scripts,
    })
}

/// Split content into the raw header block and the remaining body.
pub(crate) fn split_header(content: &str) -> Result<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let first_end = content.find('\n').unwrap_or(content.len());

    if content[..first_end].trim_end() != HEADER_MARKER {
        return Err(SkillError::InvalidHeader(format!("file must start with a {HEADER_MARKER} line")));
    }

    let rest = content.get(first_end + 1..).unwrap_or("");
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == HEADER_MARKER {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(SkillError::InvalidHeader(format!("closing {HEADER_MARKER} not found")))
}

/// Extract and validate the header fields.
pub(crate) fn parse_header(content: &str) -> Result<Header> {
    let (raw, _) = split_header(content)?;

    let mut header = match serde_yml::from_str::<Option<Header>>(raw) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "header is not valid YAML, using key: value lines");
            parse_header_lines(raw)
        }
    };

    header.name = header.name.trim().to_string();
    header.description = header.description.trim().to_string();

    if header.name.is_empty() {
        return Err(SkillError::InvalidHeader("name is required".to_string()));
    }
    if header.description.is_empty() {
        return Err(SkillError::InvalidHeader(format!("skill '{}' has no description", header.name)));
    }

    Ok(header)
}

/// Line-wise `key: value` reading of a header block.
fn parse_header_lines(raw: &str) -> Header {
    let mut header = Header::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            match key.trim() {
                "name" => header.name = unquote(value),
                "description" => header.description = unquote(value),
                "version" => header.version = Some(unquote(value)),
                "tags" => {
                    let inner = value.trim_start_matches('[').trim_end_matches(']');
                    header.tags = Some(
                        inner.split(',').map(|t| unquote(t.trim())).filter(|t| !t.is_empty()).collect(),
                    );
                }
                _ => {}
            }
        }
    }

    header
}

/// Remove surrounding quotes from a header value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\''))) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Discover helper scripts in the skill directory, sorted by file name.
fn discover_scripts(skill_dir: &Path, doc_path: &Path) -> Result<Vec<SkillScript>> {
    let mut scripts = Vec::new();

    for entry in fs::read_dir(skill_dir)? {
        let path = entry?.path();

        if !path.is_file() || path == doc_path {
            continue;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if name.starts_with('.') || name.eq_ignore_ascii_case("readme.md") {
            continue;
        }

        let script_type = ScriptType::from_path(&path);
        scripts.push(SkillScript { name, path, script_type });
    }

    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

/// Header fields; only `name` and `description` are required.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct Header {
    #[serde(default)]
    pub(crate) name: String,

    #[serde(default)]
    pub(crate) description: String,

    #[serde(default)]
    pub(crate) version: Option<String>,

    #[serde(default)]
    pub(crate) tags: Option<Vec<String>>,
}
