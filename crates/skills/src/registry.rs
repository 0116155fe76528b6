use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use skillrun_core::logging::sanitize_path;
use skillrun_core::{DuplicatePolicy, SkillsConfig};

use crate::parser::parse_skill;
use crate::types::SkillDescriptor;

/// Options controlling a registry scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Documentation filenames recognized in a skill directory, first present wins
    pub doc_files: Vec<String>,
    /// Name collision handling
    pub on_duplicate: DuplicatePolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&SkillsConfig::default())
    }
}

impl From<&SkillsConfig> for ScanOptions {
    fn from(config: &SkillsConfig) -> Self {
        Self { doc_files: config.doc_files.clone(), on_duplicate: config.on_duplicate }
    }
}

/// Immutable catalog of the skills found under one root directory.
///
/// Built once by [`SkillRegistry::scan`] and shared read-only afterwards (wrap it in an
/// `Arc` to hand it to several components). Iteration follows scan order, which is the
/// skill subdirectories sorted by file name.
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    root: PathBuf,
    skills: Vec<SkillDescriptor>,
    index: HashMap<String, usize>,
}

impl SkillRegistry {
    /// Scan `root` with default options.
    pub fn scan(root: &Path) -> skillrun_core::Result<Self> {
        Self::scan_with(root, &ScanOptions::default())
    }

    /// Scan the immediate subdirectories of `root` for skill documentation files.
    ///
    /// A missing root yields an empty registry. A root that exists but cannot be opened
    /// is the only error; problems with individual skills are logged and skipped.
    pub fn scan_with(root: &Path, options: &ScanOptions) -> skillrun_core::Result<Self> {
        let mut registry = Self { root: root.to_path_buf(), ..Self::default() };

        if !root.exists() {
            warn!(root = %root.display(), "skill root does not exist, no skills loaded");
            return Ok(registry);
        }

        std::fs::read_dir(root).map_err(|e| skillrun_core::Error::unreadable_root(root, &e))?;

        for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "failed to read skill root entry, skipping");
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let skill_dir = entry.path();
            let Some(doc_path) = options.doc_files.iter().map(|f| skill_dir.join(f)).find(|p| p.is_file()) else {
                debug!(dir = %skill_dir.display(), "no documentation file, not a skill");
                continue;
            };

            match parse_skill(skill_dir, &doc_path) {
                Ok(descriptor) => registry.insert(descriptor, options.on_duplicate),
                Err(e) => warn!(path = %doc_path.display(), error = %e, "failed to load skill"),
            }
        }

        info!(root = %sanitize_path(root), count = registry.len(), "skill scan complete");
        Ok(registry)
    }

    /// Build a registry from already-parsed descriptors, applying `on_duplicate`.
    pub fn from_descriptors(
        root: impl Into<PathBuf>, descriptors: impl IntoIterator<Item = SkillDescriptor>, on_duplicate: DuplicatePolicy,
    ) -> Self {
        let mut registry = Self { root: root.into(), ..Self::default() };
        for descriptor in descriptors {
            registry.insert(descriptor, on_duplicate);
        }
        registry
    }

    fn insert(&mut self, descriptor: SkillDescriptor, on_duplicate: DuplicatePolicy) {
        match self.index.get(&descriptor.name) {
            Some(&slot) => match on_duplicate {
                DuplicatePolicy::FirstWins => warn!(
                    skill = %descriptor.name,
                    kept = %self.skills[slot].source_dir.display(),
                    ignored = %descriptor.source_dir.display(),
                    "duplicate skill name, keeping first"
                ),
                DuplicatePolicy::LastWins => {
                    warn!(
                        skill = %descriptor.name,
                        replaced = %self.skills[slot].source_dir.display(),
                        by = %descriptor.source_dir.display(),
                        "duplicate skill name, replacing earlier"
                    );
                    self.skills[slot] = descriptor;
                }
            },
            None => {
                info!(skill = %descriptor.name, dir = %descriptor.source_dir.display(), "loaded skill");
                self.index.insert(descriptor.name.clone(), self.skills.len());
                self.skills.push(descriptor);
            }
        }
    }

    /// Directory the registry was scanned from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get a skill by name.
    pub fn get(&self, name: &str) -> Option<&SkillDescriptor> {
        self.index.get(name).map(|&slot| &self.skills[slot])
    }

    /// Skills in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillDescriptor> {
        self.skills.iter()
    }

    /// Skill names in scan order.
    pub fn names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skills section for the agent's instructions (empty when there are no skills).
    pub fn render_prompt(&self) -> String {
        crate::prompt::render(self)
    }

    /// First skill named in `text`, in scan order.
    pub fn detect(&self, text: &str) -> Option<&SkillDescriptor> {
        crate::trigger::detect(text, self).and_then(|name| self.get(name))
    }

    /// Resolve a script filename against every skill directory under the root.
    pub fn locate_script(&self, script: &str) -> Option<PathBuf> {
        crate::locate::locate(script, &self.root)
    }
}
