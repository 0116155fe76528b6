//! Detects which skill, if any, the agent's text refers to.

use crate::registry::SkillRegistry;

/// Skill name with hyphens and underscores replaced by spaces, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(['-', '_'], " ")
}

/// Whether `text` mentions `name`, either verbatim or in its normalized spelling.
///
/// Both checks are case-insensitive substring searches.
pub fn mentions_skill(text: &str, name: &str) -> bool {
    let normalized = normalize_name(name);
    if normalized.trim().is_empty() {
        return false;
    }

    let text = text.to_lowercase();
    text.contains(&name.to_lowercase()) || text.contains(&normalized)
}

/// Name of the first skill, in catalog (scan) order, mentioned by `text`.
pub fn detect<'a>(text: &str, registry: &'a SkillRegistry) -> Option<&'a str> {
    registry.iter().map(|skill| skill.name.as_str()).find(|name| mentions_skill(text, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkillDescriptor;
    use skillrun_core::DuplicatePolicy;
    use std::path::PathBuf;

    fn registry(names: &[&str]) -> SkillRegistry {
        let descriptors = names.iter().map(|name| SkillDescriptor {
            name: name.to_string(),
            description: "d".into(),
            version: "1.0.0".into(),
            tags: vec![],
            source_dir: PathBuf::from("/skills").join(name),
            doc_path: PathBuf::from("/skills").join(name).join("SKILL.md"),
            full_content: String::new(),
            scripts: vec![],
        });
        SkillRegistry::from_descriptors("/skills", descriptors, DuplicatePolicy::FirstWins)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("File-Size_Classification"), "file size classification");
    }

    #[test]
    fn test_mentions_exact_case_insensitive() {
        assert!(mentions_skill("I will use FILE-SIZE-CLASSIFICATION now", "file-size-classification"));
    }

    #[test]
    fn test_mentions_normalized() {
        assert!(mentions_skill("Let me run the file size classification skill.", "file-size-classification"));
        assert!(mentions_skill("using page editor", "page_editor"));
    }

    #[test]
    fn test_no_mention() {
        assert!(!mentions_skill("Nothing relevant here.", "file-size-classification"));
        assert!(!mentions_skill("anything", ""));
    }

    #[test]
    fn test_separator_only_name_never_matches() {
        assert!(!mentions_skill("a reply with spaces", "-"));
        assert!(!mentions_skill("a reply with spaces - and _ marks", "_-"));

        let reg = registry(&["_-", "page-editor"]);
        assert_eq!(detect("open the page editor", &reg), Some("page-editor"));
    }

    #[test]
    fn test_detect_returns_first_in_catalog_order() {
        let reg = registry(&["form-filler", "form"]);
        assert_eq!(detect("use the form-filler please", &reg), Some("form-filler"));

        let reg = registry(&["form", "form-filler"]);
        assert_eq!(detect("use the form-filler please", &reg), Some("form"));
    }

    #[test]
    fn test_detect_none() {
        let reg = registry(&["page-editor"]);
        assert_eq!(detect("I will just answer directly.", &reg), None);
        assert_eq!(detect("anything", &SkillRegistry::default()), None);
    }

    #[test]
    fn test_registry_detect_returns_descriptor() {
        let reg = registry(&["page-editor"]);
        assert_eq!(reg.detect("open the Page Editor").map(|s| s.name.as_str()), Some("page-editor"));
    }
}
