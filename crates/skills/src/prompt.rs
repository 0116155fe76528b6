//! Renders the catalog into the skills section of the agent's instructions.

use crate::registry::SkillRegistry;

const HEADER: &str = "## Available Skills";

const USAGE: &str = "\
### How to use a skill
1. To use a skill, mention its name in your reply. Its full instructions will be provided to you.
2. To run a command, put it in a fenced code block tagged `bash`, one command per line:
   ```bash
   python script_name.py --option value
   ```
   Lines in an untagged fenced block are only run when they start with `$ `.
3. Refer to skill scripts by file name only; they are located automatically.
4. Command output (stdout, stderr, success) is returned to you in the next message.";

/// Render the skills section: header, one bullet per skill, usage protocol.
///
/// Returns an empty string for an empty catalog so callers can append it unconditionally.
pub fn render(registry: &SkillRegistry) -> String {
    if registry.is_empty() {
        return String::new();
    }

    let mut out = String::from(HEADER);
    out.push_str("\n\n");
    for skill in registry.iter() {
        out.push_str(&format!("- **{}**: {}\n", skill.name, skill.description));
    }
    out.push('\n');
    out.push_str(USAGE);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkillDescriptor;
    use skillrun_core::DuplicatePolicy;
    use std::path::PathBuf;

    fn skill(name: &str, description: &str) -> SkillDescriptor {
        SkillDescriptor {
            name: name.into(),
            description: description.into(),
            version: "1.0.0".into(),
            tags: vec![],
            source_dir: PathBuf::from("/skills").join(name),
            doc_path: PathBuf::from("/skills").join(name).join("SKILL.md"),
            full_content: String::new(),
            scripts: vec![],
        }
    }

    #[test]
    fn test_render_single_skill() {
        let skills = vec![skill("demo", "Demo skill.")];
        let registry = SkillRegistry::from_descriptors("/skills", skills, DuplicatePolicy::FirstWins);
        let rendered = render(&registry);

        let bullets: Vec<_> = rendered.lines().filter(|l| l.starts_with("- **")).collect();
        assert_eq!(bullets, vec!["- **demo**: Demo skill."]);
        assert!(rendered.starts_with(HEADER));
        assert!(rendered.contains("```bash"));
        assert!(rendered.contains("`$ `"));
    }

    #[test]
    fn test_render_keeps_catalog_order() {
        let registry = SkillRegistry::from_descriptors(
            "/skills",
            vec![skill("b-skill", "Second."), skill("a-skill", "First.")],
            DuplicatePolicy::FirstWins,
        );
        let rendered = render(&registry);
        let b = rendered.find("b-skill").unwrap();
        let a = rendered.find("a-skill").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_render_empty_catalog() {
        assert_eq!(render(&SkillRegistry::default()), "");
    }
}
