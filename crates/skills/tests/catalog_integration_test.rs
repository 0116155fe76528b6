use std::fs;
use std::path::Path;

use skillrun_core::{Config, DuplicatePolicy};
use skillrun_skills::{FenceGrammar, ScanOptions, ScriptType, SkillRegistry, extract, locate};
use tempfile::TempDir;

const CLASSIFY_DOC: &str = "---\nname: file-size-classification\n\
description: Classify files in a directory by size.\nversion: 1.2.0\ntags: [files, report]\n---\n\
# File size classification\n\nRun `python classify_files_by_size.py --dir <path>`.\n";

const EDITOR_DOC: &str = "---\nname: page-editor\ndescription: Edit a workspace page.\n---\n\
# Page editor\n\nUses `classify_files_by_size.py` from file-size-classification for attachments.\n";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn library() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(&root.join("file-size-classification/SKILL.md"), CLASSIFY_DOC);
    write(&root.join("file-size-classification/classify_files_by_size.py"), "print('ok')\n");
    write(&root.join("file-size-classification/helpers.sh"), "echo helper\n");
    write(&root.join("page-editor/SKILL.md"), EDITOR_DOC);
    write(&root.join("page-editor/edit_page.js"), "console.log('edit')\n");
    write(&root.join("no-header/SKILL.md"), "# Just a title\n\nNo header here.\n");
    write(&root.join("no-description/SKILL.md"), "---\nname: no-description\n---\nBody\n");
    fs::create_dir_all(root.join("empty-dir")).unwrap();

    temp
}

#[test]
fn test_scan_builds_catalog_from_library() {
    let temp = library();
    let registry = SkillRegistry::scan(temp.path()).unwrap();

    assert_eq!(registry.names(), vec!["file-size-classification", "page-editor"]);

    let classify = registry.get("file-size-classification").unwrap();
    assert_eq!(classify.description, "Classify files in a directory by size.");
    assert_eq!(classify.version, "1.2.0");
    assert_eq!(classify.tags, vec!["files", "report"]);
    assert_eq!(classify.full_content, CLASSIFY_DOC);
    assert_eq!(classify.source_dir, temp.path().join("file-size-classification"));

    let scripts: Vec<_> = classify.scripts.iter().map(|s| (s.name.as_str(), s.script_type)).collect();
    assert_eq!(scripts, vec![("classify_files_by_size.py", ScriptType::Python), ("helpers.sh", ScriptType::Bash)]);

    let editor = registry.get("page-editor").unwrap();
    assert_eq!(editor.version, "1.0.0");
    assert_eq!(editor.scripts[0].script_type, ScriptType::JavaScript);
}

#[test]
fn test_prompt_detect_extract_locate_pipeline() {
    let temp = library();
    let registry = SkillRegistry::scan(temp.path()).unwrap();

    let prompt = registry.render_prompt();
    assert!(prompt.starts_with("## Available Skills\n\n- **file-size-classification**: Classify files"));
    assert!(prompt.contains("- **page-editor**: Edit a workspace page.\n"));

    let reply = "I'll use the page editor skill.\n\n```bash\n$ python classify_files_by_size.py --dir ./attachments\n```\n";
    assert_eq!(registry.detect(reply).map(|s| s.name.as_str()), Some("page-editor"));

    let commands = extract(reply);
    assert_eq!(commands, vec!["python classify_files_by_size.py --dir ./attachments"]);

    let script = commands[0].split_whitespace().nth(1).unwrap();
    let expected = temp.path().join("file-size-classification").join("classify_files_by_size.py");
    assert_eq!(locate(script, temp.path()), Some(expected.clone()));
    assert_eq!(registry.locate_script(script), Some(expected));
}

#[test]
fn test_scan_options_from_config() {
    let temp = library();
    write(&temp.path().join("readme-only/README.md"), "---\nname: readme-only\ndescription: From README.\n---\n");
    write(
        &temp.path().join("zz-duplicate/SKILL.md"),
        "---\nname: page-editor\ndescription: Shadowing editor.\n---\n",
    );

    let config = Config::from_toml_str(
        "[skills]\ndoc_files = [\"SKILL.md\", \"README.md\"]\non_duplicate = \"last-wins\"\n",
    )
    .unwrap();
    let options = ScanOptions::from(&config.skills);
    assert_eq!(options.on_duplicate, DuplicatePolicy::LastWins);

    let registry = SkillRegistry::scan_with(temp.path(), &options).unwrap();
    assert_eq!(registry.names(), vec!["file-size-classification", "page-editor", "readme-only"]);
    assert_eq!(registry.get("page-editor").unwrap().description, "Shadowing editor.");
}

#[test]
fn test_custom_fence_tags_from_config() {
    let config = Config::from_toml_str("[extract]\ntags = [\"run\"]\n").unwrap();
    let grammar = FenceGrammar::from(&config.extract);

    let reply = "```run\npython a.py\n```\n```bash\npython b.py\n```\n```\n$ python c.py\n```";
    assert_eq!(grammar.extract(reply), vec!["python a.py", "python c.py"]);
}

#[test]
fn test_missing_root_is_an_empty_catalog() {
    let registry = SkillRegistry::scan(Path::new("/nonexistent/skills")).unwrap();
    assert!(registry.is_empty());
    assert_eq!(registry.render_prompt(), "");
    assert!(registry.detect("anything").is_none());
}
