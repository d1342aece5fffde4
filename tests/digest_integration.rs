/*!
 * End-to-end tests: settings, digest build and attachments together
 */

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::tempdir;

use dirdigest::{
    apply_attachments, build_digest, enumerate_candidates, register_renderer, AttachmentDescriptor,
    Position, Renderer, RendererType, Settings, TraversalOptions,
};

#[derive(Default, Serialize, Deserialize)]
struct Instructions {
    text: String,
}

impl Renderer for Instructions {
    fn name(&self) -> &str {
        "Instructions"
    }

    fn render(&self) -> String {
        format!("--- START INSTRUCTIONS ---\n{}\n--- END INSTRUCTIONS ---\n", self.text)
    }

    fn save_state(&self) -> dirdigest::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl RendererType for Instructions {
    const TYPE_NAME: &'static str = "Instructions";
    const NAMESPACE: &'static str = "prompts";
}

fn write_settings(path: &Path, root: &Path, log: &Path) -> io::Result<()> {
    let root_key = root.to_string_lossy().to_string();
    let settings = serde_json::json!({
        "attachments": [
            {
                "id": "tail",
                "position": "After",
                "typeName": "log",
                "filePath": log.to_string_lossy(),
                "startPattern": "^== run"
            },
            {
                "id": "intro",
                "position": "Before",
                "typeName": "prompts::Instructions",
                "serializedState": "{\"text\":\"Review this code.\"}"
            },
            {
                "id": "inactive",
                "position": "Before",
                "typeName": "Instructions",
                "serializedState": "{\"text\":\"should not appear\"}"
            },
            {
                "id": "ghost",
                "position": "After",
                "typeName": "NotARenderer"
            }
        ],
        "folders": {
            root_key: {
                "excluded": ["SECRETS.txt"],
                "activeAttachments": ["tail", "intro", "ghost"]
            }
        }
    });
    fs::write(path, serde_json::to_string_pretty(&settings)?)
}

#[test]
fn test_settings_driven_digest_with_attachments() -> io::Result<()> {
    register_renderer::<Instructions>();

    let workspace = tempdir()?;
    let root = workspace.path().join("project");
    fs::create_dir_all(root.join("src"))?;
    fs::write(root.join("src").join("lib.rs"), "pub fn answer() -> u32 { 42 }")?;
    fs::write(root.join("secrets.txt"), "hunter2\n")?;

    let log = workspace.path().join("build.log");
    fs::write(&log, "old noise\n== run 2\ncompiled ok\n")?;

    let settings_path = workspace.path().join("settings.json");
    write_settings(&settings_path, &root, &log)?;
    let settings = Settings::load(&settings_path)?;

    let options = TraversalOptions::default();
    let allow = settings.allow_set(&root, enumerate_candidates(&root, options.include_hidden));
    assert!(allow.is_some());

    let digest = build_digest(&root, options, allow.as_ref());
    assert_eq!(digest.included_count, 1);
    assert_eq!(digest.skipped_count, 1);
    assert!(!digest.text.contains("hunter2"));

    let attachments = settings.active_attachments(&root);
    assert_eq!(attachments.len(), 3);

    let text = apply_attachments(&digest.text, &attachments);

    let intro = "--- START INSTRUCTIONS ---\nReview this code.\n--- END INSTRUCTIONS ---\n";
    assert!(text.starts_with(intro));
    assert!(text[intro.len()..].starts_with("# Directory Digest\n"));
    assert!(text.contains("pub fn answer() -> u32 { 42 }\n--- END FILE: src/lib.rs ---\n"));
    assert!(!text.contains("should not appear"));

    let tail_start = text.find("--- START LOG: Log (").unwrap();
    assert!(tail_start > text.find("--- END FILE: src/lib.rs ---").unwrap());
    assert!(text[tail_start..].contains("== run 2\ncompiled ok\n--- END LOG: Log ---\n"));
    assert!(!text.contains("old noise"));
    assert!(text.ends_with("--- END LOG: Log ---\n"));

    Ok(())
}

#[test]
fn test_descriptor_order_does_not_change_arrangement() -> io::Result<()> {
    register_renderer::<Instructions>();

    let block = |id: &str, position: Position, text: &str| {
        AttachmentDescriptor::from_renderer(
            id,
            position,
            &Instructions {
                text: text.to_string(),
            },
        )
    };

    let after_first = vec![
        block("a", Position::After, "tail")?,
        block("b", Position::Before, "head")?,
    ];
    let before_first = vec![
        block("b", Position::Before, "head")?,
        block("a", Position::After, "tail")?,
    ];

    let base = "# Directory Digest\nbody";
    let one = apply_attachments(base, &after_first);
    let two = apply_attachments(base, &before_first);

    assert_eq!(one, two);
    assert_eq!(
        one,
        "--- START INSTRUCTIONS ---\nhead\n--- END INSTRUCTIONS ---\n\
         # Directory Digest\nbody\n\
         --- START INSTRUCTIONS ---\ntail\n--- END INSTRUCTIONS ---\n"
    );

    Ok(())
}
