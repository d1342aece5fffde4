//! Splices rendered attachments around a digest

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::descriptor::{AttachmentDescriptor, Position, LEGACY_DEFAULT_TYPE};
use super::log_file::LogRenderer;
use super::registry::{with_global_registry, RendererFactory, RendererRegistry};
use super::Renderer;

/// Renders attachment descriptors against a registry
pub struct AttachmentComposer<'a> {
    registry: &'a RendererRegistry,
}

impl<'a> AttachmentComposer<'a> {
    pub fn new(registry: &'a RendererRegistry) -> Self {
        Self { registry }
    }

    /// Wrap `base` with the rendered attachments
    ///
    /// Before blocks come first and After blocks last, each group in
    /// configured order. Descriptors that fail to resolve or render, or that
    /// render only whitespace, contribute nothing.
    pub fn apply(&self, base: &str, descriptors: &[AttachmentDescriptor]) -> String {
        let before = self.render_group(descriptors, Position::Before);
        let after = self.render_group(descriptors, Position::After);

        let extra: usize = before.iter().chain(after.iter()).map(String::len).sum();
        let mut out = String::with_capacity(base.len() + extra + 1);

        for block in &before {
            out.push_str(block);
        }
        out.push_str(base);
        if !after.is_empty() && !base.is_empty() && !base.ends_with('\n') {
            out.push('\n');
        }
        for block in &after {
            out.push_str(block);
        }

        out
    }

    fn render_group(&self, descriptors: &[AttachmentDescriptor], position: Position) -> Vec<String> {
        descriptors
            .iter()
            .filter(|d| d.position == position)
            .filter_map(|d| self.render_one(d))
            .collect()
    }

    /// Render one descriptor, or `None` if it has nothing to contribute
    pub fn render_one(&self, descriptor: &AttachmentDescriptor) -> Option<String> {
        let renderer = self.instantiate(descriptor)?;

        let rendered = match panic::catch_unwind(AssertUnwindSafe(|| renderer.render())) {
            Ok(text) => text,
            Err(_) => {
                warn!(
                    "Renderer '{}' for attachment '{}' panicked; dropping it",
                    descriptor.type_name, descriptor.id
                );
                return None;
            }
        };

        if rendered.trim().is_empty() {
            debug!("Attachment '{}' rendered nothing", descriptor.id);
            return None;
        }

        Some(rendered)
    }

    /// Build the renderer for a descriptor
    ///
    /// Serialized state wins when it deserializes; otherwise the renderer is
    /// default-constructed and offered the descriptor's legacy fields.
    pub fn instantiate(&self, descriptor: &AttachmentDescriptor) -> Option<Box<dyn Renderer>> {
        let legacy_fallback;
        let factory = match self.registry.resolve(&descriptor.type_name) {
            Some(factory) => factory,
            None if descriptor.type_name == LEGACY_DEFAULT_TYPE => {
                legacy_fallback = RendererFactory::of::<LogRenderer>();
                &legacy_fallback
            }
            None => {
                warn!(
                    "Skipping attachment '{}': unknown renderer type '{}'",
                    descriptor.id, descriptor.type_name
                );
                return None;
            }
        };

        if let Some(state) = descriptor
            .serialized_state
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            match factory.restore(state) {
                Ok(renderer) => return Some(renderer),
                Err(err) => warn!(
                    "Attachment '{}' has unreadable state for {}: {}; using defaults",
                    descriptor.id,
                    factory.qualified_name(),
                    err
                ),
            }
        }

        let mut renderer = factory.create();
        renderer.apply_legacy_fields(
            descriptor.file_path.as_deref(),
            descriptor.start_pattern.as_deref(),
        );
        Some(renderer)
    }
}

/// Wrap `base` with the rendered attachments using the process-wide registry
pub fn apply_attachments(base: &str, descriptors: &[AttachmentDescriptor]) -> String {
    if descriptors.is_empty() {
        return base.to_string();
    }
    with_global_registry(|registry| AttachmentComposer::new(registry).apply(base, descriptors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::RendererType;
    use crate::error::Result;
    use serde::{Deserialize, Serialize};
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default, Serialize, Deserialize)]
    struct Static {
        text: String,
    }

    impl Renderer for Static {
        fn name(&self) -> &str {
            "Static"
        }

        fn render(&self) -> String {
            self.text.clone()
        }

        fn save_state(&self) -> Result<String> {
            Ok(serde_json::to_string(self)?)
        }
    }

    impl RendererType for Static {
        const TYPE_NAME: &'static str = "Static";
    }

    #[derive(Default, Serialize, Deserialize)]
    struct Exploding;

    impl Renderer for Exploding {
        fn name(&self) -> &str {
            "Exploding"
        }

        fn render(&self) -> String {
            panic!("renderer bug")
        }

        fn save_state(&self) -> Result<String> {
            Ok("null".to_string())
        }
    }

    impl RendererType for Exploding {
        const TYPE_NAME: &'static str = "Exploding";
    }

    fn registry() -> RendererRegistry {
        let mut registry = RendererRegistry::with_builtins();
        registry.register::<Static>().register::<Exploding>();
        registry
    }

    fn static_block(id: &str, position: Position, text: &str) -> AttachmentDescriptor {
        AttachmentDescriptor {
            id: id.into(),
            position,
            type_name: "Static".into(),
            serialized_state: Some(serde_json::json!({ "text": text }).to_string()),
            ..AttachmentDescriptor::default()
        }
    }

    #[test]
    fn test_empty_list_is_identity() {
        let registry = registry();
        let composer = AttachmentComposer::new(&registry);
        assert_eq!(composer.apply("base", &[]), "base");
        assert_eq!(apply_attachments("base\n", &[]), "base\n");
    }

    #[test]
    fn test_before_and_after_arrangement() {
        let registry = registry();
        let composer = AttachmentComposer::new(&registry);

        let descriptors = vec![
            static_block("a", Position::After, "AFTER\n"),
            static_block("b", Position::Before, "BEFORE\n"),
        ];

        assert_eq!(composer.apply("base", &descriptors), "BEFORE\nbase\nAFTER\n");
        assert_eq!(composer.apply("base\n", &descriptors), "BEFORE\nbase\nAFTER\n");
    }

    #[test]
    fn test_groups_keep_configured_order_without_separators() {
        let registry = registry();
        let composer = AttachmentComposer::new(&registry);

        let descriptors = vec![
            static_block("1", Position::Before, "b1"),
            static_block("2", Position::After, "a1"),
            static_block("3", Position::Before, "b2"),
            static_block("4", Position::After, "a2"),
        ];

        assert_eq!(composer.apply("X\n", &descriptors), "b1b2X\na1a2");
    }

    #[test]
    fn test_whitespace_render_is_dropped() {
        let registry = registry();
        let composer = AttachmentComposer::new(&registry);

        let descriptors = vec![static_block("ws", Position::After, "  \n\t")];
        assert_eq!(composer.apply("base", &descriptors), "base");
    }

    #[test]
    fn test_unresolved_type_does_not_affect_others() {
        let registry = registry();
        let composer = AttachmentComposer::new(&registry);

        let descriptors = vec![
            AttachmentDescriptor {
                id: "ghost".into(),
                type_name: "NoSuchRenderer".into(),
                ..AttachmentDescriptor::default()
            },
            static_block("real", Position::After, "REAL\n"),
        ];

        assert_eq!(composer.apply("base\n", &descriptors), "base\nREAL\n");
    }

    #[test]
    fn test_panicking_renderer_is_dropped() {
        let registry = registry();
        let composer = AttachmentComposer::new(&registry);

        let descriptors = vec![
            AttachmentDescriptor {
                id: "boom".into(),
                type_name: "Exploding".into(),
                ..AttachmentDescriptor::default()
            },
            static_block("ok", Position::After, "OK\n"),
        ];

        assert_eq!(composer.apply("base\n", &descriptors), "base\nOK\n");
    }

    #[test]
    fn test_malformed_state_falls_back_to_legacy_fields() -> std::io::Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("app.log");
        fs::write(&log, "one\ntwo\n")?;

        let registry = registry();
        let composer = AttachmentComposer::new(&registry);
        let descriptor = AttachmentDescriptor {
            id: "log".into(),
            type_name: "LogRenderer".into(),
            serialized_state: Some("{not json".into()),
            file_path: Some(log.to_string_lossy().to_string()),
            start_pattern: Some("two".into()),
            ..AttachmentDescriptor::default()
        };

        let text = composer.render_one(&descriptor).unwrap();
        assert!(text.contains("two\n"));
        assert!(!text.contains("one\n"));
        Ok(())
    }

    #[test]
    fn test_state_is_authoritative_over_legacy_fields() -> std::io::Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("app.log");
        fs::write(&log, "alpha\nbeta\n")?;

        let registry = registry();
        let composer = AttachmentComposer::new(&registry);
        let state = LogRenderer::new(log.to_string_lossy(), "beta");
        let descriptor = AttachmentDescriptor {
            id: "log".into(),
            type_name: "LogRenderer".into(),
            serialized_state: Some(serde_json::to_string(&state).unwrap()),
            file_path: Some("/definitely/missing.log".into()),
            start_pattern: Some("alpha".into()),
            ..AttachmentDescriptor::default()
        };

        let text = composer.render_one(&descriptor).unwrap();
        assert!(text.contains("beta\n"));
        assert!(!text.contains("alpha"));
        Ok(())
    }

    #[test]
    fn test_legacy_default_type_without_registration() -> std::io::Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("app.log");
        fs::write(&log, "hello\n")?;

        // An empty registry still handles the legacy "log" type.
        let registry = RendererRegistry::new();
        let composer = AttachmentComposer::new(&registry);
        let descriptor = AttachmentDescriptor {
            id: "legacy".into(),
            position: Position::Before,
            file_path: Some(log.to_string_lossy().to_string()),
            ..AttachmentDescriptor::default()
        };

        let out = composer.apply("base\n", &[descriptor]);
        assert!(out.starts_with("--- START LOG: Log ("));
        assert!(out.contains("hello\n--- END LOG: Log ---\nbase\n"));
        Ok(())
    }

    #[test]
    fn test_unmatched_log_pattern_in_composition() -> std::io::Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("app.log");
        fs::write(&log, "secret line\n")?;

        let descriptor = AttachmentDescriptor::from_renderer(
            "log",
            Position::After,
            &LogRenderer::new(log.to_string_lossy(), "NEVER"),
        )?;

        let out = apply_attachments("base", &[descriptor]);
        assert!(out.starts_with("base\n--- START LOG"));
        assert!(out.contains("(No lines matched 'NEVER'.)"));
        assert!(!out.contains("secret line"));
        Ok(())
    }
}
