//! Attachments: rendered text blocks spliced before or after a digest
//!
//! Each configured attachment names a renderer type and carries that
//! renderer's state as an opaque JSON document. The registry maps type names
//! to renderer factories; the composer hydrates, renders and splices.

mod composer;
mod descriptor;
mod log_file;
mod registry;

// Re-exports for public API
pub use composer::{apply_attachments, AttachmentComposer};
pub use descriptor::{AttachmentDescriptor, Position, LEGACY_DEFAULT_TYPE};
pub use log_file::LogRenderer;
pub use registry::{register_renderer, with_global_registry, RendererFactory, RendererRegistry};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Namespace of the renderers shipped with this crate
pub const BUILTIN_NAMESPACE: &str = "dirdigest::attachment";

/// A component that produces one attachment block
pub trait Renderer: Send {
    /// Display name, used in the renderer's own markers
    fn name(&self) -> &str;

    /// Produce the block, including its own start and end markers
    ///
    /// Must not fail: problems are reported inline in the returned text.
    fn render(&self) -> String;

    /// Serialize the renderer's configuration to an opaque state string
    fn save_state(&self) -> Result<String>;

    /// Populate a default-constructed renderer from pre-state configuration fields
    ///
    /// Only renderers that existed before generic state override this.
    fn apply_legacy_fields(&mut self, _file_path: Option<&str>, _start_pattern: Option<&str>) {}
}

/// Type-level information needed to register a renderer
pub trait RendererType: Renderer + Default + Serialize + DeserializeOwned + 'static {
    /// Simple type name, matched case-insensitively as a last resort
    const TYPE_NAME: &'static str;

    /// Namespace used to build the fully qualified name
    const NAMESPACE: &'static str = BUILTIN_NAMESPACE;

    fn qualified_name() -> String {
        format!("{}::{}", Self::NAMESPACE, Self::TYPE_NAME)
    }
}
