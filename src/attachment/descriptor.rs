//! Persisted attachment configuration

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::log_file::LogRenderer;
use super::{Renderer, RendererType};

/// Type name written by configurations that predate generic renderer state
pub const LEGACY_DEFAULT_TYPE: &str = "log";

/// Where an attachment goes relative to the digest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Position {
    /// Ahead of the digest
    Before,
    /// Behind the digest
    #[default]
    After,
}

/// One configured attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    /// Stable identifier used for per-folder activation
    pub id: String,
    pub position: Position,
    /// Renderer type name, resolved through the registry
    pub type_name: String,
    /// Renderer state as produced by [`Renderer::save_state`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized_state: Option<String>,
    /// Legacy log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Legacy log start pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_pattern: Option<String>,
}

impl Default for AttachmentDescriptor {
    fn default() -> Self {
        Self {
            id: String::new(),
            position: Position::default(),
            type_name: LEGACY_DEFAULT_TYPE.to_string(),
            serialized_state: None,
            file_path: None,
            start_pattern: None,
        }
    }
}

impl AttachmentDescriptor {
    /// Describe an attachment backed by an existing renderer instance
    pub fn from_renderer<T: RendererType>(
        id: impl Into<String>,
        position: Position,
        renderer: &T,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            id: id.into(),
            position,
            type_name: T::TYPE_NAME.to_string(),
            serialized_state: Some(renderer.save_state()?),
            file_path: None,
            start_pattern: None,
        })
    }

    /// Whether the descriptor still relies on the legacy scalar fields
    pub fn is_legacy(&self) -> bool {
        self.serialized_state.is_none() && (self.file_path.is_some() || self.start_pattern.is_some())
    }

    /// Fold legacy scalar fields into log renderer state
    ///
    /// Applies only to descriptors without state whose type is the legacy
    /// default or the log renderer. Returns whether anything changed.
    pub fn migrate_legacy(&mut self) -> bool {
        if !self.is_legacy() {
            return false;
        }

        let type_name = self.type_name.trim();
        let is_log = type_name.is_empty()
            || type_name == LEGACY_DEFAULT_TYPE
            || type_name.eq_ignore_ascii_case(LogRenderer::TYPE_NAME)
            || type_name == LogRenderer::qualified_name();
        if !is_log {
            return false;
        }

        let mut renderer = LogRenderer::default();
        renderer.apply_legacy_fields(self.file_path.as_deref(), self.start_pattern.as_deref());

        match renderer.save_state() {
            Ok(state) => {
                self.type_name = LogRenderer::TYPE_NAME.to_string();
                self.serialized_state = Some(state);
                self.file_path = None;
                self.start_pattern = None;
                true
            }
            Err(_) => false,
        }
    }
}
