/*!
 * Persisted per-folder selection and attachment configuration
 *
 * A small JSON document holding the configured attachments and, per root
 * folder, which files are excluded and which attachments are active.
 */

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::attachment::AttachmentDescriptor;
use crate::error::Result;
use crate::types::{AllowSet, CandidateFile};
use crate::utils::normalize_key;

/// Selection state for one root folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolderSettings {
    /// Relative paths the user deselected
    pub excluded: Vec<String>,
    /// Ids of attachments enabled for this folder
    pub active_attachments: Vec<String>,
}

/// The settings document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Configured attachments, in order
    pub attachments: Vec<AttachmentDescriptor>,
    /// Per-folder state keyed by folder path
    pub folders: BTreeMap<String, FolderSettings>,
}

/// Comparable form of a folder path: `/` separators, lowercased, with
/// `.` and `..` segments resolved and no trailing separator
fn folder_key(folder: &Path) -> String {
    let folded = folder.to_string_lossy().replace('\\', "/").to_lowercase();
    let absolute = folded.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in folded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            name => segments.push(name),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// The document as read, before attachment entries are validated
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSettings {
    attachments: Vec<Value>,
    folders: BTreeMap<String, FolderSettings>,
}

impl Settings {
    /// Default location: `<config dir>/dirdigest/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dirdigest").join("settings.json"))
    }

    /// Load settings, treating a missing file as empty
    ///
    /// Attachment entries that do not parse are dropped with a warning so the
    /// rest of the document still applies. Descriptors that only carry legacy
    /// log fields are migrated to serialized renderer state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let raw: RawSettings = serde_json::from_str(&content)
            .map_err(|e| crate::error!(Config, "invalid settings {}: {}", path.display(), e))?;

        let attachments = raw
            .attachments
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                serde_json::from_value::<AttachmentDescriptor>(entry)
                    .map_err(|e| warn!("Dropping attachment #{} in {}: {}", index, path.display(), e))
                    .ok()
            })
            .collect();

        let mut settings = Settings {
            attachments,
            folders: raw.folders,
        };

        let migrated = settings
            .attachments
            .iter_mut()
            .map(AttachmentDescriptor::migrate_legacy)
            .filter(|changed| *changed)
            .count();
        if migrated > 0 {
            info!("Migrated {} legacy attachment(s) in {}", migrated, path.display());
        }

        Ok(settings)
    }

    /// Write settings as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn folder(&self, folder: &Path) -> Option<&FolderSettings> {
        let key = folder_key(folder);
        self.folders
            .iter()
            .find(|(k, _)| folder_key(Path::new(k)) == key)
            .map(|(_, v)| v)
    }

    fn folder_mut(&mut self, folder: &Path) -> &mut FolderSettings {
        let key = folder_key(folder);
        let existing = self
            .folders
            .keys()
            .find(|k| folder_key(Path::new(k)) == key)
            .cloned();
        self.folders.entry(existing.unwrap_or(key)).or_default()
    }

    /// Whether a file is selected; files without a record are included
    pub fn is_included(&self, folder: &Path, relative_path: &str) -> bool {
        let key = normalize_key(relative_path);
        self.folder(folder)
            .map(|f| !f.excluded.iter().any(|e| normalize_key(e) == key))
            .unwrap_or(true)
    }

    /// Record a file as selected or deselected
    pub fn set_included(&mut self, folder: &Path, relative_path: &str, included: bool) {
        let key = normalize_key(relative_path);
        let state = self.folder_mut(folder);
        state.excluded.retain(|e| normalize_key(e) != key);
        if !included {
            state.excluded.push(relative_path.replace('\\', "/"));
        }
    }

    /// Allow-set for a build, or `None` when nothing in the folder is excluded
    pub fn allow_set<I>(&self, folder: &Path, candidates: I) -> Option<AllowSet>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let has_exclusions = self
            .folder(folder)
            .map(|f| !f.excluded.is_empty())
            .unwrap_or(false);
        if !has_exclusions {
            return None;
        }

        Some(
            candidates
                .into_iter()
                .filter(|c| self.is_included(folder, &c.relative_path))
                .map(|c| c.relative_path)
                .collect(),
        )
    }

    /// Mark an attachment active or inactive for a folder
    pub fn set_attachment_active(&mut self, folder: &Path, id: &str, active: bool) {
        let state = self.folder_mut(folder);
        state.active_attachments.retain(|a| a != id);
        if active {
            state.active_attachments.push(id.to_string());
        }
    }

    /// Attachments active for a folder, in configured order
    pub fn active_attachments(&self, folder: &Path) -> Vec<AttachmentDescriptor> {
        let Some(state) = self.folder(folder) else {
            return Vec::new();
        };

        self.attachments
            .iter()
            .filter(|d| state.active_attachments.iter().any(|id| id == &d.id))
            .cloned()
            .collect()
    }
}
