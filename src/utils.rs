/*!
 * Utility functions for dirdigest
 */

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Parse a size limit such as `1048576`, `512K`, `2M` or `1G`
///
/// Returns `None` for anything that isn't a non-negative integer with an
/// optional binary-unit suffix.
pub fn parse_size(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (digits, multiplier) = match input.chars().last()?.to_ascii_uppercase() {
        'K' => (&input[..input.len() - 1], 1024),
        'M' => (&input[..input.len() - 1], 1024 * 1024),
        'G' => (&input[..input.len() - 1], 1024 * 1024 * 1024),
        _ => (input, 1),
    };

    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Render a root-relative path with `/` separators
pub fn to_relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve `.` and `..` components without touching the filesystem
///
/// Symlinks are left alone; `..` never climbs above the root or prefix.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Key used to compare relative paths from different sources
///
/// Lowercased, with `\` folded into `/` and leading `./` or `/` dropped, so a
/// path persisted on one platform still matches one produced on another.
pub fn normalize_key(path: &str) -> String {
    let folded = path.replace('\\', "/").to_lowercase();
    let mut key = folded.as_str();
    loop {
        if let Some(rest) = key.strip_prefix("./") {
            key = rest;
        } else if let Some(rest) = key.strip_prefix('/') {
            key = rest;
        } else {
            break;
        }
    }
    key.to_string()
}

/// Whether a filesystem entry is hidden
///
/// Dot-prefixed names are hidden everywhere; on Windows the hidden
/// attribute counts as well.
pub fn is_hidden(path: &Path) -> bool {
    let dotted = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false);

    dotted || has_hidden_attribute(path)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    std::fs::symlink_metadata(path)
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}

/// Whether a directory name is on the skip list (case-insensitive)
pub fn is_skipped_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(name.to_ascii_lowercase().as_str())
}

/// Directory names that are never descended into
pub static SKIPPED_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Version Control
        ".git",
        ".svn",
        ".hg",
        ".bzr",
        // IDEs & Editors
        ".vs",
        ".vscode",
        ".idea",
        // Dependencies
        "node_modules",
        "bower_components",
        "packages",
        ".venv",
        "venv",
        // Build & Dist
        "bin",
        "obj",
        "target",
        "dist",
        "build",
        "out",
        // Caches
        "__pycache__",
        ".pytest_cache",
        ".mypy_cache",
        ".gradle",
        ".next",
        ".nuxt",
        "coverage",
    ]
    .into_iter()
    .collect()
});
