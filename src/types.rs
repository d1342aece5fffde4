/*!
 * Core types and data structures for dirdigest
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::utils::normalize_key;

/// Default maximum size of a file admitted into the digest (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Options controlling a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalOptions {
    /// Descend into hidden directories and admit hidden files
    pub include_hidden: bool,
    /// Admit files classified as binary
    pub include_binaries: bool,
    /// Files larger than this are skipped
    pub max_file_size_bytes: u64,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            include_binaries: false,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// A file discovered by traversal, before admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Root-relative path using `/` separators
    pub relative_path: String,
    /// Last modification time
    pub last_modified: SystemTime,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Output of a digest build
#[derive(Debug, Clone, Default)]
pub struct DigestResult {
    /// The rendered digest text
    pub text: String,
    /// Number of files written into the digest
    pub included_count: usize,
    /// Number of candidates skipped, including those dropped during traversal
    pub skipped_count: usize,
    /// Included files, in digest order
    pub files: Vec<CandidateFile>,
}

/// Why a candidate was left out of the digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SkipReason {
    /// File metadata could not be read
    #[strum(serialize = "unreadable metadata")]
    Metadata,
    /// File is larger than the configured limit
    #[strum(serialize = "too large")]
    TooLarge,
    /// File looks binary and binaries are excluded
    #[strum(serialize = "binary")]
    Binary,
    /// File is not part of the caller's allow-set
    #[strum(serialize = "not selected")]
    NotSelected,
    /// Content could not be read
    #[strum(serialize = "unreadable content")]
    Content,
}

/// Case-insensitive, separator-agnostic set of root-relative paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowSet {
    keys: HashSet<String>,
}

impl AllowSet {
    /// Create an empty allow-set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relative path
    pub fn insert(&mut self, relative_path: &str) -> bool {
        self.keys.insert(normalize_key(relative_path))
    }

    /// Whether the set contains the path, ignoring case and separator style
    pub fn contains(&self, relative_path: &str) -> bool {
        self.keys.contains(&normalize_key(relative_path))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for AllowSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path.as_ref());
        }
        set
    }
}

/// Cooperative cancellation flag shared between a caller and a running build
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the build stops at the next candidate
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_set_ignores_case_and_separators() {
        let set: AllowSet = ["src\\Main.rs", "README.md"].into_iter().collect();

        assert!(set.contains("src/main.rs"));
        assert!(set.contains("SRC/MAIN.RS"));
        assert!(set.contains("readme.md"));
        assert!(!set.contains("src/lib.rs"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
