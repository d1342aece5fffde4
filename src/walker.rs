/*!
 * Directory tree traversal
 *
 * Walks a root depth-first, pruning skip-listed and (optionally) hidden
 * directories, and yields absolute file paths lazily. Listing failures are
 * treated as empty directories; files that are hidden or whose attributes
 * cannot be read are counted as skipped.
 */

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::types::CandidateFile;
use crate::utils::{clean_path, is_hidden, is_skipped_dir, to_relative_path};

type Prune = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// Configures a traversal of one root directory
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    include_hidden: bool,
    sorted: bool,
}

impl Walker {
    /// Create a walker for `root`
    ///
    /// Relative roots resolve against the working directory, and `.`/`..`
    /// components are folded away so `.` and the absolute path name the
    /// same root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            clean_path(root)
        } else {
            env::current_dir()
                .map(|cwd| clean_path(&cwd.join(root)))
                .unwrap_or_else(|_| clean_path(root))
        };

        Self {
            root,
            include_hidden: false,
            sorted: false,
        }
    }

    /// Descend into hidden directories and yield hidden files
    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.include_hidden = yes;
        self
    }

    /// Visit entries in file-name order instead of directory-listing order
    pub fn sorted(mut self, yes: bool) -> Self {
        self.sorted = yes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a fresh traversal
    pub fn walk(&self) -> Walk {
        let mut walkdir = WalkDir::new(&self.root).follow_links(false);
        if self.sorted {
            walkdir = walkdir.sort_by_file_name();
        }

        let include_hidden = self.include_hidden;
        let prune: Prune = Box::new(move |entry: &DirEntry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if is_skipped_dir(&name) {
                return false;
            }
            include_hidden || !is_hidden(entry.path())
        });

        Walk {
            inner: walkdir.into_iter().filter_entry(prune),
            include_hidden,
            skipped: 0,
        }
    }
}

/// A single in-progress traversal
pub struct Walk {
    inner: FilterEntry<walkdir::IntoIter, Prune>,
    include_hidden: bool,
    skipped: usize,
}

impl Walk {
    /// Files dropped so far because they were hidden or unreadable
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Walk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Treating unreadable directory as empty: {}", err);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            if !self.include_hidden && is_hidden(entry.path()) {
                self.skipped += 1;
                continue;
            }

            match fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_dir() => continue,
                Ok(_) => return Some(entry.into_path()),
                Err(err) => {
                    debug!("Skipping {}: {}", entry.path().display(), err);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Enumerate the files under `root` as absolute paths
pub fn enumerate(root: impl AsRef<Path>, include_hidden: bool) -> Walk {
    Walker::new(root).include_hidden(include_hidden).walk()
}

/// Enumerate files under `root` with their relative path, size and mtime
///
/// Intended for list views that show candidates before a digest is built.
pub fn enumerate_candidates(
    root: impl AsRef<Path>,
    include_hidden: bool,
) -> impl Iterator<Item = CandidateFile> {
    let walker = Walker::new(root).include_hidden(include_hidden);
    let root = walker.root().to_path_buf();

    walker.walk().filter_map(move |path| {
        let metadata = fs::metadata(&path).ok()?;
        Some(CandidateFile {
            relative_path: to_relative_path(&root, &path),
            last_modified: metadata.modified().ok()?,
            size_bytes: metadata.len(),
        })
    })
}
