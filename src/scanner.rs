/*!
 * File admission and digest building
 *
 * The scanner walks the root, decides per candidate whether it belongs in the
 * digest, reads admitted files as text and hands them to the writer.
 */

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use encoding_rs::Encoding;
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::binary::is_binary;
use crate::error::{DigestError, Result};
use crate::types::{AllowSet, CancelToken, CandidateFile, DigestResult, SkipReason, TraversalOptions};
use crate::utils::to_relative_path;
use crate::walker::Walker;
use crate::writer::DigestWriter;

/// A candidate that passed admission, with its decoded content
#[derive(Debug, Clone)]
pub struct AdmittedFile {
    pub candidate: CandidateFile,
    pub content: String,
}

/// Builds a digest for one root directory
pub struct Scanner {
    walker: Walker,
    options: TraversalOptions,
    allow_set: Option<AllowSet>,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    cancel: CancelToken,
}

impl Scanner {
    /// Create a scanner with no allow-set, no progress display and no cancellation
    pub fn new(root: impl AsRef<Path>, options: TraversalOptions) -> Self {
        Self {
            walker: Walker::new(root).include_hidden(options.include_hidden),
            options,
            allow_set: None,
            progress: Arc::new(ProgressBar::hidden()),
            cancel: CancelToken::new(),
        }
    }

    /// Restrict the digest to these relative paths
    pub fn with_allow_set(mut self, allow_set: Option<AllowSet>) -> Self {
        self.allow_set = allow_set;
        self
    }

    /// Visit files in name order so the digest is reproducible
    pub fn sorted(mut self, yes: bool) -> Self {
        self.walker = self.walker.sorted(yes);
        self
    }

    pub fn with_progress(mut self, progress: Arc<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Share a token the caller can use to stop the build between candidates
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> &Path {
        self.walker.root()
    }

    /// Walk, admit and render the digest
    ///
    /// Fails only with [`DigestError::Cancelled`].
    pub fn build(&self) -> Result<DigestResult> {
        let started = Instant::now();
        let mut walk = self.walker.walk();

        let mut paths: Vec<PathBuf> = Vec::new();
        for path in walk.by_ref() {
            if self.cancel.is_cancelled() {
                return Err(DigestError::Cancelled);
            }
            paths.push(path);
        }
        let mut skipped = walk.skipped();

        self.progress.set_length(paths.len() as u64);

        // Admission runs in parallel; collect keeps traversal order.
        let outcomes: Vec<Option<std::result::Result<AdmittedFile, SkipReason>>> = paths
            .par_iter()
            .map(|path| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let outcome = self.admit(path);
                self.progress.inc(1);
                Some(outcome)
            })
            .collect();

        if self.cancel.is_cancelled() {
            return Err(DigestError::Cancelled);
        }

        let mut admitted = Vec::new();
        for (path, outcome) in paths.iter().zip(outcomes) {
            match outcome {
                Some(Ok(file)) => admitted.push(file),
                Some(Err(reason)) => {
                    debug!("Skipping {} ({})", path.display(), reason);
                    skipped += 1;
                }
                None => return Err(DigestError::Cancelled),
            }
        }

        let text = DigestWriter::new(self.root()).render(&admitted);
        info!(
            "Built digest for {}: {} included, {} skipped in {:.2?}",
            self.root().display(),
            admitted.len(),
            skipped,
            started.elapsed()
        );

        Ok(DigestResult {
            text,
            included_count: admitted.len(),
            skipped_count: skipped,
            files: admitted.into_iter().map(|f| f.candidate).collect(),
        })
    }

    /// Decide whether one file belongs in the digest
    ///
    /// Checks run in a fixed order and the first failure wins: metadata,
    /// size, binary content, allow-set membership, readable content.
    pub fn admit(&self, path: &Path) -> std::result::Result<AdmittedFile, SkipReason> {
        let metadata = fs::metadata(path).map_err(|_| SkipReason::Metadata)?;

        if metadata.len() > self.options.max_file_size_bytes {
            return Err(SkipReason::TooLarge);
        }

        if !self.options.include_binaries && is_binary(path) {
            return Err(SkipReason::Binary);
        }

        let relative_path = to_relative_path(self.root(), path);
        if let Some(allow_set) = &self.allow_set {
            if !allow_set.contains(&relative_path) {
                return Err(SkipReason::NotSelected);
            }
        }

        let content = read_text(path).map_err(|_| SkipReason::Content)?;

        Ok(AdmittedFile {
            candidate: CandidateFile {
                relative_path,
                last_modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size_bytes: metadata.len(),
            },
            content,
        })
    }
}

/// Build a digest of `root`
///
/// Never fails: unreadable entries are counted as skipped.
pub fn build_digest(
    root: impl AsRef<Path>,
    options: TraversalOptions,
    allow_set: Option<&AllowSet>,
) -> DigestResult {
    let scanner = Scanner::new(root, options).with_allow_set(allow_set.cloned());
    match scanner.build() {
        Ok(result) => result,
        Err(err) => {
            // Only reachable through cancellation, which this entry point never requests.
            warn!("Digest build stopped early: {}", err);
            DigestResult {
                text: DigestWriter::new(scanner.root()).render(&[]),
                ..DigestResult::default()
            }
        }
    }
}

/// Read a file as text
///
/// Honors UTF-8 and UTF-16 byte-order marks; anything that fails to decode
/// cleanly is read as UTF-8 with replacement characters. Only I/O failures
/// are errors.
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_text(&bytes).into_owned())
}

/// Decode raw file bytes using BOM detection with a lossy UTF-8 fallback
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            if let Some(text) =
                encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            {
                return text;
            }
        }
        None => {
            if let Ok(text) = std::str::from_utf8(bytes) {
                return Cow::Borrowed(text);
            }
        }
    }

    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_text("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'h', b'i'];
        assert_eq!(decode_text(&bytes), "hi");
    }

    #[test]
    fn test_decode_utf16le_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hey".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes), "hey");
    }

    #[test]
    fn test_decode_utf16be_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "hey".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&bytes), "hey");
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let bytes = [b'a', 0xFF, b'b'];
        assert_eq!(decode_text(&bytes), "a\u{FFFD}b");
    }

    #[test]
    fn test_admit_order_size_before_binary() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("big.png");
        fs::write(&path, vec![b'x'; 64])?;

        let scanner = Scanner::new(
            dir.path(),
            TraversalOptions {
                max_file_size_bytes: 10,
                ..TraversalOptions::default()
            },
        );
        assert_eq!(scanner.admit(&path).unwrap_err(), SkipReason::TooLarge);

        Ok(())
    }

    #[test]
    fn test_admit_binary_before_allow_set() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("logo.png");
        fs::write(&path, b"not really a png")?;

        let scanner = Scanner::new(dir.path(), TraversalOptions::default())
            .with_allow_set(Some(AllowSet::new()));
        assert_eq!(scanner.admit(&path).unwrap_err(), SkipReason::Binary);

        let scanner = Scanner::new(
            dir.path(),
            TraversalOptions {
                include_binaries: true,
                ..TraversalOptions::default()
            },
        )
        .with_allow_set(Some(AllowSet::new()));
        assert_eq!(scanner.admit(&path).unwrap_err(), SkipReason::NotSelected);

        Ok(())
    }

    #[test]
    fn test_admit_missing_file() {
        let scanner = Scanner::new("/tmp", TraversalOptions::default());
        assert_eq!(
            scanner.admit(Path::new("/definitely/missing.txt")).unwrap_err(),
            SkipReason::Metadata
        );
    }

    #[test]
    fn test_cancelled_build() -> io::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "a")?;

        let token = CancelToken::new();
        token.cancel();
        let result = Scanner::new(dir.path(), TraversalOptions::default())
            .with_cancel_token(token)
            .build();

        assert!(matches!(result, Err(DigestError::Cancelled)));
        Ok(())
    }
}
