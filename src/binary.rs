/*!
 * Binary file classification
 *
 * A file is binary when its extension is on a known-binary list, or when a
 * sniff of its first bytes finds a NUL byte or too many control characters.
 */

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;

/// Number of leading bytes inspected when sniffing content
pub const SNIFF_LEN: usize = 8192;

/// Fraction of control bytes (other than tab, LF, CR) above which content is binary
pub const CONTROL_CHAR_THRESHOLD: f64 = 0.015;

/// Extensions treated as binary without reading the file
pub static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Images
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "tif", "tiff", "webp", "heic", "avif",
        // Archives
        "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "zst", "cab", "iso",
        // Office documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf",
        // Executables & libraries
        "exe", "dll", "so", "dylib", "lib", "a", "o", "obj", "bin", "pdb", "class", "jar",
        "war", "pyc", "pyo", "wasm", "msi", "apk", "nupkg",
        // Fonts
        "ttf", "otf", "woff", "woff2", "eot",
        // Audio & video
        "mp3", "wav", "flac", "ogg", "aac", "m4a", "mp4", "avi", "mov", "mkv", "webm", "wmv",
        // Design files
        "psd", "ai", "sketch", "fig", "xd", "blend",
        // Databases
        "db", "sqlite", "sqlite3", "mdb", "accdb", "ldf", "mdf",
    ]
    .into_iter()
    .collect()
});

/// Whether the extension alone marks the file as binary
pub fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| BINARY_EXTENSIONS.contains(ext.to_string_lossy().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Classify a file as binary
///
/// Never fails: a file that cannot be opened or read is reported as binary.
pub fn is_binary(path: &Path) -> bool {
    if has_binary_extension(path) {
        return true;
    }

    match read_prefix(path) {
        Ok(prefix) => looks_binary(&prefix),
        Err(_) => true,
    }
}

/// Content heuristic over an already-read prefix
pub fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }

    if bytes.contains(&0) {
        return true;
    }

    let control = bytes
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
        .count();

    control as f64 > bytes.len() as f64 * CONTROL_CHAR_THRESHOLD
}

fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}
