/*!
 * Plain-text digest writer for dirdigest
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;

use crate::scanner::AdmittedFile;

/// First line of every digest
pub const DIGEST_HEADER: &str = "# Directory Digest";

/// Written in place of file blocks when nothing was admitted
pub const EMPTY_DIGEST_NOTICE: &str = "No files matched the current filters.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders admitted files into the digest layout
pub struct DigestWriter {
    root: String,
    generated: Option<String>,
}

impl DigestWriter {
    /// Create a writer for the given root directory
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.display().to_string(),
            generated: None,
        }
    }

    /// Use a fixed `Generated:` value instead of the current local time
    pub fn with_timestamp(mut self, generated: impl Into<String>) -> Self {
        self.generated = Some(generated.into());
        self
    }

    /// Render the digest text
    pub fn render(&self, files: &[AdmittedFile]) -> String {
        let generated = self
            .generated
            .clone()
            .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());

        let body_len: usize = files.iter().map(|f| f.content.len() + 128).sum();
        let mut out = String::with_capacity(256 + body_len);

        out.push_str(DIGEST_HEADER);
        out.push('\n');
        out.push_str(&format!("Root: {}\n", self.root));
        out.push_str(&format!("Generated: {}\n", generated));
        out.push('\n');

        if files.is_empty() {
            out.push_str(EMPTY_DIGEST_NOTICE);
            out.push('\n');
            return out;
        }

        for file in files {
            let path = &file.candidate.relative_path;
            out.push_str(&format!(
                "--- START FILE: {} ({} bytes) ---\n",
                path, file.candidate.size_bytes
            ));
            out.push_str(&file.content);
            if !file.content.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("--- END FILE: {} ---\n", path));
            out.push('\n');
        }

        out
    }
}

/// Write the final text to a file, or to stdout when no path is given
pub fn write_output(text: &str, output: Option<&Path>) -> io::Result<()> {
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(text.as_bytes())?;
            writer.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(text.as_bytes())?;
            handle.flush()
        }
    }
}
