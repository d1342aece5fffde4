//! Built-in renderer that attaches the tail of a log file
//!
//! Copies a file from the first line matching a start pattern (or from the
//! top when no pattern is set) to the end.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Renderer, RendererType};
use crate::error::Result;

const DEFAULT_LABEL: &str = "Log";

/// Renders a log file from a start pattern to EOF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogRenderer {
    /// Name shown in the start and end markers
    pub label: String,
    /// Log file to read
    pub file_path: String,
    /// Regex marking the first line to copy; empty copies the whole file
    pub start_pattern: String,
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            file_path: String::new(),
            start_pattern: String::new(),
        }
    }
}

impl LogRenderer {
    pub fn new(file_path: impl Into<String>, start_pattern: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            start_pattern: start_pattern.into(),
            ..Self::default()
        }
    }

    /// Copy lines into `out`, returning whether copying ever started
    fn copy_lines(&self, out: &mut String, pattern: Option<&Regex>) -> io::Result<bool> {
        let file = File::open(&self.file_path)?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut copying = pattern.is_none();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);

            if !copying {
                copying = pattern.map_or(true, |re| re.is_match(line));
            }
            if copying {
                out.push_str(line);
                out.push('\n');
            }
        }

        Ok(copying)
    }
}

impl Renderer for LogRenderer {
    fn name(&self) -> &str {
        if self.label.trim().is_empty() {
            DEFAULT_LABEL
        } else {
            &self.label
        }
    }

    fn render(&self) -> String {
        let mut out = format!("--- START LOG: {} ({}) ---\n", self.name(), self.file_path);
        let end = format!("--- END LOG: {} ---\n", self.name());

        if self.file_path.trim().is_empty() || !Path::new(&self.file_path).is_file() {
            out.push_str("(File not found.)\n");
            out.push_str(&end);
            return out;
        }

        let pattern = if self.start_pattern.is_empty() {
            None
        } else {
            match Regex::new(&self.start_pattern) {
                Ok(re) => Some(re),
                Err(err) => {
                    out.push_str(&format!(
                        "(Invalid start pattern '{}': {})\n",
                        self.start_pattern, err
                    ));
                    out.push_str(&end);
                    return out;
                }
            }
        };

        match self.copy_lines(&mut out, pattern.as_ref()) {
            Ok(false) => {
                out.push_str(&format!("(No lines matched '{}'.)\n", self.start_pattern));
            }
            Ok(true) => {}
            Err(err) => {
                out.push_str(&format!("(Error reading log: {})\n", err));
            }
        }

        out.push_str(&end);
        out
    }

    fn save_state(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn apply_legacy_fields(&mut self, file_path: Option<&str>, start_pattern: Option<&str>) {
        if let Some(path) = file_path {
            self.file_path = path.to_string();
        }
        if let Some(pattern) = start_pattern {
            self.start_pattern = pattern.to_string();
        }
    }
}

impl RendererType for LogRenderer {
    const TYPE_NAME: &'static str = "LogRenderer";
}
