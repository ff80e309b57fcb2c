//! Flat key/value project descriptor.
//!
//! The repository ships a plain-text `PROJECT.txt` describing the project:
//! one `key value...` pair per line, `#` comments and blank lines ignored.
//! The loader only exists to surface a name/version string to callers —
//! nothing in the core depends on its contents.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{WatchError, WatchResult};

/// A parsed project descriptor.
///
/// Keys are lowercased; a key's value is the whitespace-joined remainder
/// of its line. Lines with no value are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProjectInfo {
    values: HashMap<String, String>,
}

impl ProjectInfo {
    /// Loads a descriptor from `path`.
    ///
    /// A missing file is not an error: it loads as an empty descriptor,
    /// so callers can ship without one.
    ///
    /// # Errors
    ///
    /// - [`WatchError::PermissionDenied`] if the file is not readable.
    /// - [`WatchError::Io`] for any other I/O failure.
    pub fn load(path: &Path) -> WatchResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(WatchError::PermissionDenied(path.to_path_buf()))
            }
            Err(e) => return Err(WatchError::Io(e)),
        };
        Ok(Self::parse(&content))
    }

    /// Parses descriptor text.
    pub fn parse(content: &str) -> Self {
        let mut values = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(key) = parts.next() else { continue };
            let value = parts.collect::<Vec<_>>().join(" ");
            if !value.is_empty() {
                values.insert(key.to_lowercase(), value);
            }
        }
        Self { values }
    }

    /// Looks up a value by (case-insensitive) key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    /// The project name, if declared.
    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    /// The project version, if declared.
    pub fn version(&self) -> Option<&str> {
        self.get("version")
    }

    /// Returns `true` if the descriptor declared nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
