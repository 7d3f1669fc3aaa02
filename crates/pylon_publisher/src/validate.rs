use pylon_core::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// Extensions a CDN serves by default.
pub const DEFAULT_CDN_FILE_TYPES: &[&str] = &[
    ".ico", ".json", ".css", ".js", ".map", ".webp", ".woff", ".woff2", ".ttf", ".eot", ".jpg",
    ".jpeg", ".png", ".gif", ".svg", ".txt",
];

/// Lower-cased extension with its leading dot, empty when there is none.
fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

fn normalize_type(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Decides which files may be uploaded at all.
#[derive(Debug, Clone)]
pub struct Validator {
    allowed: HashSet<String>,
    max_size: u64,
}

impl Validator {
    pub fn new(max_size: u64) -> Self {
        Self {
            allowed: DEFAULT_CDN_FILE_TYPES.iter().map(|s| s.to_string()).collect(),
            max_size,
        }
    }

    pub fn from_config(config: &PublishConfig) -> Self {
        Self::new(config.max_file_size_bytes())
    }

    /// Replaces the default allow-list. Entries may omit the leading dot.
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed = types
            .into_iter()
            .map(|ext| normalize_type(ext.as_ref()))
            .collect();
        self
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn check_type(&self, path: &str) -> Result<(), PublishError> {
        if self.allowed.contains(&extension(path)) {
            Ok(())
        } else {
            Err(PublishError::UnsupportedType {
                path: path.to_string(),
            })
        }
    }

    pub fn check_size(&self, path: &str, size: u64) -> Result<(), PublishError> {
        if size > self.max_size {
            Err(PublishError::OversizedObject {
                path: path.to_string(),
                size,
                limit: self.max_size,
            })
        } else {
            Ok(())
        }
    }

    /// Both checks must pass before an entry is uploaded.
    pub fn check(&self, entry: &AssetEntry) -> Result<(), PublishError> {
        self.check_type(&entry.relative_path)?;
        self.check_size(&entry.relative_path, entry.size)
    }
}
