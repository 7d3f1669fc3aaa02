//! # pylon FileSystem Source
//!
//! Reads a UI build straight from a directory on disk.
//!
//! This crate implements the [`AssetSource`] trait on top of `tokio::fs`.
//! It is picked over the embedded bundle whenever a static path override
//! is configured.
//!
//! ## Usage
//!
//! ```no_run
//! use pylon_fs::DiskSource;
//!
//! let source = DiskSource::new("/srv/answer/ui/build");
//! ```

use pylon_core::prelude::*;
use std::path::Path;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Maps a path below `root` to its POSIX style path relative to `root`.
///
/// Works for absolute and relative roots, with or without a trailing
/// separator. Paths outside `root` come back unchanged apart from separators.
pub fn relative_path(root: &str, path: &str) -> String {
    let stripped = match Path::new(path).strip_prefix(root) {
        Ok(rest) => rest.to_string_lossy().into_owned(),
        Err(_) => path.strip_prefix(root).unwrap_or(path).to_string(),
    };
    stripped.replace('\\', "/").trim_start_matches('/').to_string()
}

#[derive(Clone, Debug)]
pub struct DiskSource {
    root: String,
}

impl DiskSource {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DiskSource {
    fn root(&self) -> &str {
        &self.root
    }

    async fn list(&self, dir: &str) -> Result<Vec<SourceEntry>, std::io::Error> {
        let mut read_dir = fs::read_dir(dir).await?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            // `file_type` does not follow symlinks, only real directories are entered.
            if entry.file_type().await?.is_dir() {
                entries.push(SourceEntry {
                    name,
                    path: path.to_string_lossy().into_owned(),
                    is_dir: true,
                    size: 0,
                });
                continue;
            }

            // Linked files are published with their target's size.
            let metadata = fs::metadata(&path).await?;
            if metadata.is_dir() {
                debug!(path = %path.display(), "Not following directory symlink");
                continue;
            }
            entries.push(SourceEntry {
                name,
                path: path.to_string_lossy().into_owned(),
                is_dir: false,
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn open(&self, path: &str) -> Result<ByteStream, std::io::Error> {
        let file = fs::File::open(path).await?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    fn relative_path(&self, path: &str) -> String {
        relative_path(&self.root, path)
    }
}
