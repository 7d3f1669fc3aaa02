use crate::error::*;

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// File contents as they leave a source and enter a store.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// The put-object half of a bucket. Protocol details (signing, retries) belong
/// to the implementation.
pub trait ObjectStore: Send + Sync + 'static + Clone {
    /// Writes `body` under `key`, replacing any existing object.
    ///
    /// `size` is the exact number of bytes `body` yields.
    fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        size: u64,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Base name, e.g. `main.3f2a.js`.
    pub name: String,
    /// Full path inside the source, including its root.
    pub path: String,
    pub is_dir: bool,
    /// Size in bytes from metadata, `0` for directories.
    pub size: u64,
}

/// A file found while walking a source, not opened yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// POSIX style path with the source root stripped, e.g. `static/js/main.js`.
    pub relative_path: String,
    pub name: String,
    pub source_path: String,
    /// Declared size from metadata.
    pub size: u64,
}

/// Where the UI build lives.
pub trait AssetSource: Send + Sync + 'static {
    /// The directory a walk starts from.
    fn root(&self) -> &str;

    /// Lists the direct children of `dir`, sorted by name.
    fn list(
        &self,
        dir: &str,
    ) -> impl Future<Output = Result<Vec<SourceEntry>, std::io::Error>> + Send;

    fn open(&self, path: &str) -> impl Future<Output = Result<ByteStream, std::io::Error>> + Send;

    /// Strips the source root from a path returned by [`AssetSource::list`].
    fn relative_path(&self, path: &str) -> String;
}
