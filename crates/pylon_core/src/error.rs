use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage backend error: {0}")]
    Generic(String),
}

/// Everything that can stop an asset from being published.
///
/// [`PublishError::UnsupportedType`] and [`PublishError::OversizedObject`] only
/// skip the file at hand, every other variant aborts the pass.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Cannot read {path}: {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type: {path}")]
    UnsupportedType { path: String },

    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    OversizedObject { path: String, size: u64, limit: u64 },

    #[error("Cannot open bucket {bucket}: {source}")]
    Connect {
        bucket: String,
        #[source]
        source: StorageError,
    },

    #[error("Upload of {key} failed: {source}")]
    Transport {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("{url} is not available from the CDN: {reason}")]
    Verification {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pass finished without a single object on the CDN.
    #[error("Nothing under {root} was published")]
    EmptyBuild { root: String },
}

impl PublishError {
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            PublishError::UnsupportedType { .. } | PublishError::OversizedObject { .. }
        )
    }
}
