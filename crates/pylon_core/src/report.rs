use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a single publishing pass did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub started_at: DateTime<Utc>,

    /// `None` while the pass is still running or when it was aborted.
    pub finished_at: Option<DateTime<Utc>>,

    /// Objects uploaded and verified, in traversal order.
    pub published: Vec<PublishedObject>,

    /// Files left out because they failed validation.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedObject {
    /// Object key in the bucket, e.g. "answer/static/js/main.js".
    pub key: String,

    /// Size in bytes as uploaded, after rewriting.
    pub size: u64,

    /// SHA256 of the uploaded bytes.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

impl PublishReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            published: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}
