use crate::verify::AvailabilityVerifier;
use futures::{TryStreamExt, future};
use pylon_core::prelude::*;
use sha2::{Digest, Sha256};
use std::io;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, instrument};

/// Puts objects into the bucket and confirms the CDN serves them.
///
/// Upload and verification form one step: an object that uploads but cannot
/// be read back counts as unpublished.
#[derive(Clone)]
pub struct Uploader<S: ObjectStore> {
    store: S,
    key_prefix: String,
    verifier: AvailabilityVerifier,
}

impl<S: ObjectStore> Uploader<S> {
    pub fn new(store: S, key_prefix: impl Into<String>, verifier: AvailabilityVerifier) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            verifier,
        }
    }

    /// Key prefix followed by the relative path, nothing is normalised.
    pub fn object_key(&self, relative_path: &str) -> String {
        format!("{}{relative_path}", self.key_prefix)
    }

    #[instrument(skip(self, body), fields(key))]
    pub async fn publish(
        &self,
        relative_path: &str,
        body: ByteStream,
        size: u64,
    ) -> Result<PublishedObject, PublishError> {
        let key = self.object_key(relative_path);
        tracing::Span::current().record("key", &key);

        let hasher = Arc::new(Mutex::new(Sha256::new()));
        let hasher_writer = hasher.clone();
        let body = body.and_then(move |chunk| {
            let hashed = hasher_writer
                .lock()
                .map(|mut h| h.update(&chunk))
                .map_err(|_| io::Error::other("sha256 hasher lock poisoned"));
            future::ready(hashed.map(|()| chunk))
        });

        debug!("Uploading...");
        self.store
            .put_object(&key, Box::pin(body), size)
            .await
            .map_err(|source| {
                error!("Upload failed: {source}");
                PublishError::Transport {
                    key: key.clone(),
                    source,
                }
            })?;

        self.verifier.verify(&key).await?;

        let sha256 = digest(&hasher).map_err(|source| {
            error!("Cannot finish checksum: {source}");
            PublishError::Transport {
                key: key.clone(),
                source,
            }
        })?;

        debug!("Published");
        Ok(PublishedObject { key, size, sha256 })
    }
}

fn digest(hasher: &Mutex<Sha256>) -> Result<String, StorageError> {
    let hasher = hasher
        .lock()
        .map_err(|_| StorageError::Generic("sha256 hasher lock poisoned".into()))?;
    Ok(hex::encode(hasher.clone().finalize()))
}
