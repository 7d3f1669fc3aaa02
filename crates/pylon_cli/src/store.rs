use pylon_core::prelude::*;
use pylon_opendal::OpendalStore;
use pylon_s3::S3Store;

/// The bucket client picked by [`PublishConfig::provider`].
#[derive(Clone)]
pub enum AnyStore {
    Oss(OpendalStore),
    S3(S3Store),
}

impl AnyStore {
    pub fn connect(config: &PublishConfig) -> Result<Self, StorageError> {
        match config.provider {
            StorageProvider::Oss => OpendalStore::oss(config).map(AnyStore::Oss),
            StorageProvider::S3 => S3Store::from_config(config).map(AnyStore::S3),
        }
    }
}

impl ObjectStore for AnyStore {
    async fn put_object(&self, key: &str, body: ByteStream, size: u64) -> Result<(), StorageError> {
        match self {
            AnyStore::Oss(store) => store.put_object(key, body, size).await,
            AnyStore::S3(store) => store.put_object(key, body, size).await,
        }
    }
}
