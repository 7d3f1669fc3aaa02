use futures::StreamExt;
use opendal::{Operator, services::Oss};
use pylon_core::prelude::*;
use tracing::{debug, error, instrument};

#[derive(Clone)]
pub struct OpendalStore {
    op: Operator,
}

impl OpendalStore {
    /// Create a new store from an OpenDAL Operator.
    /// The Operator can be configured for any supported backend e.g., oss, memory, etc.
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// Builds an Aliyun OSS operator from the publish configuration.
    ///
    /// Endpoints without a scheme, as the OSS console shows them, get `https://`.
    pub fn oss(config: &PublishConfig) -> Result<Self, StorageError> {
        let endpoint = if config.endpoint.contains("://") {
            config.endpoint.clone()
        } else {
            format!("https://{}", config.endpoint)
        };

        let builder = Oss::default()
            .endpoint(&endpoint)
            .bucket(&config.bucket_name)
            .access_key_id(&config.access_key_id)
            .access_key_secret(&config.access_key_secret);

        let op = Operator::new(builder)
            .map_err(|e| StorageError::InvalidConfig(format!("OpenDAL OSS Error: {e}")))?
            .finish();

        Ok(Self::new(op))
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }
}

impl ObjectStore for OpendalStore {
    #[instrument(skip(self, body))]
    async fn put_object(
        &self,
        key: &str,
        mut body: ByteStream,
        size: u64,
    ) -> Result<(), StorageError> {
        let content_type = mime_guess::from_path(key).first_or_octet_stream();

        let mut writer = self
            .op
            .writer_with(key)
            .content_type(content_type.as_ref())
            .await
            .map_err(|e| StorageError::Generic(format!("OpenDAL Writer Error: {e}")))?;

        debug!("Streaming object...");
        while let Some(chunk) = body.next().await {
            let written = match chunk {
                Ok(chunk) => writer
                    .write(chunk)
                    .await
                    .map_err(|e| StorageError::Generic(format!("OpenDAL Write Error: {e}"))),
                Err(e) => Err(StorageError::Io(e)),
            };

            if let Err(e) = written {
                error!("Failed to upload object: {e}");
                if let Err(abort) = writer.abort().await {
                    error!("Failed to abort partial upload: {abort}");
                }
                return Err(e);
            }
        }

        writer
            .close()
            .await
            .map_err(|e| StorageError::Generic(format!("OpenDAL Close Error: {e}")))?;

        debug!("Upload successful");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use opendal::services::Memory;

    fn memory_store() -> OpendalStore {
        OpendalStore::new(Operator::new(Memory::default()).unwrap().finish())
    }

    fn body(chunks: Vec<&'static str>) -> ByteStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        ))
    }

    #[tokio::test]
    async fn streams_every_chunk_into_the_object() {
        let store = memory_store();
        store
            .put_object("answer/static/js/main.js", body(vec!["var a", "=1;"]), 8)
            .await
            .unwrap();

        let data = store
            .operator()
            .read("answer/static/js/main.js")
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(data, Bytes::from_static(b"var a=1;"));
    }

    #[tokio::test]
    async fn overwrites_existing_objects() {
        let store = memory_store();
        store.put_object("a.css", body(vec!["old"]), 3).await.unwrap();
        store.put_object("a.css", body(vec!["new"]), 3).await.unwrap();

        let data = store.operator().read("a.css").await.unwrap().to_bytes();
        assert_eq!(data, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn source_errors_abort_the_upload() {
        let store = memory_store();
        let failing: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("disk went away")),
        ]));

        let err = store.put_object("b.js", failing, 7).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn oss_endpoint_gets_a_scheme() {
        let config = PublishConfig {
            endpoint: "oss-cn-hangzhou.aliyuncs.com".into(),
            bucket_name: "ui".into(),
            access_key_id: "id".into(),
            access_key_secret: "secret".into(),
            ..Default::default()
        };
        assert!(OpendalStore::oss(&config).is_ok());
    }
}
