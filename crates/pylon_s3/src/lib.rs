use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use pylon_core::prelude::*;
use tracing::{debug, error, instrument};

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client for an S3 compatible endpoint with static credentials.
    pub fn from_config(config: &PublishConfig) -> Result<Self, StorageError> {
        if config.bucket_name.is_empty() {
            return Err(StorageError::InvalidConfig("bucket name is empty".into()));
        }

        let endpoint = if config.endpoint.contains("://") {
            config.endpoint.clone()
        } else {
            format!("https://{}", config.endpoint)
        };
        let region = config
            .region
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.access_key_secret,
            None,
            None,
            "pylon",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self::new(
            Client::from_conf(s3_config),
            config.bucket_name.clone(),
        ))
    }
}

/// Buffers a body for the SDK, which wants a sized, replayable body for signing.
async fn collect_body(body: ByteStream, size: u64) -> Result<Bytes, std::io::Error> {
    let buffer = body
        .try_fold(
            BytesMut::with_capacity(size as usize),
            |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            },
        )
        .await?;
    Ok(buffer.freeze())
}

impl ObjectStore for S3Store {
    #[instrument(skip(self, body), fields(bucket = %self.bucket))]
    async fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        size: u64,
    ) -> Result<(), StorageError> {
        let data = collect_body(body, size).await?;
        let content_type = mime_guess::from_path(key).first_or_octet_stream();

        debug!("Uploading object to S3...");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type.as_ref())
            .content_length(data.len() as i64)
            .body(S3ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload object: {e:?}");
                StorageError::Generic(format!("S3 Upload Error: {e:?}"))
            })?;

        debug!("Upload successful");
        Ok(())
    }
}
