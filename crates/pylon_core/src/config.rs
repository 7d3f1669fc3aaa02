use crate::error::PublishError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Used when `max_file_size` is missing, not positive or not a number.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

const MEGABYTE: u64 = 1024 * 1024;

/// Which client talks to the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Aliyun OSS through OpenDAL.
    #[default]
    Oss,
    /// Any S3 compatible endpoint through the AWS SDK.
    S3,
}

/// The record a host hands over to (re)publish the build.
///
/// Every field is optional on the wire, missing ones come back empty and are
/// reported by [`PublishConfig::validate`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub endpoint: String,
    pub bucket_name: String,
    /// Prepended verbatim to every object key, e.g. `answer/`.
    pub object_key_prefix: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Public base URL objects are fetched from, e.g. `https://cdn.example.com/`.
    pub visit_url_prefix: String,
    /// Megabytes. Hosts send this from a form field, so strings are accepted.
    #[serde(deserialize_with = "lenient_megabytes")]
    pub max_file_size: Option<i64>,
    pub provider: StorageProvider,
    /// Only used by the S3 provider.
    pub region: Option<String>,
}

impl PublishConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, PublishError> {
        serde_json::from_slice(data).map_err(|e| PublishError::InvalidConfig(e.to_string()))
    }

    /// Checks the fields a pass cannot run without.
    pub fn validate(&self) -> Result<(), PublishError> {
        let missing: Vec<&str> = [
            ("endpoint", &self.endpoint),
            ("bucket_name", &self.bucket_name),
            ("access_key_id", &self.access_key_id),
            ("access_key_secret", &self.access_key_secret),
            ("visit_url_prefix", &self.visit_url_prefix),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PublishError::InvalidConfig(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }

    /// Largest object a pass will upload, in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        match self.max_file_size {
            Some(mb) if mb > 0 => mb as u64 * MEGABYTE,
            _ => DEFAULT_MAX_FILE_SIZE_MB * MEGABYTE,
        }
    }

    /// The URL prefix consumers use in place of `/static/..` once published.
    pub fn cdn_prefix(&self) -> String {
        format!("{}{}", self.visit_url_prefix, self.object_key_prefix)
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket_name", &self.bucket_name)
            .field("object_key_prefix", &self.object_key_prefix)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("visit_url_prefix", &self.visit_url_prefix)
            .field("max_file_size", &self.max_file_size)
            .field("provider", &self.provider)
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMegabytes {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

fn lenient_megabytes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawMegabytes>::deserialize(deserializer)? {
        Some(RawMegabytes::Number(n)) => Some(n),
        Some(RawMegabytes::Text(s)) => s.trim().parse().ok(),
        Some(RawMegabytes::Other(_)) | None => None,
    })
}
