use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::config::Settings;

pub(crate) const ASSIGNMENTS_NAMESPACE: &str = "assignments";
pub(crate) const WORK_NAMESPACE: &str = "work";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("stored blob {0} is not valid UTF-8")]
    InvalidUtf8(String),
    #[error("failed to encode blob: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("stored blob {key} is not valid JSON: {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredBlob {
    pub(crate) size: usize,
    pub(crate) sha256: String,
}

impl StoredBlob {
    fn describe(content: &str) -> Self {
        Self { size: content.len(), sha256: hex::encode(Sha256::digest(content.as_bytes())) }
    }
}

#[async_trait]
pub(crate) trait BlobStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        content: String,
    ) -> Result<StoredBlob, StorageError>;

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool, StorageError>;

    async fn list(&self, namespace: &str, prefix: &str) -> Result<Vec<String>, StorageError>;
}

#[derive(Debug, Clone)]
pub(crate) struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if !settings.s3().has_credentials() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "assignments-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Some(Self { client, bucket: settings.s3().bucket.clone() }))
    }

    fn object_key(namespace: &str, key: &str) -> String {
        format!("{namespace}/{key}")
    }
}

fn backend_error(err: impl std::error::Error) -> StorageError {
    StorageError::Backend(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        content: String,
    ) -> Result<StoredBlob, StorageError> {
        let stored = StoredBlob::describe(&content);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(Self::object_key(namespace, key))
            .content_type(JSON_CONTENT_TYPE)
            .body(ByteStream::from(content.into_bytes()))
            .send()
            .await
            .map_err(backend_error)?;

        Ok(stored)
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let object_key = Self::object_key(namespace, key);
        let request = self.client.get_object().bucket(&self.bucket).key(&object_key);
        let output = match request.send().await {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|service| service.is_no_such_key()) => {
                return Ok(None);
            }
            Err(err) => return Err(backend_error(err)),
        };

        let bytes = output.body.collect().await.map_err(backend_error)?.into_bytes();
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| StorageError::InvalidUtf8(object_key))
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        let object_key = Self::object_key(namespace, key);
        match self.client.head_object().bucket(&self.bucket).key(&object_key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|service| service.is_not_found()) => {
                Ok(false)
            }
            Err(err) => Err(backend_error(err)),
        }
    }

    async fn list(&self, namespace: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let namespace_prefix = format!("{namespace}/");
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(Self::object_key(namespace, prefix))
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(backend_error)?;

            keys.extend(output.contents().iter().filter_map(|object| {
                object.key().and_then(|key| key.strip_prefix(&namespace_prefix)).map(str::to_string)
            }));

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<(String, String), String>>,
}

impl MemoryBlobStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        content: String,
    ) -> Result<StoredBlob, StorageError> {
        let stored = StoredBlob::describe(&content);
        self.blobs.write().await.insert((namespace.to_string(), key.to_string()), content);
        Ok(stored)
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.contains_key(&(namespace.to_string(), key.to_string())))
    }

    async fn list(&self, namespace: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let blobs = self.blobs.read().await;
        Ok(blobs
            .keys()
            .filter(|(blob_namespace, key)| blob_namespace == namespace && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }
}
