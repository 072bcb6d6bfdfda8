//! services/api/src/adapters/storage.rs
//!
//! Public-bucket object storage over the storage REST API of the hosted database.

use async_trait::async_trait;
use bytes::Bytes;
use design_studio_core::ports::{ObjectStorage, PortError, PortResult};
use reqwest::{header, Client};
use tracing::{error, info};

use crate::config::StorageConfig;

#[derive(Clone)]
pub struct BucketStorageAdapter {
    client: Client,
    config: StorageConfig,
}

impl BucketStorageAdapter {
    pub fn new(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.config.url, self.config.bucket, name)
    }

    /// URL under which an uploaded object is served without credentials.
    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, name
        )
    }
}

#[async_trait]
impl ObjectStorage for BucketStorageAdapter {
    async fn upload(&self, name: &str, content_type: &str, data: Bytes) -> PortResult<String> {
        let size = data.len();
        let response = self
            .client
            .post(self.object_url(name))
            .bearer_auth(&self.config.key)
            .header("apikey", &self.config.key)
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Upload of {} failed with {}: {}", name, status, detail);
            return Err(PortError::Upstream(format!("Upload failed with {}: {}", status, detail)));
        }

        info!("Uploaded {} ({} bytes) to bucket {}.", name, size, self.config.bucket);
        Ok(self.public_url(name))
    }
}
