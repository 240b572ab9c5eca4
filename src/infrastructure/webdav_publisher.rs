// WebDAV-style publisher - uploads the graph with an authenticated PUT
use crate::application::error::{PipelineError, PipelineResult};
use crate::application::graph_publisher::{GraphPublisher, PublishTarget};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WebDavPublisher {
    client: reqwest::Client,
}

impl WebDavPublisher {
    pub fn new(timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Publish(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GraphPublisher for WebDavPublisher {
    async fn publish(&self, image_path: &Path, target: &PublishTarget) -> PipelineResult<u16> {
        let body = tokio::fs::read(image_path).await.map_err(|e| {
            PipelineError::Publish(format!("cannot read {}: {}", image_path.display(), e))
        })?;

        tracing::debug!(
            "Uploading {} bytes to {}",
            body.len(),
            target.endpoint_url
        );

        let response = self
            .client
            .put(&target.endpoint_url)
            .basic_auth(&target.credentials.username, Some(&target.credentials.password))
            .body(body)
            .send()
            .await
            .map_err(|e| PipelineError::Publish(format!("PUT {} failed: {}", target.endpoint_url, e)))?;

        Ok(response.status().as_u16())
    }
}
