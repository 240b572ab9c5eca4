// Publisher trait for the composite graph
use crate::application::error::PipelineResult;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// Basic-auth credentials for the publish endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where and as whom the composite graph is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub endpoint_url: String,
    pub credentials: Credentials,
}

#[async_trait]
pub trait GraphPublisher: Send + Sync {
    /// Upload the image and return the raw HTTP status code.
    ///
    /// Only transport failures are errors; any response, including 4xx/5xx,
    /// is returned as a status code for the caller to judge.
    async fn publish(&self, image_path: &Path, target: &PublishTarget) -> PipelineResult<u16>;
}
