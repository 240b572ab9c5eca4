// Store engine trait - the round-robin time-series backend
use crate::domain::chart::ChartSpec;
use crate::domain::series::{SeriesId, StoreSchema};
use async_trait::async_trait;
use std::path::Path;

/// Returned (inside `anyhow::Error`) when the engine itself refuses an update
/// because the timestamp is not after its last update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine rejected update at {attempted}, last update was {last}")]
pub struct StaleUpdate {
    pub attempted: i64,
    pub last: i64,
}

#[async_trait]
pub trait StoreEngine: Send + Sync {
    /// Create a new store file with the given schema
    async fn create(&self, path: &Path, schema: &StoreSchema) -> anyhow::Result<()>;

    /// Epoch seconds of the last update recorded in the store
    async fn last_update(&self, path: &Path) -> anyhow::Result<i64>;

    /// Write one row; `values` follow the schema's declaration order
    async fn update(&self, path: &Path, timestamp: i64, values: &[f64]) -> anyhow::Result<()>;

    /// Draw one series into a PNG at `output`, replacing any file there
    async fn graph(
        &self,
        path: &Path,
        output: &Path,
        series: SeriesId,
        spec: &ChartSpec,
    ) -> anyhow::Result<()>;
}
