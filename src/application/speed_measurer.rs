// Measurement capability trait
use crate::domain::measurement::MeasurementSample;
use async_trait::async_trait;

#[async_trait]
pub trait SpeedMeasurer: Send + Sync {
    /// Run one latency/download/upload test against the best available server
    async fn measure(&self) -> anyhow::Result<MeasurementSample>;
}
