// Time series store - fixed-schema round-robin storage for the three gauges
use crate::application::error::{PipelineError, PipelineResult};
use crate::application::store_engine::{StaleUpdate, StoreEngine};
use crate::domain::chart::ChartSpec;
use crate::domain::measurement::MeasurementSample;
use crate::domain::series::{SeriesId, StoreSchema};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct TimeSeriesStore {
    engine: Arc<dyn StoreEngine>,
    path: PathBuf,
    schema: StoreSchema,
}

impl TimeSeriesStore {
    pub fn new(engine: Arc<dyn StoreEngine>, path: PathBuf, schema: StoreSchema) -> Self {
        Self {
            engine,
            path,
            schema,
        }
    }

    pub async fn exists(&self) -> std::io::Result<bool> {
        tokio::fs::try_exists(&self.path).await
    }

    /// Create the store if no file exists at the configured path.
    ///
    /// Returns `true` when a store was created. An existing store is left alone,
    /// even if the configured schema has changed since it was created.
    pub async fn ensure_created(&self) -> PipelineResult<bool> {
        let present = self.exists().await.map_err(|e| {
            PipelineError::StoreCreation(format!("cannot check {}: {}", self.path.display(), e))
        })?;
        if present {
            tracing::debug!("Store {} present, continuing", self.path.display());
            return Ok(false);
        }

        tracing::debug!(
            "Store {} not found, creating with step {}s and {}s retention",
            self.path.display(),
            self.schema.step.as_secs(),
            self.schema.retention().as_secs()
        );
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PipelineError::StoreCreation(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        self.engine
            .create(&self.path, &self.schema)
            .await
            .map_err(|e| PipelineError::StoreCreation(format!("{:#}", e)))?;

        Ok(true)
    }

    /// Append one sample. The sample must be strictly later than the last stored row.
    pub async fn append(&self, sample: &MeasurementSample) -> PipelineResult<()> {
        let attempted = sample.epoch_seconds();
        let last = self
            .engine
            .last_update(&self.path)
            .await
            .map_err(|e| PipelineError::StoreWrite(format!("{:#}", e)))?;

        if attempted <= last {
            return Err(PipelineError::NonMonotonicTimestamp { attempted, last });
        }

        let values = self.values_for(sample);
        tracing::debug!("Updating store at {} with {:?}", attempted, values);

        self.engine
            .update(&self.path, attempted, &values)
            .await
            .map_err(|e| match e.downcast_ref::<StaleUpdate>() {
                Some(stale) => PipelineError::NonMonotonicTimestamp {
                    attempted: stale.attempted,
                    last: stale.last,
                },
                None => PipelineError::StoreWrite(format!("{:#}", e)),
            })
    }

    /// Draw the recent history of one series into `output`.
    pub async fn render_window(
        &self,
        series: SeriesId,
        output: &Path,
        spec: &ChartSpec,
    ) -> PipelineResult<()> {
        let present = self.exists().await.map_err(|e| {
            PipelineError::render(series, format!("cannot check {}: {}", self.path.display(), e))
        })?;
        if !present {
            return Err(PipelineError::render(
                series,
                format!("store {} does not exist", self.path.display()),
            ));
        }

        self.engine
            .graph(&self.path, output, series, spec)
            .await
            .map_err(|e| PipelineError::render(series, format!("{:#}", e)))
    }

    fn values_for(&self, sample: &MeasurementSample) -> Vec<f64> {
        self.schema
            .data_sources
            .iter()
            .map(|ds| match ds.series {
                SeriesId::Ping => sample.latency_ms as f64,
                SeriesId::Upload => sample.upload_mbps,
                SeriesId::Download => sample.download_mbps,
            })
            .collect()
    }
}
