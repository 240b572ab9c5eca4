// SpeedChart service - one measure, store, render, compose and publish run
use crate::application::chart_renderer::ChartRenderer;
use crate::application::error::{PipelineError, PipelineResult};
use crate::application::graph_publisher::{GraphPublisher, PublishTarget};
use crate::application::image_compositor::ImageCompositor;
use crate::application::speed_measurer::SpeedMeasurer;
use crate::application::store_engine::StoreEngine;
use crate::application::time_series_store::TimeSeriesStore;
use crate::domain::chart::CompositeImage;
use crate::domain::measurement::MeasurementSample;
use crate::domain::series::SeriesId;
use crate::infrastructure::config::Settings;
use crate::infrastructure::run_lock::RunLock;
use std::sync::Arc;

/// What happened to the publish step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Skipped,
    /// 2xx response
    Accepted(u16),
    /// Any other response; logged, not an error
    Rejected(u16),
    /// Transport failure; the store and graph are kept
    Failed(String),
}

#[derive(Debug)]
pub struct RunReport {
    pub store_created: bool,
    pub sample: Option<MeasurementSample>,
    pub composite: CompositeImage,
    pub publish: PublishOutcome,
}

impl RunReport {
    /// A rejected upload only fails the run when the deployment asks for it.
    pub fn is_success(&self, fail_on_error_status: bool) -> bool {
        !(fail_on_error_status && matches!(self.publish, PublishOutcome::Rejected(_)))
    }
}

pub struct SpeedChartService {
    settings: Settings,
    store: TimeSeriesStore,
    renderer: ChartRenderer,
    compositor: ImageCompositor,
    measurer: Arc<dyn SpeedMeasurer>,
    publisher: Arc<dyn GraphPublisher>,
}

impl SpeedChartService {
    pub fn new(
        settings: Settings,
        engine: Arc<dyn StoreEngine>,
        measurer: Arc<dyn SpeedMeasurer>,
        publisher: Arc<dyn GraphPublisher>,
    ) -> Self {
        let store = TimeSeriesStore::new(
            engine,
            settings.general.store_path.clone(),
            settings.store_schema(),
        );
        let renderer = ChartRenderer::new(settings.chart_specs(), settings.general.temp_dir.clone());

        Self {
            settings,
            store,
            renderer,
            compositor: ImageCompositor::new(),
            measurer,
            publisher,
        }
    }

    /// Execute one run.
    ///
    /// Configuration problems are reported before anything is touched. Store,
    /// measurement, render and composition failures abort the run; publish
    /// failures end up in the report.
    pub async fn run(&self) -> PipelineResult<RunReport> {
        let publish_target = self.settings.publish_target()?;
        let _lock = RunLock::acquire(&self.settings.lock_path())?;

        let store_created = self.store.ensure_created().await?;

        let sample = if self.settings.general.measure {
            Some(self.measure_and_append().await?)
        } else {
            tracing::debug!("Measuring disabled, skipping speedtest");
            None
        };

        tracing::debug!("Updating graph");
        let composite = self.render_graph().await?;

        let publish = match publish_target {
            Some(target) => self.publish(&composite, &target).await,
            None => {
                tracing::debug!("Not uploading graph");
                PublishOutcome::Skipped
            }
        };

        Ok(RunReport {
            store_created,
            sample,
            composite,
            publish,
        })
    }

    async fn measure_and_append(&self) -> PipelineResult<MeasurementSample> {
        tracing::debug!("Starting speedtest");
        let sample = self
            .measurer
            .measure()
            .await
            .map_err(|e| PipelineError::Measurement(format!("{:#}", e)))?;

        tracing::info!(
            download = sample.download_mbps,
            upload = sample.upload_mbps,
            ping = sample.latency_ms,
            "Download: {} Upload: {} Ping: {}",
            sample.download_mbps,
            sample.upload_mbps,
            sample.latency_ms
        );

        self.store.append(&sample).await?;
        Ok(sample)
    }

    async fn render_graph(&self) -> PipelineResult<CompositeImage> {
        // Charts already rendered are dropped, and their files removed, if a later one fails
        let download = self.renderer.render(SeriesId::Download, &self.store).await?;
        let upload = self.renderer.render(SeriesId::Upload, &self.store).await?;
        let latency = self.renderer.render(SeriesId::Ping, &self.store).await?;

        self.compositor
            .compose(download, upload, latency, &self.settings.general.graph_path)
            .await
    }

    async fn publish(&self, composite: &CompositeImage, target: &PublishTarget) -> PublishOutcome {
        tracing::debug!("Uploading graph");
        match self.publisher.publish(&composite.path, target).await {
            Ok(status) => {
                tracing::debug!(status, "Upload response code: {}", status);
                if (200..300).contains(&status) {
                    PublishOutcome::Accepted(status)
                } else {
                    PublishOutcome::Rejected(status)
                }
            }
            Err(e) => {
                tracing::warn!("Graph upload failed: {}", e);
                PublishOutcome::Failed(e.to_string())
            }
        }
    }
}
