// Main entry point - Dependency injection and a single pipeline run
mod application;
mod domain;
mod infrastructure;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::application::speedchart_service::{PublishOutcome, SpeedChartService};
use crate::infrastructure::config::load_settings;
use crate::infrastructure::rrdtool_engine::RrdToolEngine;
use crate::infrastructure::speedtest_cli::SpeedtestCli;
use crate::infrastructure::webdav_publisher::WebDavPublisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = load_settings()?;

    // Initialize tracing; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.general.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create adapters (infrastructure layer)
    let engine = Arc::new(RrdToolEngine::new(
        settings.rrdtool.binary.clone(),
        Duration::from_secs(settings.rrdtool.timeout_secs),
    ));
    let measurer = Arc::new(SpeedtestCli::new(
        settings.speedtest.command.clone(),
        settings.speedtest.args.clone(),
        Duration::from_secs(settings.speedtest.timeout_secs),
    ));
    let publisher = Arc::new(WebDavPublisher::new(Duration::from_secs(
        settings.graph_upload.timeout_secs,
    ))?);

    // Create service (application layer)
    let fail_on_error_status = settings.graph_upload.fail_on_error_status;
    let service = SpeedChartService::new(settings, engine, measurer, publisher);

    // A failed run is reported once, by the returned error
    let report = service.run().await?;

    if report.store_created {
        tracing::info!("Created new store");
    }
    if report.sample.is_none() {
        tracing::debug!("No measurement taken this run");
    }
    tracing::debug!(
        "Graph {} is {}x{}",
        report.composite.path.display(),
        report.composite.width,
        report.composite.height
    );

    match &report.publish {
        PublishOutcome::Skipped => {}
        PublishOutcome::Accepted(status) => {
            tracing::info!("Graph uploaded, response code {}", status);
        }
        PublishOutcome::Rejected(status) => {
            tracing::debug!("Graph upload answered with status {}", status);
        }
        PublishOutcome::Failed(reason) => {
            tracing::debug!("Graph kept locally after failed upload: {}", reason);
        }
    }

    if !report.is_success(fail_on_error_status) {
        anyhow::bail!("Graph upload was rejected by the server");
    }

    Ok(())
}
