// speedtest-cli measurement implementation
use crate::application::speed_measurer::SpeedMeasurer;
use crate::domain::measurement::MeasurementSample;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;

/// Runs `speedtest-cli --json` (or a compatible command) and converts its report.
#[derive(Debug, Clone)]
pub struct SpeedtestCli {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SpeedtestReport {
    timestamp: String,
    ping: f64,
    download: f64,
    upload: f64,
}

impl SpeedtestCli {
    pub fn new(command: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            args,
            timeout,
        }
    }

    fn parse_report(stdout: &str) -> Result<MeasurementSample> {
        let report: SpeedtestReport =
            serde_json::from_str(stdout.trim()).context("Failed to parse speedtest report")?;
        let timestamp = DateTime::parse_from_rfc3339(&report.timestamp)
            .with_context(|| format!("Invalid speedtest timestamp {:?}", report.timestamp))?
            .with_timezone(&Utc);

        Ok(MeasurementSample::from_raw(
            timestamp,
            report.ping,
            report.download,
            report.upload,
        ))
    }
}

#[async_trait]
impl SpeedMeasurer for SpeedtestCli {
    async fn measure(&self) -> Result<MeasurementSample> {
        tracing::debug!("Starting speedtest: {} {}", self.command, self.args.join(" "));

        let mut command = Command::new(&self.command);
        command.args(&self.args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .with_context(|| format!("Speedtest timed out after {}s", self.timeout.as_secs()))?
            .with_context(|| format!("Failed to execute {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Speedtest failed with {}: {}", output.status, stderr.trim());
        }

        Self::parse_report(&String::from_utf8_lossy(&output.stdout))
    }
}
