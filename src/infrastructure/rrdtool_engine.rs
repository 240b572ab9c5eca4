// rrdtool store engine implementation
use crate::application::store_engine::{StaleUpdate, StoreEngine};
use crate::domain::chart::ChartSpec;
use crate::domain::series::{SeriesId, StoreSchema};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Color of the threshold rule on every chart.
const THRESHOLD_COLOR: &str = "FF0000";

#[derive(Debug, Clone)]
pub struct RrdToolEngine {
    binary: String,
    timeout: Duration,
}

impl RrdToolEngine {
    pub fn new(binary: String, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    /// Run one rrdtool command and return its stdout, failing on a non-zero exit.
    async fn execute(&self, args: &[String]) -> Result<String> {
        let operation = args.first().map(String::as_str).unwrap_or_default();
        tracing::debug!("Executing {} {}", self.binary, args.join(" "));

        let mut command = Command::new(&self.binary);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .with_context(|| {
                format!(
                    "rrdtool {} timed out after {}s",
                    operation,
                    self.timeout.as_secs()
                )
            })?
            .with_context(|| format!("Failed to execute {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if let Some(stale) = parse_stale_update(&stderr) {
                return Err(stale.into());
            }
            anyhow::bail!("rrdtool {} failed with {}: {}", operation, output.status, stderr);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl StoreEngine for RrdToolEngine {
    async fn create(&self, path: &Path, schema: &StoreSchema) -> Result<()> {
        self.execute(&create_args(path, schema)).await?;
        Ok(())
    }

    async fn last_update(&self, path: &Path) -> Result<i64> {
        let stdout = self.execute(&["last".to_string(), path_arg(path)]).await?;
        parse_last(&stdout)
    }

    async fn update(&self, path: &Path, timestamp: i64, values: &[f64]) -> Result<()> {
        self.execute(&update_args(path, timestamp, values)).await?;
        Ok(())
    }

    async fn graph(&self, path: &Path, output: &Path, series: SeriesId, spec: &ChartSpec) -> Result<()> {
        self.execute(&graph_args(path, output, series, spec)).await?;
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn create_args(path: &Path, schema: &StoreSchema) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        path_arg(path),
        format!("--step={}", schema.step.as_secs()),
        "--no-overwrite".to_string(),
    ];
    args.extend(schema.data_sources.iter().map(|ds| ds.declaration()));
    args.push(schema.archive.declaration());
    args
}

fn update_args(path: &Path, timestamp: i64, values: &[f64]) -> Vec<String> {
    let mut row = timestamp.to_string();
    for value in values {
        row.push(':');
        row.push_str(&value.to_string());
    }
    vec!["update".to_string(), path_arg(path), row]
}

fn graph_args(path: &Path, output: &Path, series: SeriesId, spec: &ChartSpec) -> Vec<String> {
    let name = series.name();
    // Colons separate DEF fields, so they must be escaped inside the path
    let source = path_arg(path).replace(':', "\\:");
    vec![
        "graph".to_string(),
        path_arg(output),
        "--imgformat=PNG".to_string(),
        format!("--width={}", spec.width),
        format!("--height={}", spec.height),
        "--full-size-mode".to_string(),
        format!("--upper-limit={}", spec.axis_max),
        "--lower-limit=0".to_string(),
        "--rigid".to_string(),
        "--end=now".to_string(),
        format!("--start=end-{}s", spec.window.as_secs()),
        format!("DEF:{name}={source}:{name}:MAX"),
        format!("LINE1:{}#{}:{}", name, spec.color, series.label()),
        format!("HRULE:{}#{}", spec.threshold_min, THRESHOLD_COLOR),
    ]
}

fn parse_last(stdout: &str) -> Result<i64> {
    stdout
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Unexpected rrdtool last output: {:?}", stdout.trim()))
}

/// Recognize rrdtool's "illegal attempt to update using time X when last update time is Y".
fn parse_stale_update(stderr: &str) -> Option<StaleUpdate> {
    fn number_after(text: &str, marker: &str) -> Option<i64> {
        let start = text.find(marker)? + marker.len();
        let digits: String = text[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '-')
            .collect();
        digits.parse().ok()
    }

    if !stderr.contains("illegal attempt to update") {
        return None;
    }
    Some(StaleUpdate {
        attempted: number_after(stderr, "using time ")?,
        last: number_after(stderr, "last update time is ")?,
    })
}
