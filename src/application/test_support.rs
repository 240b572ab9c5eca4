// In-memory collaborators shared by the application tests
use crate::application::speed_measurer::SpeedMeasurer;
use crate::application::store_engine::{StaleUpdate, StoreEngine};
use crate::domain::chart::ChartSpec;
use crate::domain::measurement::MeasurementSample;
use crate::domain::series::{Archive, DataSource, SeriesId, StoreSchema};
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn test_schema() -> StoreSchema {
    StoreSchema {
        step: Duration::from_secs(1800),
        data_sources: SeriesId::ALL
            .iter()
            .map(|&series| DataSource {
                series,
                heartbeat: Duration::from_secs(3600),
                min: 0.0,
                max: 100.0,
            })
            .collect(),
        archive: Archive {
            xff: 0.5,
            steps_per_row: 2,
            rows: 168,
        },
    }
}

pub fn chart_spec(width: u32, height: u32) -> ChartSpec {
    ChartSpec {
        width,
        height,
        color: "0000FF".to_string(),
        axis_max: 100.0,
        threshold_min: 20.0,
        window: Duration::from_secs(7 * 24 * 3600),
    }
}

pub fn sample_at(epoch_seconds: i64) -> MeasurementSample {
    MeasurementSample::new(
        Local.timestamp_opt(epoch_seconds, 0).unwrap(),
        25,
        100.0,
        20.0,
    )
}

#[derive(Debug, Default)]
struct EngineState {
    create_calls: usize,
    last: i64,
    updates: Vec<(i64, Vec<f64>)>,
    graphs: Vec<SeriesId>,
}

/// Store engine keeping rows in memory and drawing flat PNGs.
#[derive(Debug, Default)]
pub struct FakeEngine {
    state: Mutex<EngineState>,
    fail_create: bool,
    fail_graph: Option<SeriesId>,
    reported_last: Option<i64>,
    widths: HashMap<SeriesId, u32>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_graph(mut self, series: SeriesId) -> Self {
        self.fail_graph = Some(series);
        self
    }

    /// Draw `series` with this width regardless of the requested one
    pub fn with_width(mut self, series: SeriesId, width: u32) -> Self {
        self.widths.insert(series, width);
        self
    }

    pub fn with_last_update(self, last: i64) -> Self {
        self.state.lock().unwrap().last = last;
        self
    }

    /// Make `last_update` answer `last` while `update` keeps enforcing the real one
    pub fn with_reported_last_update(mut self, last: i64) -> Self {
        self.reported_last = Some(last);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn updates(&self) -> Vec<(i64, Vec<f64>)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn graphs(&self) -> Vec<SeriesId> {
        self.state.lock().unwrap().graphs.clone()
    }
}

fn parse_color(hex: &str) -> Rgb<u8> {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(0)
    };
    Rgb([channel(0), channel(2), channel(4)])
}

#[async_trait]
impl StoreEngine for FakeEngine {
    async fn create(&self, path: &Path, _schema: &StoreSchema) -> anyhow::Result<()> {
        if self.fail_create {
            anyhow::bail!("creating '{}': Permission denied", path.display());
        }
        std::fs::write(path, b"rrd")?;
        self.state.lock().unwrap().create_calls += 1;
        Ok(())
    }

    async fn last_update(&self, path: &Path) -> anyhow::Result<i64> {
        if !path.exists() {
            anyhow::bail!("opening '{}': No such file or directory", path.display());
        }
        Ok(self
            .reported_last
            .unwrap_or_else(|| self.state.lock().unwrap().last))
    }

    async fn update(&self, _path: &Path, timestamp: i64, values: &[f64]) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if timestamp <= state.last {
            return Err(StaleUpdate {
                attempted: timestamp,
                last: state.last,
            }
            .into());
        }
        state.last = timestamp;
        state.updates.push((timestamp, values.to_vec()));
        Ok(())
    }

    async fn graph(&self, path: &Path, output: &Path, series: SeriesId, spec: &ChartSpec) -> anyhow::Result<()> {
        if self.fail_graph == Some(series) || !path.exists() {
            anyhow::bail!("cannot graph {}", series);
        }
        let width = self.widths.get(&series).copied().unwrap_or(spec.width);
        RgbImage::from_pixel(width, spec.height, parse_color(&spec.color))
            .save_with_format(output, image::ImageFormat::Png)?;
        self.state.lock().unwrap().graphs.push(series);
        Ok(())
    }
}

/// Measurer returning a fixed sample, or failing.
#[derive(Debug, Default)]
pub struct FakeMeasurer {
    sample: Option<MeasurementSample>,
    calls: AtomicUsize,
}

impl FakeMeasurer {
    pub fn returning(sample: MeasurementSample) -> Self {
        Self {
            sample: Some(sample),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeedMeasurer for FakeMeasurer {
    async fn measure(&self) -> anyhow::Result<MeasurementSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sample
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Cannot retrieve speedtest configuration"))
    }
}
