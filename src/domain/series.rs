// Gauge series and round-robin store schema
use std::fmt;
use std::time::Duration;

/// The three gauges kept in the store, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Ping,
    Upload,
    Download,
}

impl SeriesId {
    /// Declaration order inside the store; updates carry values in this order.
    pub const ALL: [SeriesId; 3] = [SeriesId::Ping, SeriesId::Upload, SeriesId::Download];

    pub fn name(self) -> &'static str {
        match self {
            SeriesId::Ping => "ping",
            SeriesId::Upload => "upload",
            SeriesId::Download => "download",
        }
    }

    /// Legend label drawn next to the series line ("ping" -> "Ping").
    pub fn label(self) -> &'static str {
        match self {
            SeriesId::Ping => "Ping",
            SeriesId::Upload => "Upload",
            SeriesId::Download => "Download",
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A GAUGE data source: each point overwrites, values outside `[min, max]` are unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub series: SeriesId,
    pub heartbeat: Duration,
    pub min: f64,
    pub max: f64,
}

impl DataSource {
    /// `DS:<name>:GAUGE:<heartbeat>:<min>:<max>`
    pub fn declaration(&self) -> String {
        format!(
            "DS:{}:GAUGE:{}:{}:{}",
            self.series.name(),
            self.heartbeat.as_secs(),
            self.min,
            self.max
        )
    }
}

/// Round-robin archive consolidating with MAX.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub xff: f64,
    pub steps_per_row: u32,
    pub rows: u32,
}

impl Archive {
    /// `RRA:MAX:<xff>:<steps_per_row>:<rows>`
    pub fn declaration(&self) -> String {
        format!("RRA:MAX:{}:{}:{}", self.xff, self.steps_per_row, self.rows)
    }
}

/// Fixed schema of the store. Only used at creation time; an existing store keeps
/// whatever schema it was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSchema {
    pub step: Duration,
    pub data_sources: Vec<DataSource>,
    pub archive: Archive,
}

impl StoreSchema {
    /// Total time covered by the archive before the oldest row is overwritten.
    pub fn retention(&self) -> Duration {
        self.step * self.archive.steps_per_row * self.archive.rows
    }
}
