// Chart domain models
use super::series::SeriesId;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;

/// Drawing parameters for one gauge chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub width: u32,
    pub height: u32,
    /// Line color as `RRGGBB` hex, without the leading `#`.
    pub color: String,
    /// Upper bound of the vertical axis, applied even when data exceeds it.
    pub axis_max: f64,
    /// Value of the red horizontal reference line.
    pub threshold_min: f64,
    /// History shown, ending now.
    pub window: Duration,
}

/// A rendered chart living in a temporary file.
///
/// The file is removed when the value is dropped, so every owner releases it
/// exactly once whether the pipeline finishes or not.
#[derive(Debug)]
pub struct ChartImage {
    series: SeriesId,
    path: TempPath,
}

impl ChartImage {
    pub fn new(series: SeriesId, path: TempPath) -> Self {
        Self { series, path }
    }

    pub fn series(&self) -> SeriesId {
        self.series
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The stacked download/upload/latency image written to the configured path.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl CompositeImage {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self { path, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_image_removes_file_on_drop() {
        let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let kept: PathBuf = path.to_path_buf();

        let chart = ChartImage::new(SeriesId::Ping, path);
        assert!(kept.exists());
        assert_eq!(chart.series(), SeriesId::Ping);

        drop(chart);
        assert!(!kept.exists());
    }
}
