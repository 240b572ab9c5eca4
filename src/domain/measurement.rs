// Measurement domain model
use chrono::{DateTime, Local, Utc};

const BYTES_PER_MEBIBYTE: f64 = 1024.0 * 1024.0;

/// One speed measurement, created once per run and appended to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSample {
    pub captured_at: DateTime<Local>,
    pub latency_ms: u32,
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

impl MeasurementSample {
    pub fn new(captured_at: DateTime<Local>, latency_ms: u32, download_mbps: f64, upload_mbps: f64) -> Self {
        Self {
            captured_at,
            latency_ms,
            download_mbps,
            upload_mbps,
        }
    }

    /// Build a sample from the raw values reported by a speed test.
    ///
    /// Latency is rounded to whole milliseconds; the byte rates are divided by
    /// 1024 twice and rounded to two fractional digits.
    pub fn from_raw(timestamp: DateTime<Utc>, ping_ms: f64, download_rate: f64, upload_rate: f64) -> Self {
        Self::new(
            timestamp.with_timezone(&Local),
            round_latency(ping_ms),
            rate_to_mbps(download_rate),
            rate_to_mbps(upload_rate),
        )
    }

    /// Epoch seconds written to the store.
    pub fn epoch_seconds(&self) -> i64 {
        self.captured_at.timestamp()
    }
}

fn round_latency(ping_ms: f64) -> u32 {
    if !ping_ms.is_finite() || ping_ms <= 0.0 {
        return 0;
    }
    ping_ms.round().min(u32::MAX as f64) as u32
}

fn rate_to_mbps(rate: f64) -> f64 {
    if !rate.is_finite() || rate <= 0.0 {
        return 0.0;
    }
    (rate / BYTES_PER_MEBIBYTE * 100.0).round() / 100.0
}
