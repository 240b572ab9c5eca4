// Pipeline error taxonomy
use crate::domain::series::SeriesId;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failures of a speedchart run.
///
/// Everything except `Publish` aborts the run; publish transport failures are
/// reported through the run outcome instead of being returned.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    #[error("another run holds the lock at {0}")]
    RunInProgress(String),

    #[error("cannot take run lock: {0}")]
    Lock(String),

    #[error("failed to create store: {0}")]
    StoreCreation(String),

    #[error("measurement failed: {0}")]
    Measurement(String),

    #[error("timestamp {attempted} is not after last stored timestamp {last}")]
    NonMonotonicTimestamp { attempted: i64, last: i64 },

    #[error("failed to write to store: {0}")]
    StoreWrite(String),

    #[error("failed to render {series} chart: {reason}")]
    Render { series: SeriesId, reason: String },

    #[error("failed to compose graph: {0}")]
    Composition(String),

    #[error("failed to publish graph: {0}")]
    Publish(String),
}

impl PipelineError {
    pub fn render(series: SeriesId, reason: impl Into<String>) -> Self {
        PipelineError::Render {
            series,
            reason: reason.into(),
        }
    }
}
