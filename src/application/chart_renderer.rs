// Chart renderer - draws one gauge's recent history into a temporary PNG
use crate::application::error::{PipelineError, PipelineResult};
use crate::application::time_series_store::TimeSeriesStore;
use crate::domain::chart::{ChartImage, ChartSpec};
use crate::domain::series::SeriesId;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ChartRenderer {
    specs: HashMap<SeriesId, ChartSpec>,
    temp_dir: Option<PathBuf>,
}

impl ChartRenderer {
    pub fn new(specs: HashMap<SeriesId, ChartSpec>, temp_dir: Option<PathBuf>) -> Self {
        Self { specs, temp_dir }
    }

    /// Render `series` from `store` into a fresh temporary file owned by the returned image.
    pub async fn render(&self, series: SeriesId, store: &TimeSeriesStore) -> PipelineResult<ChartImage> {
        let spec = self
            .specs
            .get(&series)
            .ok_or_else(|| PipelineError::render(series, "no chart settings"))?;
        Self::validate(series, spec)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(series.name()).suffix(".png");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| PipelineError::render(series, format!("cannot create temporary file: {}", e)))?;
        let path = file.into_temp_path();

        tracing::debug!("Rendering {} chart to {}", series, path.display());
        // `path` is dropped (and removed) if drawing fails
        store.render_window(series, &path, spec).await?;

        Ok(ChartImage::new(series, path))
    }

    fn validate(series: SeriesId, spec: &ChartSpec) -> PipelineResult<()> {
        if spec.width == 0 || spec.height == 0 {
            return Err(PipelineError::render(
                series,
                format!("invalid size {}x{}", spec.width, spec.height),
            ));
        }
        if spec.window.is_zero() {
            return Err(PipelineError::render(series, "empty time window"));
        }
        Ok(())
    }
}
