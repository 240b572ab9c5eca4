// Image compositor - stacks the three gauge charts into one graph
use crate::application::error::{PipelineError, PipelineResult};
use crate::domain::chart::{ChartImage, CompositeImage};
use image::{DynamicImage, GenericImage, ImageFormat, RgbImage};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ImageCompositor;

impl ImageCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Stack download (top), upload (middle) and latency (bottom) into `output_path`.
    ///
    /// The three charts are consumed: their temporary files are gone once this
    /// returns, on success and on failure alike.
    pub async fn compose(
        &self,
        download: ChartImage,
        upload: ChartImage,
        latency: ChartImage,
        output_path: &Path,
    ) -> PipelineResult<CompositeImage> {
        let output = output_path.to_path_buf();
        // Decoding and encoding are CPU bound
        tokio::task::spawn_blocking(move || {
            let charts = [download, upload, latency];
            Self::compose_blocking(&charts, &output)
        })
        .await
        .map_err(|e| PipelineError::Composition(format!("compositing task failed: {}", e)))?
    }

    fn compose_blocking(charts: &[ChartImage], output_path: &Path) -> PipelineResult<CompositeImage> {
        let images = charts
            .iter()
            .map(|chart| {
                image::open(chart.path()).map_err(|e| {
                    PipelineError::Composition(format!(
                        "cannot read {} chart {}: {}",
                        chart.series(),
                        chart.path().display(),
                        e
                    ))
                })
            })
            .collect::<PipelineResult<Vec<DynamicImage>>>()?;

        let width = images[0].width();
        if let Some((chart, image)) = charts
            .iter()
            .zip(&images)
            .find(|(_, image)| image.width() != width)
        {
            return Err(PipelineError::Composition(format!(
                "{} chart is {}px wide, expected {}px",
                chart.series(),
                image.width(),
                width
            )));
        }
        let height: u32 = images.iter().map(|image| image.height()).sum();

        let mut canvas = RgbImage::new(width, height);
        let mut offset = 0;
        for image in &images {
            canvas
                .copy_from(&image.to_rgb8(), 0, offset)
                .map_err(|e| PipelineError::Composition(format!("cannot paste chart: {}", e)))?;
            offset += image.height();
        }

        Self::write_atomically(DynamicImage::ImageRgb8(canvas), output_path)?;
        tracing::debug!("Wrote {}x{} graph to {}", width, height, output_path.display());

        Ok(CompositeImage::new(output_path.to_path_buf(), width, height))
    }

    /// Write into a sibling temporary file, then rename over the destination.
    fn write_atomically(image: DynamicImage, output_path: &Path) -> PipelineResult<()> {
        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| PipelineError::Composition(format!("cannot create {}: {}", dir.display(), e)))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".graph")
            .suffix(".png")
            .tempfile_in(dir)
            .map_err(|e| PipelineError::Composition(format!("cannot create temporary file: {}", e)))?;

        image
            .write_to(&mut tmp, ImageFormat::Png)
            .map_err(|e| PipelineError::Composition(format!("cannot encode graph: {}", e)))?;

        tmp.persist(output_path).map_err(|e| {
            PipelineError::Composition(format!("cannot move graph to {}: {}", output_path.display(), e))
        })?;
        Ok(())
    }
}
