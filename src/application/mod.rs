// Application layer - Pipeline components and the run orchestration
pub mod chart_renderer;
pub mod error;
pub mod graph_publisher;
pub mod image_compositor;
pub mod speed_measurer;
pub mod speedchart_service;
pub mod store_engine;
pub mod time_series_store;

#[cfg(test)]
pub mod test_support;
