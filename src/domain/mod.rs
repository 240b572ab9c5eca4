// Domain layer - Measurements, store schema and chart artifacts
pub mod chart;
pub mod measurement;
pub mod series;
