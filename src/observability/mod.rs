pub mod metrics;
pub mod telemetry;

pub use metrics::{CaptureMetrics, MetricsSnapshot};
pub use telemetry::{init_tracing, LogConfig, LogLevel};
