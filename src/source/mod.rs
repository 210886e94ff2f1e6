pub mod metric_source;
pub mod http;
pub mod mock;

pub use metric_source::{FramePayload, MetricSource, SourceError, SourceResult, TileCoord};
pub use http::HttpMetricSource;
pub use mock::MockMetricSource;
