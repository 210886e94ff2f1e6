use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::MetricDetail;

/// Result type for data-source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised by metric data sources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("data service unavailable: {0}")]
    Unavailable(String),
}

/// Slippy-map tile address (zoom, column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Opaque timeseries payload for one tile on one date, consumed by the
/// render pipeline without inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload {
    pub date: NaiveDate,
    pub tile: TileCoord,
    pub bytes: Vec<u8>,
}

/// Trait for metric data-source implementations
///
/// This trait provides a common interface for the anomaly-map data service:
/// - HTTP-backed service client
/// - Mock source for tests and offline runs
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Most recent date the service has metrics for (the playback anchor)
    async fn last_available_date(&self) -> SourceResult<NaiveDate>;

    /// Fetch the timeseries frame payload for one tile on one date,
    /// covering `window_days` days of history
    async fn fetch_frame(
        &self,
        date: NaiveDate,
        tile: TileCoord,
        window_days: u32,
    ) -> SourceResult<FramePayload>;

    /// Metric record for a region on a date, `None` if the service has no
    /// record for that day
    async fn region_metric(
        &self,
        region_code: &str,
        date: NaiveDate,
    ) -> SourceResult<Option<MetricDetail>>;
}
