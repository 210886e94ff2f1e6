use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::date::day_index_in_year;
use crate::core::MetricDetail;
use crate::source::metric_source::{
    FramePayload, MetricSource, SourceError, SourceResult, TileCoord,
};

/// One recorded frame fetch (for verification)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    pub date: NaiveDate,
    pub tile: TileCoord,
    pub window_days: u32,
}

/// Mock metric source for tests and offline runs
///
/// Serves a configurable last date and deterministic synthetic frame
/// payloads, and records every frame request it receives.
pub struct MockMetricSource {
    state: Mutex<MockState>,
}

struct MockState {
    last_date: NaiveDate,
    fail_last_date: bool,
    fail_frames: bool,
    latency: Option<Duration>,
    metrics: HashMap<(String, NaiveDate), MetricDetail>,
    frame_requests: Vec<FrameRequest>,
}

impl MockMetricSource {
    pub fn new(last_date: NaiveDate) -> Self {
        Self {
            state: Mutex::new(MockState {
                last_date,
                fail_last_date: false,
                fail_frames: false,
                latency: None,
                metrics: HashMap::new(),
                frame_requests: Vec::new(),
            }),
        }
    }

    /// Move the anchor date the source reports
    pub async fn set_last_date(&self, date: NaiveDate) {
        self.state.lock().await.last_date = date;
    }

    /// Make the last-date fetch fail until cleared
    pub async fn set_last_date_failure(&self, failing: bool) {
        self.state.lock().await.fail_last_date = failing;
    }

    /// Make frame fetches fail until cleared (requests are still recorded)
    pub async fn set_frame_failure(&self, failing: bool) {
        self.state.lock().await.fail_frames = failing;
    }

    /// Delay every request by the given duration
    pub async fn set_latency(&self, latency: Duration) {
        self.state.lock().await.latency = Some(latency);
    }

    /// Seed a region metric record, keyed by region code and date
    pub async fn insert_metric(&self, metric: MetricDetail) {
        let key = (metric.region.code.clone(), metric.date);
        self.state.lock().await.metrics.insert(key, metric);
    }

    /// Drain all recorded frame requests (for verification)
    pub async fn take_frame_requests(&self) -> Vec<FrameRequest> {
        self.state.lock().await.frame_requests.drain(..).collect()
    }
}

/// Deterministic payload bytes for one tile request
fn synthetic_payload(date: NaiveDate, tile: TileCoord, window_days: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(20);
    bytes.extend_from_slice(&tile.z.to_be_bytes());
    bytes.extend_from_slice(&tile.x.to_be_bytes());
    bytes.extend_from_slice(&tile.y.to_be_bytes());
    bytes.extend_from_slice(&day_index_in_year(date).to_be_bytes());
    bytes.extend_from_slice(&window_days.to_be_bytes());
    bytes
}

#[async_trait]
impl MetricSource for MockMetricSource {
    async fn last_available_date(&self) -> SourceResult<NaiveDate> {
        let (latency, result) = {
            let state = self.state.lock().await;
            let result = if state.fail_last_date {
                Err(SourceError::Unavailable("injected last-date failure".into()))
            } else {
                Ok(state.last_date)
            };
            (state.latency, result)
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_frame(
        &self,
        date: NaiveDate,
        tile: TileCoord,
        window_days: u32,
    ) -> SourceResult<FramePayload> {
        let (latency, failing) = {
            let mut state = self.state.lock().await;
            state.frame_requests.push(FrameRequest { date, tile, window_days });
            (state.latency, state.fail_frames)
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(SourceError::Unavailable("injected frame failure".into()));
        }
        Ok(FramePayload {
            date,
            tile,
            bytes: synthetic_payload(date, tile, window_days),
        })
    }

    async fn region_metric(
        &self,
        region_code: &str,
        date: NaiveDate,
    ) -> SourceResult<Option<MetricDetail>> {
        let (latency, result) = {
            let state = self.state.lock().await;
            let key = (region_code.to_string(), date);
            (state.latency, state.metrics.get(&key).cloned())
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        Ok(result)
    }
}
