use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::core::MetricDetail;
use crate::source::metric_source::{
    FramePayload, MetricSource, SourceError, SourceResult, TileCoord,
};
use async_trait::async_trait;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

/// Client for the anomaly-map data service HTTP API
pub struct HttpMetricSource {
    client: Client,
    base_url: String,
}

/// Body of the last-available-date endpoint
#[derive(Debug, Deserialize)]
struct LastDateBody {
    date: NaiveDate,
}

/// Paginated metric list as served by the metrics endpoint
#[derive(Debug, Deserialize)]
struct MetricListBody {
    #[allow(dead_code)]
    count: u64,
    results: Vec<MetricDetail>,
}

impl HttpMetricSource {
    pub fn new(base_url: &str) -> SourceResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_bytes(&self, url: &str) -> SourceResult<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn last_available_date(&self) -> SourceResult<NaiveDate> {
        let url = last_date_url(&self.base_url);
        let body = self.get_bytes(&url).await?;
        let parsed: LastDateBody = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Decode(format!("last-date body: {}", e)))?;
        Ok(parsed.date)
    }

    async fn fetch_frame(
        &self,
        date: NaiveDate,
        tile: TileCoord,
        window_days: u32,
    ) -> SourceResult<FramePayload> {
        let url = frame_url(&self.base_url, date, tile, window_days);
        let bytes = self.get_bytes(&url).await?;
        debug!("Fetched {} payload bytes for tile {} on {}", bytes.len(), tile, date);
        Ok(FramePayload { date, tile, bytes })
    }

    async fn region_metric(
        &self,
        region_code: &str,
        date: NaiveDate,
    ) -> SourceResult<Option<MetricDetail>> {
        let url = region_metrics_url(&self.base_url, region_code, date);
        let body = self.get_bytes(&url).await?;
        let parsed: MetricListBody = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Decode(format!("metric list body: {}", e)))?;
        Ok(parsed.results.into_iter().next())
    }
}

fn last_date_url(base: &str) -> String {
    format!("{}/api/metrics/last-date/", base)
}

fn frame_url(base: &str, date: NaiveDate, tile: TileCoord, days: u32) -> String {
    format!(
        "{}/api/metrics/timeseries-tiles/{}/{}/{}/?date={}&days={}",
        base, tile.z, tile.x, tile.y, date, days
    )
}

fn region_metrics_url(base: &str, region_code: &str, date: NaiveDate) -> String {
    format!(
        "{}/api/metrics/?region_code={}&date_from={}&date_to={}&page=1&page_size=1",
        base, region_code, date, date
    )
}
