use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::core::date::{day_index_in_year, formatted_date};
use crate::core::style::{rgb_to_hex, value_color};
use crate::playback::RenderGate;
use crate::source::{MetricSource, TileCoord};

/// Headless render pipeline driven by the published playback date
///
/// For each date it fetches the frame payload for every configured tile,
/// logs a one-line summary and signals the render gate so the scheduler
/// can take its next step. A failed fetch is logged and the gate is still
/// signalled; the scheduler's own timeout fallback covers a pipeline that
/// dies entirely.
pub struct FramePipeline {
    source: Arc<dyn MetricSource>,
    gate: Arc<RenderGate>,
    tiles: Vec<TileCoord>,
    window_days: u32,
}

impl FramePipeline {
    pub fn new(
        source: Arc<dyn MetricSource>,
        gate: Arc<RenderGate>,
        tiles: Vec<TileCoord>,
        window_days: u32,
    ) -> Self {
        Self { source, gate, tiles, window_days }
    }

    /// Consume the date feed until the channel closes
    pub async fn run(self, mut feed: watch::Receiver<Option<NaiveDate>>) {
        while feed.changed().await.is_ok() {
            let current = *feed.borrow();
            match current {
                Some(date) => self.render(date).await,
                None => debug!("Playback disabled, nothing to render"),
            }
        }
        debug!("Date feed closed, render pipeline exiting");
    }

    async fn render(&self, date: NaiveDate) {
        let started = Instant::now();
        let mut total_bytes = 0usize;
        for tile in &self.tiles {
            match self.source.fetch_frame(date, *tile, self.window_days).await {
                Ok(payload) => {
                    debug!(
                        "Tile {} frame for {}: {} bytes",
                        payload.tile,
                        payload.date,
                        payload.bytes.len()
                    );
                    total_bytes += payload.bytes.len();
                }
                Err(e) => warn!("Frame fetch failed for tile {} on {}: {}", tile, date, e),
            }
        }

        let swatch = rgb_to_hex(value_color(day_index_in_year(date) as f64 / 365.0));
        info!(
            "Rendered {}: {} tiles, {} bytes, swatch {} in {:?}",
            formatted_date(date),
            self.tiles.len(),
            total_bytes,
            swatch,
            started.elapsed()
        );
        self.gate.complete();
    }
}
