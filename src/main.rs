mod core;
mod detail;
mod playback;
mod render;
mod source;

use crate::core::date::{formatted_date, subtract_days};
use crate::core::metric::trend_with_dates;
use crate::core::style::classify_anomaly;
use crate::core::{DateAxis, MetricDetail, RegionRef};
use crate::detail::SelectionStore;
use crate::playback::{PlaybackPhase, PlaybackScheduler, PlaybackTuning};
use crate::render::FramePipeline;
use crate::source::{HttpMetricSource, MetricSource, MockMetricSource, TileCoord};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Trailing days of the window summarized in the closing trend
const TREND_DAYS: usize = 7;

/// Steps the walk takes before the demo region drill-in
const DRILL_AFTER_STEPS: u64 = 5;

/// Persistent application settings
#[derive(Serialize, Deserialize)]
struct AppSettings {
    /// Base URL of the metrics service
    api_base_url: String,
    /// Use the synthetic data source instead of the metrics service
    offline: bool,
    /// Map tiles fetched for every rendered date
    tiles: Vec<TileCoord>,
    /// Playback window length in days
    window_days: u32,
    /// Date to start the walk from; beginning of the window when unset
    start_date: Option<NaiveDate>,
    /// Region drilled into partway through the walk
    demo_region_code: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            offline: false,
            // Tile covering Spain at the map's initial zoom
            tiles: vec![TileCoord::new(6, 31, 24)],
            window_days: 30,
            start_date: None,
            demo_region_code: None,
        }
    }
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("anomap").join("settings.json"))
    }

    fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(settings) = serde_json::from_str(&contents) {
                        return settings;
                    }
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(&path, json);
            }
        }
    }

    /// Environment variables take precedence over the settings file
    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("ANOMAP_API_BASE_URL") {
            self.api_base_url = base;
        }
        if std::env::var_os("ANOMAP_OFFLINE").is_some() {
            self.offline = true;
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut settings = AppSettings::load();
    settings.apply_env_overrides();

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let result = rt.block_on(run(&settings));

    settings.save();
    result
}

/// Wire the scheduler, render pipeline and detail store together, then
/// walk the playback window once
async fn run(settings: &AppSettings) -> anyhow::Result<()> {
    let source: Arc<dyn MetricSource> = if settings.offline {
        let today = chrono::Utc::now().date_naive();
        info!("Using the synthetic data source (last date {})", today);
        let mock = Arc::new(MockMetricSource::new(today));
        mock.set_latency(Duration::from_millis(50)).await;
        if let Some(code) = &settings.demo_region_code {
            seed_demo_metrics(&mock, code, today, settings.window_days).await;
        }
        mock
    } else {
        let http = HttpMetricSource::new(&settings.api_base_url)?;
        info!("Metrics service: {}", http.base_url());
        Arc::new(http)
    };

    let selection = Arc::new(SelectionStore::new());
    let tuning = PlaybackTuning {
        window_days: settings.window_days,
        ..PlaybackTuning::default()
    };
    let scheduler = Arc::new(PlaybackScheduler::new(
        source.clone(),
        selection.clone(),
        tuning,
    ));

    // The pipeline follows the published playback date and signals the
    // render gate after every frame
    let pipeline = FramePipeline::new(
        source.clone(),
        scheduler.render_gate(),
        settings.tiles.clone(),
        scheduler.tuning().window_days,
    );
    let pipeline_task = tokio::spawn(pipeline.run(scheduler.date_feed()));

    scheduler.enable().await.context("Could not start playback")?;
    match settings.start_date {
        Some(date) => {
            if !scheduler.seek_to_date(date).await {
                warn!("{} is outside the playback window, starting at the beginning", date);
                scheduler.seek_to(0).await;
            }
        }
        None => scheduler.seek_to(0).await,
    }
    scheduler.play().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, pausing playback");
                scheduler.pause().await;
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                let snap = scheduler.snapshot().await;
                if snap.phase == PlaybackPhase::Finished {
                    break;
                }
                if let Some(code) = &settings.demo_region_code {
                    // Drill into the demo region once, partway through the walk
                    if !selection.is_selected() && snap.stats.steps >= DRILL_AFTER_STEPS {
                        inspect_region(&scheduler, &selection, source.as_ref(), code).await;
                    }
                }
            }
        }
    }

    let snap = scheduler.snapshot().await;
    let ended_on = snap
        .current_date
        .map(formatted_date)
        .unwrap_or_else(|| "-".to_string());
    info!(
        "Walk ended on {} (day {} of {}): {} steps, {} render timeouts",
        ended_on,
        snap.current_index + 1,
        snap.axis_len,
        snap.stats.steps,
        snap.stats.render_timeouts
    );

    let axis = scheduler.axis().await;
    log_region_trend(source.as_ref(), &selection, &axis).await;

    scheduler.disable().await;
    // Dropping the scheduler closes the date feed and lets the pipeline exit
    drop(scheduler);
    let _ = pipeline_task.await;
    Ok(())
}

/// Pause the walk, fetch the figures for one region, then resume
///
/// Mirrors the selection flow of the map: picking a region suspends
/// playback while its record is shown.
async fn inspect_region(
    scheduler: &PlaybackScheduler,
    selection: &SelectionStore,
    source: &dyn MetricSource,
    region_code: &str,
) {
    scheduler.pause().await;
    let date = match scheduler.current_date().await {
        Some(date) => date,
        None => return,
    };

    // The record id is only known once the record arrives
    selection.select(region_code, region_code);
    match selection.current_metric(source, date).await {
        Ok(Some(metric)) => {
            selection.select(&metric.id, &metric.region.code);
            let figures = metric.figures();
            let class = classify_anomaly(metric.anomaly_degree.unwrap_or(f64::NAN));
            info!(
                "{} ({}) on {}: value {:.1}% (predicted {:.1}%, range {:.1}%..{:.1}%), anomaly {:.1}% ({}, {})",
                metric.region.name,
                metric.region.code,
                formatted_date(date),
                figures.value,
                figures.predicted_value,
                figures.lower_value,
                figures.upper_value,
                figures.anomaly_degree,
                class.label(),
                class.color()
            );
        }
        Ok(None) => info!("No record for region {} on {}", region_code, formatted_date(date)),
        Err(e) => warn!("Region lookup failed: {}", e),
    }

    // play() is a no-op while the paused loop is still unwinding; retry
    // until the walk is moving again
    loop {
        scheduler.play().await;
        let phase = scheduler.snapshot().await.phase;
        if phase == PlaybackPhase::Playing || phase == PlaybackPhase::Finished {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Log a short value trend for the selected region over the tail of the
/// playback window
async fn log_region_trend(
    source: &dyn MetricSource,
    selection: &SelectionStore,
    axis: &DateAxis,
) {
    let sel = match selection.selected() {
        Some(sel) => sel,
        None => return,
    };
    if axis.is_empty() {
        return;
    }

    let from = axis.len().saturating_sub(TREND_DAYS);
    let recent = &axis.dates()[from..];
    let mut values = Vec::with_capacity(recent.len());
    for date in recent {
        match source.region_metric(&sel.region_code, *date).await {
            Ok(Some(metric)) => values.push(metric.value.unwrap_or(0.0)),
            Ok(None) => values.push(0.0),
            Err(e) => {
                warn!("Trend fetch failed for {}: {}", date, e);
                values.push(0.0);
            }
        }
    }

    let last = match recent.last() {
        Some(last) => *last,
        None => return,
    };
    info!(
        "{}-day trend for metric {} ({})",
        recent.len(),
        sel.metric_id,
        sel.region_code
    );
    for point in trend_with_dates(&values, last) {
        info!("  {}  {:.1}%", formatted_date(point.date), point.value);
    }
}

/// Seed the synthetic source with a plausible series for the demo region
async fn seed_demo_metrics(
    mock: &MockMetricSource,
    region_code: &str,
    last_date: NaiveDate,
    window_days: u32,
) {
    for offset in 0..window_days {
        let date = subtract_days(last_date, offset);
        let phase = offset as f64 / window_days.max(1) as f64;
        let anomaly = match offset % 4 {
            0 => 0.12,
            2 => -0.08,
            _ => 0.0,
        };
        mock.insert_metric(MetricDetail {
            id: format!("demo-{}-{}", region_code, date),
            date,
            region: RegionRef {
                id: 1,
                code: region_code.to_string(),
                name: format!("Region {}", region_code),
            },
            value: Some(0.15 + 0.55 * phase),
            predicted_value: Some(0.15 + 0.5 * phase),
            lower_value: Some(0.1 + 0.45 * phase),
            upper_value: Some(0.2 + 0.6 * phase),
            anomaly_degree: Some(anomaly),
        })
        .await;
    }
}
