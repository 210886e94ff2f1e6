pub mod gate;
pub mod scheduler;

pub use gate::{RenderGate, WaitOutcome};
pub use scheduler::{PlaybackScheduler, PlaybackSnapshot};

use std::time::Duration;
use thiserror::Error;

use crate::core::axis::AxisError;
use crate::source::SourceError;

/// Playback phase visible to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Disabled,
    Paused,
    Playing,
    Finished,
}

/// Playback timing configuration
#[derive(Debug, Clone)]
pub struct PlaybackTuning {
    /// Length of the playback window in days
    pub window_days: u32,
    /// Pace of the run loop, per advanced day
    pub step_delay: Duration,
    /// Extra settle time after each synchronized step
    pub settle_delay: Duration,
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            window_days: 30,
            step_delay: Duration::from_millis(750),
            settle_delay: Duration::from_millis(200),
        }
    }
}

impl PlaybackTuning {
    /// Longest time the run loop waits for a render completion before
    /// advancing anyway
    pub fn render_wait(&self) -> Duration {
        self.step_delay
    }
}

/// Per-session playback counters, zeroed on enable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub steps: u64,
    pub render_timeouts: u64,
}

/// Port for clearing a stale detail selection when a playback session
/// starts over
pub trait SelectionReset: Send + Sync {
    fn reset_selection(&self);
}

/// Errors surfaced by playback lifecycle operations
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("invalid playback window: {0}")]
    Axis(#[from] AxisError),

    #[error("data source failure: {0}")]
    Source(#[from] SourceError),
}
