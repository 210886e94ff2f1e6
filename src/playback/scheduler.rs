use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::core::axis::DateAxis;
use crate::playback::gate::{RenderGate, WaitOutcome};
use crate::playback::{
    PlaybackError, PlaybackPhase, PlaybackStats, PlaybackTuning, SelectionReset,
};
use crate::source::MetricSource;

/// Internal playback state, owned exclusively by the scheduler
struct PlaybackState {
    enabled: bool,
    paused: bool,
    finished: bool,
    current_index: usize,
    axis: DateAxis,
    stats: PlaybackStats,
    /// Bumped on every enable; run loops from older sessions abort
    session: u64,
}

impl PlaybackState {
    fn new() -> Self {
        Self {
            enabled: false,
            paused: true,
            finished: false,
            current_index: 0,
            axis: DateAxis::empty(),
            stats: PlaybackStats::default(),
            session: 0,
        }
    }

    fn current_date(&self) -> Option<NaiveDate> {
        if self.enabled {
            self.axis.date_at(self.current_index)
        } else {
            None
        }
    }

    fn phase(&self) -> PlaybackPhase {
        if !self.enabled {
            PlaybackPhase::Disabled
        } else if self.finished {
            PlaybackPhase::Finished
        } else if self.paused {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Playing
        }
    }
}

/// Read-only view of the playback state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub enabled: bool,
    pub paused: bool,
    pub finished: bool,
    pub current_index: usize,
    pub axis_len: usize,
    pub current_date: Option<NaiveDate>,
    pub stats: PlaybackStats,
}

/// Timeline playback scheduler
///
/// Owns the date axis and the playback cursor, and drives a run loop that
/// advances the cursor one day per synchronized tick. Each tick publishes
/// the new date for renderers, waits on the render gate (with a timeout
/// fallback so a stalled renderer never wedges playback), then idles for
/// the settle delay. Pause, seek and disable are observed cooperatively at
/// the next checkpoint of the loop.
pub struct PlaybackScheduler {
    state: Arc<Mutex<PlaybackState>>,
    tuning: PlaybackTuning,
    source: Arc<dyn MetricSource>,
    selection: Arc<dyn SelectionReset>,
    gate: Arc<RenderGate>,
    date_tx: watch::Sender<Option<NaiveDate>>,
    /// True while a run loop task exists; guards against double spawns
    loop_active: Arc<AtomicBool>,
}

impl PlaybackScheduler {
    pub fn new(
        source: Arc<dyn MetricSource>,
        selection: Arc<dyn SelectionReset>,
        tuning: PlaybackTuning,
    ) -> Self {
        let (date_tx, _) = watch::channel(None);
        Self {
            state: Arc::new(Mutex::new(PlaybackState::new())),
            tuning,
            source,
            selection,
            gate: Arc::new(RenderGate::new()),
            date_tx,
            loop_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn tuning(&self) -> &PlaybackTuning {
        &self.tuning
    }

    /// Feed of the published current date (`None` while disabled)
    pub fn date_feed(&self) -> watch::Receiver<Option<NaiveDate>> {
        self.date_tx.subscribe()
    }

    /// Gate the render pipeline signals after each visual update
    pub fn render_gate(&self) -> Arc<RenderGate> {
        self.gate.clone()
    }

    /// Start a playback session anchored at the most recent available date
    ///
    /// Builds a fresh axis covering the configured window, parks the cursor
    /// on the anchor date and clears any stale detail selection. Idempotent
    /// while already enabled. On a data-source failure playback stays
    /// disabled.
    pub async fn enable(&self) -> Result<(), PlaybackError> {
        if self.state.lock().await.enabled {
            return Ok(());
        }

        // Fetched outside the lock; the anchor decides the whole window
        let last_date = self.source.last_available_date().await?;
        let axis = DateAxis::ending_at(last_date, self.tuning.window_days)?;

        let published = {
            let mut state = self.state.lock().await;
            if state.enabled {
                return Ok(());
            }
            state.session += 1;
            state.axis = axis;
            state.current_index = state.axis.last_index().unwrap_or(0);
            state.enabled = true;
            state.paused = true;
            state.finished = false;
            state.stats = PlaybackStats::default();
            state.current_date()
        };

        self.selection.reset_selection();
        self.date_tx.send_replace(published);
        info!(
            "Playback enabled: {}-day window ending {}",
            self.tuning.window_days, last_date
        );
        Ok(())
    }

    /// End the playback session and clear the axis
    pub async fn disable(&self) {
        {
            let mut state = self.state.lock().await;
            state.enabled = false;
            state.paused = true;
            state.finished = false;
            state.current_index = 0;
            state.axis = DateAxis::empty();
        }
        self.date_tx.send_replace(None);
        info!("Playback disabled");
    }

    /// Enable or disable depending on the current state
    pub async fn toggle_playback(&self) -> Result<(), PlaybackError> {
        let enabled = self.state.lock().await.enabled;
        if enabled {
            self.disable().await;
            Ok(())
        } else {
            self.enable().await
        }
    }

    /// Disable and re-enable, re-anchoring against the current last
    /// available date
    pub async fn reset(&self) -> Result<(), PlaybackError> {
        self.disable().await;
        self.enable().await
    }

    /// Resume advancement from the current cursor position
    ///
    /// Only effective while enabled and paused. At most one run loop exists
    /// per scheduler; a `play()` arriving while the previous loop is still
    /// unwinding leaves the pause flag untouched and can be retried.
    pub async fn play(&self) {
        let session = {
            let mut state = self.state.lock().await;
            if !state.enabled || !state.paused {
                return;
            }
            if self.loop_active.swap(true, Ordering::SeqCst) {
                return;
            }
            state.paused = false;
            state.session
        };

        let state = self.state.clone();
        let tuning = self.tuning.clone();
        let gate = self.gate.clone();
        let date_tx = self.date_tx.clone();
        let loop_active = self.loop_active.clone();
        tokio::spawn(async move {
            Self::run_loop(state, tuning, gate, date_tx, loop_active, session).await;
        });
    }

    /// Halt advancement; the run loop observes this at its next checkpoint
    pub async fn pause(&self) {
        let mut state = self.state.lock().await;
        if state.enabled && !state.paused {
            state.paused = true;
            debug!("Playback pause requested");
        }
    }

    /// Move the cursor to `target`, clamped into the axis bounds
    ///
    /// Publishes the new date so a paused renderer refreshes. Never starts
    /// the run loop; a running loop continues from the sought position.
    pub async fn seek_to(&self, target: i64) {
        let published = {
            let mut state = self.state.lock().await;
            Self::apply_seek(&mut state, target)
        };
        if let Some(date) = published {
            self.date_tx.send_replace(Some(date));
        }
    }

    /// Jump the cursor to a specific calendar date
    ///
    /// Returns `false` and leaves the cursor alone when the date is not on
    /// the axis or playback is disabled. Never starts the run loop.
    pub async fn seek_to_date(&self, date: NaiveDate) -> bool {
        let published = {
            let mut state = self.state.lock().await;
            let index = match state.axis.index_of(date) {
                Some(index) => index,
                None => return false,
            };
            Self::apply_seek(&mut state, index as i64)
        };
        match published {
            Some(date) => {
                self.date_tx.send_replace(Some(date));
                true
            }
            None => false,
        }
    }

    /// Move the cursor back by `steps` days, clamped at the axis start
    pub async fn step_back(&self, steps: u32) {
        let published = {
            let mut state = self.state.lock().await;
            let target = state.current_index as i64 - steps as i64;
            Self::apply_seek(&mut state, target)
        };
        if let Some(date) = published {
            self.date_tx.send_replace(Some(date));
        }
    }

    /// Move the cursor forward by `steps` days, clamped at the axis end
    pub async fn step_forward(&self, steps: u32) {
        let published = {
            let mut state = self.state.lock().await;
            let target = state.current_index as i64 + steps as i64;
            Self::apply_seek(&mut state, target)
        };
        if let Some(date) = published {
            self.date_tx.send_replace(Some(date));
        }
    }

    /// Clamp `target` into the axis and move the cursor there, recomputing
    /// the finished flag. Returns the date to publish, if any.
    fn apply_seek(state: &mut PlaybackState, target: i64) -> Option<NaiveDate> {
        if !state.enabled {
            return None;
        }
        let index = state.axis.clamp_index(target)?;
        state.current_index = index;
        state.finished = state.axis.last_index() == Some(index);
        state.current_date()
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.state.lock().await;
        PlaybackSnapshot {
            phase: state.phase(),
            enabled: state.enabled,
            paused: state.paused,
            finished: state.finished,
            current_index: state.current_index,
            axis_len: state.axis.len(),
            current_date: state.current_date(),
            stats: state.stats,
        }
    }

    pub async fn current_date(&self) -> Option<NaiveDate> {
        self.state.lock().await.current_date()
    }

    /// The date axis of the current session (empty while disabled)
    pub async fn axis(&self) -> DateAxis {
        self.state.lock().await.axis.clone()
    }

    async fn run_loop(
        state: Arc<Mutex<PlaybackState>>,
        tuning: PlaybackTuning,
        gate: Arc<RenderGate>,
        date_tx: watch::Sender<Option<NaiveDate>>,
        loop_active: Arc<AtomicBool>,
        session: u64,
    ) {
        debug!("Playback loop started (session {})", session);
        loop {
            // Checkpoint: advance under the lock, or stop
            let published = {
                let mut state = state.lock().await;
                if state.session != session {
                    // A newer session owns these flags now
                    loop_active.store(false, Ordering::SeqCst);
                    debug!("Playback loop superseded (session {})", session);
                    return;
                }
                if !state.enabled || state.paused {
                    // The stop may have landed while the final step was in
                    // flight, with the cursor already on the last index
                    if state.axis.last_index() == Some(state.current_index) {
                        state.finished = true;
                    }
                    loop_active.store(false, Ordering::SeqCst);
                    debug!("Playback loop stopped (session {})", session);
                    return;
                }
                let at_end = match state.axis.last_index() {
                    Some(last) => state.current_index >= last,
                    None => true,
                };
                if at_end {
                    state.paused = true;
                    state.finished = true;
                    loop_active.store(false, Ordering::SeqCst);
                    info!(
                        "Playback finished after {} steps ({} render timeouts)",
                        state.stats.steps, state.stats.render_timeouts
                    );
                    return;
                }
                state.current_index += 1;
                state.stats.steps += 1;
                // Armed before publishing so a completion from the previous
                // step can never satisfy this one
                gate.arm();
                state.current_date()
            };
            date_tx.send_replace(published);

            if let WaitOutcome::TimedOut = gate.wait(tuning.render_wait()).await {
                warn!(
                    "No render completion within {:?}, advancing anyway",
                    tuning.render_wait()
                );
                let mut state = state.lock().await;
                // disable() keeps the session number, so check the flag too
                if state.session == session && state.enabled {
                    state.stats.render_timeouts += 1;
                }
            }

            tokio::time::sleep(tuning.settle_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMetricSource;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct RecordingSelection {
        resets: AtomicUsize,
    }

    impl RecordingSelection {
        fn new() -> Arc<Self> {
            Arc::new(Self { resets: AtomicUsize::new(0) })
        }

        fn count(&self) -> usize {
            self.resets.load(Ordering::SeqCst)
        }
    }

    impl SelectionReset for RecordingSelection {
        fn reset_selection(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn make_scheduler(
        last: &str,
        window_days: u32,
    ) -> (Arc<PlaybackScheduler>, Arc<MockMetricSource>, Arc<RecordingSelection>) {
        let source = Arc::new(MockMetricSource::new(date(last)));
        let selection = RecordingSelection::new();
        let tuning = PlaybackTuning { window_days, ..PlaybackTuning::default() };
        let scheduler = Arc::new(PlaybackScheduler::new(
            source.clone(),
            selection.clone(),
            tuning,
        ));
        (scheduler, source, selection)
    }

    /// Renderer stand-in: records every published date and immediately
    /// signals the gate
    fn spawn_renderer(scheduler: &Arc<PlaybackScheduler>) -> Arc<StdMutex<Vec<NaiveDate>>> {
        let recorded = Arc::new(StdMutex::new(Vec::new()));
        let gate = scheduler.render_gate();
        let mut feed = scheduler.date_feed();
        let sink = recorded.clone();
        tokio::spawn(async move {
            while feed.changed().await.is_ok() {
                let current = *feed.borrow();
                if let Some(date) = current {
                    sink.lock().unwrap().push(date);
                    gate.complete();
                }
            }
        });
        recorded
    }

    async fn wait_until_finished(scheduler: &PlaybackScheduler) {
        for _ in 0..2000 {
            if scheduler.snapshot().await.phase == PlaybackPhase::Finished {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("playback did not finish in time");
    }

    #[tokio::test]
    async fn test_enable_builds_window_and_starts_at_last_date() {
        let (scheduler, _source, selection) = make_scheduler("2025-01-31", 30);
        scheduler.enable().await.unwrap();

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.phase, PlaybackPhase::Paused);
        assert_eq!(snap.axis_len, 30);
        assert_eq!(snap.current_index, 29);
        assert_eq!(snap.current_date, Some(date("2025-01-31")));
        assert!(!snap.finished);
        assert_eq!(selection.count(), 1);

        let axis = scheduler.axis().await;
        assert_eq!(axis.first(), Some(date("2025-01-02")));
        assert_eq!(axis.last(), Some(date("2025-01-31")));

        // the anchor date is published for observers
        assert_eq!(*scheduler.date_feed().borrow(), Some(date("2025-01-31")));

        // enabling twice is a no-op
        scheduler.enable().await.unwrap();
        assert_eq!(selection.count(), 1);
        assert_eq!(scheduler.snapshot().await.current_index, 29);
    }

    #[tokio::test]
    async fn test_enable_source_failure_leaves_playback_disabled() {
        let (scheduler, source, selection) = make_scheduler("2025-01-31", 30);
        source.set_last_date_failure(true).await;

        let err = scheduler.enable().await.unwrap_err();
        assert!(matches!(err, PlaybackError::Source(_)));
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.phase, PlaybackPhase::Disabled);
        assert_eq!(snap.axis_len, 0);
        assert_eq!(selection.count(), 0);
        assert_eq!(*scheduler.date_feed().borrow(), None);

        // recovers once the source does
        source.set_last_date_failure(false).await;
        scheduler.enable().await.unwrap();
        assert_eq!(scheduler.snapshot().await.phase, PlaybackPhase::Paused);
    }

    #[tokio::test]
    async fn test_disable_clears_session() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 30);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(5).await;

        scheduler.disable().await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.phase, PlaybackPhase::Disabled);
        assert_eq!(snap.current_index, 0);
        assert_eq!(snap.axis_len, 0);
        assert_eq!(snap.current_date, None);
        assert_eq!(*scheduler.date_feed().borrow(), None);
    }

    #[tokio::test]
    async fn test_toggle_playback_flips_between_enabled_and_disabled() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 30);
        scheduler.toggle_playback().await.unwrap();
        assert!(scheduler.snapshot().await.enabled);
        scheduler.toggle_playback().await.unwrap();
        assert_eq!(scheduler.snapshot().await.phase, PlaybackPhase::Disabled);
    }

    #[tokio::test]
    async fn test_seek_clamps_to_axis_bounds() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.enable().await.unwrap();

        scheduler.seek_to(-3).await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 0);
        assert_eq!(snap.current_date, Some(date("2025-01-27")));
        assert!(!snap.finished);

        scheduler.seek_to(99).await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 4);
        assert!(snap.finished);
        assert_eq!(snap.phase, PlaybackPhase::Finished);

        scheduler.seek_to(2).await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 2);
        assert!(!snap.finished);

        // the sought date is published for paused renderers
        assert_eq!(*scheduler.date_feed().borrow(), Some(date("2025-01-29")));
    }

    #[tokio::test]
    async fn test_steps_clamp_at_axis_edges() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.enable().await.unwrap();
        assert_eq!(scheduler.snapshot().await.current_index, 4);

        scheduler.step_back(2).await;
        assert_eq!(scheduler.snapshot().await.current_index, 2);

        scheduler.step_forward(10).await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 4);
        assert!(snap.finished);

        scheduler.step_back(100).await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 0);
        assert!(!snap.finished);
    }

    #[tokio::test]
    async fn test_seek_to_date_jumps_to_matching_index() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.enable().await.unwrap();

        assert!(scheduler.seek_to_date(date("2025-01-28")).await);
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 1);
        assert!(!snap.finished);
        assert_eq!(*scheduler.date_feed().borrow(), Some(date("2025-01-28")));

        // off-axis dates leave the cursor alone
        assert!(!scheduler.seek_to_date(date("2024-12-25")).await);
        assert_eq!(scheduler.snapshot().await.current_index, 1);

        assert!(scheduler.seek_to_date(date("2025-01-31")).await);
        assert!(scheduler.snapshot().await.finished);
    }

    #[tokio::test]
    async fn test_seek_on_disabled_scheduler_is_ignored() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.seek_to(3).await;
        scheduler.step_forward(2).await;
        assert!(!scheduler.seek_to_date(date("2025-01-29")).await);
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.phase, PlaybackPhase::Disabled);
        assert_eq!(snap.current_index, 0);
        assert_eq!(*scheduler.date_feed().borrow(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_runs_to_end_one_day_per_tick() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;

        let recorded = spawn_renderer(&scheduler);
        scheduler.play().await;
        wait_until_finished(&scheduler).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 4);
        assert!(snap.paused);
        assert!(snap.finished);
        assert_eq!(snap.stats.steps, 4);
        assert_eq!(snap.stats.render_timeouts, 0);

        let dates = recorded.lock().unwrap().clone();
        assert_eq!(
            dates,
            vec![
                date("2025-01-28"),
                date("2025-01-29"),
                date("2025-01-30"),
                date("2025-01-31"),
            ]
        );
        for pair in dates.windows(2) {
            assert_eq!(pair[1], pair[0].succ_opt().unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_play_does_not_double_advance() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;
        let _recorded = spawn_renderer(&scheduler);

        scheduler.play().await;
        scheduler.play().await;
        wait_until_finished(&scheduler).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 4);
        assert_eq!(snap.stats.steps, 4);

        // playing again at the end changes nothing
        scheduler.play().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let snap = scheduler.snapshot().await;
        assert_eq!(snap.phase, PlaybackPhase::Finished);
        assert_eq!(snap.stats.steps, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_cursor_and_play_resumes() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 30);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;
        let _recorded = spawn_renderer(&scheduler);

        scheduler.play().await;
        tokio::time::sleep(Duration::from_millis(450)).await;
        scheduler.pause().await;
        // let the in-flight step drain
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let held = scheduler.snapshot().await;
        assert_eq!(held.phase, PlaybackPhase::Paused);
        assert!(held.current_index >= 1);
        assert!(held.current_index < 29);

        // the cursor must not drift while paused
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(scheduler.snapshot().await.current_index, held.current_index);

        scheduler.play().await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let resumed = scheduler.snapshot().await;
        assert!(resumed.current_index > held.current_index);
        assert_eq!(resumed.phase, PlaybackPhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_during_final_step_still_marks_finished() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 2);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;
        let _recorded = spawn_renderer(&scheduler);

        scheduler.play().await;
        // the only step lands on the last index; pause while it settles
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.pause().await;
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 1);
        assert!(snap.paused);
        assert!(snap.finished);
        assert_eq!(snap.phase, PlaybackPhase::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_renderer_times_out_and_still_advances() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 3);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;

        // no renderer: every step must ride the timeout fallback
        let start = tokio::time::Instant::now();
        scheduler.play().await;
        wait_until_finished(&scheduler).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 2);
        assert_eq!(snap.stats.steps, 2);
        assert_eq!(snap.stats.render_timeouts, 2);
        // two full render waits plus settle delays
        assert!(start.elapsed() >= Duration::from_millis(2 * 950));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_disable_is_not_counted() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 5);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;

        // no renderer: the first step parks in its render wait
        scheduler.play().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.disable().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.phase, PlaybackPhase::Disabled);
        assert_eq!(snap.stats.render_timeouts, 0);
    }

    #[tokio::test]
    async fn test_reset_reanchors_against_new_last_date() {
        let (scheduler, source, selection) = make_scheduler("2025-01-31", 30);
        scheduler.enable().await.unwrap();
        assert_eq!(scheduler.current_date().await, Some(date("2025-01-31")));

        source.set_last_date(date("2025-02-15")).await;
        scheduler.reset().await.unwrap();

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_date, Some(date("2025-02-15")));
        assert_eq!(snap.phase, PlaybackPhase::Paused);
        let axis = scheduler.axis().await;
        assert_eq!(axis.first(), Some(date("2025-01-17")));
        assert_eq!(selection.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_on_single_day_axis_finishes_immediately() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 1);
        scheduler.enable().await.unwrap();
        assert_eq!(scheduler.snapshot().await.current_index, 0);

        scheduler.play().await;
        wait_until_finished(&scheduler).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 0);
        assert_eq!(snap.stats.steps, 0);
        assert!(snap.finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_while_running_continues_from_new_position() {
        let (scheduler, _source, _selection) = make_scheduler("2025-01-31", 30);
        scheduler.enable().await.unwrap();
        scheduler.seek_to(0).await;
        let recorded = spawn_renderer(&scheduler);

        scheduler.play().await;
        tokio::time::sleep(Duration::from_millis(450)).await;
        scheduler.seek_to(20).await;
        wait_until_finished(&scheduler).await;

        let snap = scheduler.snapshot().await;
        assert_eq!(snap.current_index, 29);
        assert_eq!(snap.current_date, Some(date("2025-01-31")));

        // after the jump the loop keeps stepping from the sought position
        let dates = recorded.lock().unwrap().clone();
        let axis = scheduler.axis().await;
        let jump = axis.date_at(20).unwrap();
        let pos = dates.iter().position(|d| *d == jump).unwrap();
        let expected: Vec<NaiveDate> = (20..30).map(|i| axis.date_at(i).unwrap()).collect();
        assert_eq!(&dates[pos..], &expected[..]);
    }
}
