//! Autoplay state machine for the preview slideshow.
//!
//! The engine never owns a clock. Progress only moves through [`PlaybackEngine::tick`],
//! which the host calls from a timer that exists exactly while the engine is
//! `Playing` (see `ticker::PlaybackClock`).

use crate::config::PlaybackConfig;
use crate::steps::StepSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use ts_rs::TS;

pub const PROGRESS_FULL: f64 = 100.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlaybackMode {
    #[default]
    Idle,
    Playing,
    Paused,
    Completed,
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PlaybackMode::Idle => "idle",
            PlaybackMode::Playing => "playing",
            PlaybackMode::Paused => "paused",
            PlaybackMode::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Tick cadence and per-step dwell. Progress per tick is derived from the
/// ratio so changing the cadence never changes how long a step stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    pub tick_interval: Duration,
    pub dwell: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for PlaybackTiming {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            dwell: Duration::from_millis(config.dwell_ms),
        }
    }
}

impl PlaybackTiming {
    pub fn delta_progress(&self) -> f64 {
        let dwell = self.dwell.as_secs_f64();
        if dwell <= f64::EPSILON {
            return PROGRESS_FULL;
        }
        PROGRESS_FULL * (self.tick_interval.as_secs_f64() / dwell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PlaybackState {
    /// `None` only while the collection is empty.
    pub current_index: Option<usize>,
    pub progress: f64,
    pub mode: PlaybackMode,
}

impl PlaybackState {
    fn initial(step_count: usize) -> Self {
        Self {
            current_index: (step_count > 0).then_some(0),
            progress: 0.0,
            mode: PlaybackMode::Idle,
        }
    }

    /// Share of the whole tour already shown, for the top progress bar.
    pub fn overall_pct(&self, step_count: usize) -> f64 {
        let Some(current) = self.current_index else {
            return 0.0;
        };
        if step_count == 0 {
            return 0.0;
        }
        let done = current as f64 + self.progress / PROGRESS_FULL;
        (done / step_count as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ControlLabel {
    Play,
    Pause,
    Replay,
}

/// What the preview surface renders after each transition.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PlaybackView {
    pub state: PlaybackState,
    pub step_count: usize,
    pub overall_pct: f64,
    pub can_prev: bool,
    pub can_next: bool,
    pub control: ControlLabel,
    pub step_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Toggle,
    Restart,
    Next,
    Prev,
    Tick { delta: f64 },
    AdvanceTick,
}

#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    step_count: usize,
    state: PlaybackState,
    timing: PlaybackTiming,
}

impl PlaybackEngine {
    pub fn new(step_count: usize, timing: PlaybackTiming) -> Self {
        Self {
            step_count,
            state: PlaybackState::initial(step_count),
            timing,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.mode
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.timing
    }

    pub fn apply(&mut self, command: PlaybackCommand) -> PlaybackState {
        match command {
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Toggle => self.toggle(),
            PlaybackCommand::Restart => self.restart(),
            PlaybackCommand::Next => self.next(),
            PlaybackCommand::Prev => self.prev(),
            PlaybackCommand::Tick { delta } => self.tick(delta),
            PlaybackCommand::AdvanceTick => self.advance_tick(),
        }
        self.state
    }

    pub fn play(&mut self) {
        if self.step_count == 0 {
            debug!("Nothing to play; collection is empty");
            self.state = PlaybackState::initial(0);
            return;
        }
        match self.state.mode {
            PlaybackMode::Playing => {}
            PlaybackMode::Completed => {
                self.restart();
                self.state.mode = PlaybackMode::Playing;
                info!("Replaying tour from the first step");
            }
            PlaybackMode::Idle | PlaybackMode::Paused => {
                self.state.mode = PlaybackMode::Playing;
                info!(
                    index = self.state.current_index,
                    progress = self.state.progress,
                    "Playback started"
                );
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state.mode != PlaybackMode::Playing {
            debug!(mode = %self.state.mode, "Pause ignored outside of playback");
            return;
        }
        self.state.mode = PlaybackMode::Paused;
        info!(
            index = self.state.current_index,
            progress = self.state.progress,
            "Playback paused"
        );
    }

    /// The single play button: pause while playing, otherwise play (which
    /// replays from the start once completed).
    pub fn toggle(&mut self) {
        if self.state.mode == PlaybackMode::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn restart(&mut self) {
        self.state = PlaybackState::initial(self.step_count);
        info!("Playback restarted");
    }

    /// Add `delta` percent of dwell to the current step. Only effective while
    /// playing; carry-over past a full step is dropped.
    pub fn tick(&mut self, delta: f64) {
        if self.state.mode != PlaybackMode::Playing {
            debug!(mode = %self.state.mode, "Dropping tick outside of playback");
            return;
        }
        if !delta.is_finite() || delta <= 0.0 {
            warn!(delta, "Dropping tick with non-positive progress");
            return;
        }
        let Some(current) = self.state.current_index else {
            return;
        };

        let progress = self.state.progress + delta;
        if progress < PROGRESS_FULL {
            self.state.progress = progress;
            trace!(index = current, progress, "Tick");
            return;
        }

        if current + 1 < self.step_count {
            self.state.current_index = Some(current + 1);
            self.state.progress = 0.0;
            info!(index = current + 1, "Advanced to next step");
        } else {
            self.state.progress = PROGRESS_FULL;
            self.state.mode = PlaybackMode::Completed;
            info!(index = current, "Playback completed");
        }
    }

    pub fn advance_tick(&mut self) {
        self.tick(self.timing.delta_progress());
    }

    pub fn next(&mut self) {
        let Some(current) = self.state.current_index else {
            return;
        };
        let target = (current + 1).min(self.step_count.saturating_sub(1));
        self.jump_to(target);
    }

    pub fn prev(&mut self) {
        let Some(current) = self.state.current_index else {
            return;
        };
        self.jump_to(current.saturating_sub(1));
    }

    /// Manual navigation: always restarts the dwell window, and leaves a
    /// completed run paused at the chosen step.
    fn jump_to(&mut self, index: usize) {
        let from = self.state.current_index;
        self.state.current_index = Some(index);
        self.state.progress = 0.0;
        if self.state.mode == PlaybackMode::Completed {
            self.state.mode = PlaybackMode::Paused;
        }
        if from == Some(index) {
            debug!(index, "Manual navigation clamped at boundary");
        } else {
            info!(index, mode = %self.state.mode, "Moved to step");
        }
    }

    /// Reconcile with an edited collection. The index stays positional and
    /// is clamped into range; if a different step now sits under it, that
    /// step starts a fresh dwell window, and a completed run drops to paused.
    pub fn sync_steps(&mut self, before: &StepSnapshot, after: &StepSnapshot) {
        let previous = self.step_count;
        self.step_count = after.len();

        let Some(last) = after.last_index() else {
            if previous > 0 {
                info!(previous, "Collection emptied; playback is inert");
            }
            self.state = PlaybackState::initial(0);
            return;
        };
        let Some(current) = self.state.current_index else {
            self.state = PlaybackState::initial(after.len());
            return;
        };

        let target = current.min(last);
        let shown = before.ids().get(current);
        let replaced = shown != after.ids().get(target);
        self.state.current_index = Some(target);
        if target != current {
            info!(
                from = current,
                to = target,
                "Clamped playback after collection shrank"
            );
        }
        if replaced {
            self.state.progress = 0.0;
            if self.state.mode == PlaybackMode::Completed {
                self.state.mode = PlaybackMode::Paused;
            }
            debug!(
                index = target,
                mode = %self.state.mode,
                "Current step replaced; dwell restarted"
            );
        }
    }

    pub fn view(&self) -> PlaybackView {
        let current = self.state.current_index;
        let control = match self.state.mode {
            PlaybackMode::Playing => ControlLabel::Pause,
            PlaybackMode::Completed => ControlLabel::Replay,
            PlaybackMode::Idle | PlaybackMode::Paused => ControlLabel::Play,
        };
        let step_label = match current {
            Some(idx) => format!("Step {} of {}", idx + 1, self.step_count),
            None => "No steps to preview".to_string(),
        };
        PlaybackView {
            state: self.state,
            step_count: self.step_count,
            overall_pct: self.state.overall_pct(self.step_count),
            can_prev: current.is_some_and(|idx| idx > 0),
            can_next: current.is_some_and(|idx| idx + 1 < self.step_count),
            control,
            step_label,
        }
    }
}
