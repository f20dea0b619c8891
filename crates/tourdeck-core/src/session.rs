//! Authoring session: owns the step collection and exactly one active
//! current-step tracker (autoplay preview or scroll view).
//!
//! Hosts drive everything through [`SessionCommand`]s and render the
//! [`TourSnapshot`] returned with every [`SessionEvent`]. Collection edits
//! reconcile the active tracker before the snapshot is taken.

use crate::config::TourConfig;
use crate::highlight::{self, HighlightProjection};
use crate::playback::{
    PlaybackCommand, PlaybackEngine, PlaybackMode, PlaybackTiming, PlaybackView,
};
use crate::steps::{Step, StepCollection, StepId, StepPatch, StepPayload, StepSnapshot};
use crate::viewport::{
    AnchorSpan, Crossing, ScrollProbe, StepStatus, ViewportGeometry, ViewportStepTracker,
};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TrackerMode {
    #[default]
    Scroll,
    Preview,
}

#[derive(Debug, Clone)]
struct ScrollView {
    tracker: ViewportStepTracker,
    probe: Option<ScrollProbe>,
}

#[derive(Debug, Clone)]
enum ActiveTracker {
    Preview(PlaybackEngine),
    Scroll(ScrollView),
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct TourSnapshot {
    pub steps: Vec<Step>,
    pub mode: TrackerMode,
    pub current_index: Option<usize>,
    pub playback: Option<PlaybackView>,
    pub step_statuses: Vec<StepStatus>,
    pub highlight: Option<HighlightProjection>,
    pub scroll_offset: Option<f32>,
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    GetSnapshot,
    AddStep { payload: StepPayload },
    UpdateStep { id: StepId, patch: StepPatch },
    DeleteStep { id: StepId },
    ReorderSteps { order: Vec<StepId> },
    MoveStep { id: StepId, to: usize },
    EnterPreview,
    EnterScroll,
    Play,
    Pause,
    TogglePlay,
    Restart,
    NextStep,
    PrevStep,
    Tick { delta: f64 },
    AdvanceTick,
    Crossing { crossing: Crossing },
    SetAnchorLayout { spans: Vec<AnchorSpan> },
    ScrollTo { offset: f32 },
    JumpToStep { index: usize },
    Resize { height: f32 },
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "tour_get_snapshot",
            Self::AddStep { .. } => "tour_add_step",
            Self::UpdateStep { .. } => "tour_update_step",
            Self::DeleteStep { .. } => "tour_delete_step",
            Self::ReorderSteps { .. } => "tour_reorder_steps",
            Self::MoveStep { .. } => "tour_move_step",
            Self::EnterPreview => "tour_enter_preview",
            Self::EnterScroll => "tour_enter_scroll",
            Self::Play => "tour_play",
            Self::Pause => "tour_pause",
            Self::TogglePlay => "tour_toggle_play",
            Self::Restart => "tour_restart",
            Self::NextStep => "tour_next_step",
            Self::PrevStep => "tour_prev_step",
            Self::Tick { .. } => "tour_tick",
            Self::AdvanceTick => "tour_advance_tick",
            Self::Crossing { .. } => "tour_crossing",
            Self::SetAnchorLayout { .. } => "tour_set_anchor_layout",
            Self::ScrollTo { .. } => "tour_scroll_to",
            Self::JumpToStep { .. } => "tour_jump_to_step",
            Self::Resize { .. } => "tour_resize",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: TourSnapshot,
}

#[derive(Debug, Clone)]
pub struct TourSession {
    collection: StepCollection,
    active: ActiveTracker,
    timing: PlaybackTiming,
    geometry: ViewportGeometry,
}

impl TourSession {
    /// Start in the scrolling editor, like the authoring surface does.
    pub fn new(collection: StepCollection, config: &TourConfig) -> Self {
        let geometry = ViewportGeometry::from(&config.scroll);
        let tracker = ViewportStepTracker::new(&collection.snapshot(), geometry);
        Self {
            collection,
            active: ActiveTracker::Scroll(ScrollView {
                tracker,
                probe: None,
            }),
            timing: PlaybackTiming::from(&config.playback),
            geometry,
        }
    }

    pub fn collection(&self) -> &StepCollection {
        &self.collection
    }

    pub fn mode(&self) -> TrackerMode {
        match self.active {
            ActiveTracker::Preview(_) => TrackerMode::Preview,
            ActiveTracker::Scroll(_) => TrackerMode::Scroll,
        }
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.timing
    }

    pub fn current_index(&self) -> Option<usize> {
        match &self.active {
            ActiveTracker::Preview(engine) => engine.current_index(),
            ActiveTracker::Scroll(view) => view.tracker.current_index(),
        }
    }

    pub fn playback(&self) -> Option<&PlaybackEngine> {
        match &self.active {
            ActiveTracker::Preview(engine) => Some(engine),
            ActiveTracker::Scroll(_) => None,
        }
    }

    pub fn playback_mode(&self) -> Option<PlaybackMode> {
        self.playback().map(PlaybackEngine::mode)
    }

    pub fn tracker(&self) -> Option<&ViewportStepTracker> {
        match &self.active {
            ActiveTracker::Scroll(view) => Some(&view.tracker),
            ActiveTracker::Preview(_) => None,
        }
    }

    pub fn snapshot(&self) -> TourSnapshot {
        let current_index = self.current_index();
        let (playback, step_statuses, scroll_offset) = match &self.active {
            ActiveTracker::Preview(engine) => (Some(engine.view()), Vec::new(), None),
            ActiveTracker::Scroll(view) => (
                None,
                view.tracker.statuses(),
                view.probe.as_ref().map(ScrollProbe::offset),
            ),
        };
        let highlight = current_index.and_then(|idx| {
            self.collection
                .step_at(idx)
                .map(|step| highlight::project(step, idx))
        });
        TourSnapshot {
            steps: self.collection.steps().to_vec(),
            mode: self.mode(),
            current_index,
            playback,
            step_statuses,
            highlight,
            scroll_offset,
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> Result<SessionEvent> {
        let action = command.action();
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::AddStep { payload } => {
                self.add_step(payload);
            }
            SessionCommand::UpdateStep { id, patch } => {
                self.update_step(id, patch);
            }
            SessionCommand::DeleteStep { id } => {
                self.delete_step(id);
            }
            SessionCommand::ReorderSteps { order } => self.reorder_steps(&order)?,
            SessionCommand::MoveStep { id, to } => {
                self.move_step(id, to);
            }
            SessionCommand::EnterPreview => self.enter_preview(),
            SessionCommand::EnterScroll => self.enter_scroll(),
            SessionCommand::Play => self.playback_command(PlaybackCommand::Play),
            SessionCommand::Pause => self.playback_command(PlaybackCommand::Pause),
            SessionCommand::TogglePlay => self.playback_command(PlaybackCommand::Toggle),
            SessionCommand::Restart => self.playback_command(PlaybackCommand::Restart),
            SessionCommand::NextStep => self.playback_command(PlaybackCommand::Next),
            SessionCommand::PrevStep => self.playback_command(PlaybackCommand::Prev),
            SessionCommand::Tick { delta } => {
                self.playback_command(PlaybackCommand::Tick { delta })
            }
            SessionCommand::AdvanceTick => self.playback_command(PlaybackCommand::AdvanceTick),
            SessionCommand::Crossing { crossing } => {
                self.observe_crossing(crossing);
            }
            SessionCommand::SetAnchorLayout { spans } => self.set_anchor_layout(spans)?,
            SessionCommand::ScrollTo { offset } => {
                self.scroll_to(offset);
            }
            SessionCommand::JumpToStep { index } => {
                self.jump_to_step(index);
            }
            SessionCommand::Resize { height } => self.resize(height),
        }
        Ok(SessionEvent {
            action,
            snapshot: self.snapshot(),
        })
    }

    pub fn add_step(&mut self, payload: StepPayload) -> StepId {
        let before = self.collection.snapshot();
        let id = self.collection.add(payload);
        self.reconcile(&before);
        id
    }

    pub fn update_step(&mut self, id: StepId, patch: StepPatch) -> bool {
        self.collection.update(id, patch)
    }

    pub fn delete_step(&mut self, id: StepId) -> Option<usize> {
        let before = self.collection.snapshot();
        let removed = self.collection.delete(id);
        if removed.is_some() {
            self.reconcile(&before);
        }
        removed
    }

    pub fn reorder_steps(&mut self, order: &[StepId]) -> Result<()> {
        let before = self.collection.snapshot();
        self.collection.reorder(order)?;
        self.reconcile(&before);
        Ok(())
    }

    pub fn move_step(&mut self, id: StepId, to: usize) -> bool {
        let before = self.collection.snapshot();
        let moved = self.collection.move_step(id, to);
        if moved {
            self.reconcile(&before);
        }
        moved
    }

    /// Switch to the autoplay preview. The scroll view and its observers are
    /// dropped; playback starts fresh at the first step.
    pub fn enter_preview(&mut self) {
        if matches!(self.active, ActiveTracker::Preview(_)) {
            return;
        }
        let engine = PlaybackEngine::new(self.collection.len(), self.timing);
        self.active = ActiveTracker::Preview(engine);
        info!(steps = self.collection.len(), "Entered preview");
    }

    /// Leave the preview; its playback state is discarded.
    pub fn enter_scroll(&mut self) {
        if matches!(self.active, ActiveTracker::Scroll(_)) {
            return;
        }
        let tracker = ViewportStepTracker::new(&self.collection.snapshot(), self.geometry);
        self.active = ActiveTracker::Scroll(ScrollView {
            tracker,
            probe: None,
        });
        info!(steps = self.collection.len(), "Entered scroll view");
    }

    fn playback_command(&mut self, command: PlaybackCommand) {
        match &mut self.active {
            ActiveTracker::Preview(engine) => {
                engine.apply(command);
            }
            ActiveTracker::Scroll(_) => {
                debug!(?command, "Ignoring playback command outside of preview");
            }
        }
    }

    fn scroll_view_mut(&mut self, what: &'static str) -> Option<&mut ScrollView> {
        match &mut self.active {
            ActiveTracker::Scroll(view) => Some(view),
            ActiveTracker::Preview(_) => {
                debug!(what, "Ignoring scroll input while previewing");
                None
            }
        }
    }

    pub fn observe_crossing(&mut self, crossing: Crossing) -> Option<usize> {
        let view = self.scroll_view_mut("crossing")?;
        view.tracker.observe(crossing)
    }

    /// Install the laid-out anchor rectangles for the current binding.
    pub fn set_anchor_layout(&mut self, spans: Vec<AnchorSpan>) -> Result<()> {
        let Some(view) = self.scroll_view_mut("anchor layout") else {
            bail!("anchor layout requires the scroll view");
        };
        let probe = ScrollProbe::new(view.tracker.binding(), spans)?;
        debug!(
            anchors = probe.binding().len(),
            generation = probe.binding().generation(),
            "Installed anchor layout"
        );
        view.probe = Some(probe);
        Ok(())
    }

    /// Scroll the viewport and fold every crossing into the tracker.
    pub fn scroll_to(&mut self, offset: f32) -> Option<usize> {
        let view = self.scroll_view_mut("scroll")?;
        let geometry = view.tracker.geometry();
        let Some(probe) = view.probe.as_mut() else {
            debug!(offset, "Ignoring scroll before an anchor layout is installed");
            return view.tracker.current_index();
        };
        for crossing in probe.scroll_to(offset, &geometry) {
            view.tracker.observe(crossing);
        }
        view.tracker.current_index()
    }

    /// Scroll so step `index` sits in the middle of the viewport.
    pub fn jump_to_step(&mut self, index: usize) -> Option<f32> {
        let view = self.scroll_view_mut("jump")?;
        let geometry = view.tracker.geometry();
        let target = view.probe.as_ref()?.scroll_target(index, &geometry)?;
        self.scroll_to(target);
        Some(target)
    }

    pub fn resize(&mut self, height: f32) {
        let Some(view) = self.scroll_view_mut("resize") else {
            return;
        };
        view.tracker.resize(height);
        let geometry = view.tracker.geometry();
        self.geometry = geometry;
    }

    /// Bring the active tracker in line with the collection after an edit.
    fn reconcile(&mut self, before: &StepSnapshot) {
        let snapshot = self.collection.snapshot();
        match &mut self.active {
            ActiveTracker::Preview(engine) => engine.sync_steps(before, &snapshot),
            ActiveTracker::Scroll(view) => {
                if view.tracker.rebind(&snapshot) && view.probe.take().is_some() {
                    debug!("Dropped anchor layout bound to the previous step set");
                }
            }
        }
    }
}
