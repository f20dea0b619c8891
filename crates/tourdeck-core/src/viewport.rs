//! Scroll-driven current step.
//!
//! Each step has an anchor region in the scrolling content. An anchor is
//! "live" while its top has passed the enter line and its bottom has not yet
//! passed the leave line; both lines are fractions of the viewport height.
//! Crossing either line produces one of four events, and
//! [`ViewportStepTracker::observe`] folds them into a single current index.
//!
//! Observers are bound to one anchor set through a generation number. Any
//! change to the collection order rebinds the tracker, after which crossings
//! minted for the old set are ignored.

use crate::config::ScrollConfig;
use crate::steps::{StepId, StepSnapshot};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CrossingKind {
    /// Top of the anchor passed the enter line while scrolling down.
    EnteringForward,
    /// Bottom of the anchor came back over the leave line while scrolling up.
    EnteringBackward,
    /// Bottom of the anchor passed the leave line while scrolling down.
    LeavingForward,
    /// Top of the anchor went back under the enter line while scrolling up.
    LeavingBackward,
}

impl CrossingKind {
    fn is_entering(self) -> bool {
        matches!(
            self,
            CrossingKind::EnteringForward | CrossingKind::EnteringBackward
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Crossing {
    #[ts(type = "number")]
    pub generation: u64,
    pub index: usize,
    pub kind: CrossingKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub height: f32,
    pub enter_fraction: f32,
    pub leave_fraction: f32,
}

impl Default for ViewportGeometry {
    fn default() -> Self {
        Self::from(&ScrollConfig::default())
    }
}

impl From<&ScrollConfig> for ViewportGeometry {
    fn from(config: &ScrollConfig) -> Self {
        Self {
            height: config.viewport_height,
            enter_fraction: config.enter_fraction,
            leave_fraction: config.leave_fraction,
        }
    }
}

impl ViewportGeometry {
    /// Distance of the enter line from the viewport top, in pixels.
    pub fn enter_line(&self) -> f32 {
        self.height * self.enter_fraction
    }

    pub fn leave_line(&self) -> f32 {
        self.height * self.leave_fraction
    }
}

/// Vertical extent of one anchor in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnchorSpan {
    pub top: f32,
    pub bottom: f32,
}

impl AnchorSpan {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }
}

/// Handle given to whatever observes the viewport, scoped to one anchor set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorBinding {
    generation: u64,
    anchors: Vec<StepId>,
}

impl AnchorBinding {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn anchors(&self) -> &[StepId] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn crossing(&self, index: usize, kind: CrossingKind) -> Option<Crossing> {
        (index < self.anchors.len()).then_some(Crossing {
            generation: self.generation,
            index,
            kind,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StepStatus {
    Done,
    Current,
    Upcoming,
}

#[derive(Debug, Clone)]
pub struct ViewportStepTracker {
    anchors: Vec<StepId>,
    generation: u64,
    current: Option<usize>,
    geometry: ViewportGeometry,
}

impl ViewportStepTracker {
    pub fn new(snapshot: &StepSnapshot, geometry: ViewportGeometry) -> Self {
        Self {
            anchors: snapshot.ids().to_vec(),
            generation: 1,
            current: (!snapshot.is_empty()).then_some(0),
            geometry,
        }
    }

    pub fn binding(&self) -> AnchorBinding {
        AnchorBinding {
            generation: self.generation,
            anchors: self.anchors.clone(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn geometry(&self) -> ViewportGeometry {
        self.geometry
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Fold one crossing into the current index and return it.
    pub fn observe(&mut self, crossing: Crossing) -> Option<usize> {
        if crossing.generation != self.generation {
            debug!(
                generation = crossing.generation,
                current = self.generation,
                "Ignoring crossing from a released observer"
            );
            return self.current;
        }
        let Some(last) = self.anchors.len().checked_sub(1) else {
            return self.current;
        };
        if crossing.index > last {
            debug!(
                index = crossing.index,
                last,
                "Ignoring crossing past the last anchor"
            );
            return self.current;
        }

        let target = match crossing.kind {
            CrossingKind::EnteringForward | CrossingKind::EnteringBackward => Some(crossing.index),
            CrossingKind::LeavingForward if crossing.index == last => Some(last),
            CrossingKind::LeavingBackward if crossing.index == 0 => Some(0),
            CrossingKind::LeavingForward | CrossingKind::LeavingBackward => None,
        };
        if let Some(index) = target {
            if self.current != Some(index) {
                debug!(index, kind = ?crossing.kind, "Scroll moved current step");
            }
            self.current = Some(index);
        }
        self.current
    }

    /// Tear down the current anchor set and bind to `snapshot`. Returns
    /// whether anything changed; the current index is clamped, not reset.
    pub fn rebind(&mut self, snapshot: &StepSnapshot) -> bool {
        if self.anchors.as_slice() == snapshot.ids() {
            return false;
        }
        self.generation = self.generation.wrapping_add(1);
        self.anchors = snapshot.ids().to_vec();
        self.current = match (self.current, snapshot.last_index()) {
            (_, None) => None,
            (None, Some(_)) => Some(0),
            (Some(current), Some(last)) => Some(current.min(last)),
        };
        info!(
            generation = self.generation,
            anchors = self.anchors.len(),
            current = self.current,
            "Rebound scroll observers"
        );
        true
    }

    /// Viewport size changed: the crossing lines move, the current step stays.
    pub fn resize(&mut self, height: f32) {
        if !height.is_finite() || height <= 0.0 {
            warn!(height, "Ignoring invalid viewport height");
            return;
        }
        self.geometry.height = height;
        debug!(
            height,
            enter_line = self.geometry.enter_line(),
            leave_line = self.geometry.leave_line(),
            "Recomputed scroll geometry"
        );
    }

    pub fn status(&self, index: usize) -> Option<StepStatus> {
        if index >= self.anchors.len() {
            return None;
        }
        let current = self.current?;
        Some(match index.cmp(&current) {
            Ordering::Less => StepStatus::Done,
            Ordering::Equal => StepStatus::Current,
            Ordering::Greater => StepStatus::Upcoming,
        })
    }

    pub fn statuses(&self) -> Vec<StepStatus> {
        (0..self.anchors.len())
            .filter_map(|index| self.status(index))
            .collect()
    }
}

/// Turns scroll offsets over a laid-out anchor set into crossings, the way a
/// browser intersection observer would.
#[derive(Debug, Clone)]
pub struct ScrollProbe {
    binding: AnchorBinding,
    spans: Vec<AnchorSpan>,
    offset: f32,
}

impl ScrollProbe {
    pub fn new(binding: AnchorBinding, spans: Vec<AnchorSpan>) -> Result<Self> {
        if spans.len() != binding.len() {
            bail!(
                "anchor layout has {} spans for {} anchors",
                spans.len(),
                binding.len()
            );
        }
        let invalid = |span: &AnchorSpan| {
            !span.top.is_finite() || !span.bottom.is_finite() || span.bottom < span.top
        };
        if let Some(index) = spans.iter().position(invalid) {
            bail!("anchor span {index} is not a valid vertical range");
        }
        if let Some(index) = spans.windows(2).position(|pair| pair[1].top < pair[0].top) {
            bail!("anchor span {} starts above the span before it", index + 1);
        }
        Ok(Self {
            binding,
            spans,
            offset: 0.0,
        })
    }

    pub fn binding(&self) -> &AnchorBinding {
        &self.binding
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Move the viewport top to `offset` and report every line crossed on
    /// the way, in the order they were crossed.
    pub fn scroll_to(&mut self, offset: f32, geometry: &ViewportGeometry) -> Vec<Crossing> {
        if !offset.is_finite() {
            warn!(offset, "Ignoring non-finite scroll offset");
            return Vec::new();
        }
        let from = self.offset;
        let to = offset;
        self.offset = to;
        if from == to {
            return Vec::new();
        }
        let forward = to > from;
        let passed = |line: f32| {
            if forward {
                from < line && line <= to
            } else {
                to < line && line <= from
            }
        };

        let mut hits: Vec<(f32, usize, CrossingKind)> = Vec::new();
        for (index, (start, end)) in self.live_windows(geometry).into_iter().enumerate() {
            if forward {
                if passed(start) {
                    hits.push((start, index, CrossingKind::EnteringForward));
                }
                if passed(end) {
                    hits.push((end, index, CrossingKind::LeavingForward));
                }
            } else {
                if passed(end) {
                    hits.push((end, index, CrossingKind::EnteringBackward));
                }
                if passed(start) {
                    hits.push((start, index, CrossingKind::LeavingBackward));
                }
            }
        }

        hits.sort_by(|a, b| {
            let by_position = a.0.total_cmp(&b.0);
            let by_index = a.1.cmp(&b.1);
            let (by_position, by_index) = if forward {
                (by_position, by_index)
            } else {
                (by_position.reverse(), by_index.reverse())
            };
            by_position
                .then(by_index)
                .then(b.2.is_entering().cmp(&a.2.is_entering()))
        });

        hits.into_iter()
            .filter_map(|(_, index, kind)| self.binding.crossing(index, kind))
            .collect()
    }

    /// Scroll offsets over which each anchor is live. A window is cut short
    /// where the next anchor's window opens, so at most one anchor is live at
    /// any offset and the crossing stream reads the same in both directions.
    fn live_windows(&self, geometry: &ViewportGeometry) -> Vec<(f32, f32)> {
        let starts: Vec<f32> = self
            .spans
            .iter()
            .map(|span| span.top - geometry.enter_line())
            .collect();
        self.spans
            .iter()
            .enumerate()
            .map(|(index, span)| {
                let start = starts[index];
                let mut end = span.bottom - geometry.leave_line();
                if let Some(&next) = starts.get(index + 1) {
                    end = end.min(next);
                }
                (start, end.max(start))
            })
            .collect()
    }

    /// Offset that centres anchor `index` in the viewport (sidebar jumps).
    pub fn scroll_target(&self, index: usize, geometry: &ViewportGeometry) -> Option<f32> {
        let span = self.spans.get(index)?;
        let middle = (span.top + span.bottom) * 0.5;
        Some((middle - geometry.height * 0.5).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(count: u64) -> StepSnapshot {
        StepSnapshot::from_ids((1..=count).map(StepId).collect())
    }

    fn tracker(count: u64) -> ViewportStepTracker {
        ViewportStepTracker::new(&snapshot(count), ViewportGeometry::default())
    }

    fn feed(
        tracker: &mut ViewportStepTracker,
        events: &[(usize, CrossingKind)],
    ) -> Vec<Option<usize>> {
        let binding = tracker.binding();
        events
            .iter()
            .map(|(index, kind)| {
                let crossing = binding.crossing(*index, *kind).unwrap();
                tracker.observe(crossing)
            })
            .collect()
    }

    fn forward_pass(count: usize) -> Vec<(usize, CrossingKind)> {
        (0..count)
            .flat_map(|idx| {
                [
                    (idx, CrossingKind::EnteringForward),
                    (idx, CrossingKind::LeavingForward),
                ]
            })
            .collect()
    }

    fn backward_pass(count: usize) -> Vec<(usize, CrossingKind)> {
        (0..count)
            .rev()
            .flat_map(|idx| {
                [
                    (idx, CrossingKind::EnteringBackward),
                    (idx, CrossingKind::LeavingBackward),
                ]
            })
            .collect()
    }

    /// Anchors 400px tall with 400px gaps: far enough apart that no two
    /// are live at once with the default 900px viewport.
    fn spaced_layout(count: usize) -> Vec<AnchorSpan> {
        (0..count)
            .map(|idx| {
                let top = 600.0 + idx as f32 * 800.0;
                AnchorSpan::new(top, top + 400.0)
            })
            .collect()
    }

    #[test]
    fn starts_on_first_step_or_none() {
        assert_eq!(tracker(3).current_index(), Some(0));
        assert_eq!(tracker(0).current_index(), None);
    }

    #[test]
    fn entering_sets_current_in_both_directions() {
        let mut tracker = tracker(4);
        let seen = feed(
            &mut tracker,
            &[
                (2, CrossingKind::EnteringForward),
                (1, CrossingKind::EnteringBackward),
            ],
        );
        assert_eq!(seen, vec![Some(2), Some(1)]);
    }

    #[test]
    fn leaving_only_pins_the_edges() {
        let mut tracker = tracker(3);
        let seen = feed(
            &mut tracker,
            &[
                (1, CrossingKind::EnteringForward),
                (1, CrossingKind::LeavingForward),
                (2, CrossingKind::LeavingForward),
                (1, CrossingKind::LeavingBackward),
                (0, CrossingKind::LeavingBackward),
            ],
        );
        assert_eq!(seen, vec![Some(1), Some(1), Some(2), Some(2), Some(0)]);
    }

    #[test]
    fn forward_and_backward_passes_mirror_each_other() {
        for count in 1..=6 {
            let mut tracker = tracker(count as u64);
            let forward = feed(&mut tracker, &forward_pass(count));
            let mut backward = feed(&mut tracker, &backward_pass(count));
            backward.reverse();
            assert_eq!(forward, backward, "asymmetric for {count} steps");
        }
    }

    #[test]
    fn crossings_from_a_released_binding_are_ignored() {
        let mut tracker = tracker(3);
        let stale = tracker.binding();

        assert!(tracker.rebind(&snapshot(2)));
        let crossing = stale.crossing(1, CrossingKind::EnteringForward).unwrap();
        assert_eq!(tracker.observe(crossing), Some(0));

        let fresh = tracker.binding();
        let crossing = fresh.crossing(1, CrossingKind::EnteringForward).unwrap();
        assert_eq!(tracker.observe(crossing), Some(1));
    }

    #[test]
    fn out_of_range_crossings_are_ignored() {
        let mut tracker = tracker(2);
        let crossing = Crossing {
            generation: tracker.generation(),
            index: 5,
            kind: CrossingKind::EnteringForward,
        };
        assert_eq!(tracker.observe(crossing), Some(0));
        assert!(tracker.binding().crossing(5, CrossingKind::EnteringForward).is_none());
    }

    #[test]
    fn rebind_clamps_and_skips_unchanged_sets() {
        let mut tracker = tracker(3);
        feed(&mut tracker, &[(2, CrossingKind::EnteringForward)]);
        let generation = tracker.generation();

        assert!(!tracker.rebind(&snapshot(3)));
        assert_eq!(tracker.generation(), generation);

        assert!(tracker.rebind(&snapshot(2)));
        assert_eq!(tracker.current_index(), Some(1));

        assert!(tracker.rebind(&snapshot(0)));
        assert_eq!(tracker.current_index(), None);

        assert!(tracker.rebind(&snapshot(2)));
        assert_eq!(tracker.current_index(), Some(0));
    }

    #[test]
    fn reordered_ids_rebind_the_observers() {
        let mut tracker = tracker(2);
        let reordered = StepSnapshot::from_ids(vec![StepId(2), StepId(1)]);
        assert!(tracker.rebind(&reordered));
        assert_eq!(tracker.current_index(), Some(0));
    }

    #[test]
    fn resize_moves_lines_but_keeps_current() {
        let mut tracker = tracker(3);
        feed(&mut tracker, &[(2, CrossingKind::EnteringForward)]);
        tracker.resize(500.0);
        assert_eq!(tracker.current_index(), Some(2));
        assert!((tracker.geometry().enter_line() - 300.0).abs() < f32::EPSILON);

        tracker.resize(f32::NAN);
        assert!((tracker.geometry().height - 500.0).abs() < f32::EPSILON);
    }

    #[test]
    fn statuses_split_around_current() {
        let mut tracker = tracker(4);
        feed(&mut tracker, &[(2, CrossingKind::EnteringForward)]);
        assert_eq!(
            tracker.statuses(),
            vec![
                StepStatus::Done,
                StepStatus::Done,
                StepStatus::Current,
                StepStatus::Upcoming
            ]
        );
        assert_eq!(tracker.status(9), None);
    }

    #[test]
    fn scrolling_reports_crossings_in_order() {
        let tracker = tracker(2);
        let geometry = tracker.geometry();
        let mut probe = ScrollProbe::new(tracker.binding(), spaced_layout(2)).unwrap();

        let kinds: Vec<(usize, CrossingKind)> = probe
            .scroll_to(5_000.0, &geometry)
            .into_iter()
            .map(|crossing| (crossing.index, crossing.kind))
            .collect();
        assert_eq!(kinds, forward_pass(2));

        let kinds: Vec<(usize, CrossingKind)> = probe
            .scroll_to(-1_000.0, &geometry)
            .into_iter()
            .map(|crossing| (crossing.index, crossing.kind))
            .collect();
        assert_eq!(kinds, backward_pass(2));
    }

    #[test]
    fn small_scroll_steps_drive_tracker_symmetrically() {
        let count = 5;
        let mut tracker = tracker(count as u64);
        let geometry = tracker.geometry();
        let mut probe = ScrollProbe::new(tracker.binding(), spaced_layout(count)).unwrap();

        let mut forward = Vec::new();
        for step in 1..=100 {
            for crossing in probe.scroll_to(step as f32 * 50.0, &geometry) {
                forward.push(tracker.observe(crossing));
            }
        }
        let mut backward = Vec::new();
        for step in (0..100).rev() {
            for crossing in probe.scroll_to(step as f32 * 50.0, &geometry) {
                backward.push(tracker.observe(crossing));
            }
        }
        backward.reverse();

        assert_eq!(forward.len(), count * 2);
        assert_eq!(forward, backward);
    }

    #[test]
    fn overlapping_cards_still_scroll_symmetrically() {
        // Tall cards with short gaps keep two anchors inside the live band.
        let count = 3;
        let mut tracker = tracker(count as u64);
        let geometry = tracker.geometry();
        let spans: Vec<AnchorSpan> = (0..count)
            .map(|idx| {
                let top = 600.0 + idx as f32 * 730.0;
                AnchorSpan::new(top, top + 650.0)
            })
            .collect();
        let mut probe = ScrollProbe::new(tracker.binding(), spans).unwrap();

        let mut forward = Vec::new();
        for step in 1..=60 {
            for crossing in probe.scroll_to(step as f32 * 50.0, &geometry) {
                forward.push(tracker.observe(crossing));
            }
        }
        let mut backward = Vec::new();
        for step in (0..60).rev() {
            for crossing in probe.scroll_to(step as f32 * 50.0, &geometry) {
                backward.push(tracker.observe(crossing));
            }
        }
        backward.reverse();

        assert_eq!(
            forward,
            vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]
        );
        assert_eq!(forward, backward);
    }

    #[test]
    fn nested_anchor_gets_its_own_window() {
        let tracker = tracker(2);
        let geometry = tracker.geometry();
        let spans = vec![AnchorSpan::new(600.0, 2_000.0), AnchorSpan::new(800.0, 900.0)];
        let mut probe = ScrollProbe::new(tracker.binding(), spans).unwrap();

        let kinds: Vec<(usize, CrossingKind)> = probe
            .scroll_to(3_000.0, &geometry)
            .into_iter()
            .map(|crossing| (crossing.index, crossing.kind))
            .collect();
        assert_eq!(kinds, forward_pass(2));
    }

    #[test]
    fn mismatched_layouts_are_rejected() {
        let tracker = tracker(3);
        assert!(ScrollProbe::new(tracker.binding(), spaced_layout(2)).is_err());
        let broken = vec![
            AnchorSpan::new(0.0, 10.0),
            AnchorSpan::new(50.0, 20.0),
            AnchorSpan::new(60.0, 80.0),
        ];
        assert!(ScrollProbe::new(tracker.binding(), broken).is_err());
        let unordered = vec![
            AnchorSpan::new(0.0, 10.0),
            AnchorSpan::new(60.0, 80.0),
            AnchorSpan::new(20.0, 40.0),
        ];
        assert!(ScrollProbe::new(tracker.binding(), unordered).is_err());
    }

    #[test]
    fn scroll_target_centres_anchor() {
        let tracker = tracker(2);
        let geometry = tracker.geometry();
        let probe = ScrollProbe::new(tracker.binding(), spaced_layout(2)).unwrap();
        assert_eq!(probe.scroll_target(1, &geometry), Some(1_150.0));
        assert_eq!(probe.scroll_target(0, &geometry), Some(350.0));
        assert_eq!(probe.scroll_target(2, &geometry), None);
    }
}
