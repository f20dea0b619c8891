//! Ordered, uniquely identified tour steps.
//!
//! Position in the collection is the only notion of "step N". Ids are minted
//! from a monotonic counter owned by the collection, so an id is never handed
//! out twice even after the step that carried it was deleted.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use ts_rs::TS;

/// Stable identity of a step within one collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct StepId(#[ts(type = "number")] pub u64);

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Region of interest on a step's image, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HighlightRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl HighlightRect {
    pub const DEFAULT: HighlightRect = HighlightRect {
        x: 50.0,
        y: 50.0,
        width: 200.0,
        height: 100.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for HighlightRect {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Step {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    #[serde(default)]
    pub highlight: HighlightRect,
}

/// Content of a step that is about to be created.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, TS)]
#[ts(export)]
pub struct StepPayload {
    pub title: String,
    pub description: String,
    #[ts(optional)]
    pub image: Option<String>,
    #[ts(optional)]
    pub highlight: Option<HighlightRect>,
}

impl StepPayload {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            image: None,
            highlight: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_highlight(mut self, highlight: HighlightRect) -> Self {
        self.highlight = Some(highlight);
        self
    }
}

/// Partial edit of an existing step; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, TS)]
#[ts(export)]
pub struct StepPatch {
    #[ts(optional)]
    pub title: Option<String>,
    #[ts(optional)]
    pub description: Option<String>,
    #[ts(optional)]
    pub image: Option<String>,
    #[ts(optional)]
    pub highlight: Option<HighlightRect>,
}

impl StepPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.highlight.is_none()
    }
}

/// Read-only view of the collection order handed to the engines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSnapshot {
    ids: Vec<StepId>,
}

impl StepSnapshot {
    pub fn from_ids(ids: Vec<StepId>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[StepId] {
        &self.ids
    }

    pub fn last_index(&self) -> Option<usize> {
        self.ids.len().checked_sub(1)
    }
}

#[derive(Debug, Clone)]
pub struct StepCollection {
    steps: Vec<Step>,
    next_id: u64,
}

impl Default for StepCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl StepCollection {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            next_id: 1,
        }
    }

    pub fn from_payloads(payloads: impl IntoIterator<Item = StepPayload>) -> Self {
        let mut collection = Self::new();
        for payload in payloads {
            collection.add(payload);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            ids: self.steps.iter().map(|step| step.id).collect(),
        }
    }

    /// Append a new step and return its freshly minted id.
    pub fn add(&mut self, payload: StepPayload) -> StepId {
        let id = StepId(self.next_id);
        self.next_id += 1;
        self.steps.push(Step {
            id,
            title: payload.title,
            description: payload.description,
            image: payload.image,
            highlight: payload.highlight.unwrap_or_default(),
        });
        info!(%id, position = self.steps.len() - 1, "Added step");
        id
    }

    /// Apply `patch` to the step with `id`. Unknown ids are ignored since an
    /// edit may race a delete; returns whether a step was touched.
    pub fn update(&mut self, id: StepId, patch: StepPatch) -> bool {
        let Some(step) = self.steps.iter_mut().find(|step| step.id == id) else {
            debug!(%id, "Ignoring update for unknown step");
            return false;
        };
        if patch.is_empty() {
            return true;
        }
        if let Some(title) = patch.title {
            step.title = title;
        }
        if let Some(description) = patch.description {
            step.description = description;
        }
        if let Some(image) = patch.image {
            step.image = Some(image);
        }
        if let Some(highlight) = patch.highlight {
            step.highlight = highlight;
        }
        info!(%id, "Updated step");
        true
    }

    /// Remove the step with `id`, returning the position it occupied.
    pub fn delete(&mut self, id: StepId) -> Option<usize> {
        let Some(position) = self.position(id) else {
            debug!(%id, "Ignoring delete for unknown step");
            return None;
        };
        self.steps.remove(position);
        info!(%id, position, remaining = self.steps.len(), "Deleted step");
        Some(position)
    }

    /// Replace the order with `order`, which must name every current step
    /// exactly once. A mismatch is a caller bug and leaves the collection
    /// untouched.
    pub fn reorder(&mut self, order: &[StepId]) -> Result<()> {
        if order.len() != self.steps.len() {
            bail!(
                "reorder expects {} step ids, got {}",
                self.steps.len(),
                order.len()
            );
        }
        let known: HashSet<StepId> = self.steps.iter().map(|step| step.id).collect();
        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !known.contains(id) {
                bail!("reorder names unknown step id {id}");
            }
            if !seen.insert(*id) {
                bail!("reorder names step id {id} more than once");
            }
        }

        let mut by_id: HashMap<StepId, Step> = self
            .steps
            .drain(..)
            .map(|step| (step.id, step))
            .collect();
        // Every id was checked above, so each lookup succeeds exactly once.
        self.steps = order.iter().filter_map(|id| by_id.remove(id)).collect();
        info!(count = self.steps.len(), "Reordered steps");
        Ok(())
    }

    /// Move one step to `to` (clamped), shifting the others. This is the
    /// single-item drag gesture; returns `false` for unknown ids.
    pub fn move_step(&mut self, id: StepId, to: usize) -> bool {
        let Some(from) = self.position(id) else {
            debug!(%id, "Ignoring move for unknown step");
            return false;
        };
        let to = to.min(self.steps.len().saturating_sub(1));
        if from != to {
            let step = self.steps.remove(from);
            self.steps.insert(to, step);
            info!(%id, from, to, "Moved step");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_of(titles: &[&str]) -> StepCollection {
        StepCollection::from_payloads(
            titles
                .iter()
                .map(|title| StepPayload::new(*title, format!("{title} description"))),
        )
    }

    fn titles(collection: &StepCollection) -> Vec<&str> {
        collection.iter().map(|step| step.title.as_str()).collect()
    }

    #[test]
    fn add_appends_with_default_highlight() {
        let mut collection = collection_of(&["A"]);
        let id = collection.add(StepPayload::new("B", "second"));

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.step_at(1).map(|step| step.id), Some(id));
        assert_eq!(collection.get(id).map(|s| s.highlight), Some(HighlightRect::DEFAULT));
    }

    #[test]
    fn add_keeps_explicit_highlight() {
        let mut collection = StepCollection::new();
        let rect = HighlightRect::new(300.0, 150.0, 250.0, 100.0);
        let id = collection.add(StepPayload::new("A", "a").with_highlight(rect));
        assert_eq!(collection.get(id).map(|s| s.highlight), Some(rect));
    }

    #[test]
    fn ids_are_never_reused_after_delete() {
        let mut collection = collection_of(&["A", "B", "C"]);
        let last = collection.step_at(2).map(|step| step.id);
        collection.delete(last.unwrap());
        let fresh = collection.add(StepPayload::new("D", "d"));

        assert_ne!(Some(fresh), last);
        let ids: HashSet<StepId> = collection.iter().map(|step| step.id).collect();
        assert_eq!(ids.len(), collection.len());
    }

    #[test]
    fn update_changes_only_given_fields_in_place() {
        let mut collection = collection_of(&["A", "B"]);
        let id = collection.step_at(1).unwrap().id;

        let touched = collection.update(
            id,
            StepPatch {
                title: Some("B2".to_string()),
                image: Some("https://example.com/b.png".to_string()),
                ..StepPatch::default()
            },
        );

        assert!(touched);
        let step = collection.step_at(1).unwrap();
        assert_eq!(step.id, id);
        assert_eq!(step.title, "B2");
        assert_eq!(step.description, "B description");
        assert_eq!(step.image.as_deref(), Some("https://example.com/b.png"));
    }

    #[test]
    fn update_and_delete_of_unknown_id_are_noops() {
        let mut collection = collection_of(&["A", "B"]);
        let before = collection.steps().to_vec();

        assert!(!collection.update(StepId(999), StepPatch::default()));
        assert_eq!(collection.delete(StepId(999)), None);
        assert_eq!(collection.steps(), before.as_slice());
    }

    #[test]
    fn delete_reports_position() {
        let mut collection = collection_of(&["A", "B", "C"]);
        let id = collection.step_at(1).unwrap().id;
        assert_eq!(collection.delete(id), Some(1));
        assert_eq!(titles(&collection), vec!["A", "C"]);
    }

    #[test]
    fn reorder_is_a_permutation() {
        let mut collection = collection_of(&["A", "B", "C"]);
        let ids = collection.snapshot();
        let order = vec![ids.ids()[2], ids.ids()[0], ids.ids()[1]];

        collection.reorder(&order).unwrap();

        assert_eq!(titles(&collection), vec!["C", "A", "B"]);
        assert_eq!(collection.snapshot().ids(), order.as_slice());
    }

    #[test]
    fn reorder_rejects_malformed_permutations() {
        let mut collection = collection_of(&["A", "B", "C"]);
        let ids = collection.snapshot().ids().to_vec();

        assert!(collection.reorder(&ids[..2]).is_err());
        assert!(collection.reorder(&[ids[0], ids[0], ids[1]]).is_err());
        assert!(collection.reorder(&[ids[0], ids[1], StepId(42)]).is_err());
        assert_eq!(titles(&collection), vec!["A", "B", "C"]);
    }

    #[test]
    fn move_step_shifts_neighbours() {
        let mut collection = collection_of(&["A", "B", "C", "D"]);
        let id = collection.step_at(0).unwrap().id;

        assert!(collection.move_step(id, 2));
        assert_eq!(titles(&collection), vec!["B", "C", "A", "D"]);

        assert!(collection.move_step(id, 99));
        assert_eq!(titles(&collection), vec!["B", "C", "D", "A"]);

        assert!(!collection.move_step(StepId(999), 0));
    }
}
