//! Render parameters for a step's highlight overlay.
//!
//! The rectangle comes from the step; the emphasis (zoom and pan applied to the
//! image behind it) cycles through a small fixed palette so consecutive steps
//! alternate in style.

use crate::steps::{HighlightRect, Step};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct EmphasisPreset {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Center, left, right, top and bottom focus.
pub const EMPHASIS_PALETTE: [EmphasisPreset; 5] = [
    EmphasisPreset {
        scale: 1.2,
        offset_x: 0.0,
        offset_y: 0.0,
    },
    EmphasisPreset {
        scale: 1.3,
        offset_x: 50.0,
        offset_y: -20.0,
    },
    EmphasisPreset {
        scale: 1.25,
        offset_x: -40.0,
        offset_y: 30.0,
    },
    EmphasisPreset {
        scale: 1.15,
        offset_x: 20.0,
        offset_y: 40.0,
    },
    EmphasisPreset {
        scale: 1.35,
        offset_x: -30.0,
        offset_y: -50.0,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct HighlightProjection {
    pub rect: HighlightRect,
    pub emphasis: EmphasisPreset,
    pub variant: usize,
}

pub fn emphasis_for(variant_index: usize) -> EmphasisPreset {
    EMPHASIS_PALETTE[variant_index % EMPHASIS_PALETTE.len()]
}

pub fn project(step: &Step, variant_index: usize) -> HighlightProjection {
    HighlightProjection {
        rect: effective_rect(step.highlight),
        emphasis: emphasis_for(variant_index),
        variant: variant_index % EMPHASIS_PALETTE.len(),
    }
}

/// Unusable components (non-finite, or a non-positive extent) fall back to
/// the default rectangle field by field.
fn effective_rect(rect: HighlightRect) -> HighlightRect {
    let fallback = HighlightRect::DEFAULT;
    let coord = |value: f32, default: f32| if value.is_finite() { value } else { default };
    let extent = |value: f32, default: f32| {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            default
        }
    };
    HighlightRect {
        x: coord(rect.x, fallback.x),
        y: coord(rect.y, fallback.y),
        width: extent(rect.width, fallback.width),
        height: extent(rect.height, fallback.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepId;

    fn step_with(highlight: HighlightRect) -> Step {
        Step {
            id: StepId(1),
            title: "Title".to_string(),
            description: "Description".to_string(),
            image: None,
            highlight,
        }
    }

    #[test]
    fn palette_cycles_by_variant() {
        let step = step_with(HighlightRect::DEFAULT);
        assert_eq!(project(&step, 0).emphasis, EMPHASIS_PALETTE[0]);
        assert_eq!(project(&step, 4).emphasis, EMPHASIS_PALETTE[4]);
        assert_eq!(project(&step, 5).emphasis, EMPHASIS_PALETTE[0]);
        assert_eq!(project(&step, 7).variant, 2);
    }

    #[test]
    fn consecutive_steps_alternate_emphasis() {
        let step = step_with(HighlightRect::DEFAULT);
        for idx in 0..10 {
            assert_ne!(project(&step, idx).emphasis, project(&step, idx + 1).emphasis);
        }
    }

    #[test]
    fn caller_rect_passes_through() {
        let rect = HighlightRect::new(100.0, 200.0, 300.0, 120.0);
        assert_eq!(project(&step_with(rect), 3).rect, rect);
    }

    #[test]
    fn degenerate_rect_falls_back_per_field() {
        let rect = HighlightRect::new(f32::NAN, 10.0, 0.0, -5.0);
        let projected = project(&step_with(rect), 0).rect;
        assert_eq!(projected, HighlightRect::new(50.0, 10.0, 200.0, 100.0));
    }
}
