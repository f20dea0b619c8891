//! TypeScript declarations for everything a web host exchanges with the session.

use crate::highlight::{EmphasisPreset, HighlightProjection};
use crate::playback::{ControlLabel, PlaybackMode, PlaybackState, PlaybackView};
use crate::session::{TourSnapshot, TrackerMode};
use crate::steps::{HighlightRect, Step, StepId, StepPatch, StepPayload};
use crate::viewport::{AnchorSpan, Crossing, CrossingKind, StepStatus};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<String> {
    let name = T::name();
    T::export_all_to(out_dir).with_context(|| format!("failed to export {name}"))?;
    Ok(name)
}

pub fn export_ts_bindings(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for entry in
        fs::read_dir(out_dir).with_context(|| format!("failed to list {}", out_dir.display()))?
    {
        let path = entry.context("failed to read directory entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
    }

    let exported = [
        export_single_type::<StepId>(out_dir)?,
        export_single_type::<HighlightRect>(out_dir)?,
        export_single_type::<Step>(out_dir)?,
        export_single_type::<StepPayload>(out_dir)?,
        export_single_type::<StepPatch>(out_dir)?,
        export_single_type::<PlaybackMode>(out_dir)?,
        export_single_type::<PlaybackState>(out_dir)?,
        export_single_type::<ControlLabel>(out_dir)?,
        export_single_type::<PlaybackView>(out_dir)?,
        export_single_type::<EmphasisPreset>(out_dir)?,
        export_single_type::<HighlightProjection>(out_dir)?,
        export_single_type::<CrossingKind>(out_dir)?,
        export_single_type::<Crossing>(out_dir)?,
        export_single_type::<AnchorSpan>(out_dir)?,
        export_single_type::<StepStatus>(out_dir)?,
        export_single_type::<TrackerMode>(out_dir)?,
        export_single_type::<TourSnapshot>(out_dir)?,
    ];

    let index_content: String = exported
        .iter()
        .map(|name| format!("export type {{ {name} }} from \"./{name}\";\n"))
        .collect();
    let index_path = out_dir.join("index.ts");
    fs::write(&index_path, index_content)
        .with_context(|| format!("failed to write {}", index_path.display()))?;

    info!(out_dir = %out_dir.display(), types = exported.len(), "Exported TypeScript bindings");
    Ok(())
}
