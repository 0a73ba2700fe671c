//! Shared state types for the egui UI.

mod analysis;
mod status;
mod upload;
mod view;

pub use analysis::*;
pub use status::*;
pub use upload::*;
pub use view::*;

use crate::api::BoundingBox;

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug)]
pub struct UiState {
    pub status: StatusBarState,
    pub upload: UploadState,
    /// Region of interest for tasks, stats and polygon queries.
    pub bbox: BoundingBox,
    /// Comma-separated grid identifiers; blank means all grids.
    pub grids_text: String,
    pub task: TaskState,
    pub stats: StatsState,
    pub polygons: PolygonSets,
    pub view: ViewState,
}

impl UiState {
    pub fn new(bbox: BoundingBox, grids: &[String], view: ViewState) -> Self {
        Self {
            status: StatusBarState::idle(),
            upload: UploadState::default(),
            bbox,
            grids_text: grids.join(","),
            task: TaskState::default(),
            stats: StatsState::default(),
            polygons: PolygonSets::default(),
            view,
        }
    }

    /// Parsed grid list from the text field.
    pub fn grids(&self) -> Vec<String> {
        self.grids_text
            .split(',')
            .map(str::trim)
            .filter(|grid| !grid.is_empty())
            .map(str::to_string)
            .collect()
    }
}
