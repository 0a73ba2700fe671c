use std::sync::Arc;

use egui::Rect;

use crate::api::{BoundingBox, PolygonFeature, PolygonPage};
use crate::view::{DragState, RendererSelector, ViewTransform};

/// Both loaded polygon sets. They are only ever replaced together.
#[derive(Clone, Debug, Default)]
pub struct PolygonSets {
    pub a: Arc<Vec<PolygonFeature>>,
    pub b: Arc<Vec<PolygonFeature>>,
    /// Server-reported counts for the last load.
    pub count_a: usize,
    pub count_b: usize,
    /// Bumped on every replacement so views can cache derived data.
    pub revision: u64,
    pub loading: bool,
    pub loaded_for: Option<BoundingBox>,
}

impl PolygonSets {
    pub fn replace(&mut self, a: PolygonPage, b: PolygonPage, bbox: BoundingBox) {
        self.count_a = a.count;
        self.count_b = b.count;
        self.a = Arc::new(a.features);
        self.b = Arc::new(b.features);
        self.loaded_for = Some(bbox);
        self.revision += 1;
    }
}

/// Renderer choice plus each view's camera.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub renderer: RendererSelector,
    pub raster: ViewTransform,
    pub drag: DragState,
    /// Scene-space rect shown by the accelerated view; `None` until first shown.
    pub scene_rect: Option<Rect>,
    /// Data rect the active view last displayed.
    pub visible: Option<BoundingBox>,
    /// Framing the next active view should adopt after a switch.
    pub pending_frame: Option<BoundingBox>,
}

impl ViewState {
    pub fn new(renderer: RendererSelector) -> Self {
        Self {
            renderer,
            raster: ViewTransform::default(),
            drag: DragState::default(),
            scene_rect: None,
            visible: None,
            pending_frame: None,
        }
    }
}
