use std::panic::{self, AssertUnwindSafe};

use egui::{self, Rect, Ui, Vec2};

use super::EguiApp;
use crate::api::{BoundingBox, PolygonFeature};
use crate::view::mapper::{data_from_scene_rect, scene_point, scene_rect_from_data};
use crate::view::raster::BACKGROUND;
use crate::view::{SceneError, SceneLayers};

/// Screen pixels per data unit for a freshly opened view.
const INITIAL_PIXELS_PER_UNIT: f32 = 16.0;

/// Dataset meshes are keyed on the polygon revision; the bbox frame is
/// swapped in place when only the bbox moves.
#[derive(Default)]
pub(super) struct SceneCache {
    built: Option<BuiltLayers>,
}

struct BuiltLayers {
    revision: u64,
    bbox: BoundingBox,
    layers: SceneLayers,
}

impl SceneCache {
    fn sync(
        &mut self,
        revision: u64,
        features_a: &[PolygonFeature],
        features_b: &[PolygonFeature],
        bbox: BoundingBox,
    ) -> Result<(), SceneError> {
        if let Some(built) = self.built.as_mut().filter(|built| built.revision == revision) {
            if built.bbox != bbox {
                built.layers.set_bbox(bbox)?;
                built.bbox = bbox;
            }
            return Ok(());
        }
        self.built = None;
        let layers = build_layers(features_a, features_b, bbox)?;
        self.built = Some(BuiltLayers {
            revision,
            bbox,
            layers,
        });
        Ok(())
    }
}

impl EguiApp {
    pub(super) fn render_scene_view(&mut self, ui: &mut Ui) {
        let revision = self.controller.ui.polygons.revision;
        let bbox = self.controller.ui.bbox;
        let polygons = &self.controller.ui.polygons;
        if let Err(err) = self.scene.sync(revision, &polygons.a, &polygons.b, bbox) {
            self.scene.built = None;
            self.controller.report_scene_failure(err.to_string());
            return;
        }
        let Some(built) = &self.scene.built else {
            return;
        };

        let view_size = ui.available_size();
        let mut scene_rect = match self.controller.take_pending_frame() {
            Some(target) => scene_rect_from_data(target),
            None => self
                .controller
                .ui
                .view
                .scene_rect
                .unwrap_or_else(|| initial_scene_rect(bbox, view_size)),
        };
        ui.painter()
            .rect_filled(ui.available_rect_before_wrap(), 0.0, BACKGROUND);
        let inner = egui::Scene::new()
            .zoom_range(0.0001..=10_000.0)
            .show(ui, &mut scene_rect, |ui| {
                let to_global = ui.ctx().layer_transform_to_global(ui.layer_id());
                let zoom = to_global.map_or(1.0, |transform| transform.scaling);
                ui.painter().extend(built.layers.shapes(zoom));
                let pointer = ui.ctx().pointer_hover_pos()?;
                let local = to_global.map_or(pointer, |transform| transform.inverse() * pointer);
                built
                    .layers
                    .pick(local)
                    .map(|target| (target.id.clone(), target.area))
            });

        if let Some((id, area)) = inner.inner {
            inner.response.on_hover_ui_at_pointer(|ui| {
                ui.label(format!("id: {id}"));
                ui.label(format!("area: {area:.4}"));
            });
        }
        self.controller.ui.view.scene_rect = Some(scene_rect);
        self.controller.publish_visible(data_from_scene_rect(scene_rect));
    }
}

/// Build layers, turning a panic inside triangulation into an error.
fn build_layers(
    features_a: &[PolygonFeature],
    features_b: &[PolygonFeature],
    bbox: BoundingBox,
) -> Result<SceneLayers, SceneError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        SceneLayers::build(features_a, features_b, bbox)
    }))
    .unwrap_or_else(|_| Err(SceneError::Runtime("layer construction panicked".into())))
}

/// Camera centred on the bbox at the initial pixel density.
fn initial_scene_rect(bbox: BoundingBox, view_size: Vec2) -> Rect {
    let center = scene_point(bbox.normalized().center());
    let size = view_size.max(Vec2::splat(1.0)) / INITIAL_PIXELS_PER_UNIT;
    Rect::from_center_size(center, size)
}
