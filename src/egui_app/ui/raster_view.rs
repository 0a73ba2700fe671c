use std::sync::Arc;

use egui::{
    self, Color32, Rect, Response, Sense, TextureHandle, TextureOptions, Ui, pos2, vec2,
};

use super::EguiApp;
use crate::api::BoundingBox;
use crate::view::{CanvasMapper, RasterScene, ViewTransform, WheelStep, render_raster};

/// Last uploaded raster and the inputs it was drawn from.
#[derive(Default)]
pub(super) struct RasterCache {
    texture: Option<TextureHandle>,
    drawn: Option<RasterKey>,
}

#[derive(Clone, Copy, PartialEq)]
struct RasterKey {
    revision: u64,
    bbox: BoundingBox,
    transform: ViewTransform,
    size: [usize; 2],
}

impl EguiApp {
    pub(super) fn render_raster_view(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let size = [
            rect.width().max(1.0).round() as usize,
            rect.height().max(1.0).round() as usize,
        ];
        let viewport = vec2(size[0] as f32, size[1] as f32);
        let features_a = Arc::clone(&self.controller.ui.polygons.a);
        let features_b = Arc::clone(&self.controller.ui.polygons.b);
        let bbox = self.controller.ui.bbox;
        let scene = RasterScene::new(&features_a, &features_b, bbox);
        let extent = scene.extent();

        if let Some(target) = self.controller.take_pending_frame() {
            self.controller.ui.view.raster.frame(&extent, viewport, target);
        }
        self.handle_raster_input(ui, &response, rect);

        let transform = self.controller.ui.view.raster;
        let key = RasterKey {
            revision: self.controller.ui.polygons.revision,
            bbox,
            transform,
            size,
        };
        if self.raster.drawn != Some(key) {
            let image = render_raster(&scene, size, &transform);
            match &mut self.raster.texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.raster.texture =
                        Some(ui.ctx().load_texture("raster_view", image, TextureOptions::LINEAR));
                }
            }
            self.raster.drawn = Some(key);
        }
        if let Some(texture) = &self.raster.texture {
            ui.painter_at(rect).image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        let mapper = CanvasMapper::new(&extent, viewport, &transform);
        self.controller.publish_visible(mapper.visible_data_rect(viewport));
    }

    fn handle_raster_input(&mut self, ui: &Ui, response: &Response, rect: Rect) {
        let view = &mut self.controller.ui.view;
        if response.drag_started() {
            if let Some(pointer) = response.interact_pointer_pos() {
                view.drag.press(pointer, &view.raster);
            }
        }
        if response.dragged() {
            if let Some(pointer) = response.interact_pointer_pos() {
                if rect.contains(pointer) {
                    view.drag.drag_to(pointer, &mut view.raster);
                } else {
                    view.drag.release();
                }
            }
        }
        if response.drag_stopped() {
            view.drag.release();
        }
        if response.hovered() {
            let delta = ui.input(|i| i.raw_scroll_delta.y);
            if let Some(step) = WheelStep::from_scroll_delta(delta) {
                view.raster.zoom_by_wheel(step);
            }
        }
        if view.drag.is_dragging() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }
    }
}

