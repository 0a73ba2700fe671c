use egui::{Sense, Stroke, StrokeKind, Ui};

use super::{EguiApp, style};
use crate::view::thumbnail::THUMBNAIL_SIZE;
use crate::view::ThumbnailMapper;

impl EguiApp {
    /// Overview of the bbox (and the last loaded region) inside the global
    /// extent.
    pub(super) fn render_thumbnail(&self, ui: &mut Ui) {
        let palette = style::palette();
        let (rect, _) = ui.allocate_exact_size(THUMBNAIL_SIZE, Sense::hover());
        let mapper = ThumbnailMapper::new(self.controller.settings().view.global_bounds, rect.size());
        let offset = rect.min.to_vec2();
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, palette.bg_window);
        painter.rect_stroke(
            mapper.frame().translate(offset),
            0.0,
            Stroke::new(1.0, palette.outline),
            StrokeKind::Inside,
        );
        if let Some(loaded) = self.controller.ui.polygons.loaded_for {
            painter.rect_stroke(
                mapper.bbox_rect(loaded).translate(offset),
                0.0,
                Stroke::new(1.0, palette.text_muted),
                StrokeKind::Middle,
            );
        }
        let bbox = mapper.bbox_rect(self.controller.ui.bbox).translate(offset);
        painter.rect_filled(bbox, 0.0, palette.bbox.gamma_multiply(0.2));
        painter.rect_stroke(bbox, 0.0, Stroke::new(1.5, palette.bbox), StrokeKind::Middle);
    }
}
