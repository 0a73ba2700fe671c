use tracing::info;

use super::EguiController;
use crate::api::BoundingBox;
use crate::egui_app::ui::style::StatusTone;
use crate::view::RendererKind;

impl EguiController {
    /// Switch renderers, carrying the current framing across.
    pub fn toggle_renderer(&mut self) {
        self.ui.view.pending_frame = self.ui.view.visible;
        let active = self.ui.view.renderer.toggle();
        self.set_status(format!("{} renderer active", active.label()), StatusTone::Info);
    }

    /// Called when the accelerated view cannot build or draw its layers.
    pub fn report_scene_failure(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.ui.view.renderer.report_failure(reason.clone()) {
            self.ui.view.pending_frame = self.ui.view.visible;
            self.set_status(
                format!("Accelerated renderer failed, using raster: {reason}"),
                StatusTone::Warning,
            );
        }
    }

    /// Record the data rect the active view is showing.
    pub fn publish_visible(&mut self, rect: BoundingBox) {
        if rect.is_finite() {
            self.ui.view.visible = Some(rect);
        }
    }

    /// Framing the active view should adopt this frame, if any.
    pub fn take_pending_frame(&mut self) -> Option<BoundingBox> {
        self.ui.view.pending_frame.take()
    }

    pub fn active_renderer(&self) -> RendererKind {
        self.ui.view.renderer.active()
    }

    /// Back to the initial camera for both views.
    pub fn reset_view(&mut self) {
        info!("Resetting view");
        self.ui.view.raster.reset();
        self.ui.view.scene_rect = None;
        self.ui.view.pending_frame = None;
    }
}
