//! egui renderer for the application UI.

mod panels;
mod raster_view;
mod scene_view;
pub mod style;
mod thumbnail;

use std::time::Duration;

use egui::{self, Vec2, vec2};

use crate::egui_app::controller::EguiController;
use raster_view::RasterCache;
use scene_view::SceneCache;

/// Smallest window that still fits the control column and a usable view.
pub const MIN_VIEWPORT_SIZE: Vec2 = vec2(960.0, 640.0);
const CONTROLS_WIDTH: f32 = 340.0;
/// Repaint cadence while background requests are outstanding.
const BUSY_REPAINT: Duration = Duration::from_millis(100);

/// Renders the egui UI using the shared controller state.
pub struct EguiApp {
    controller: EguiController,
    visuals_set: bool,
    raster: RasterCache,
    scene: SceneCache,
}

impl EguiApp {
    pub fn new(controller: EguiController) -> Self {
        Self {
            controller,
            visuals_set: false,
            raster: RasterCache::default(),
            scene: SceneCache::default(),
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        style::apply_visuals(&mut visuals);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        self.controller.tick();
        self.render_status(ctx);
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(CONTROLS_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.render_controls(ui));
            });
        egui::CentralPanel::default().show(ctx, |ui| self.render_view_panel(ui));
        if self.controller.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.save_settings();
        self.controller.shutdown();
    }
}
