use egui::{self, Button, DragValue, Frame, Grid, ProgressBar, RichText, Ui};

use super::{EguiApp, style};
use crate::egui_app::state::{DatasetSlot, MetricsView, StatsScope};
use crate::view::RendererKind;

const BBOX_DRAG_SPEED: f64 = 0.1;

impl EguiApp {
    pub(super) fn render_controls(&mut self, ui: &mut Ui) {
        self.render_upload_section(ui);
        ui.separator();
        self.render_region_section(ui);
        ui.separator();
        self.render_task_section(ui);
        ui.separator();
        self.render_stats_section(ui);
    }

    fn render_upload_section(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        ui.heading("Datasets");
        ui.label(
            RichText::new(&self.controller.settings().server.base_url).color(palette.text_muted),
        );
        let uploading = self.controller.ui.upload.uploading;
        for slot in [DatasetSlot::A, DatasetSlot::B] {
            let swatch = match slot {
                DatasetSlot::A => palette.dataset_a,
                DatasetSlot::B => palette.dataset_b,
            };
            ui.horizontal(|ui| {
                ui.label(RichText::new(slot.label()).color(swatch).strong());
                ui.add_enabled(
                    !uploading,
                    egui::TextEdit::singleline(&mut self.controller.ui.upload.slot_mut(slot).prefix)
                        .desired_width(110.0)
                        .hint_text("prefix"),
                );
                if ui
                    .add_enabled(!uploading, Button::new("Choose file…"))
                    .clicked()
                {
                    self.controller.pick_dataset_file(slot);
                }
            });
            let entry = self.controller.ui.upload.slot(slot);
            let file = entry
                .file
                .as_ref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "No file selected".into());
            ui.label(RichText::new(file).color(palette.text_muted));
            if let Some(percent) = entry.progress {
                ui.add(ProgressBar::new(f32::from(percent) / 100.0).show_percentage());
            }
            if let Some(response) = &entry.response {
                ui.label(RichText::new(response).color(palette.text_muted).small());
            }
        }
        if ui.add_enabled(!uploading, Button::new("Upload")).clicked() {
            self.controller.start_upload();
        }
    }

    fn render_region_section(&mut self, ui: &mut Ui) {
        ui.heading("Region");
        let bbox = &mut self.controller.ui.bbox;
        Grid::new("bbox_grid").num_columns(4).show(ui, |ui| {
            ui.label("min x");
            ui.add(DragValue::new(&mut bbox.minx).speed(BBOX_DRAG_SPEED));
            ui.label("min y");
            ui.add(DragValue::new(&mut bbox.miny).speed(BBOX_DRAG_SPEED));
            ui.end_row();
            ui.label("max x");
            ui.add(DragValue::new(&mut bbox.maxx).speed(BBOX_DRAG_SPEED));
            ui.label("max y");
            ui.add(DragValue::new(&mut bbox.maxy).speed(BBOX_DRAG_SPEED));
            ui.end_row();
        });
        ui.horizontal(|ui| {
            ui.label("Grids");
            ui.add(
                egui::TextEdit::singleline(&mut self.controller.ui.grids_text)
                    .hint_text("all grids"),
            );
        });
        self.render_thumbnail(ui);
    }

    fn render_task_section(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        ui.heading("Similarity");
        let task = &self.controller.ui.task;
        let busy = task.submitting || task.polling;
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, Button::new("Compute")).clicked() {
                self.controller.start_compute();
            }
            if busy {
                ui.spinner();
            }
        });
        let task = &self.controller.ui.task;
        if let Some(task_id) = &task.task_id {
            ui.label(format!("Task {task_id}: {}", task.status_label()));
        }
        if let Some(result) = &task.result {
            metrics_grid(ui, "task_metrics", &MetricsView::from(result));
        }
        if let Some(error) = &task.error {
            ui.label(RichText::new(error).color(palette.dataset_a));
        }
    }

    fn render_stats_section(&mut self, ui: &mut Ui) {
        ui.heading("Region statistics");
        for scope in [StatsScope::Global, StatsScope::BoundingBox] {
            let slot = self.controller.ui.stats.slot(scope);
            let loading = slot.loading;
            ui.horizontal(|ui| {
                if ui.add_enabled(!loading, Button::new(scope.label())).clicked() {
                    self.controller.load_stats(scope);
                }
                if loading {
                    ui.spinner();
                }
            });
            if let Some(stats) = &self.controller.ui.stats.slot(scope).result {
                metrics_grid(ui, scope.label(), &MetricsView::from(&stats.metrics));
            }
        }
    }

    pub(super) fn render_view_panel(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        ui.horizontal(|ui| {
            let loading = self.controller.ui.polygons.loading;
            if ui
                .add_enabled(!loading, Button::new("Load polygons"))
                .clicked()
            {
                self.controller.load_polygons();
            }
            if loading {
                ui.spinner();
            }
            ui.label(format!(
                "A: {}  B: {}",
                self.controller.ui.polygons.count_a, self.controller.ui.polygons.count_b
            ));
            ui.separator();
            let active = self.controller.active_renderer();
            let other = match active {
                RendererKind::Raster => RendererKind::Accelerated,
                RendererKind::Accelerated => RendererKind::Raster,
            };
            let toggle = ui.button(format!("Use {}", other.label().to_lowercase()));
            let selector = &self.controller.ui.view.renderer;
            let toggle = match (selector.accelerated_supported(), selector.last_failure()) {
                (_, Some(reason)) => toggle.on_hover_text(format!("Accelerated view failed: {reason}")),
                (false, None) => toggle.on_hover_text("Hardware acceleration was not detected"),
                (true, None) => toggle,
            };
            if toggle.clicked() {
                self.controller.toggle_renderer();
            }
            ui.label(RichText::new(active.label()).color(palette.text_muted));
            if active == RendererKind::Raster {
                if ui.button("−").clicked() {
                    self.controller.ui.view.raster.zoom_out();
                }
                if ui.button("+").clicked() {
                    self.controller.ui.view.raster.zoom_in();
                }
            }
            if ui.button("Reset view").clicked() {
                self.controller.reset_view();
            }
        });
        Frame::NONE.stroke(style::section_stroke()).show(ui, |ui| {
            match self.controller.active_renderer() {
                RendererKind::Raster => self.render_raster_view(ui),
                RendererKind::Accelerated => self.render_scene_view(ui),
            }
        });
    }

    pub(super) fn render_status(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(Frame::NONE.fill(palette.bg_window).inner_margin(4.0))
            .show(ctx, |ui| {
                let status = &self.controller.ui.status;
                ui.horizontal(|ui| {
                    let (dot, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                    ui.painter()
                        .circle_filled(dot.center(), 6.0, status.badge_color);
                    ui.label(RichText::new(&status.badge_label).strong());
                    ui.separator();
                    let text = ui.label(&status.text);
                    if !status.log.is_empty() {
                        text.on_hover_text(status.log_text());
                    }
                });
            });
    }
}

fn metrics_grid(ui: &mut Ui, id: &str, view: &MetricsView) {
    Grid::new(id).num_columns(2).striped(true).show(ui, |ui| {
        for (label, value) in view.rows() {
            ui.label(label);
            ui.monospace(value);
            ui.end_row();
        }
    });
}
