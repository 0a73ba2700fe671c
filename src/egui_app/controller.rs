//! Owns the UI state and turns user actions into background requests
//! against the matching service.

mod jobs;
mod regions;
mod tasks;
mod upload;
mod view;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::MatchService;
use crate::config::{self, AppSettings};
use crate::egui_app::state::{UiState, UploadState, ViewState};
use crate::egui_app::ui::style::{self, StatusTone};
use crate::view::RendererSelector;
use jobs::{ControllerJobs, JobMessage};

/// Status log key shared by every upload progress update.
pub const UPLOAD_STATUS_KEY: &str = "upload-progress";

/// Maintains app state and bridges the service client to the egui UI.
pub struct EguiController {
    pub ui: UiState,
    settings: AppSettings,
    jobs: ControllerJobs,
}

impl EguiController {
    /// Build a controller. `accelerated_supported` is the startup probe result.
    pub fn new(
        service: Arc<dyn MatchService>,
        settings: AppSettings,
        accelerated_supported: bool,
    ) -> Self {
        let renderer =
            RendererSelector::from_probe(accelerated_supported, settings.view.prefer_accelerated);
        let mut ui = UiState::new(
            settings.view.global_bounds,
            &settings.analysis.grids,
            ViewState::new(renderer),
        );
        ui.upload =
            UploadState::with_prefixes(&settings.datasets.prefix_a, &settings.datasets.prefix_b);
        let jobs = ControllerJobs::new(service, settings.analysis.poll_interval());
        Self { ui, settings, jobs }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Apply every finished background result. Call once per frame.
    pub fn tick(&mut self) {
        while let Ok(message) = self.jobs.try_recv_message() {
            match message {
                JobMessage::Upload(message) => self.handle_upload_message(message),
                JobMessage::TaskCreated(result) => self.handle_task_created(result),
                JobMessage::TaskPoll { task_id, event } => self.handle_task_poll(task_id, event),
                JobMessage::StatsLoaded { scope, result } => self.handle_stats_loaded(scope, result),
                JobMessage::PolygonsLoaded { bbox, result } => {
                    self.handle_polygons_loaded(bbox, result)
                }
            }
        }
    }

    /// Whether any request is outstanding, so the UI keeps repainting.
    pub fn is_busy(&self) -> bool {
        self.ui.upload.uploading
            || self.ui.task.submitting
            || self.ui.task.polling
            || self.ui.stats.global.loading
            || self.ui.stats.bbox.loading
            || self.ui.polygons.loading
    }

    /// Stop the task poller. Requests already in flight finish on their own.
    pub fn shutdown(&mut self) {
        if self.ui.task.polling {
            info!("Stopping task poller");
        }
        self.jobs.clear_task_poll();
        self.ui.task.polling = false;
    }

    /// Settings with the user's edits (prefixes, grids) folded in.
    pub fn settings_snapshot(&self) -> AppSettings {
        let mut settings = self.settings.clone();
        settings.datasets.prefix_a = self.ui.upload.a.prefix.trim().to_string();
        settings.datasets.prefix_b = self.ui.upload.b.prefix.trim().to_string();
        settings.analysis.grids = self.ui.grids();
        settings.normalized()
    }

    /// Persist the edited settings, reporting a status on failure.
    pub fn save_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        match config::save(&snapshot) {
            Ok(()) => self.settings = snapshot,
            Err(err) => {
                warn!(error = %err, "Failed to save settings");
                self.set_status(format!("Failed to save settings: {err}"), StatusTone::Error);
            }
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.write_status(None, text.into(), tone);
    }

    /// Like [`Self::set_status`], but repeated calls with the same key update
    /// one log line.
    pub(crate) fn set_keyed_status(
        &mut self,
        key: &'static str,
        text: impl Into<String>,
        tone: StatusTone,
    ) {
        self.write_status(Some(key), text.into(), tone);
    }

    fn write_status(&mut self, key: Option<&'static str>, text: String, tone: StatusTone) {
        let (label, color) = style::status_badge(tone);
        self.ui.status.record(key, text.clone());
        self.ui.status.text = text;
        self.ui.status.badge_label = label;
        self.ui.status.badge_color = color;
    }
}

impl Drop for EguiController {
    fn drop(&mut self) {
        self.jobs.clear_task_poll();
    }
}
