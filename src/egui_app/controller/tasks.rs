use tracing::{info, warn};

use super::EguiController;
use super::jobs::PollEvent;
use crate::api::{ApiError, TaskCreated, TaskRequest, TaskStatus};
use crate::egui_app::state::{MetricsView, TaskState};
use crate::egui_app::ui::style::StatusTone;

impl EguiController {
    /// Create a task for the current prefixes and bbox, then poll it.
    pub fn start_compute(&mut self) {
        if self.ui.task.submitting {
            return;
        }
        let request = TaskRequest {
            dataset_a: self.ui.upload.a.prefix.trim().to_string(),
            dataset_b: self.ui.upload.b.prefix.trim().to_string(),
            bbox: Some(self.ui.bbox),
            grids: self.ui.grids(),
        };
        self.jobs.clear_task_poll();
        self.ui.task = TaskState {
            submitting: true,
            ..TaskState::default()
        };
        info!(dataset_a = %request.dataset_a, dataset_b = %request.dataset_b, "Creating task");
        self.set_status("Creating task…", StatusTone::Busy);
        self.jobs.begin_create_task(request);
    }

    pub fn is_polling(&self) -> bool {
        self.ui.task.polling
    }

    pub(super) fn handle_task_created(&mut self, result: Result<TaskCreated, ApiError>) {
        self.ui.task.submitting = false;
        match result {
            Ok(created) => {
                let terminal = created.status.is_terminal();
                self.ui.task.task_id = Some(created.task_id.clone());
                self.ui.task.status = Some(created.status);
                self.set_status(format!("Task {} created", created.task_id), StatusTone::Busy);
                if !terminal {
                    self.ui.task.polling = true;
                    self.jobs.begin_task_poll(created.task_id);
                }
            }
            Err(err) => {
                warn!(error = %err, "Task creation failed");
                self.ui.task.error = Some(err.user_message());
                self.set_status(
                    format!("Failed to create task: {}", err.user_message()),
                    StatusTone::Error,
                );
            }
        }
    }

    pub(super) fn handle_task_poll(&mut self, task_id: String, event: PollEvent) {
        if self.ui.task.task_id.as_deref() != Some(task_id.as_str())
            || !self.jobs.task_poll_active_for(&task_id)
        {
            return;
        }
        match event {
            PollEvent::Snapshot {
                snapshot,
                result_error,
            } => {
                let terminal = snapshot.status.is_terminal();
                match snapshot.status {
                    TaskStatus::Done => {
                        let view = snapshot.result.as_ref().map(MetricsView::from);
                        self.ui.task.result = snapshot.result;
                        match (view, result_error) {
                            (Some(view), _) => {
                                self.set_status(
                                    format!("Task done, Jaccard {}", view.jaccard),
                                    StatusTone::Info,
                                );
                            }
                            (None, Some(err)) => {
                                warn!(%task_id, error = %err, "Task result unavailable");
                                self.ui.task.error = Some(err.user_message());
                                self.set_status(
                                    format!(
                                        "Task finished but its result is unavailable: {}",
                                        err.user_message()
                                    ),
                                    StatusTone::Warning,
                                );
                            }
                            (None, None) => self.set_status("Task done", StatusTone::Info),
                        }
                    }
                    TaskStatus::Failed => {
                        let reason = snapshot
                            .error
                            .unwrap_or_else(|| "no reason given".to_string());
                        self.set_status(format!("Task failed: {reason}"), StatusTone::Error);
                        self.ui.task.error = Some(reason);
                    }
                    _ => {}
                }
                self.ui.task.status = Some(snapshot.status);
                if terminal {
                    self.finish_polling();
                }
            }
            PollEvent::Failed { error, fatal } => {
                if fatal {
                    self.ui.task.error = Some(error.user_message());
                    self.finish_polling();
                    self.set_status(
                        format!("Stopped polling: {}", error.user_message()),
                        StatusTone::Error,
                    );
                } else {
                    self.set_status(
                        format!("Poll failed, retrying next interval: {}", error.user_message()),
                        StatusTone::Warning,
                    );
                }
            }
        }
    }

    fn finish_polling(&mut self) {
        self.ui.task.polling = false;
        self.jobs.clear_task_poll();
    }
}
