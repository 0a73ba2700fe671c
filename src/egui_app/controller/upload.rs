use std::path::PathBuf;

use rfd::FileDialog;
use tracing::info;

use super::jobs::{UploadJob, UploadMessage};
use super::{EguiController, UPLOAD_STATUS_KEY};
use crate::egui_app::state::DatasetSlot;
use crate::egui_app::ui::style::StatusTone;

impl EguiController {
    /// Choose a dataset file with the native picker.
    pub fn pick_dataset_file(&mut self, slot: DatasetSlot) {
        let Some(path) = FileDialog::new()
            .set_title(format!("Dataset {}", slot.label()))
            .add_filter("Datasets", &["csv", "txt", "wkt"])
            .add_filter("All files", &["*"])
            .pick_file()
        else {
            return;
        };
        self.set_dataset_file(slot, path);
    }

    pub fn set_dataset_file(&mut self, slot: DatasetSlot, path: PathBuf) {
        let entry = self.ui.upload.slot_mut(slot);
        entry.file = Some(path);
        entry.response = None;
    }

    /// Upload A then B in the background.
    pub fn start_upload(&mut self) {
        if self.ui.upload.uploading {
            return;
        }
        let (Some(path_a), Some(path_b)) =
            (self.ui.upload.a.file.clone(), self.ui.upload.b.file.clone())
        else {
            self.set_status("Select both dataset files before uploading", StatusTone::Warning);
            return;
        };
        let prefix_a = self.ui.upload.a.prefix.trim().to_string();
        let prefix_b = self.ui.upload.b.prefix.trim().to_string();
        if prefix_a.is_empty() || prefix_b.is_empty() {
            self.set_status("Both datasets need a prefix", StatusTone::Warning);
            return;
        }
        info!(%prefix_a, %prefix_b, "Starting upload");
        self.ui.upload.uploading = true;
        for slot in [DatasetSlot::A, DatasetSlot::B] {
            let entry = self.ui.upload.slot_mut(slot);
            entry.progress = None;
            entry.response = None;
        }
        self.set_keyed_status(UPLOAD_STATUS_KEY, "Uploading…", StatusTone::Busy);
        self.jobs.begin_upload(UploadJob {
            datasets: [
                (DatasetSlot::A, prefix_a, path_a),
                (DatasetSlot::B, prefix_b, path_b),
            ],
        });
    }

    pub(super) fn handle_upload_message(&mut self, message: UploadMessage) {
        match message {
            UploadMessage::Progress { slot, percent } => {
                self.ui.upload.slot_mut(slot).progress = Some(percent);
                self.set_keyed_status(
                    UPLOAD_STATUS_KEY,
                    format!("Uploading {}… {percent}%", slot.label()),
                    StatusTone::Busy,
                );
            }
            UploadMessage::SlotDone { slot, response } => {
                let entry = self.ui.upload.slot_mut(slot);
                entry.progress = Some(100);
                entry.response = Some(summarize_response(&response));
            }
            UploadMessage::Finished(result) => {
                self.ui.upload.uploading = false;
                match result {
                    Ok(()) => {
                        self.set_keyed_status(UPLOAD_STATUS_KEY, "Upload complete", StatusTone::Info)
                    }
                    Err((slot, err)) => {
                        self.ui.upload.slot_mut(slot).progress = None;
                        self.set_keyed_status(
                            UPLOAD_STATUS_KEY,
                            format!("Upload of {} failed: {}", slot.label(), err.user_message()),
                            StatusTone::Error,
                        );
                    }
                }
                self.ui.status.release_key(UPLOAD_STATUS_KEY);
            }
        }
    }
}

/// Short human-readable form of the server's upload acknowledgement.
fn summarize_response(response: &serde_json::Value) -> String {
    match response {
        serde_json::Value::Null => "stored".to_string(),
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Object(map) => match map.get("path").and_then(|p| p.as_str()) {
            Some(path) => format!("stored at {path}"),
            None => response.to_string(),
        },
        other => other.to_string(),
    }
}
