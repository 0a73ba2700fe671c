//! Background jobs. Each request runs on its own thread and reports back
//! through one channel that the controller drains once per frame.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, TryRecvError},
    },
    thread,
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::api::{
    ApiError, BoundingBox, MatchService, PolygonPage, RegionStats, TaskCreated, TaskRequest,
    TaskSnapshot, TaskStatus,
};
use crate::egui_app::state::{DatasetSlot, StatsScope};

pub(crate) enum JobMessage {
    Upload(UploadMessage),
    TaskCreated(Result<TaskCreated, ApiError>),
    TaskPoll { task_id: String, event: PollEvent },
    StatsLoaded {
        scope: StatsScope,
        result: Result<RegionStats, ApiError>,
    },
    PolygonsLoaded {
        bbox: BoundingBox,
        result: Result<(PolygonPage, PolygonPage), ApiError>,
    },
}

pub(crate) enum UploadMessage {
    Progress { slot: DatasetSlot, percent: u8 },
    SlotDone {
        slot: DatasetSlot,
        response: serde_json::Value,
    },
    Finished(Result<(), (DatasetSlot, ApiError)>),
}

pub(crate) enum PollEvent {
    Snapshot {
        snapshot: TaskSnapshot,
        /// Set when the task reported `DONE` but its result could not be fetched.
        result_error: Option<ApiError>,
    },
    Failed { error: ApiError, fatal: bool },
}

#[derive(Debug, Clone)]
pub(crate) struct UploadJob {
    pub(crate) datasets: [(DatasetSlot, String, PathBuf); 2],
}

#[derive(Debug, Clone)]
pub(crate) struct StatsJob {
    pub(crate) scope: StatsScope,
    pub(crate) dataset_a: String,
    pub(crate) dataset_b: String,
    pub(crate) bbox: Option<BoundingBox>,
    pub(crate) grids: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct PolygonJob {
    pub(crate) dataset_a: String,
    pub(crate) dataset_b: String,
    pub(crate) bbox: BoundingBox,
    pub(crate) limit: usize,
    pub(crate) grids: Vec<String>,
}

/// Sole owner of a running task poller; dropping it stops the poller.
pub(crate) struct TaskPollHandle {
    task_id: String,
    cancel: Arc<AtomicBool>,
}

impl TaskPollHandle {
    pub(crate) fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl Drop for TaskPollHandle {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

pub(crate) struct ControllerJobs {
    service: Arc<dyn MatchService>,
    message_tx: Sender<JobMessage>,
    message_rx: Receiver<JobMessage>,
    poll_interval: Duration,
    task_poll: Option<TaskPollHandle>,
}

impl ControllerJobs {
    pub(crate) fn new(service: Arc<dyn MatchService>, poll_interval: Duration) -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel();
        Self {
            service,
            message_tx,
            message_rx,
            poll_interval,
            task_poll: None,
        }
    }

    pub(crate) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    /// Upload A then B; B is never attempted when A fails.
    pub(crate) fn begin_upload(&self, job: UploadJob) {
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            for (slot, prefix, path) in job.datasets {
                let progress_tx = tx.clone();
                let mut on_progress = |percent: u8| {
                    let _ = progress_tx.send(JobMessage::Upload(UploadMessage::Progress {
                        slot,
                        percent,
                    }));
                };
                match service.upload_dataset(&prefix, &path, &mut on_progress) {
                    Ok(response) => {
                        let _ = tx.send(JobMessage::Upload(UploadMessage::SlotDone {
                            slot,
                            response,
                        }));
                    }
                    Err(err) => {
                        warn!(slot = slot.label(), error = %err, "Upload failed");
                        let _ = tx.send(JobMessage::Upload(UploadMessage::Finished(Err((
                            slot, err,
                        )))));
                        return;
                    }
                }
            }
            let _ = tx.send(JobMessage::Upload(UploadMessage::Finished(Ok(()))));
        });
    }

    pub(crate) fn begin_create_task(&self, request: TaskRequest) {
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let _ = tx.send(JobMessage::TaskCreated(service.create_task(&request)));
        });
    }

    /// Start polling `task_id`, replacing (and stopping) any previous poller.
    ///
    /// The loop waits one interval before each request, so requests never
    /// overlap, and it exits after the first terminal status.
    pub(crate) fn begin_task_poll(&mut self, task_id: String) {
        let cancel = Arc::new(AtomicBool::new(false));
        self.task_poll = Some(TaskPollHandle {
            task_id: task_id.clone(),
            cancel: Arc::clone(&cancel),
        });
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        let interval = self.poll_interval;
        info!(%task_id, ?interval, "Polling task");
        thread::spawn(move || {
            let send = |event: PollEvent| {
                tx.send(JobMessage::TaskPoll {
                    task_id: task_id.clone(),
                    event,
                })
                .is_ok()
            };
            loop {
                thread::sleep(interval);
                if cancel.load(Ordering::Relaxed) {
                    debug!(%task_id, "Task poller cancelled");
                    break;
                }
                match service.get_task(&task_id) {
                    Ok(mut snapshot) => {
                        let terminal = snapshot.status.is_terminal();
                        let mut result_error = None;
                        if snapshot.status == TaskStatus::Done && snapshot.result.is_none() {
                            match service.get_result(&task_id) {
                                Ok(result) => snapshot.result = Some(result),
                                Err(err) => result_error = Some(err),
                            }
                        }
                        let event = PollEvent::Snapshot {
                            snapshot,
                            result_error,
                        };
                        if !send(event) || terminal {
                            break;
                        }
                    }
                    Err(error) => {
                        let fatal = !error.is_transient();
                        if !send(PollEvent::Failed { error, fatal }) || fatal {
                            break;
                        }
                    }
                }
            }
        });
    }

    pub(crate) fn task_poll_active_for(&self, task_id: &str) -> bool {
        self.task_poll
            .as_ref()
            .is_some_and(|handle| handle.task_id() == task_id)
    }

    pub(crate) fn clear_task_poll(&mut self) {
        self.task_poll = None;
    }

    pub(crate) fn begin_stats(&self, job: StatsJob) {
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let result =
                service.get_region_stats(&job.dataset_a, &job.dataset_b, job.bbox, &job.grids);
            let _ = tx.send(JobMessage::StatsLoaded {
                scope: job.scope,
                result,
            });
        });
    }

    /// Fetch both datasets concurrently and report them as one message.
    pub(crate) fn begin_polygons(&self, job: PolygonJob) {
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let fetch = |dataset: &str| {
                service.get_polygons(dataset, job.bbox, job.limit, &job.grids)
            };
            let (a, b) = thread::scope(|scope| {
                let a = scope.spawn(|| fetch(&job.dataset_a));
                let b = fetch(&job.dataset_b);
                let a = a
                    .join()
                    .unwrap_or_else(|_| Err(ApiError::Transport("polygon fetch panicked".into())));
                (a, b)
            });
            let result = a.and_then(|a| b.map(|b| (a, b)));
            let _ = tx.send(JobMessage::PolygonsLoaded {
                bbox: job.bbox,
                result,
            });
        });
    }
}
