use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use super::*;
use crate::api::{
    ApiError, BoundingBox, PolygonFeature, PolygonPage, RegionStats, SimilarityMetrics,
    TaskCreated, TaskRequest, TaskSnapshot, TaskStatus,
};

/// Scripted in-memory service. Unscripted task polls report `RUNNING`.
#[derive(Default)]
pub(super) struct FakeService {
    pub(super) uploads: Mutex<Vec<String>>,
    pub(super) failing_prefixes: Mutex<Vec<String>>,
    pub(super) created: Mutex<Vec<TaskRequest>>,
    pub(super) task_script: Mutex<VecDeque<Result<TaskSnapshot, ApiError>>>,
    pub(super) task_calls: Mutex<Vec<String>>,
    pub(super) result: Mutex<Option<SimilarityMetrics>>,
    pub(super) result_calls: AtomicUsize,
    pub(super) polygons: Mutex<HashMap<String, PolygonPage>>,
    pub(super) polygon_bboxes: Mutex<Vec<BoundingBox>>,
    pub(super) stats_calls: Mutex<Vec<Option<BoundingBox>>>,
}

impl FakeService {
    pub(super) fn script(&self, steps: Vec<Result<TaskSnapshot, ApiError>>) {
        self.task_script.lock().unwrap().extend(steps);
    }

    pub(super) fn task_calls_for(&self, task_id: &str) -> usize {
        self.task_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == task_id)
            .count()
    }
}

impl MatchService for FakeService {
    fn upload_dataset(
        &self,
        prefix: &str,
        _path: &Path,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<serde_json::Value, ApiError> {
        self.uploads.lock().unwrap().push(prefix.to_string());
        if self.failing_prefixes.lock().unwrap().iter().any(|p| p == prefix) {
            return Err(ApiError::Status {
                code: 400,
                message: format!("bad file for {prefix}"),
            });
        }
        on_progress(50);
        on_progress(100);
        Ok(json!({ "path": format!("/data/{prefix}") }))
    }

    fn create_task(&self, request: &TaskRequest) -> Result<TaskCreated, ApiError> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(TaskCreated {
            task_id: format!("t{}", created.len()),
            status: TaskStatus::Pending,
        })
    }

    fn get_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError> {
        self.task_calls.lock().unwrap().push(task_id.to_string());
        self.task_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(snapshot(TaskStatus::Running, None)))
    }

    fn get_result(&self, _task_id: &str) -> Result<SimilarityMetrics, ApiError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap()
            .ok_or_else(|| ApiError::Status {
                code: 404,
                message: "no result".into(),
            })
    }

    fn get_polygons(
        &self,
        dataset: &str,
        bbox: BoundingBox,
        _limit: usize,
        _grids: &[String],
    ) -> Result<PolygonPage, ApiError> {
        self.polygon_bboxes.lock().unwrap().push(bbox);
        self.polygons
            .lock()
            .unwrap()
            .get(dataset)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                code: 404,
                message: format!("unknown dataset {dataset}"),
            })
    }

    fn get_region_stats(
        &self,
        dataset_a: &str,
        dataset_b: &str,
        bbox: Option<BoundingBox>,
        _grids: &[String],
    ) -> Result<RegionStats, ApiError> {
        self.stats_calls.lock().unwrap().push(bbox);
        Ok(RegionStats {
            dataset_a: Some(dataset_a.to_string()),
            dataset_b: Some(dataset_b.to_string()),
            bbox,
            metrics: metrics(if bbox.is_some() { 0.25 } else { 0.5 }),
        })
    }
}

pub(super) fn metrics(jaccard: f64) -> SimilarityMetrics {
    SimilarityMetrics {
        block_jaccard: jaccard,
        intersection_count: 7,
        area_a: 10.0,
        area_b: 8.0,
        area_inter: 4.5,
    }
}

pub(super) fn snapshot(status: TaskStatus, result: Option<SimilarityMetrics>) -> TaskSnapshot {
    TaskSnapshot {
        task_id: None,
        status,
        result,
        error: None,
    }
}

pub(super) fn square_feature(id: u64, origin: f64) -> PolygonFeature {
    serde_json::from_value(json!({
        "id": id,
        "area": 1.0,
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [origin, origin], [origin + 1.0, origin], [origin + 1.0, origin + 1.0],
                [origin, origin + 1.0], [origin, origin]
            ]]
        }
    }))
    .unwrap()
}

pub(super) fn page(features: Vec<PolygonFeature>) -> PolygonPage {
    PolygonPage {
        dataset: None,
        count: features.len(),
        features,
    }
}

pub(super) fn test_controller(accelerated: bool) -> (EguiController, Arc<FakeService>) {
    let service = Arc::new(FakeService::default());
    let mut settings = AppSettings::default();
    settings.analysis.poll_interval_ms = 5;
    let controller = EguiController::new(service.clone(), settings, accelerated);
    (controller, service)
}

/// Drain job messages until `done` holds, failing after a few seconds.
pub(super) fn pump_until(controller: &mut EguiController, done: impl Fn(&EguiController) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        controller.tick();
        if done(controller) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for background jobs");
        thread::sleep(Duration::from_millis(2));
    }
}
