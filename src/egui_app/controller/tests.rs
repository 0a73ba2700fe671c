use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use super::test_support::*;
use crate::api::{ApiError, BoundingBox, TaskStatus};
use crate::egui_app::state::{DatasetSlot, StatsScope};
use crate::view::RendererKind;

#[test]
fn compute_polls_until_done_and_stops() {
    let (mut controller, service) = test_controller(false);
    service.script(vec![
        Ok(snapshot(TaskStatus::Running, None)),
        Ok(snapshot(TaskStatus::Done, Some(metrics(0.42)))),
    ]);

    controller.start_compute();
    pump_until(&mut controller, |c| c.ui.task.status == Some(TaskStatus::Done));

    assert!(!controller.is_polling());
    assert_eq!(controller.ui.task.task_id.as_deref(), Some("t1"));
    assert_eq!(controller.ui.task.result, Some(metrics(0.42)));
    assert!(controller.ui.status.text.contains("0.420000"));
    thread::sleep(Duration::from_millis(40));
    controller.tick();
    assert_eq!(service.task_calls_for("t1"), 2);
    assert_eq!(service.result_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn compute_sends_bbox_and_grids() {
    let (mut controller, service) = test_controller(false);
    controller.ui.bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
    controller.ui.grids_text = " g1, ,g2 ".into();
    service.script(vec![Ok(snapshot(TaskStatus::Done, Some(metrics(0.1))))]);

    controller.start_compute();
    pump_until(&mut controller, |c| !c.is_busy());

    let created = service.created.lock().unwrap();
    assert_eq!(created[0].bbox, Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0)));
    assert_eq!(created[0].grids, vec!["g1".to_string(), "g2".to_string()]);
    assert_eq!(created[0].dataset_a, "data_a");
}

#[test]
fn done_without_inline_result_fetches_result_once() {
    let (mut controller, service) = test_controller(false);
    *service.result.lock().unwrap() = Some(metrics(0.9));
    service.script(vec![Ok(snapshot(TaskStatus::Done, None))]);

    controller.start_compute();
    pump_until(&mut controller, |c| c.ui.task.status == Some(TaskStatus::Done));

    assert_eq!(controller.ui.task.result, Some(metrics(0.9)));
    assert_eq!(service.result_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn done_with_unfetchable_result_reports_error() {
    let (mut controller, service) = test_controller(false);
    service.script(vec![Ok(snapshot(TaskStatus::Done, None))]);

    controller.start_compute();
    pump_until(&mut controller, |c| c.ui.task.status == Some(TaskStatus::Done));
    thread::sleep(Duration::from_millis(50));
    controller.tick();

    assert_eq!(service.result_calls.load(Ordering::SeqCst), 1);
    assert!(controller.ui.task.result.is_none());
    assert!(!controller.is_polling());
    let error = controller.ui.task.error.as_deref().unwrap_or_default();
    assert!(error.contains("no result"), "{error}");
    assert!(controller.ui.status.text.contains("result is unavailable"));
}

#[test]
fn failed_task_surfaces_server_error() {
    let (mut controller, service) = test_controller(false);
    let mut failed = snapshot(TaskStatus::Failed, None);
    failed.error = Some("grid mismatch".into());
    service.script(vec![Ok(failed)]);

    controller.start_compute();
    pump_until(&mut controller, |c| c.ui.task.status == Some(TaskStatus::Failed));

    assert!(!controller.is_polling());
    assert_eq!(controller.ui.task.error.as_deref(), Some("grid mismatch"));
    assert!(controller.ui.status.text.contains("grid mismatch"));
}

#[test]
fn transient_poll_errors_keep_polling() {
    let (mut controller, service) = test_controller(false);
    service.script(vec![
        Err(ApiError::Transport("connection reset".into())),
        Err(ApiError::Status {
            code: 503,
            message: "busy".into(),
        }),
        Ok(snapshot(TaskStatus::Done, Some(metrics(0.3)))),
    ]);

    controller.start_compute();
    pump_until(&mut controller, |c| c.ui.task.status == Some(TaskStatus::Done));

    assert_eq!(service.task_calls_for("t1"), 3);
    assert_eq!(controller.ui.task.result, Some(metrics(0.3)));
}

#[test]
fn client_errors_end_polling() {
    let (mut controller, service) = test_controller(false);
    service.script(vec![Err(ApiError::Status {
        code: 404,
        message: "Task not found".into(),
    })]);

    controller.start_compute();
    pump_until(&mut controller, |c| c.ui.task.error.is_some());

    assert!(!controller.is_polling());
    assert!(controller.ui.status.text.contains("Task not found"));
    thread::sleep(Duration::from_millis(40));
    assert_eq!(service.task_calls_for("t1"), 1);
}

#[test]
fn new_compute_stops_previous_poller() {
    let (mut controller, service) = test_controller(false);
    controller.start_compute();
    pump_until(&mut controller, |c| c.is_polling());
    controller.start_compute();
    pump_until(&mut controller, |c| {
        c.ui.task.task_id.as_deref() == Some("t2") && c.is_polling()
    });

    thread::sleep(Duration::from_millis(30));
    let settled = service.task_calls_for("t1");
    thread::sleep(Duration::from_millis(60));
    assert_eq!(service.task_calls_for("t1"), settled);
    assert!(service.task_calls_for("t2") > 0);

    controller.shutdown();
    assert!(!controller.is_polling());
}

#[test]
fn upload_runs_a_then_b_and_collapses_progress() {
    let (mut controller, service) = test_controller(false);
    controller.set_dataset_file(DatasetSlot::A, "a.csv".into());
    controller.set_dataset_file(DatasetSlot::B, "b.csv".into());

    controller.start_upload();
    pump_until(&mut controller, |c| !c.ui.upload.uploading);

    assert_eq!(*service.uploads.lock().unwrap(), vec!["data_a", "data_b"]);
    assert_eq!(controller.ui.upload.b.progress, Some(100));
    assert_eq!(
        controller.ui.upload.a.response.as_deref(),
        Some("stored at /data/data_a")
    );
    assert_eq!(controller.ui.status.log_text(), "Upload complete");
}

#[test]
fn upload_stops_after_first_failure() {
    let (mut controller, service) = test_controller(false);
    service.failing_prefixes.lock().unwrap().push("data_a".into());
    controller.set_dataset_file(DatasetSlot::A, "a.csv".into());
    controller.set_dataset_file(DatasetSlot::B, "b.csv".into());

    controller.start_upload();
    pump_until(&mut controller, |c| !c.ui.upload.uploading);

    assert_eq!(*service.uploads.lock().unwrap(), vec!["data_a"]);
    assert!(controller.ui.status.text.contains("bad file for data_a"));
    assert!(controller.ui.upload.b.response.is_none());
}

#[test]
fn upload_requires_both_files() {
    let (mut controller, service) = test_controller(false);
    controller.set_dataset_file(DatasetSlot::A, "a.csv".into());

    controller.start_upload();

    assert!(!controller.ui.upload.uploading);
    assert!(service.uploads.lock().unwrap().is_empty());
    assert_eq!(controller.ui.status.badge_label, "Warning");
}

#[test]
fn polygons_replace_both_sets_together() {
    let (mut controller, service) = test_controller(false);
    {
        let mut polygons = service.polygons.lock().unwrap();
        polygons.insert("data_a".into(), page(vec![square_feature(1, 0.0), square_feature(2, 3.0)]));
        polygons.insert("data_b".into(), page(vec![square_feature(9, 1.0)]));
    }

    controller.load_polygons();
    pump_until(&mut controller, |c| !c.ui.polygons.loading);

    assert_eq!(controller.ui.polygons.a.len(), 2);
    assert_eq!(controller.ui.polygons.b.len(), 1);
    assert_eq!(controller.ui.polygons.revision, 1);
    assert_eq!(controller.ui.status.text, "Loaded A:2 / B:1");

    service.polygons.lock().unwrap().remove("data_b");
    controller.load_polygons();
    pump_until(&mut controller, |c| !c.ui.polygons.loading);

    assert_eq!(controller.ui.polygons.revision, 1);
    assert_eq!(controller.ui.polygons.a.len(), 2);
    assert!(controller.ui.status.text.contains("unknown dataset data_b"));
}

#[test]
fn polygon_query_sends_bbox_as_entered() {
    let (mut controller, service) = test_controller(false);
    {
        let mut polygons = service.polygons.lock().unwrap();
        polygons.insert("data_a".into(), page(vec![square_feature(1, 0.0)]));
        polygons.insert("data_b".into(), page(vec![]));
    }
    let inverted = BoundingBox::new(10.0, 8.0, 2.0, 1.0);
    controller.ui.bbox = inverted;

    controller.load_polygons();
    pump_until(&mut controller, |c| !c.ui.polygons.loading);

    assert_eq!(*service.polygon_bboxes.lock().unwrap(), vec![inverted, inverted]);
    assert_eq!(controller.ui.polygons.loaded_for, Some(inverted));
}

#[test]
fn stats_scopes_load_independently() {
    let (mut controller, service) = test_controller(false);
    controller.load_stats(StatsScope::Global);
    controller.load_stats(StatsScope::BoundingBox);
    assert!(controller.ui.stats.global.loading && controller.ui.stats.bbox.loading);

    pump_until(&mut controller, |c| !c.is_busy());

    let global = controller.ui.stats.global.result.as_ref().unwrap();
    let bbox = controller.ui.stats.bbox.result.as_ref().unwrap();
    assert_eq!(global.bbox, None);
    assert_eq!(global.metrics.block_jaccard, 0.5);
    assert_eq!(bbox.bbox, Some(controller.ui.bbox));
    assert_eq!(service.stats_calls.lock().unwrap().len(), 2);
}

#[test]
fn renderer_switch_hands_framing_over() {
    let (mut controller, _service) = test_controller(true);
    assert_eq!(controller.active_renderer(), RendererKind::Accelerated);
    let shown = BoundingBox::new(-5.0, -5.0, 5.0, 5.0);
    controller.publish_visible(shown);

    controller.toggle_renderer();
    assert_eq!(controller.active_renderer(), RendererKind::Raster);
    assert_eq!(controller.take_pending_frame(), Some(shown));
    assert_eq!(controller.take_pending_frame(), None);

    controller.toggle_renderer();
    controller.report_scene_failure("triangulation failed");
    assert_eq!(controller.active_renderer(), RendererKind::Raster);
    assert_eq!(controller.take_pending_frame(), Some(shown));
    assert_eq!(controller.ui.status.badge_label, "Warning");
}

#[test]
fn failed_probe_starts_on_raster_but_allows_manual_switch() {
    let (mut controller, _service) = test_controller(false);
    assert_eq!(controller.active_renderer(), RendererKind::Raster);
    controller.toggle_renderer();
    assert_eq!(controller.active_renderer(), RendererKind::Accelerated);
}

#[test]
fn settings_snapshot_folds_in_edits() {
    let (mut controller, _service) = test_controller(false);
    controller.ui.upload.a.prefix = " left ".into();
    controller.ui.grids_text = "g7".into();

    let snapshot = controller.settings_snapshot();

    assert_eq!(snapshot.datasets.prefix_a, "left");
    assert_eq!(snapshot.datasets.prefix_b, "data_b");
    assert_eq!(snapshot.analysis.grids, vec!["g7".to_string()]);
}
