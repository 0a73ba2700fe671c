//! Typed access to the spatial matching service.

mod client;
mod error;
mod multipart;
mod types;

use std::path::Path;

pub use client::ApiClient;
pub use error::{ApiError, FALLBACK_MESSAGE};
pub use types::{
    BoundingBox, Coordinates, FeatureId, Geometry, PolygonFeature, PolygonPage, Position,
    RegionStats, Ring, SimilarityMetrics, TaskCreated, TaskRequest, TaskSnapshot, TaskStatus,
};

/// Operations exposed by the matching service.
///
/// Calls block the current thread; the UI runs them on background jobs.
pub trait MatchService: Send + Sync {
    /// Upload one dataset file under `prefix`, reporting whole-percent progress.
    /// The response body is returned as-is.
    fn upload_dataset(
        &self,
        prefix: &str,
        path: &Path,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<serde_json::Value, ApiError>;

    fn create_task(&self, request: &TaskRequest) -> Result<TaskCreated, ApiError>;

    /// Fresh status for a task; never cached.
    fn get_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError>;

    /// Final metrics of a finished task.
    fn get_result(&self, task_id: &str) -> Result<SimilarityMetrics, ApiError>;

    /// Features of `dataset` intersecting `bbox`, capped server-side at `limit`.
    fn get_polygons(
        &self,
        dataset: &str,
        bbox: BoundingBox,
        limit: usize,
        grids: &[String],
    ) -> Result<PolygonPage, ApiError>;

    /// Statistics for the pair; `None` covers the whole domain.
    fn get_region_stats(
        &self,
        dataset_a: &str,
        dataset_b: &str,
        bbox: Option<BoundingBox>,
        grids: &[String],
    ) -> Result<RegionStats, ApiError>;
}
