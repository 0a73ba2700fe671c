//! Blocking ureq implementation of [`MatchService`].

use std::path::Path;

use tracing::{debug, info};
use url::Url;

use super::error::ApiError;
use super::multipart::MultipartUpload;
use super::types::{
    BoundingBox, PolygonPage, RegionStats, SimilarityMetrics, TaskCreated, TaskRequest,
    TaskSnapshot,
};
use super::MatchService;
use crate::http_client::{self, ProgressReader};

/// Client for the matching service rooted at a configured origin.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base: Url,
    max_response_bytes: usize,
}

impl ApiClient {
    pub fn new(base_url: &str, max_response_bytes: usize) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim())
            .map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: expected an http(s) origin"
            )));
        }
        Ok(Self {
            base,
            max_response_bytes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: &Url, query: &[(&str, String)]) -> Result<Vec<u8>, ApiError> {
        debug!(%url, "GET");
        let request = query.iter().fold(
            http_client::agent()
                .get(url.as_str())
                .set("Accept", "application/json"),
            |request, (key, value)| request.query(key, value),
        );
        self.finish(request.call())
    }

    fn finish(&self, outcome: Result<ureq::Response, ureq::Error>) -> Result<Vec<u8>, ApiError> {
        let response =
            outcome.map_err(|err| ApiError::from_ureq(err, self.max_response_bytes))?;
        http_client::read_response_bytes(response, self.max_response_bytes)
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }
}

fn grid_param(grids: &[String]) -> Option<(&'static str, String)> {
    let joined = grids
        .iter()
        .map(|grid| grid.trim())
        .filter(|grid| !grid.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(("grids", joined))
}

impl MatchService for ApiClient {
    fn upload_dataset(
        &self,
        prefix: &str,
        path: &Path,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.endpoint(&["api", "datasets", "upload"])?;
        let upload = MultipartUpload::new(prefix, path)?;
        info!(prefix, path = %path.display(), bytes = upload.content_length, "Uploading dataset");
        let body = ProgressReader::new(upload.body, upload.content_length, on_progress);
        let outcome = http_client::agent()
            .post(url.as_str())
            .set("Content-Type", &upload.content_type)
            .set("Content-Length", &upload.content_length.to_string())
            .send(body);
        let bytes = self.finish(outcome)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into())))
    }

    fn create_task(&self, request: &TaskRequest) -> Result<TaskCreated, ApiError> {
        let url = self.endpoint(&["api", "tasks"])?;
        debug!(%url, "POST");
        let outcome = http_client::agent()
            .post(url.as_str())
            .set("Accept", "application/json")
            .send_json(request);
        TaskCreated::from_body(&self.finish(outcome)?)
    }

    fn get_task(&self, task_id: &str) -> Result<TaskSnapshot, ApiError> {
        let url = self.endpoint(&["api", "tasks", task_id])?;
        TaskSnapshot::from_body(&self.get(&url, &[])?)
    }

    fn get_result(&self, task_id: &str) -> Result<SimilarityMetrics, ApiError> {
        let url = self.endpoint(&["api", "results", task_id])?;
        SimilarityMetrics::from_body(&self.get(&url, &[])?)
    }

    fn get_polygons(
        &self,
        dataset: &str,
        bbox: BoundingBox,
        limit: usize,
        grids: &[String],
    ) -> Result<PolygonPage, ApiError> {
        let url = self.endpoint(&["api", "regions", "polygons"])?;
        let mut query = vec![("dataset", dataset.to_string()), ("limit", limit.to_string())];
        query.extend(bbox.query_pairs());
        query.extend(grid_param(grids));
        PolygonPage::from_body(&self.get(&url, &query)?)
    }

    fn get_region_stats(
        &self,
        dataset_a: &str,
        dataset_b: &str,
        bbox: Option<BoundingBox>,
        grids: &[String],
    ) -> Result<RegionStats, ApiError> {
        let url = self.endpoint(&["api", "regions", "stats"])?;
        let mut query = vec![
            ("dataset_a", dataset_a.to_string()),
            ("dataset_b", dataset_b.to_string()),
        ];
        if let Some(bbox) = bbox {
            query.extend(bbox.query_pairs());
        }
        query.extend(grid_param(grids));
        RegionStats::from_body(&self.get(&url, &query)?)
    }
}
