//! Typed request and response contracts for the matching service.
//!
//! Response bodies are decoded into private wire structs first and then
//! validated, so a malformed payload surfaces as
//! [`ApiError::InvalidResponse`](super::ApiError::InvalidResponse) instead of
//! leaking half-populated values into the UI.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::ApiError;

/// Axis-aligned rectangle in dataset coordinates.
///
/// Ordering is not enforced: `minx > maxx` is a valid value and consumers
/// call [`BoundingBox::normalized`] when they need ordered bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BoundingBox {
    pub const fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    /// Same rectangle with min/max swapped where the user entered them backwards.
    pub fn normalized(self) -> Self {
        Self {
            minx: self.minx.min(self.maxx),
            miny: self.miny.min(self.maxy),
            maxx: self.minx.max(self.maxx),
            maxy: self.miny.max(self.maxy),
        }
    }

    pub fn width(&self) -> f64 {
        (self.maxx - self.minx).abs()
    }

    pub fn height(&self) -> f64 {
        (self.maxy - self.miny).abs()
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.minx + self.maxx) / 2.0,
            (self.miny + self.maxy) / 2.0,
        ]
    }

    /// Corner ring closed back onto its first point.
    pub fn outline(&self) -> [[f64; 2]; 5] {
        [
            [self.minx, self.miny],
            [self.maxx, self.miny],
            [self.maxx, self.maxy],
            [self.minx, self.maxy],
            [self.minx, self.miny],
        ]
    }

    pub fn is_finite(&self) -> bool {
        [self.minx, self.miny, self.maxx, self.maxy]
            .iter()
            .all(|v| v.is_finite())
    }

    pub(crate) fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("minx", self.minx.to_string()),
            ("miny", self.miny.to_string()),
            ("maxx", self.maxx.to_string()),
            ("maxy", self.maxy.to_string()),
        ]
    }
}

/// Body of `POST /api/tasks`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskRequest {
    pub dataset_a: String,
    pub dataset_b: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grids: Vec<String>,
}

/// Server-side task state. Unknown strings are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
    Other(String),
}

impl TaskStatus {
    /// `Done` and `Failed` end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "DONE" => Self::Done,
            "FAILED" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Similarity metrics for a pair of datasets over some region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityMetrics {
    pub block_jaccard: f64,
    pub intersection_count: u64,
    pub area_a: f64,
    pub area_b: f64,
    pub area_inter: f64,
}

#[derive(Deserialize)]
struct MetricsWire {
    block_jaccard: Option<f64>,
    intersection_count: Option<f64>,
    area_a: Option<f64>,
    area_b: Option<f64>,
    area_inter: Option<f64>,
}

impl MetricsWire {
    fn validate(self) -> Result<SimilarityMetrics, ApiError> {
        // Overlaps inside one dataset are summed per pair, so this can exceed 1.
        let block_jaccard = non_negative("block_jaccard", self.block_jaccard)?;
        let count = non_negative("intersection_count", self.intersection_count)?;
        if count.fract() != 0.0 {
            return Err(invalid(format!("intersection_count {count} is not an integer")));
        }
        Ok(SimilarityMetrics {
            block_jaccard,
            intersection_count: count as u64,
            area_a: non_negative("area_a", self.area_a)?,
            area_b: non_negative("area_b", self.area_b)?,
            area_inter: non_negative("area_inter", self.area_inter)?,
        })
    }
}

fn required(field: &str, value: Option<f64>) -> Result<f64, ApiError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(invalid(format!("{field} is not finite ({v})"))),
        None => Err(invalid(format!("missing field `{field}`"))),
    }
}

fn non_negative(field: &str, value: Option<f64>) -> Result<f64, ApiError> {
    let v = required(field, value)?;
    if v < 0.0 {
        return Err(invalid(format!("{field} is negative ({v})")));
    }
    Ok(v)
}

fn invalid(message: String) -> ApiError {
    ApiError::InvalidResponse(message)
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        let text = String::from_utf8_lossy(body);
        let snippet: String = text.trim().chars().take(160).collect();
        invalid(format!("{err}: {snippet}"))
    })
}

/// Response of `POST /api/tasks`.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskCreated {
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Deserialize)]
struct TaskCreatedWire {
    task_id: Option<String>,
    status: Option<TaskStatus>,
}

impl TaskCreated {
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let wire: TaskCreatedWire = decode(body)?;
        let task_id = wire
            .task_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("task response carried no task_id".into()))?;
        Ok(Self {
            task_id,
            status: wire.status.unwrap_or(TaskStatus::Pending),
        })
    }
}

/// Response of `GET /api/tasks/{task_id}`.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSnapshot {
    pub task_id: Option<String>,
    pub status: TaskStatus,
    pub result: Option<SimilarityMetrics>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct TaskSnapshotWire {
    task_id: Option<String>,
    status: Option<TaskStatus>,
    result: Option<MetricsWire>,
    error: Option<String>,
}

impl TaskSnapshot {
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let wire: TaskSnapshotWire = decode(body)?;
        let status = wire
            .status
            .ok_or_else(|| invalid("task snapshot carried no status".into()))?;
        let result = wire.result.map(MetricsWire::validate).transpose()?;
        Ok(Self {
            task_id: wire.task_id,
            status,
            result,
            error: wire.error.filter(|e| !e.trim().is_empty()),
        })
    }
}

impl SimilarityMetrics {
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        decode::<MetricsWire>(body)?.validate()
    }
}

/// Response of `GET /api/regions/stats`.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionStats {
    pub dataset_a: Option<String>,
    pub dataset_b: Option<String>,
    /// `None` when the statistics cover the whole domain.
    pub bbox: Option<BoundingBox>,
    pub metrics: SimilarityMetrics,
}

#[derive(Deserialize)]
struct RegionStatsWire {
    dataset_a: Option<String>,
    dataset_b: Option<String>,
    bbox: Option<BoundingBox>,
    #[serde(flatten)]
    metrics: MetricsWire,
}

impl RegionStats {
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let wire: RegionStatsWire = decode(body)?;
        Ok(Self {
            dataset_a: wire.dataset_a,
            dataset_b: wire.dataset_b,
            bbox: wire.bbox,
            metrics: wire.metrics.validate()?,
        })
    }
}

/// Feature identifier as sent by the server: either text or a number.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A coordinate pair. Extra ordinates (Z, M) are accepted and dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position(pub [f64; 2]);

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        match values.as_slice() {
            [x, y, ..] => Ok(Self([*x, *y])),
            _ => Err(serde::de::Error::invalid_length(
                values.len(),
                &"a position with at least two ordinates",
            )),
        }
    }
}

pub type Ring = Vec<Position>;

/// Coordinate structure of a geometry, distinguished by nesting depth.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    /// A bare ring.
    Ring(Ring),
    /// Polygon: outer ring followed by holes.
    Polygon(Vec<Ring>),
    /// Multipolygon: a list of polygons.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Coordinates {
    /// Every polygon as `[outer, holes..]`; a bare ring becomes a polygon
    /// without holes.
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Self::Ring(ring) => vec![std::slice::from_ref(ring)],
            Self::Polygon(rings) => vec![rings.as_slice()],
            Self::MultiPolygon(polygons) => polygons.iter().map(Vec::as_slice).collect(),
        }
    }

    /// The rings the raster view outlines: the first ring of each polygon.
    pub fn outer_rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons()
            .into_iter()
            .filter_map(|polygon| polygon.first())
    }

    /// Every ring including holes.
    pub fn all_rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons().into_iter().flatten()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Coordinates,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PolygonFeature {
    pub id: FeatureId,
    pub area: f64,
    pub geometry: Geometry,
}

/// Response of `GET /api/regions/polygons`.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonPage {
    pub dataset: Option<String>,
    pub count: usize,
    pub features: Vec<PolygonFeature>,
}

#[derive(Deserialize)]
struct PolygonPageWire {
    dataset: Option<String>,
    count: Option<usize>,
    features: Option<Vec<PolygonFeature>>,
}

impl PolygonPage {
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let wire: PolygonPageWire = decode(body)?;
        let features = wire
            .features
            .ok_or_else(|| invalid("polygon page carried no features".into()))?;
        if let Some(bad) = features.iter().find(|f| !f.area.is_finite() || f.area < 0.0) {
            return Err(invalid(format!("feature {} has invalid area {}", bad.id, bad.area)));
        }
        Ok(Self {
            dataset: wire.dataset,
            count: wire.count.unwrap_or(features.len()),
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_with_result_is_validated() {
        let body = br#"{"task_id":"t1","status":"DONE","error":null,
            "result":{"block_jaccard":0.42,"intersection_count":3,"area_a":12.5,"area_b":9.0,"area_inter":5.2}}"#;
        let snapshot = TaskSnapshot::from_body(body).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Done);
        let result = snapshot.result.unwrap();
        assert_eq!(result.intersection_count, 3);
        assert_eq!(format!("{:.6}", result.block_jaccard), "0.420000");
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn jaccard_above_one_is_accepted() {
        let body = br#"{"status":"DONE","result":{"block_jaccard":5.0,"intersection_count":10,"area_a":10.0,"area_b":50.0,"area_inter":50.0}}"#;
        let result = TaskSnapshot::from_body(body).unwrap().result.unwrap();
        assert_eq!(result.block_jaccard, 5.0);
        assert_eq!(result.area_inter, 50.0);
    }

    #[test]
    fn negative_or_nan_jaccard_is_invalid() {
        let body = br#"{"block_jaccard":-0.1,"intersection_count":0,"area_a":1,"area_b":1,"area_inter":0}"#;
        let err = SimilarityMetrics::from_body(body).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(msg) if msg.contains("block_jaccard")));

        let wire = MetricsWire {
            block_jaccard: Some(f64::NAN),
            intersection_count: Some(0.0),
            area_a: Some(1.0),
            area_b: Some(1.0),
            area_inter: Some(0.0),
        };
        let err = wire.validate().unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(msg) if msg.contains("block_jaccard")));
    }

    #[test]
    fn snapshot_without_status_is_invalid() {
        assert!(TaskSnapshot::from_body(br#"{"task_id":"t1"}"#).is_err());
        assert!(TaskSnapshot::from_body(b"<html>oops</html>").is_err());
    }

    #[test]
    fn unknown_status_is_kept_and_not_terminal() {
        let snapshot = TaskSnapshot::from_body(br#"{"status":"QUEUED"}"#).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Other("QUEUED".into()));
        assert!(!snapshot.status.is_terminal());
        assert!(TaskStatus::from("failed".to_string()).is_terminal());
    }

    #[test]
    fn created_task_requires_id() {
        assert!(TaskCreated::from_body(br#"{"task_id":"  ","status":"PENDING"}"#).is_err());
        let created = TaskCreated::from_body(br#"{"task_id":"t1","status":"RUNNING"}"#).unwrap();
        assert_eq!(created.task_id, "t1");
        assert_eq!(created.status, TaskStatus::Running);
    }

    #[test]
    fn region_stats_flatten_metrics_and_null_bbox() {
        let body = br#"{"dataset_a":"data_a","dataset_b":"data_b","bbox":null,
            "area_a":4.0,"area_b":2.0,"area_inter":1.0,"intersection_count":2,"block_jaccard":0.2}"#;
        let stats = RegionStats::from_body(body).unwrap();
        assert!(stats.bbox.is_none());
        assert_eq!(stats.metrics.area_a, 4.0);
        assert_eq!(stats.dataset_b.as_deref(), Some("data_b"));
    }

    #[test]
    fn polygon_page_accepts_polygon_and_multipolygon_shapes() {
        let body = br#"{"dataset":"data_a","count":2,"features":[
            {"id":7,"area":1.0,"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"id":"b-1","area":2.0,"geometry":{"type":"MultiPolygon","coordinates":[
                [[[0,0],[1,0],[1,1],[0,0]]],
                [[[5,5],[6,5],[6,6],[5,5]],[[5.2,5.2],[5.4,5.2],[5.4,5.4],[5.2,5.2]]]
            ]}}]}"#;
        let page = PolygonPage::from_body(body).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.features[0].id.to_string(), "7");
        assert_eq!(page.features[1].id.to_string(), "b-1");
        let multi = &page.features[1].geometry.coordinates;
        assert_eq!(multi.outer_rings().count(), 2);
        assert_eq!(multi.all_rings().count(), 3);
    }

    #[test]
    fn bare_ring_and_3d_positions_decode() {
        let coords: Coordinates = serde_json::from_str("[[0,0,9],[2,0,9],[2,2,9]]").unwrap();
        let rings: Vec<_> = coords.outer_rings().collect();
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0][1], Position([2.0, 0.0]));
    }

    #[test]
    fn inverted_bbox_normalizes() {
        let bbox = BoundingBox::new(10.0, 5.0, 0.0, -5.0).normalized();
        assert_eq!(bbox, BoundingBox::new(0.0, -5.0, 10.0, 5.0));
        assert_eq!(bbox.outline()[4], bbox.outline()[0]);
    }

    #[test]
    fn task_request_omits_empty_optionals() {
        let request = TaskRequest {
            dataset_a: "data_a".into(),
            dataset_b: "data_b".into(),
            bbox: None,
            grids: Vec::new(),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"dataset_a":"data_a","dataset_b":"data_b"}"#
        );
    }
}
