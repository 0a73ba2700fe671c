use crate::api::{RegionStats, SimilarityMetrics, TaskStatus};

/// Lifecycle of the most recent server-side task.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskState {
    pub task_id: Option<String>,
    /// `None` until a task has been created.
    pub status: Option<TaskStatus>,
    pub result: Option<SimilarityMetrics>,
    pub error: Option<String>,
    /// A create request is in flight.
    pub submitting: bool,
    pub polling: bool,
}

impl TaskState {
    pub fn status_label(&self) -> &str {
        self.status.as_ref().map_or("Not started", TaskStatus::as_str)
    }
}

/// Which region a stats request covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsScope {
    Global,
    BoundingBox,
}

impl StatsScope {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::BoundingBox => "Bounding box",
        }
    }
}

/// One independently loaded stats result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSlot {
    pub loading: bool,
    pub result: Option<RegionStats>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsState {
    pub global: StatsSlot,
    pub bbox: StatsSlot,
}

impl StatsState {
    pub fn slot(&self, scope: StatsScope) -> &StatsSlot {
        match scope {
            StatsScope::Global => &self.global,
            StatsScope::BoundingBox => &self.bbox,
        }
    }

    pub fn slot_mut(&mut self, scope: StatsScope) -> &mut StatsSlot {
        match scope {
            StatsScope::Global => &mut self.global,
            StatsScope::BoundingBox => &mut self.bbox,
        }
    }
}

/// Metrics formatted for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricsView {
    pub jaccard: String,
    pub intersection_count: String,
    pub area_a: String,
    pub area_b: String,
    pub area_inter: String,
}

impl From<&SimilarityMetrics> for MetricsView {
    fn from(metrics: &SimilarityMetrics) -> Self {
        Self {
            jaccard: format!("{:.6}", metrics.block_jaccard),
            intersection_count: metrics.intersection_count.to_string(),
            area_a: format!("{:.4}", metrics.area_a),
            area_b: format!("{:.4}", metrics.area_b),
            area_inter: format!("{:.4}", metrics.area_inter),
        }
    }
}

impl MetricsView {
    pub fn rows(&self) -> [(&'static str, &str); 5] {
        [
            ("Jaccard", self.jaccard.as_str()),
            ("Intersections", self.intersection_count.as_str()),
            ("Area A", self.area_a.as_str()),
            ("Area B", self.area_b.as_str()),
            ("Area A∩B", self.area_inter.as_str()),
        ]
    }
}
