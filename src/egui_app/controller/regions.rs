use tracing::{info, warn};

use super::EguiController;
use super::jobs::{PolygonJob, StatsJob};
use crate::api::{ApiError, BoundingBox, PolygonPage, RegionStats};
use crate::egui_app::state::StatsScope;
use crate::egui_app::ui::style::StatusTone;

impl EguiController {
    /// Request stats for the whole datasets or the current bbox.
    pub fn load_stats(&mut self, scope: StatsScope) {
        if self.ui.stats.slot(scope).loading {
            return;
        }
        let bbox = match scope {
            StatsScope::Global => None,
            StatsScope::BoundingBox => Some(self.ui.bbox),
        };
        self.ui.stats.slot_mut(scope).loading = true;
        self.set_status(
            format!("Loading {} stats…", scope.label().to_lowercase()),
            StatusTone::Busy,
        );
        self.jobs.begin_stats(StatsJob {
            scope,
            dataset_a: self.ui.upload.a.prefix.trim().to_string(),
            dataset_b: self.ui.upload.b.prefix.trim().to_string(),
            bbox,
            grids: self.ui.grids(),
        });
    }

    /// Fetch both polygon sets inside the current bbox.
    pub fn load_polygons(&mut self) {
        if self.ui.polygons.loading {
            return;
        }
        let bbox = self.ui.bbox;
        let limit = self.settings.analysis.polygon_limit;
        info!(?bbox, limit, "Loading polygons");
        self.ui.polygons.loading = true;
        self.set_status("Loading polygons…", StatusTone::Busy);
        self.jobs.begin_polygons(PolygonJob {
            dataset_a: self.ui.upload.a.prefix.trim().to_string(),
            dataset_b: self.ui.upload.b.prefix.trim().to_string(),
            bbox,
            limit,
            grids: self.ui.grids(),
        });
    }

    pub(super) fn handle_stats_loaded(
        &mut self,
        scope: StatsScope,
        result: Result<RegionStats, ApiError>,
    ) {
        let slot = self.ui.stats.slot_mut(scope);
        slot.loading = false;
        match result {
            Ok(stats) => {
                slot.result = Some(stats);
                self.set_status(format!("{} stats loaded", scope.label()), StatusTone::Info);
            }
            Err(err) => {
                warn!(scope = scope.label(), error = %err, "Stats request failed");
                self.set_status(
                    format!("{} stats failed: {}", scope.label(), err.user_message()),
                    StatusTone::Error,
                );
            }
        }
    }

    pub(super) fn handle_polygons_loaded(
        &mut self,
        bbox: BoundingBox,
        result: Result<(PolygonPage, PolygonPage), ApiError>,
    ) {
        self.ui.polygons.loading = false;
        match result {
            Ok((a, b)) => {
                self.ui.polygons.replace(a, b, bbox);
                self.set_status(
                    format!(
                        "Loaded A:{} / B:{}",
                        self.ui.polygons.count_a, self.ui.polygons.count_b
                    ),
                    StatusTone::Info,
                );
            }
            Err(err) => {
                warn!(error = %err, "Polygon request failed");
                self.set_status(
                    format!("Failed to load polygons: {}", err.user_message()),
                    StatusTone::Error,
                );
            }
        }
    }
}
