//! Retained layers for the accelerated view: triangulated fills, outlines,
//! the bbox frame, and hit-testing for tooltips.

use std::sync::Arc;

use egui::{Color32, Mesh, Pos2, Rect, Shape, Stroke};
use earcutr::earcut;

use super::mapper::scene_point;
use crate::api::{BoundingBox, PolygonFeature, Position, Ring};

pub const FILL_A: [u8; 4] = [220, 20, 60, 190];
pub const FILL_B: [u8; 4] = [34, 139, 34, 190];
pub const OUTLINE: [u8; 4] = [40, 40, 40, 220];
pub const BBOX_OUTLINE: [u8; 4] = [64, 158, 255, 255];
/// Outline widths in screen pixels.
pub const OUTLINE_WIDTH: f32 = 1.2;
pub const BBOX_WIDTH: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Feature {id} has a non-finite coordinate")]
    NonFinite { id: String },
    #[error("Triangulation failed for feature {id}: {reason}")]
    Triangulation { id: String, reason: String },
    /// Failure reported while the view was running.
    #[error("Accelerated view error: {0}")]
    Runtime(String),
}

/// One pickable feature in scene coordinates.
#[derive(Clone, Debug)]
pub struct PickTarget {
    pub id: String,
    pub area: f64,
    bounds: Rect,
    rings: Vec<Vec<Pos2>>,
}

impl PickTarget {
    /// Even-odd containment across every ring, holes included.
    pub fn contains(&self, point: Pos2) -> bool {
        if !self.bounds.contains(point) {
            return false;
        }
        let mut inside = false;
        for ring in &self.rings {
            let mut j = ring.len().wrapping_sub(1);
            for i in 0..ring.len() {
                let (a, b) = (ring[i], ring[j]);
                if (a.y > point.y) != (b.y > point.y)
                    && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
                {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

/// Everything drawn for one dataset.
#[derive(Clone, Debug, Default)]
pub struct DatasetLayer {
    pub mesh: Arc<Mesh>,
    pub outlines: Vec<Vec<Pos2>>,
    pub targets: Vec<PickTarget>,
}

impl DatasetLayer {
    fn build(features: &[PolygonFeature], fill: Color32) -> Result<Self, SceneError> {
        let mut mesh = Mesh::default();
        let mut outlines = Vec::new();
        let mut targets = Vec::with_capacity(features.len());
        for feature in features {
            let id = feature.id.to_string();
            let mut rings = Vec::new();
            for polygon in feature.geometry.coordinates.polygons() {
                triangulate_into(&mut mesh, polygon, fill, &id)?;
                for ring in polygon {
                    let points: Vec<Pos2> = open_ring(ring)
                        .iter()
                        .map(|Position(p)| scene_point(*p))
                        .collect();
                    if points.len() >= 3 {
                        rings.push(points);
                    }
                }
            }
            if rings.is_empty() {
                continue;
            }
            let bounds = Rect::from_points(&rings.concat());
            outlines.extend(rings.iter().cloned());
            targets.push(PickTarget {
                id,
                area: feature.area,
                bounds,
                rings,
            });
        }
        Ok(Self {
            mesh: Arc::new(mesh),
            outlines,
            targets,
        })
    }
}

/// Ring without a trailing point that repeats the first.
fn open_ring(ring: &Ring) -> &[Position] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn triangulate_into(
    mesh: &mut Mesh,
    polygon: &[Ring],
    fill: Color32,
    id: &str,
) -> Result<(), SceneError> {
    let mut coords = Vec::new();
    let mut holes = Vec::new();
    for (index, ring) in polygon.iter().enumerate() {
        let ring = open_ring(ring);
        if ring.len() < 3 {
            continue;
        }
        if index > 0 {
            if coords.is_empty() {
                break;
            }
            holes.push(coords.len() / 2);
        }
        for Position([x, y]) in ring {
            if !(x.is_finite() && y.is_finite()) {
                return Err(SceneError::NonFinite { id: id.to_string() });
            }
            coords.extend([*x, *y]);
        }
    }
    if coords.len() < 6 {
        return Ok(());
    }
    let indices = earcut(&coords, &holes, 2).map_err(|err| SceneError::Triangulation {
        id: id.to_string(),
        reason: format!("{err:?}"),
    })?;
    let base = mesh.vertices.len() as u32;
    for pair in coords.chunks_exact(2) {
        mesh.colored_vertex(scene_point([pair[0], pair[1]]), fill);
    }
    for tri in indices.chunks_exact(3) {
        mesh.add_triangle(base + tri[0] as u32, base + tri[1] as u32, base + tri[2] as u32);
    }
    Ok(())
}

/// Both datasets plus the bbox frame, in scene space (`y` flipped).
#[derive(Clone, Debug)]
pub struct SceneLayers {
    pub a: DatasetLayer,
    pub b: DatasetLayer,
    pub bbox_outline: [Pos2; 5],
}

impl SceneLayers {
    pub fn build(
        features_a: &[PolygonFeature],
        features_b: &[PolygonFeature],
        bbox: BoundingBox,
    ) -> Result<Self, SceneError> {
        Ok(Self {
            a: DatasetLayer::build(features_a, rgba(FILL_A))?,
            b: DatasetLayer::build(features_b, rgba(FILL_B))?,
            bbox_outline: bbox_outline(bbox)?,
        })
    }

    /// Move the bbox frame without touching the dataset meshes.
    pub fn set_bbox(&mut self, bbox: BoundingBox) -> Result<(), SceneError> {
        self.bbox_outline = bbox_outline(bbox)?;
        Ok(())
    }

    /// Top-most feature under `point`: B is drawn over A, and later features
    /// over earlier ones.
    pub fn pick(&self, point: Pos2) -> Option<&PickTarget> {
        [&self.b, &self.a]
            .into_iter()
            .find_map(|layer| layer.targets.iter().rev().find(|t| t.contains(point)))
    }

    /// Shapes for one frame; `zoom` is screen pixels per scene unit.
    pub fn shapes(&self, zoom: f32) -> Vec<Shape> {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        let outline = Stroke::new(OUTLINE_WIDTH / zoom, rgba(OUTLINE));
        let mut shapes = Vec::with_capacity(self.a.outlines.len() + self.b.outlines.len() + 3);
        for layer in [&self.a, &self.b] {
            shapes.push(Shape::mesh(Arc::clone(&layer.mesh)));
            shapes.extend(
                layer
                    .outlines
                    .iter()
                    .map(|ring| Shape::closed_line(ring.clone(), outline)),
            );
        }
        shapes.push(Shape::line(
            self.bbox_outline.to_vec(),
            Stroke::new(BBOX_WIDTH / zoom, rgba(BBOX_OUTLINE)),
        ));
        shapes
    }
}

fn bbox_outline(bbox: BoundingBox) -> Result<[Pos2; 5], SceneError> {
    if !bbox.is_finite() {
        return Err(SceneError::NonFinite { id: "bbox".into() });
    }
    Ok(bbox.outline().map(scene_point))
}

pub(crate) fn rgba([r, g, b, a]: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(r, g, b, a)
}
