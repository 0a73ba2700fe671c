//! CPU rasterizer for the fallback view.
//!
//! Paths are accumulated into a coverage mask clipped to their pixel bounds
//! and composited onto the canvas once, so a translucent stroke never
//! darkens where its own segments overlap.

use egui::{Color32, ColorImage, Pos2, Vec2, vec2};

use super::mapper::{CanvasMapper, DataExtent, ViewTransform};
use crate::api::{BoundingBox, PolygonFeature, Position};

/// Unpremultiplied RGBA.
pub type Rgba = [u8; 4];

pub const BACKGROUND: Color32 = Color32::from_rgb(0xfc, 0xfc, 0xfc);
pub const FILL_A: Rgba = [220, 20, 60, 64];
pub const STROKE_A: Rgba = [220, 20, 60, 230];
pub const FILL_B: Rgba = [34, 139, 34, 64];
pub const STROKE_B: Rgba = [34, 139, 34, 230];
pub const BBOX_STROKE: Rgba = [64, 158, 255, 230];
pub const RING_WIDTH: f32 = 1.2;
pub const BBOX_WIDTH: f32 = 2.0;
pub const BBOX_DASH: [f32; 2] = [6.0, 4.0];

const SUBSAMPLES: usize = 4;

/// Fixed-size opaque pixel buffer.
pub struct RasterCanvas {
    image: ColorImage,
}

impl RasterCanvas {
    pub fn new(width: usize, height: usize, background: Color32) -> Self {
        Self {
            image: ColorImage::new([width, height], vec![background; width * height]),
        }
    }

    pub fn width(&self) -> usize {
        self.image.size[0]
    }

    pub fn height(&self) -> usize {
        self.image.size[1]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color32> {
        (x < self.width() && y < self.height()).then(|| self.image.pixels[y * self.width() + x])
    }

    pub fn into_image(self) -> ColorImage {
        self.image
    }

    /// Fill a closed ring using the even-odd rule.
    pub fn fill_polygon(&mut self, points: &[Pos2], color: Rgba) {
        if points.len() < 3 || color[3] == 0 {
            return;
        }
        let Some(mut mask) = Mask::covering(points, 0.0, self.width(), self.height()) else {
            return;
        };
        let mut crossings = Vec::new();
        for row in 0..mask.h {
            for sub in 0..SUBSAMPLES {
                let sample_y = (mask.y0 + row) as f32 + (sub as f32 + 0.5) / SUBSAMPLES as f32;
                crossings.clear();
                for (a, b) in closed_edges(points) {
                    if (a.y <= sample_y) != (b.y <= sample_y) {
                        crossings.push(a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
                crossings.sort_by(f32::total_cmp);
                for span in crossings.chunks_exact(2) {
                    mask.add_span(row, span[0], span[1], 1.0 / SUBSAMPLES as f32);
                }
            }
        }
        self.composite(&mask, color);
    }

    /// Stroke a polyline, optionally closed and dashed with an on/off pattern.
    pub fn stroke_path(
        &mut self,
        points: &[Pos2],
        closed: bool,
        width: f32,
        dash: Option<&[f32]>,
        color: Rgba,
    ) {
        if points.len() < 2 || color[3] == 0 || !(width > 0.0) {
            return;
        }
        let half = width / 2.0;
        let Some(mut mask) = Mask::covering(points, half + 1.0, self.width(), self.height()) else {
            return;
        };
        let mut path = points.to_vec();
        if closed && path.first() != path.last() {
            path.push(path[0]);
        }
        let segments = match dash {
            Some(pattern) if pattern.iter().sum::<f32>() > 0.0 => dash_segments(&path, pattern),
            _ => path.windows(2).map(|pair| (pair[0], pair[1])).collect(),
        };
        for (a, b) in segments {
            mask.stamp_segment(a, b, half);
        }
        self.composite(&mask, color);
    }

    fn composite(&mut self, mask: &Mask, color: Rgba) {
        let stride = self.width();
        let alpha = f32::from(color[3]) / 255.0;
        for row in 0..mask.h {
            for col in 0..mask.w {
                let coverage = mask.cov[row * mask.w + col].min(1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let idx = (mask.y0 + row) * stride + mask.x0 + col;
                if let Some(pixel) = self.image.pixels.get_mut(idx) {
                    *pixel = blend_over(*pixel, color, alpha * coverage);
                }
            }
        }
    }
}

/// Source-over onto an opaque destination.
fn blend_over(dst: Color32, src: Rgba, alpha: f32) -> Color32 {
    let mix = |s: u8, d: u8| (f32::from(s) * alpha + f32::from(d) * (1.0 - alpha)).round() as u8;
    Color32::from_rgb(mix(src[0], dst.r()), mix(src[1], dst.g()), mix(src[2], dst.b()))
}

fn closed_edges(points: &[Pos2]) -> impl Iterator<Item = (Pos2, Pos2)> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

/// Split a polyline into the "on" pieces of a repeating dash pattern.
fn dash_segments(path: &[Pos2], pattern: &[f32]) -> Vec<(Pos2, Pos2)> {
    let mut out = Vec::new();
    let mut index = 0;
    let mut remaining = pattern[0];
    for pair in path.windows(2) {
        let (mut start, end) = (pair[0], pair[1]);
        let mut left = start.distance(end);
        while left > 0.0 {
            let step = remaining.min(left);
            let next = start + (end - start) * (step / left);
            if index % 2 == 0 {
                out.push((start, next));
            }
            start = next;
            left -= step;
            remaining -= step;
            if remaining <= 0.0 {
                index = (index + 1) % pattern.len();
                remaining = pattern[index];
            }
        }
    }
    out
}

/// Coverage accumulator for one path, clipped to the canvas.
struct Mask {
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    cov: Vec<f32>,
}

impl Mask {
    fn covering(points: &[Pos2], margin: f32, width: usize, height: usize) -> Option<Self> {
        let (mut min, mut max) = (Pos2::new(f32::MAX, f32::MAX), Pos2::new(f32::MIN, f32::MIN));
        for p in points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                return None;
            }
            min = min.min(*p);
            max = max.max(*p);
        }
        let x0 = (min.x - margin).floor().max(0.0);
        let y0 = (min.y - margin).floor().max(0.0);
        let x1 = (max.x + margin).ceil().min(width as f32);
        let y1 = (max.y + margin).ceil().min(height as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (w, h) = ((x1 - x0) as usize, (y1 - y0) as usize);
        Some(Self {
            x0: x0 as usize,
            y0: y0 as usize,
            w,
            h,
            cov: vec![0.0; w * h],
        })
    }

    fn add_span(&mut self, row: usize, from: f32, to: f32, weight: f32) {
        let from = from - self.x0 as f32;
        let to = to - self.x0 as f32;
        let first = from.floor().max(0.0) as usize;
        let last = (to.ceil().max(0.0) as usize).min(self.w);
        for col in first..last {
            let overlap = to.min(col as f32 + 1.0) - from.max(col as f32);
            if overlap > 0.0 {
                self.cov[row * self.w + col] += overlap * weight;
            }
        }
    }

    fn stamp_segment(&mut self, a: Pos2, b: Pos2, half: f32) {
        let reach = half + 1.0;
        let col0 = ((a.x.min(b.x) - reach).floor() - self.x0 as f32).max(0.0) as usize;
        let row0 = ((a.y.min(b.y) - reach).floor() - self.y0 as f32).max(0.0) as usize;
        let col1 = (((a.x.max(b.x) + reach).ceil() - self.x0 as f32).max(0.0) as usize).min(self.w);
        let row1 = (((a.y.max(b.y) + reach).ceil() - self.y0 as f32).max(0.0) as usize).min(self.h);
        let ab = b - a;
        let len_sq = ab.length_sq();
        for row in row0..row1 {
            for col in col0..col1 {
                let p = Pos2::new(
                    (self.x0 + col) as f32 + 0.5,
                    (self.y0 + row) as f32 + 0.5,
                );
                let t = if len_sq > 0.0 {
                    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let distance = p.distance(a + ab * t);
                let coverage = (half + 0.5 - distance).clamp(0.0, 1.0);
                let slot = &mut self.cov[row * self.w + col];
                *slot = slot.max(coverage);
            }
        }
    }
}

/// Rings of both datasets plus the active bbox, ready to rasterize.
pub struct RasterScene<'a> {
    pub rings_a: Vec<&'a [Position]>,
    pub rings_b: Vec<&'a [Position]>,
    pub bbox: BoundingBox,
}

impl<'a> RasterScene<'a> {
    /// Keep the outer ring of every polygon; holes are not drawn here.
    pub fn new(
        features_a: &'a [PolygonFeature],
        features_b: &'a [PolygonFeature],
        bbox: BoundingBox,
    ) -> Self {
        let outer = |features: &'a [PolygonFeature]| {
            features
                .iter()
                .flat_map(|feature| feature.geometry.coordinates.outer_rings())
                .map(Vec::as_slice)
                .collect::<Vec<_>>()
        };
        Self {
            rings_a: outer(features_a),
            rings_b: outer(features_b),
            bbox,
        }
    }

    pub fn extent(&self) -> DataExtent {
        DataExtent::from_scene(
            self.bbox,
            self.rings_a.iter().chain(self.rings_b.iter()).copied(),
        )
    }
}

/// Draw A, then B, then the dashed bbox onto a fresh canvas.
pub fn render_raster(scene: &RasterScene<'_>, size: [usize; 2], transform: &ViewTransform) -> ColorImage {
    let [width, height] = size;
    let mut canvas = RasterCanvas::new(width, height, BACKGROUND);
    let viewport: Vec2 = vec2(width as f32, height as f32);
    let mapper = CanvasMapper::new(&scene.extent(), viewport, transform);
    let ring_width = RING_WIDTH / transform.zoom;
    let to_pixels = |ring: &[Position]| -> Vec<Pos2> {
        ring.iter().map(|Position(point)| mapper.to_pixel(*point)).collect()
    };
    for (rings, fill, stroke) in [
        (&scene.rings_a, FILL_A, STROKE_A),
        (&scene.rings_b, FILL_B, STROKE_B),
    ] {
        for ring in rings.iter() {
            let points = to_pixels(*ring);
            canvas.fill_polygon(&points, fill);
            canvas.stroke_path(&points, true, ring_width, None, stroke);
        }
    }
    let outline: Vec<Pos2> = scene
        .bbox
        .outline()
        .iter()
        .map(|corner| mapper.to_pixel(*corner))
        .collect();
    canvas.stroke_path(
        &outline,
        true,
        BBOX_WIDTH / transform.zoom,
        Some(&BBOX_DASH),
        BBOX_STROKE,
    );
    canvas.into_image()
}
