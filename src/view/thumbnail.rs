//! Fixed-scale overview of the bbox against the global extent.

use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::api::BoundingBox;

pub const THUMBNAIL_SIZE: Vec2 = vec2(220.0, 220.0);
pub const THUMBNAIL_PAD: f32 = 10.0;

/// Independent x/y scales, so a non-square global extent fills the square.
#[derive(Clone, Copy, Debug)]
pub struct ThumbnailMapper {
    global: BoundingBox,
    size: Vec2,
    scale: Vec2,
}

impl ThumbnailMapper {
    pub fn new(global: BoundingBox, size: Vec2) -> Self {
        let global = global.normalized();
        let span = |v: f64| if v > 0.0 { v } else { 1.0 };
        Self {
            global,
            size,
            scale: vec2(
                ((f64::from(size.x - 2.0 * THUMBNAIL_PAD)) / span(global.width())) as f32,
                ((f64::from(size.y - 2.0 * THUMBNAIL_PAD)) / span(global.height())) as f32,
            ),
        }
    }

    pub fn to_local(&self, [x, y]: [f64; 2]) -> Pos2 {
        pos2(
            THUMBNAIL_PAD + ((x - self.global.minx) as f32) * self.scale.x,
            self.size.y - THUMBNAIL_PAD - ((y - self.global.miny) as f32) * self.scale.y,
        )
    }

    /// Drawable area inside the padding.
    pub fn frame(&self) -> Rect {
        Rect::from_min_max(
            pos2(THUMBNAIL_PAD, THUMBNAIL_PAD),
            pos2(self.size.x - THUMBNAIL_PAD, self.size.y - THUMBNAIL_PAD),
        )
    }

    /// The bbox in local coordinates; corners are normalized so an inverted
    /// box still produces a positive-size rect.
    pub fn bbox_rect(&self, bbox: BoundingBox) -> Rect {
        let a = self.to_local([bbox.minx, bbox.miny]);
        let b = self.to_local([bbox.maxx, bbox.maxy]);
        Rect::from_min_size(
            pos2(a.x.min(b.x), a.y.min(b.y)),
            vec2((b.x - a.x).abs(), (b.y - a.y).abs()),
        )
    }
}
