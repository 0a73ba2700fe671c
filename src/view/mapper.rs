//! Data-space to pixel-space mapping for the raster view, plus the pan/zoom
//! state that drives it.

use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::api::{BoundingBox, Position};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;
/// Padding between the fitted extent and the canvas edge, in pixels.
pub const CANVAS_PAD: f32 = 20.0;
const WHEEL_OUT_FACTOR: f32 = 0.9;
const WHEEL_IN_FACTOR: f32 = 1.1;
const BUTTON_STEP: f32 = 1.2;

/// One notch of the mouse wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelStep {
    /// Wheel rolled toward the user (content scrolls down).
    Out,
    /// Wheel rolled away from the user.
    In,
}

impl WheelStep {
    /// Classify an egui scroll delta; `None` for horizontal-only scrolling.
    pub fn from_scroll_delta(delta_y: f32) -> Option<Self> {
        if delta_y > 0.0 {
            Some(Self::In)
        } else if delta_y < 0.0 {
            Some(Self::Out)
        } else {
            None
        }
    }
}

/// Interactive zoom multiplier and pixel pan offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };
    }

    pub fn zoom_by_wheel(&mut self, step: WheelStep) {
        let factor = match step {
            WheelStep::Out => WHEEL_OUT_FACTOR,
            WheelStep::In => WHEEL_IN_FACTOR,
        };
        self.set_zoom(self.zoom * factor);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * BUTTON_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / BUTTON_STEP);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Choose zoom and pan so `target` is centred and fits the viewport.
    ///
    /// Zoom stays clamped, so a target far larger or smaller than the fitted
    /// extent is shown as close as the clamp allows.
    pub fn frame(&mut self, extent: &DataExtent, viewport: Vec2, target: BoundingBox) {
        let target = target.normalized();
        let base = extent.base_scale(viewport);
        let fit = f64::min(
            f64::from(viewport.x) / nonzero(target.width()),
            f64::from(viewport.y) / nonzero(target.height()),
        );
        self.set_zoom((fit / base) as f32);
        let scale = base * f64::from(self.zoom);
        let [cx, cy] = target.center();
        let pad = f64::from(CANVAS_PAD);
        self.pan = vec2(
            (f64::from(viewport.x) / 2.0 - pad - (cx - extent.min[0]) * scale) as f32,
            (pad + (cy - extent.min[1]) * scale - f64::from(viewport.y) / 2.0) as f32,
        );
    }
}

fn nonzero(span: f64) -> f64 {
    if span > 0.0 && span.is_finite() { span } else { 1.0 }
}

/// Press/drag/release state for panning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer position minus pan at the moment of the press.
    Dragging { anchor: Vec2 },
}

impl DragState {
    pub fn press(&mut self, pointer: Pos2, transform: &ViewTransform) {
        *self = Self::Dragging {
            anchor: pointer.to_vec2() - transform.pan,
        };
    }

    /// Move the pan with the pointer; returns whether anything changed.
    pub fn drag_to(&self, pointer: Pos2, transform: &mut ViewTransform) -> bool {
        let Self::Dragging { anchor } = self else {
            return false;
        };
        let pan = pointer.to_vec2() - *anchor;
        let changed = pan != transform.pan;
        transform.pan = pan;
        changed
    }

    /// Button released or pointer left the surface.
    pub fn release(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}

/// Union of the configured bbox and every coordinate drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataExtent {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl DataExtent {
    pub fn from_scene<'a>(
        bbox: BoundingBox,
        rings: impl IntoIterator<Item = &'a [Position]>,
    ) -> Self {
        let bbox = bbox.normalized();
        let mut extent = Self {
            min: [bbox.minx, bbox.miny],
            max: [bbox.maxx, bbox.maxy],
        };
        for Position([x, y]) in rings.into_iter().flatten() {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            extent.min = [extent.min[0].min(*x), extent.min[1].min(*y)];
            extent.max = [extent.max[0].max(*x), extent.max[1].max(*y)];
        }
        extent
    }

    /// Uniform scale fitting the extent into the padded viewport.
    /// A zero-width or zero-height axis counts as one unit.
    pub fn base_scale(&self, viewport: Vec2) -> f64 {
        let usable_w = f64::from(viewport.x - 2.0 * CANVAS_PAD);
        let usable_h = f64::from(viewport.y - 2.0 * CANVAS_PAD);
        let sx = usable_w / nonzero(self.max[0] - self.min[0]);
        let sy = usable_h / nonzero(self.max[1] - self.min[1]);
        let scale = sx.min(sy);
        if scale > 0.0 && scale.is_finite() { scale } else { 1.0 }
    }
}

/// Maps between data coordinates and canvas pixels (origin top-left).
#[derive(Clone, Copy, Debug)]
pub struct CanvasMapper {
    min: [f64; 2],
    height: f64,
    scale: f64,
    pan: Vec2,
}

impl CanvasMapper {
    pub fn new(extent: &DataExtent, viewport: Vec2, transform: &ViewTransform) -> Self {
        Self {
            min: extent.min,
            height: f64::from(viewport.y),
            scale: extent.base_scale(viewport) * f64::from(transform.zoom),
            pan: transform.pan,
        }
    }

    /// Pixels per data unit after zoom.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_pixel(&self, [x, y]: [f64; 2]) -> Pos2 {
        let pad = f64::from(CANVAS_PAD);
        pos2(
            (pad + (x - self.min[0]) * self.scale + f64::from(self.pan.x)) as f32,
            (self.height - pad - (y - self.min[1]) * self.scale + f64::from(self.pan.y)) as f32,
        )
    }

    pub fn to_data(&self, pixel: Pos2) -> [f64; 2] {
        let pad = f64::from(CANVAS_PAD);
        [
            (f64::from(pixel.x) - f64::from(self.pan.x) - pad) / self.scale + self.min[0],
            (self.height - pad + f64::from(self.pan.y) - f64::from(pixel.y)) / self.scale
                + self.min[1],
        ]
    }

    /// Data rectangle covered by a `viewport`-sized canvas.
    pub fn visible_data_rect(&self, viewport: Vec2) -> BoundingBox {
        let [minx, miny] = self.to_data(pos2(0.0, viewport.y));
        let [maxx, maxy] = self.to_data(pos2(viewport.x, 0.0));
        BoundingBox::new(minx, miny, maxx, maxy)
    }
}

/// Scene space used by the accelerated view: data `(x, y)` becomes `(x, -y)`.
pub fn scene_point([x, y]: [f64; 2]) -> Pos2 {
    pos2(x as f32, -y as f32)
}

pub fn scene_rect_from_data(bbox: BoundingBox) -> Rect {
    let bbox = bbox.normalized();
    Rect::from_min_max(
        scene_point([bbox.minx, bbox.maxy]),
        scene_point([bbox.maxx, bbox.miny]),
    )
}

pub fn data_from_scene_rect(rect: Rect) -> BoundingBox {
    BoundingBox::new(
        f64::from(rect.min.x),
        f64::from(-rect.max.y),
        f64::from(rect.max.x),
        f64::from(-rect.min.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_extent() -> DataExtent {
        DataExtent::from_scene(BoundingBox::new(0.0, 0.0, 10.0, 10.0), std::iter::empty())
    }

    #[test]
    fn y_axis_is_inverted() {
        let viewport = vec2(800.0, 520.0);
        let mapper = CanvasMapper::new(&unit_extent(), viewport, &ViewTransform::default());
        let low = mapper.to_pixel([0.0, 0.0]);
        let high = mapper.to_pixel([10.0, 10.0]);
        assert!(low.y > high.y);
        assert!(low.x < high.x);
        assert_eq!(low, pos2(20.0, 500.0));
        assert!((high.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_stays_clamped_under_repeated_input() {
        let mut transform = ViewTransform::default();
        for _ in 0..200 {
            transform.zoom_by_wheel(WheelStep::In);
            transform.zoom_in();
        }
        assert_eq!(transform.zoom, MAX_ZOOM);
        for _ in 0..400 {
            transform.zoom_by_wheel(WheelStep::Out);
            transform.zoom_out();
        }
        assert_eq!(transform.zoom, MIN_ZOOM);
    }

    #[test]
    fn reset_restores_identity_after_any_history() {
        let mut transform = ViewTransform::default();
        let mut drag = DragState::default();
        transform.zoom_in();
        drag.press(pos2(10.0, 10.0), &transform);
        drag.drag_to(pos2(55.0, -30.0), &mut transform);
        drag.release();
        transform.zoom_by_wheel(WheelStep::Out);
        transform.reset();
        assert_eq!(transform.zoom, 1.0);
        assert_eq!(transform.pan, Vec2::ZERO);
    }

    #[test]
    fn drag_moves_pan_by_pointer_delta_and_stops_on_release() {
        let mut transform = ViewTransform {
            zoom: 1.0,
            pan: vec2(5.0, 5.0),
        };
        let mut drag = DragState::default();
        assert!(!drag.drag_to(pos2(100.0, 100.0), &mut transform));
        drag.press(pos2(100.0, 100.0), &transform);
        assert!(drag.drag_to(pos2(130.0, 90.0), &mut transform));
        assert_eq!(transform.pan, vec2(35.0, -5.0));
        drag.release();
        assert!(!drag.drag_to(pos2(0.0, 0.0), &mut transform));
        assert_eq!(transform.pan, vec2(35.0, -5.0));
    }

    #[test]
    fn degenerate_and_inverted_extents_are_tolerated() {
        let flat = DataExtent::from_scene(BoundingBox::new(3.0, 3.0, 3.0, 3.0), std::iter::empty());
        assert_eq!(flat.base_scale(vec2(100.0, 100.0)), 60.0);
        let inverted =
            DataExtent::from_scene(BoundingBox::new(10.0, 10.0, 0.0, 0.0), std::iter::empty());
        assert_eq!(inverted, unit_extent());
    }

    #[test]
    fn extent_grows_to_cover_rings() {
        let ring = vec![Position([-5.0, 2.0]), Position([4.0, 30.0])];
        let extent = DataExtent::from_scene(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            [ring.as_slice()],
        );
        assert_eq!(extent.min, [-5.0, 0.0]);
        assert_eq!(extent.max, [10.0, 30.0]);
    }

    #[test]
    fn pixel_round_trip_with_pan_and_zoom() {
        let transform = ViewTransform {
            zoom: 2.5,
            pan: vec2(-40.0, 12.0),
        };
        let mapper = CanvasMapper::new(&unit_extent(), vec2(400.0, 300.0), &transform);
        let [x, y] = mapper.to_data(mapper.to_pixel([3.25, 7.5]));
        assert!((x - 3.25).abs() < 1e-4);
        assert!((y - 7.5).abs() < 1e-4);
    }

    #[test]
    fn framing_centres_target_in_viewport() {
        let viewport = vec2(800.0, 520.0);
        let extent = unit_extent();
        let mut transform = ViewTransform::default();
        let target = BoundingBox::new(2.0, 2.0, 4.0, 4.0);
        transform.frame(&extent, viewport, target);
        let mapper = CanvasMapper::new(&extent, viewport, &transform);
        let centre = mapper.to_pixel([3.0, 3.0]);
        assert!((centre.x - 400.0).abs() < 0.01);
        assert!((centre.y - 260.0).abs() < 0.01);
        let visible = mapper.visible_data_rect(viewport);
        assert!(visible.minx <= 2.0 + 1e-3 && visible.maxx >= 4.0 - 1e-3);
        assert!(visible.miny <= 2.0 + 1e-3 && visible.maxy >= 4.0 - 1e-3);
    }

    #[test]
    fn scene_rect_conversion_round_trips() {
        let bbox = BoundingBox::new(-3.0, 1.0, 5.0, 9.0);
        let rect = scene_rect_from_data(bbox);
        assert_eq!(rect.min, pos2(-3.0, -9.0));
        assert_eq!(data_from_scene_rect(rect), bbox);
    }
}
