//! Renderer-independent view logic: coordinate mapping, the CPU raster path,
//! scene layers for the accelerated path, renderer selection and the overview.

pub mod mapper;
pub mod raster;
pub mod renderer;
pub mod scene;
pub mod thumbnail;

pub use mapper::{CanvasMapper, DataExtent, DragState, ViewTransform, WheelStep};
pub use raster::{RasterCanvas, RasterScene, render_raster};
pub use renderer::{RendererKind, RendererSelector, probe_gl};
pub use scene::{SceneError, SceneLayers};
pub use thumbnail::ThumbnailMapper;
