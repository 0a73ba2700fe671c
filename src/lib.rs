//! Library exports for the polygon matching client and its tests.
/// Typed client for the matching service HTTP API.
pub mod api;
/// Application directory resolution.
pub mod app_dirs;
/// Persisted client settings.
pub mod config;
/// Shared egui UI modules.
pub mod egui_app;
/// Shared HTTP agent and bounded response helpers.
pub mod http_client;
/// Logging setup.
pub mod logging;
/// Renderer-independent view math: mapping, rasterizing, scene layers.
pub mod view;
