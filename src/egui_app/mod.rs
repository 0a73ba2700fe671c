//! egui shell: controller, UI state and rendering.

pub mod controller;
pub mod state;
pub mod ui;
