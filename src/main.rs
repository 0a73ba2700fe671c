#![deny(missing_docs)]

//! Entry point for the polygon matching desktop client.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]
use std::sync::Arc;

use polymatch::api::ApiClient;
use polymatch::config;
use polymatch::egui_app::controller::EguiController;
use polymatch::egui_app::ui::{EguiApp, MIN_VIEWPORT_SIZE};
use polymatch::logging;
use polymatch::view::probe_gl;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_error) = match config::load_or_default() {
        Ok(settings) => (settings, None),
        Err(err) => (Default::default(), Some(err)),
    };
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }
    if let Some(err) = &config_error {
        tracing::warn!(error = %err, "Using default settings");
    }

    let viewport = egui::ViewportBuilder::default()
        .with_title("Polymatch")
        .with_min_inner_size(MIN_VIEWPORT_SIZE)
        .with_inner_size([1280.0, 820.0]);
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Polymatch",
        native_options,
        Box::new(move |cc| {
            let accelerated = probe_gl(cc.gl.as_deref());
            let client = ApiClient::new(
                &settings.server.base_url,
                settings.server.max_response_bytes,
            );
            match client {
                Ok(client) => {
                    let controller = EguiController::new(Arc::new(client), settings, accelerated);
                    Ok(Box::new(EguiApp::new(controller)))
                }
                Err(err) => Ok(Box::new(LaunchError {
                    message: format!("Invalid server URL in settings: {err}"),
                })),
            }
        }),
    )?;
    Ok(())
}

/// Minimal fallback app to display initialization errors.
struct LaunchError {
    message: String,
}

impl eframe::App for LaunchError {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Failed to start");
                ui.label(&self.message);
            });
        });
    }
}
