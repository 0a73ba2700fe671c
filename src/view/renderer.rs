//! Hardware-acceleration probe and the two-state renderer selector.

use eframe::glow::{self, HasContext as _};
use tracing::{info, warn};

/// Which view draws the polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererKind {
    /// CPU pixel buffer uploaded as a texture.
    Raster,
    /// Triangulated meshes drawn by the GPU through `egui::Scene`.
    Accelerated,
}

impl RendererKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Raster => "Raster",
            Self::Accelerated => "Accelerated",
        }
    }
}

/// Ask the GL context for one harmless parameter.
///
/// Returns `false` without a context, when the query reports a GL error, or
/// when the reported texture limit is not positive.
pub fn probe_gl(gl: Option<&glow::Context>) -> bool {
    let Some(gl) = gl else {
        return false;
    };
    // SAFETY: called on the thread that owns the context eframe created, with
    // no GL objects involved.
    let (max_texture, error) = unsafe {
        let value = gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE);
        (value, gl.get_error())
    };
    interpret_probe(max_texture, error)
}

fn interpret_probe(max_texture_size: i32, gl_error: u32) -> bool {
    gl_error == glow::NO_ERROR && max_texture_size > 0
}

/// Active renderer plus what the probe and runtime have reported.
///
/// Failures only move Accelerated to Raster; the user may switch either way
/// at any time.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererSelector {
    active: RendererKind,
    accelerated_supported: bool,
    last_failure: Option<String>,
}

impl RendererSelector {
    pub fn from_probe(accelerated_supported: bool, prefer_accelerated: bool) -> Self {
        let active = if accelerated_supported && prefer_accelerated {
            RendererKind::Accelerated
        } else {
            RendererKind::Raster
        };
        info!(
            supported = accelerated_supported,
            active = active.label(),
            "Renderer selected"
        );
        Self {
            active,
            accelerated_supported,
            last_failure: None,
        }
    }

    pub fn active(&self) -> RendererKind {
        self.active
    }

    pub fn accelerated_supported(&self) -> bool {
        self.accelerated_supported
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Record an accelerated-view failure and fall back to raster.
    /// Returns whether the active renderer changed.
    pub fn report_failure(&mut self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        warn!(%reason, "Accelerated view failed");
        self.accelerated_supported = false;
        self.last_failure = Some(reason);
        if self.active == RendererKind::Accelerated {
            self.active = RendererKind::Raster;
            return true;
        }
        false
    }

    /// Manual switch; never blocked by the probe result.
    pub fn toggle(&mut self) -> RendererKind {
        let next = match self.active {
            RendererKind::Raster => RendererKind::Accelerated,
            RendererKind::Accelerated => RendererKind::Raster,
        };
        self.set(next);
        next
    }

    pub fn set(&mut self, kind: RendererKind) {
        if kind != self.active {
            info!(from = self.active.label(), to = kind.label(), "Renderer switched");
        }
        self.active = kind;
    }
}
