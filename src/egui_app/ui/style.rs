use egui::{Color32, CornerRadius, Stroke, Visuals, style::WidgetVisuals};

/// Severity of a status-bar message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Idle,
    Busy,
    Info,
    Warning,
    Error,
}

/// Badge label and colour for a tone.
pub fn status_badge(tone: StatusTone) -> (String, Color32) {
    match tone {
        StatusTone::Idle => ("Idle".into(), Color32::from_rgb(42, 42, 42)),
        StatusTone::Busy => ("Working".into(), Color32::from_rgb(31, 139, 255)),
        StatusTone::Info => ("Info".into(), Color32::from_rgb(64, 140, 112)),
        StatusTone::Warning => ("Warning".into(), Color32::from_rgb(192, 138, 43)),
        StatusTone::Error => ("Error".into(), Color32::from_rgb(192, 57, 43)),
    }
}

#[derive(Clone, Copy)]
pub struct Palette {
    pub bg_window: Color32,
    pub bg_panel: Color32,
    pub bg_widget: Color32,
    pub outline: Color32,
    pub text: Color32,
    pub text_muted: Color32,
    pub accent: Color32,
    /// Legend swatches; match the view colours.
    pub dataset_a: Color32,
    pub dataset_b: Color32,
    pub bbox: Color32,
}

pub fn palette() -> Palette {
    Palette {
        bg_window: Color32::from_rgb(18, 20, 24),
        bg_panel: Color32::from_rgb(28, 31, 36),
        bg_widget: Color32::from_rgb(44, 48, 55),
        outline: Color32::from_rgb(60, 66, 75),
        text: Color32::from_rgb(210, 214, 220),
        text_muted: Color32::from_rgb(142, 148, 158),
        accent: Color32::from_rgb(64, 158, 255),
        dataset_a: Color32::from_rgb(220, 20, 60),
        dataset_b: Color32::from_rgb(34, 139, 34),
        bbox: Color32::from_rgb(64, 158, 255),
    }
}

pub fn apply_visuals(visuals: &mut Visuals) {
    let palette = palette();
    visuals.window_fill = palette.bg_window;
    visuals.panel_fill = palette.bg_panel;
    visuals.extreme_bg_color = palette.bg_window;
    visuals.faint_bg_color = palette.bg_panel;
    visuals.override_text_color = Some(palette.text);
    visuals.hyperlink_color = palette.accent;
    visuals.selection.stroke = Stroke::new(1.0, palette.accent);
    for widgets in [
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        square_widget(widgets, palette);
    }
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, palette.accent);
    visuals.window_corner_radius = CornerRadius::ZERO;
}

fn square_widget(widgets: &mut WidgetVisuals, palette: Palette) {
    widgets.corner_radius = CornerRadius::ZERO;
    widgets.bg_fill = palette.bg_widget;
    widgets.weak_bg_fill = palette.bg_widget;
    widgets.bg_stroke = Stroke::new(1.0, palette.outline);
    widgets.fg_stroke = Stroke::new(1.0, palette.text);
}

pub fn section_stroke() -> Stroke {
    Stroke::new(1.0, palette().outline)
}
