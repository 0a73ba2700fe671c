use crate::egui_app::ui::style::{self, StatusTone};
use egui::Color32;

const MAX_LOG_ENTRIES: usize = 200;

/// Status badge + text shown in the footer.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusBarState {
    pub text: String,
    pub badge_label: String,
    pub badge_color: Color32,
    /// Rolling status log, oldest first.
    pub log: Vec<StatusLogEntry>,
}

/// One log line. Entries sharing a key are updated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusLogEntry {
    pub key: Option<&'static str>,
    pub text: String,
}

impl StatusBarState {
    pub fn idle() -> Self {
        let (badge_label, badge_color) = style::status_badge(StatusTone::Idle);
        Self {
            text: "Choose two dataset files to get started".into(),
            badge_label,
            badge_color,
            log: Vec::new(),
        }
    }

    /// Append a line, or replace the existing line with the same key.
    pub fn record(&mut self, key: Option<&'static str>, text: String) {
        if let Some(key) = key {
            if let Some(entry) = self.log.iter_mut().find(|entry| entry.key == Some(key)) {
                entry.text = text;
                return;
            }
        }
        self.log.push(StatusLogEntry { key, text });
        if self.log.len() > MAX_LOG_ENTRIES {
            let excess = self.log.len() - MAX_LOG_ENTRIES;
            self.log.drain(..excess);
        }
    }

    /// Drop the keyed line so the next update starts a fresh one.
    pub fn release_key(&mut self, key: &'static str) {
        for entry in self.log.iter_mut().filter(|entry| entry.key == Some(key)) {
            entry.key = None;
        }
    }

    pub fn log_text(&self) -> String {
        self.log
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
