//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Error messages (red)
    pub error: Style,
    /// Table borders
    pub dim: Style,
    /// Table header cells
    pub header: Style,
    /// `running` status cells
    pub running: Style,
    /// `error` status cells
    pub failed: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.error = Style::new().red();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
        self.running = Style::new().green();
        self.failed = Style::new().red().bold();
    }

    /// Style for a table cell, keyed on its text.
    #[must_use]
    pub fn cell(&self, text: &str) -> Style {
        match text {
            "running" => self.running,
            "error" => self.failed,
            _ => Style::new(),
        }
    }
}
