//! Terminal rendering for `vbmc` replies.

pub mod json;
pub mod styles;
pub mod table;

use console::Term;
use owo_colors::OwoColorize as _;
pub use styles::Styles;
use vbmc_common::ControlResponse;

/// Where and how replies are printed.
pub struct OutputContext {
    pub styles: Styles,
    /// Hides confirmations; errors and tables still print.
    pub quiet: bool,
}

impl OutputContext {
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let mut styles = Styles::default();
        if colors_enabled(no_color) {
            styles.colorize();
        }
        Self { styles, quiet }
    }

    /// Confirmation line for a command that returned no data.
    pub fn success(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("{} {msg}", "✓".style(self.styles.success));
    }

    /// One daemon error message, on stderr.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {msg}", "✗".style(self.styles.error));
    }

    /// Print the table carried by a `list` or `show` reply.
    pub fn table(&self, response: &ControlResponse) {
        let (Some(header), Some(rows)) = (&response.header, &response.rows) else {
            return;
        };
        for line in table::render(header, rows, &self.styles) {
            println!("{line}");
        }
    }
}

/// Color only real terminals, and honor a non-empty `NO_COLOR` even when
/// the flag is absent.
fn colors_enabled(no_color: bool) -> bool {
    let env_off = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    !no_color && !env_off && Term::stdout().is_term()
}
