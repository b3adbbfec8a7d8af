//! Application context: unified state passed to every command handler.

use std::time::Duration;

use crate::infra::control_client::ControlClient;
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// The raw control reply as JSON.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Where and how long to talk to the control plane.
pub struct ControlFlags {
    /// Loopback port of the control channel.
    pub port: u16,
    /// Bound on one request/reply exchange.
    pub timeout: Duration,
}

/// Constructed once in `Cli::run()` and passed as `&AppContext` to all
/// command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Control channel client.
    pub client: ControlClient,
}

impl AppContext {
    #[must_use]
    pub fn new(output: &OutputFlags, control: &ControlFlags) -> Self {
        let mode = if output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(output.no_color, output.quiet),
            mode,
            client: ControlClient::new(control.port, control.timeout),
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }
}
