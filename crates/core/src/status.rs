//! Status line and context gauge models.

use crate::types::{AgentMode, EditMode};

/// Everything the one-line status bar shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub edit_mode: EditMode,
    pub agent_mode: AgentMode,
    pub last_tool: Option<String>,
    pub tool_total: u32,
    pub peers: usize,
    /// First quit keypress seen; the next one confirms.
    pub quit_pending: bool,
    /// Transient notice, e.g. an atlas load failure.
    pub notice: Option<String>,
}

impl StatusLine {
    pub fn record_tool_use(&mut self, name: impl Into<String>, count: u32) {
        self.last_tool = Some(name.into());
        self.tool_total = self.tool_total.saturating_add(count.max(1));
    }
}

/// Context-window usage, 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextGauge {
    percent: u8,
}

impl ContextGauge {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn set(&mut self, percent: u8) {
        self.percent = percent.min(100);
    }
}
