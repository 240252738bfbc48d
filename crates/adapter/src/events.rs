//! Inbound router events and outbound hooks.

use std::path::PathBuf;

use crate::types::AgentMode;

/// Something the router collaborator reports to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    MessageReceived { speaker: String, text: String },
    ContextPercent(u8),
    ToolUse { name: String, count: u32 },
    ModeChange(AgentMode),
    WaitingStart { target: String },
    WaitingStop { target: String },
    PeerSpawned { index: usize },
    PeerDisconnected,
    DebugLog { kind: String, text: String },
}

impl InboundEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::MessageReceived { .. } => "messageReceived",
            InboundEvent::ContextPercent(_) => "contextPercent",
            InboundEvent::ToolUse { .. } => "toolUse",
            InboundEvent::ModeChange(_) => "modeChange",
            InboundEvent::WaitingStart { .. } => "waitingStart",
            InboundEvent::WaitingStop { .. } => "waitingStop",
            InboundEvent::PeerSpawned { .. } => "peerSpawned",
            InboundEvent::PeerDisconnected => "peerDisconnected",
            InboundEvent::DebugLog { .. } => "debugLog",
        }
    }
}

/// Calls from the UI back to its collaborator.
pub trait Hooks {
    fn on_submit_text(&mut self, text: String);
    fn on_exit_confirmed(&mut self);
    fn on_requirements_file_selected(&mut self, path: Option<PathBuf>);
}

/// A hook invocation as a value, for forwarding and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    SubmitText(String),
    ExitConfirmed,
    FileSelected(Option<PathBuf>),
}

impl Hooks for Vec<HookCall> {
    fn on_submit_text(&mut self, text: String) {
        self.push(HookCall::SubmitText(text));
    }

    fn on_exit_confirmed(&mut self) {
        self.push(HookCall::ExitConfirmed);
    }

    fn on_requirements_file_selected(&mut self, path: Option<PathBuf>) {
        self.push(HookCall::FileSelected(path));
    }
}
