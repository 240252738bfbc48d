//! Protocol module - JSON message types for the router bridge
//!
//! Line-delimited JSON, one object per line, discriminated by `type`.
//!
//! Router -> UI:
//!
//! ```text
//! {"type":"messageReceived","speaker":"arbiter","text":"hi"}
//! {"type":"contextPercent","percent":42}
//! {"type":"toolUse","name":"grep","count":2}
//! {"type":"modeChange","mode":"plan"}
//! {"type":"waitingStart","target":"arbiter"}
//! {"type":"waitingStop","target":"arbiter"}
//! {"type":"peerSpawned","index":1}
//! {"type":"peerDisconnected"}
//! {"type":"debugLog","kind":"router","text":"..."}
//! ```
//!
//! UI -> router: `submitText`, `exitConfirmed`, `fileSelected` and `error`.

use serde::{Deserialize, Serialize};

use crate::events::{HookCall, InboundEvent};
use crate::types::AgentMode;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown agent mode {0:?}")]
    UnknownMode(String),
}

fn default_count() -> u32 {
    1
}

/// Router -> UI wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RouterMessage {
    MessageReceived {
        speaker: String,
        text: String,
    },
    ContextPercent {
        percent: f64,
    },
    ToolUse {
        name: String,
        #[serde(default = "default_count")]
        count: u32,
    },
    ModeChange {
        mode: String,
    },
    WaitingStart {
        target: String,
    },
    WaitingStop {
        target: String,
    },
    PeerSpawned {
        index: usize,
    },
    PeerDisconnected,
    DebugLog {
        #[serde(default)]
        kind: String,
        text: String,
    },
}

impl TryFrom<RouterMessage> for InboundEvent {
    type Error = ProtocolError;

    fn try_from(msg: RouterMessage) -> Result<Self, Self::Error> {
        Ok(match msg {
            RouterMessage::MessageReceived { speaker, text } => {
                InboundEvent::MessageReceived { speaker, text }
            }
            RouterMessage::ContextPercent { percent } => {
                let pct = if percent.is_finite() {
                    percent.round().clamp(0.0, 100.0) as u8
                } else {
                    0
                };
                InboundEvent::ContextPercent(pct)
            }
            RouterMessage::ToolUse { name, count } => InboundEvent::ToolUse { name, count },
            RouterMessage::ModeChange { mode } => match AgentMode::from_str(&mode) {
                Some(mode) => InboundEvent::ModeChange(mode),
                None => return Err(ProtocolError::UnknownMode(mode)),
            },
            RouterMessage::WaitingStart { target } => InboundEvent::WaitingStart { target },
            RouterMessage::WaitingStop { target } => InboundEvent::WaitingStop { target },
            RouterMessage::PeerSpawned { index } => InboundEvent::PeerSpawned { index },
            RouterMessage::PeerDisconnected => InboundEvent::PeerDisconnected,
            RouterMessage::DebugLog { kind, text } => InboundEvent::DebugLog {
                kind: if kind.is_empty() { "router".to_string() } else { kind },
                text,
            },
        })
    }
}

/// UI -> router wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiMessage {
    SubmitText { text: String },
    ExitConfirmed,
    FileSelected { path: Option<String> },
    Error { message: String },
}

impl From<HookCall> for UiMessage {
    fn from(call: HookCall) -> Self {
        match call {
            HookCall::SubmitText(text) => UiMessage::SubmitText { text },
            HookCall::ExitConfirmed => UiMessage::ExitConfirmed,
            HookCall::FileSelected(path) => UiMessage::FileSelected {
                path: path.map(|p| p.to_string_lossy().into_owned()),
            },
        }
    }
}

/// Parse one router line.
pub fn parse_line(line: &str) -> Result<InboundEvent, ProtocolError> {
    let msg: RouterMessage = serde_json::from_str(line.trim())?;
    InboundEvent::try_from(msg)
}

/// Encode a UI message as one line, without the trailing newline.
pub fn encode_line(msg: &UiMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}
