//! Chat log model: messages, scroll position and the waiting indicator.

use crate::types::WAITING_BLINK_MS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: String,
    pub text: String,
}

/// Scrollable chat history.
///
/// `scroll` counts visual lines up from the bottom; 0 follows new messages.
/// The pane that lays out the messages knows the line count, so callers pass
/// the current maximum when scrolling.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    scroll: usize,
    waiting: Option<String>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            speaker: speaker.into(),
            text: text.into(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Scroll towards older messages, never past `max`.
    pub fn scroll_up(&mut self, lines: usize, max: usize) {
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    /// Re-clamp after the pane shrank or grew.
    pub fn clamp_scroll(&mut self, max: usize) {
        self.scroll = self.scroll.min(max);
    }

    pub fn start_waiting(&mut self, target: impl Into<String>) {
        self.waiting = Some(target.into());
    }

    /// Stop waiting on `target`; a stop for some other target is ignored.
    pub fn stop_waiting(&mut self, target: &str) -> bool {
        if self.waiting.as_deref() == Some(target) {
            self.waiting = None;
            return true;
        }
        false
    }

    pub fn waiting(&self) -> Option<&str> {
        self.waiting.as_deref()
    }
}

/// Waiting-indicator frame (0..=3 trailing dots) at engine time `now_ms`.
pub fn blink_phase(now_ms: u64) -> u8 {
    ((now_ms / WAITING_BLINK_MS) % 4) as u8
}
