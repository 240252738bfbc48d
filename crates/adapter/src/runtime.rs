//! Router bridge runtime integration.
//!
//! Bridges the single-threaded UI loop with the async TCP server: inbound
//! events arrive on an unbounded channel the UI drains between frames, and hook
//! calls are queued for the server's outbound dispatcher.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{HookCall, Hooks, InboundEvent};
use crate::protocol::UiMessage;
use crate::server::{run_server, ServerConfig, ServerState};

/// Cloneable producer side of the inbound event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<InboundEvent>,
}

impl EventSender {
    /// Queue an event. Never blocks; returns false once the UI is gone.
    pub fn send(&self, event: InboundEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Running bridge instance.
pub struct RouterBridge {
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<InboundEvent>,
    out_tx: Option<mpsc::UnboundedSender<UiMessage>>,
    state: Option<Arc<ServerState>>,
    server: Option<JoinHandle<()>>,
}

impl RouterBridge {
    /// Bridge without a TCP listener; events come only from [`Self::sender`].
    pub fn local() -> Self {
        let (tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx: EventSender { tx },
            events_rx,
            out_tx: None,
            state: None,
            server: None,
        }
    }

    /// Start the TCP bridge on the current tokio runtime.
    pub fn start(config: ServerConfig) -> Self {
        let mut bridge = Self::local();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<UiMessage>();
        let state = ServerState::new();
        let events = bridge.events_tx.clone();
        let server_state = Arc::clone(&state);
        bridge.server = Some(tokio::spawn(async move {
            if let Err(e) = run_server(config, server_state, events, out_rx, None).await {
                log::warn!("router bridge stopped: {}", e);
            }
        }));
        bridge.out_tx = Some(out_tx);
        bridge.state = Some(state);
        bridge
    }

    /// `start` with the given config, or `local` when there is none.
    pub fn from_config(config: Option<&ServerConfig>) -> Self {
        match config {
            Some(config) => Self::start(config.clone()),
            None => {
                log::info!("router bridge disabled");
                Self::local()
            }
        }
    }

    pub fn sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn try_recv(&mut self) -> Option<InboundEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        self.events_rx.recv().await
    }

    /// True when at least one router is connected.
    pub fn has_router(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.connected() > 0)
    }

    /// Hook sink that forwards to every connected router.
    pub fn hooks(&self) -> BridgeHooks {
        BridgeHooks {
            out_tx: self.out_tx.clone(),
        }
    }
}

impl Drop for RouterBridge {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}

/// [`Hooks`] implementation handed to the UI by [`RouterBridge::hooks`].
#[derive(Debug, Clone)]
pub struct BridgeHooks {
    out_tx: Option<mpsc::UnboundedSender<UiMessage>>,
}

impl BridgeHooks {
    fn send(&self, call: HookCall) {
        match &self.out_tx {
            Some(tx) => {
                let _ = tx.send(call.into());
            }
            None => log::debug!("no router bridge for {:?}", call),
        }
    }
}

impl Hooks for BridgeHooks {
    fn on_submit_text(&mut self, text: String) {
        self.send(HookCall::SubmitText(text));
    }

    fn on_exit_confirmed(&mut self) {
        self.send(HookCall::ExitConfirmed);
    }

    fn on_requirements_file_selected(&mut self, path: Option<PathBuf>) {
        self.send(HookCall::FileSelected(path));
    }
}
