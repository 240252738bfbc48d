//! Adapter module - the UI's link to its router collaborator
//!
//! The router drives the conversation; this crate turns what it reports into
//! [`InboundEvent`]s and hands user actions back through the [`Hooks`] trait.
//!
//! # Protocol Overview
//!
//! A **line-delimited JSON protocol** over TCP, one object per line with a
//! `type` discriminator:
//!
//! 1. **Connection**: the router connects to the UI (default: 127.0.0.1:7878)
//! 2. **Events**: each line the router sends becomes one [`InboundEvent`]
//! 3. **Hooks**: submits, exit confirmation and file selection are broadcast
//!    to every connected router
//! 4. **Errors**: a malformed line is answered with an `error` message and
//!    otherwise ignored
//!
//! See [`protocol`] for the message shapes.
//!
//! # Environment Variables
//!
//! - `PARLEY_ROUTER_HOST`: Bind address (default: "127.0.0.1")
//! - `PARLEY_ROUTER_PORT`: Port number (default: 7878)
//! - `PARLEY_ROUTER_DISABLED`: Set to "1" or "true" to disable the bridge
//! - `PARLEY_ATLAS_PATH`, `PARLEY_TILE_SIZE`, `PARLEY_TICK_MS`,
//!   `PARLEY_DEBUG_LOG`, `PARLEY_PICKER_DIR`: see [`AppConfig`]
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7878
//! {"type":"messageReceived","speaker":"arbiter","text":"hello"}
//! {"type":"modeChange","mode":"plan"}
//! ```

pub mod choreo;
pub mod config;
pub mod debug_log;
pub mod events;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_parley_core as core;
pub use tui_parley_types as types;

pub use choreo::{Lanes, SharedEngine};
pub use config::AppConfig;
pub use debug_log::{DebugLog, LogTail};
pub use events::{HookCall, Hooks, InboundEvent};
pub use protocol::{parse_line, ProtocolError, RouterMessage, UiMessage};
pub use runtime::{BridgeHooks, EventSender, RouterBridge};
pub use server::{run_server, ServerConfig, ServerState};
