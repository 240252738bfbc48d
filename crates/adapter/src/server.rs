//! TCP server for the router bridge
//!
//! Accepts router connections and manages client lifecycle. Every line a
//! client sends is parsed into an [`InboundEvent`](crate::events::InboundEvent) and forwarded through an
//! [`EventSender`]; UI messages are broadcast to all connected clients.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::{encode_line, parse_line, UiMessage};
use crate::runtime::EventSender;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7878;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let host = get("PARLEY_ROUTER_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = get("PARLEY_ROUTER_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { host, port }
    }

    /// Check if the bridge is disabled via `PARLEY_ROUTER_DISABLED`.
    pub fn is_disabled(get: impl Fn(&str) -> Option<String>) -> bool {
        get("PARLEY_ROUTER_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// Handle to a connected router client
struct ClientHandle {
    id: usize,
    addr: SocketAddr,
    tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
#[derive(Default)]
pub struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
    connected: AtomicUsize,
}

impl ServerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of routers currently connected.
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }

    async fn broadcast(&self, line: &str) -> usize {
        let clients = self.clients.read().await;
        for c in clients.iter() {
            let _ = c.tx.send(line.to_string());
        }
        clients.len()
    }

    async fn add(&self, client: ClientHandle) {
        self.clients.write().await.push(client);
        self.connected.fetch_add(1, Ordering::Relaxed);
    }

    async fn remove(&self, client_id: usize) {
        let mut clients = self.clients.write().await;
        if let Some(i) = clients.iter().position(|c| c.id == client_id) {
            let c = clients.swap_remove(i);
            log::debug!("dropping client {} ({})", c.id, c.addr);
            self.connected.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// Start the TCP server.
///
/// Runs until the listener fails. `ready_tx` receives the bound address, which
/// lets tests bind port 0.
pub async fn run_server(
    config: ServerConfig,
    state: Arc<ServerState>,
    events: EventSender,
    mut out_rx: mpsc::UnboundedReceiver<UiMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    log::info!("router bridge listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let line = match encode_line(&msg) {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("cannot encode {:?}: {}", msg, e);
                        continue;
                    }
                };
                if state.broadcast(&line).await == 0 {
                    log::debug!("no router connected, dropped {}", line);
                }
            }
        });
    }

    let mut client_id_counter = 0usize;

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        log::info!("router {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let events = events.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, &state, events).await {
                log::warn!("router {} error: {}", client_id, e);
            }
            log::info!("router {} disconnected", client_id);
        });
    }
}

/// Handle a single router connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: &ServerState,
    events: EventSender,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state
        .add(ClientHandle {
            id: client_id,
            addr,
            tx: tx.clone(),
        })
        .await;

    // Spawn task to write lines to the client
    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    let result = loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line).await {
            Ok(n) => n,
            Err(e) => break Err(e.into()),
        };
        if bytes_read == 0 {
            break Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_line(trimmed) {
            Ok(event) => {
                log::debug!("router {} sent {}", client_id, event.kind());
                if !events.send(event) {
                    // UI side is gone.
                    break Ok(());
                }
            }
            Err(e) => {
                log::warn!("router {} sent a bad line: {}", client_id, e);
                let reply = UiMessage::Error {
                    message: e.to_string(),
                };
                if let Ok(reply) = encode_line(&reply) {
                    let _ = tx.send(reply);
                }
            }
        }
    };

    state.remove(client_id).await;
    drop(tx);
    let _ = write_task.await;
    result
}
