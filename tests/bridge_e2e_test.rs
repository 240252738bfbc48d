use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use tui_parley::adapter::{
    run_server, InboundEvent, RouterBridge, ServerConfig, ServerState, UiMessage,
};
use tui_parley::types::AgentMode;

#[tokio::test]
async fn router_events_in_and_hook_calls_out() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };

    let mut bridge = RouterBridge::local();
    let state = ServerState::new();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<UiMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_state = Arc::clone(&state);
    let events = bridge.sender();
    let server_handle = tokio::spawn(async move {
        let _ = run_server(config, server_state, events, out_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // router -> UI
    let msg = r#"{"type":"messageReceived","speaker":"arbiter","text":"hi there"}"#;
    write_half.write_all(msg.as_bytes()).await.unwrap();
    write_half.write_all(b"\n").await.unwrap();
    let mode = r#"{"type":"modeChange","mode":"plan"}"#;
    write_half.write_all(mode.as_bytes()).await.unwrap();
    write_half.write_all(b"\n").await.unwrap();
    write_half.flush().await.unwrap();

    let ev = tokio::time::timeout(Duration::from_secs(2), bridge.recv())
        .await
        .unwrap()
        .expect("expected inbound event");
    assert_eq!(
        ev,
        InboundEvent::MessageReceived {
            speaker: "arbiter".into(),
            text: "hi there".into(),
        }
    );
    let ev = tokio::time::timeout(Duration::from_secs(2), bridge.recv())
        .await
        .unwrap()
        .expect("expected mode change");
    assert_eq!(ev, InboundEvent::ModeChange(AgentMode::Plan));
    assert_eq!(state.connected(), 1);

    // A malformed line is answered, not forwarded.
    write_half.write_all(b"{not json}\n").await.unwrap();
    write_half.flush().await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .expect("expected error reply");
    let v: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(v["type"], "error");
    assert!(bridge.try_recv().is_none());

    // UI -> router
    out_tx
        .send(UiMessage::SubmitText {
            text: "hello".into(),
        })
        .unwrap();
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .expect("expected submitText line");
    let v: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(v["type"], "submitText");
    assert_eq!(v["text"], "hello");

    drop(write_half);
    drop(lines);
    server_handle.abort();
}

#[tokio::test]
async fn disconnect_is_tracked() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let bridge = RouterBridge::local();
    let state = ServerState::new();
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<UiMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_state = Arc::clone(&state);
    let events = bridge.sender();
    let server_handle = tokio::spawn(async move {
        let _ = run_server(config, server_state, events, out_rx, Some(ready_tx)).await;
    });
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let stream = TcpStream::connect(addr).await.unwrap();
    wait_for(|| state.connected() == 1).await;
    drop(stream);
    wait_for(|| state.connected() == 0).await;

    server_handle.abort();
}

async fn wait_for(cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
