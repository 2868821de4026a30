//! Mock rosbridge broker for integration tests.
//!
//! Accepts websocket clients on `127.0.0.1:<random>`, reports every
//! connection and every op it receives, and lets the test push `publish`
//! frames or drop the current client.

#![allow(dead_code, missing_docs, clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// What the broker observed.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    Connected,
    Op(Value),
    Disconnected,
}

#[derive(Debug, Clone)]
enum Control {
    Send(String),
    Kick,
}

#[derive(Debug, Clone)]
struct BrokerState {
    events: mpsc::UnboundedSender<BrokerEvent>,
    control: broadcast::Sender<Control>,
}

#[derive(Debug)]
pub struct MockBroker {
    pub url: String,
    pub addr: SocketAddr,
    events: mpsc::UnboundedReceiver<BrokerEvent>,
    control: broadcast::Sender<Control>,
    server: JoinHandle<()>,
}

impl MockBroker {
    pub async fn start() -> Self {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("mock broker failed to bind");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("mock broker has no local addr");
        };
        let (events_tx, events) = mpsc::unbounded_channel();
        let (control, _) = broadcast::channel(64);

        let state = BrokerState {
            events: events_tx,
            control: control.clone(),
        };
        let app = Router::new().route("/", get(ws_handler)).with_state(state);
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("ws://{addr}"),
            addr,
            events,
            control,
            server,
        }
    }

    /// Waits for the next observation.
    pub async fn next_event(&mut self) -> BrokerEvent {
        match tokio::time::timeout(TIMEOUT, self.events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => panic!("mock broker event channel closed"),
            Err(_) => panic!("timed out waiting for broker event"),
        }
    }

    /// Returns an observation if one arrives within `window`.
    pub async fn event_within(&mut self, window: Duration) -> Option<BrokerEvent> {
        tokio::time::timeout(window, self.events.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn expect_connected(&mut self) {
        let event = self.next_event().await;
        assert_eq!(event, BrokerEvent::Connected);
    }

    pub async fn expect_disconnected(&mut self) {
        let event = self.next_event().await;
        assert_eq!(event, BrokerEvent::Disconnected);
    }

    pub async fn expect_op(&mut self) -> Value {
        match self.next_event().await {
            BrokerEvent::Op(op) => op,
            other => panic!("expected an op, got {other:?}"),
        }
    }

    /// Collects ops until `count` subscribe ops were seen; returns their topics.
    pub async fn expect_subscriptions(&mut self, count: usize) -> Vec<String> {
        let mut topics = Vec::new();
        while topics.len() < count {
            let op = self.expect_op().await;
            if op["op"] == "subscribe" {
                topics.push(op["topic"].as_str().unwrap_or_default().to_string());
            }
        }
        topics.sort();
        topics
    }

    /// Pushes a `publish` frame to the connected client.
    pub fn publish(&self, topic: &str, msg: Value) {
        let frame = json!({ "op": "publish", "topic": topic, "msg": msg });
        self.send_raw(&frame.to_string());
    }

    /// Pushes an arbitrary text frame.
    pub fn send_raw(&self, frame: &str) {
        let _ = self.control.send(Control::Send(frame.to_string()));
    }

    /// Closes the current client socket from the server side.
    pub fn kick(&self) {
        let _ = self.control.send(Control::Kick);
    }
}

impl Drop for MockBroker {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Returns a `ws://` URL on which nothing is listening.
pub fn dead_url() -> String {
    let Ok(listener) = std::net::TcpListener::bind("127.0.0.1:0") else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    drop(listener);
    format!("ws://{addr}")
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<BrokerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_socket(socket, state))
}

async fn run_socket(socket: WebSocket, state: BrokerState) {
    let mut control = state.control.subscribe();
    let _ = state.events.send(BrokerEvent::Connected);
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(op) = serde_json::from_str::<Value>(&text) {
                            let _ = state.events.send(BrokerEvent::Op(op));
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            cmd = control.recv() => {
                match cmd {
                    Ok(Control::Send(frame)) => {
                        if ws_tx.send(Message::text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Control::Kick) => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = state.events.send(BrokerEvent::Disconnected);
}
