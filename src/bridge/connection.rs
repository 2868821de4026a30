//! Bridge connection: handshake, link I/O loop, and notifications.
//!
//! A [`BridgeConnection`] owns at most one live websocket link at a time.
//! The link's read/write loop runs in its own task; it decodes inbound
//! `publish` frames, routes them to topic callbacks, and writes queued
//! outbound ops. Every transition is reported both as a
//! [`ConnectionState`] on a watch channel and as a [`ConnectionEvent`]
//! on a broadcast channel.

use std::fmt;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use super::protocol::{BridgeOp, ScalarMessage, op_id};
use super::router::TopicRouter;
use super::subscription::{Subscription, SubscriptionId};
use crate::error::BridgeError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Capacity of the notification channel. Notifications are rare; a
/// receiver only lags if it stops polling entirely.
const EVENT_CAPACITY: usize = 16;

/// Lifecycle state of a [`BridgeConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No link; either never connected or closed.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Link is up.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Notification raised on link transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake succeeded.
    Open,
    /// Handshake failed or an established link went away.
    Closed,
}

#[derive(Debug)]
struct Link {
    outbound: mpsc::UnboundedSender<BridgeOp>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Link {
    fn is_live(&self, state: ConnectionState) -> bool {
        // The task reports `Disconnected` before it returns.
        state != ConnectionState::Disconnected && !self.task.is_finished()
    }

    /// Stops the task and waits for it to return.
    async fn reap(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "bridge link task failed");
        }
    }
}

/// Client connection to a rosbridge server.
#[derive(Debug)]
pub struct BridgeConnection {
    url: String,
    state: Arc<watch::Sender<ConnectionState>>,
    events: broadcast::Sender<ConnectionEvent>,
    router: Arc<Mutex<TopicRouter>>,
    link: Mutex<Option<Link>>,
}

impl BridgeConnection {
    /// Creates a disconnected connection bound to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            url: url.into(),
            state: Arc::new(state),
            events,
            router: Arc::new(Mutex::new(TopicRouter::new())),
            link: Mutex::new(None),
        }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `true` while the link is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns a receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Returns a receiver of future `Open`/`Closed` notifications.
    ///
    /// Subscribe before calling [`BridgeConnection::connect`] to observe
    /// the outcome of that handshake.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Performs the websocket handshake and starts the link task.
    ///
    /// Raises [`ConnectionEvent::Open`] on success. On failure the state
    /// returns to `Disconnected` and [`ConnectionEvent::Closed`] is raised
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyConnected`] if a live link exists, or
    /// [`BridgeError::ConnectionFailure`] if the handshake fails.
    pub async fn connect(&self) -> Result<(), BridgeError> {
        let mut slot = self.link.lock().await;
        if let Some(link) = slot.take() {
            if link.is_live(self.state()) {
                *slot = Some(link);
                return Err(BridgeError::AlreadyConnected(self.url.clone()));
            }
            link.reap().await;
        }

        self.state.send_replace(ConnectionState::Connecting);
        tracing::debug!(url = %self.url, "connecting to bridge");

        let ws = match connect_async(self.url.as_str()).await {
            Ok((ws, _response)) => ws,
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                let _ = self.events.send(ConnectionEvent::Closed);
                return Err(BridgeError::ConnectionFailure {
                    url: self.url.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        self.state.send_replace(ConnectionState::Connected);
        tracing::info!(url = %self.url, "connection established");
        let _ = self.events.send(ConnectionEvent::Open);

        let task = tokio::spawn(run_link(
            ws,
            outbound_rx,
            cancel.clone(),
            Arc::clone(&self.router),
            Arc::clone(&self.state),
            self.events.clone(),
        ));
        *slot = Some(Link {
            outbound,
            cancel,
            task,
        });
        Ok(())
    }

    /// Closes the link, if any, and waits for its task to finish.
    ///
    /// Idempotent: returns `true` only for the call that tore down a live
    /// link. Pending outbound ops are flushed before the close frame.
    pub async fn close(&self) -> bool {
        let Some(link) = self.link.lock().await.take() else {
            return false;
        };
        let live = link.is_live(self.state());
        link.reap().await;
        live
    }

    /// Registers `on_message` for `topic` and sends the `subscribe` op.
    ///
    /// The callback is invoked once per inbound message with the raw
    /// `data` field, in arrival order, until the link closes or the
    /// returned [`Subscription`] is unsubscribed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] unless the link is up, or
    /// [`BridgeError::Send`] if the link went away mid-call.
    pub async fn subscribe<F>(
        &self,
        topic: &str,
        message_type: &str,
        on_message: F,
    ) -> Result<Subscription, BridgeError>
    where
        F: FnMut(f64) + Send + 'static,
    {
        let slot = self.link.lock().await;
        let Some(link) = slot.as_ref().filter(|link| link.is_live(self.state())) else {
            return Err(BridgeError::NotConnected);
        };

        let id = SubscriptionId::new();
        let op_id = op_id("subscribe", topic);
        self.router
            .lock()
            .await
            .insert(topic, id, Box::new(on_message));

        let op = BridgeOp::Subscribe {
            id: Some(op_id.clone()),
            topic: topic.to_string(),
            msg_type: message_type.to_string(),
        };
        if link.outbound.send(op).is_err() {
            self.router.lock().await.remove(id);
            return Err(BridgeError::Send);
        }
        tracing::debug!(topic, message_type, "subscribed");

        Ok(Subscription::new(
            id,
            op_id,
            topic.to_string(),
            message_type.to_string(),
            Arc::clone(&self.router),
            link.outbound.clone(),
        ))
    }

    /// Announces that this client publishes `topic` with `message_type`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] unless the link is up.
    pub async fn advertise(&self, topic: &str, message_type: &str) -> Result<(), BridgeError> {
        self.send(BridgeOp::Advertise {
            id: Some(op_id("advertise", topic)),
            topic: topic.to_string(),
            msg_type: message_type.to_string(),
        })
        .await
    }

    /// Queues a message for `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] unless the link is up.
    pub async fn publish(&self, topic: &str, msg: serde_json::Value) -> Result<(), BridgeError> {
        self.send(BridgeOp::Publish {
            topic: topic.to_string(),
            msg,
        })
        .await
    }

    async fn send(&self, op: BridgeOp) -> Result<(), BridgeError> {
        let slot = self.link.lock().await;
        match slot.as_ref() {
            Some(link) if link.is_live(self.state()) => {
                link.outbound.send(op).map_err(|_| BridgeError::Send)
            }
            _ => Err(BridgeError::NotConnected),
        }
    }
}

/// Runs the read/write loop for a single link.
///
/// - Writes ops queued by the connection and its subscriptions.
/// - Routes inbound `publish` frames to topic callbacks.
///
/// On exit the router is cleared, the state drops to `Disconnected`, and
/// `Closed` is raised.
async fn run_link(
    ws: WsStream,
    mut outbound: mpsc::UnboundedReceiver<BridgeOp>,
    cancel: CancellationToken,
    router: Arc<Mutex<TopicRouter>>,
    state: Arc<watch::Sender<ConnectionState>>,
    events: broadcast::Sender<ConnectionEvent>,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let reason = loop {
        tokio::select! {
            () = cancel.cancelled() => {
                while let Ok(op) = outbound.try_recv() {
                    if write_op(&mut ws_tx, &op).await.is_err() {
                        break;
                    }
                }
                let _ = ws_tx.send(Message::Close(None)).await;
                break "closed by client";
            }
            // Ops queued by the connection or a subscription
            op = outbound.recv() => {
                let Some(op) = op else {
                    break "outbound queue dropped";
                };
                if write_op(&mut ws_tx, &op).await.is_err() {
                    break "write failed";
                }
            }
            // Inbound frame from the bridge
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&text, &router).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break "closed by server",
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "bridge transport error");
                        break "transport error";
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    router.lock().await.clear();
    state.send_replace(ConnectionState::Disconnected);
    tracing::info!(reason, "connection is closed");
    let _ = events.send(ConnectionEvent::Closed);
}

async fn write_op(ws_tx: &mut WsSink, op: &BridgeOp) -> Result<(), ()> {
    let json = match op.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "dropping unencodable op");
            return Ok(());
        }
    };
    ws_tx.send(Message::text(json)).await.map_err(|e| {
        tracing::warn!(error = %e, "bridge write failed");
    })
}

/// Decodes one text frame and dispatches it.
///
/// Returns the number of callbacks invoked. Undecodable frames and
/// malformed message bodies are logged and discarded.
async fn handle_frame(text: &str, router: &Mutex<TopicRouter>) -> usize {
    let op = match BridgeOp::from_json(text).map_err(BridgeError::from) {
        Ok(op) => op,
        Err(e) => {
            tracing::warn!(error = %e, code = e.error_code(), "discarding undecodable frame");
            return 0;
        }
    };

    let BridgeOp::Publish { topic, msg } = op else {
        tracing::trace!("ignoring non-publish op");
        return 0;
    };

    let mut router = router.lock().await;
    if !router.has_topic(&topic) {
        tracing::trace!(topic, "no subscriber for topic");
        return 0;
    }
    match decode_scalar(msg) {
        Ok(value) => router.dispatch(&topic, value),
        Err(e) => {
            tracing::warn!(topic, error = %e, code = e.error_code(), "discarding malformed message");
            0
        }
    }
}

/// Extracts the `data` field of a `std_msgs/Float32` body.
fn decode_scalar(msg: serde_json::Value) -> Result<f64, BridgeError> {
    Ok(serde_json::from_value::<ScalarMessage>(msg)?.data)
}
