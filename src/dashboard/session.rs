//! Dashboard session: owns the bridge connection for its whole lifetime.
//!
//! [`DashboardSession::mount`] creates the connection and spawns a single
//! driver task. The driver multiplexes connection notifications, inbound
//! readings, the reconnect timer, and cancellation, and is the only
//! writer of [`DashboardState`]. [`DashboardSession::unmount`] cancels the
//! driver, which then unsubscribes, drops any pending reconnect timer,
//! and closes the connection exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

use super::readings::{ScalarReading, SensorTopic};
use super::state::DashboardState;
use super::view::DashboardView;
use crate::bridge::{
    BridgeConnection, ConnectionEvent, ConnectionState, FLOAT32_TYPE, ReconnectPolicy,
    Subscription,
};
use crate::config::BridgeConfig;

/// An owned, running dashboard.
///
/// Dropping the session without calling [`DashboardSession::unmount`]
/// still cancels the driver; teardown then finishes in the background.
#[derive(Debug)]
pub struct DashboardSession {
    connection: Arc<BridgeConnection>,
    state: watch::Receiver<DashboardState>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<bool>>,
}

impl DashboardSession {
    /// Creates the connection and starts connecting in the background.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn mount(config: BridgeConfig) -> Self {
        let connection = Arc::new(BridgeConnection::new(config.url.clone()));
        let (state_tx, state_rx) = watch::channel(DashboardState::default());
        let cancel = CancellationToken::new();
        let (readings_tx, readings_rx) = mpsc::unbounded_channel();

        let driver = SessionDriver {
            connection: Arc::clone(&connection),
            policy: ReconnectPolicy::new(config.reconnect_delay),
            state: state_tx,
            cancel: cancel.clone(),
            subscriptions: Vec::new(),
            readings_tx,
            readings_rx,
        };
        tracing::info!(
            url = %config.url,
            reconnect_delay = ?config.reconnect_delay,
            "mounting dashboard"
        );
        let driver = tokio::spawn(driver.run());

        Self {
            connection,
            state: state_rx,
            cancel,
            driver: Some(driver),
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// Derives the view from the current state.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView::from_state(&self.state.borrow())
    }

    /// Returns the lifecycle state of the underlying connection.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Hands the current view and every later one to `on_view` until
    /// `shutdown` resolves.
    ///
    /// `shutdown` is polled first on every turn, so a signal that lands
    /// while `on_view` runs ends the loop before the next view.
    pub async fn render_until<S, V>(&self, shutdown: S, mut on_view: V)
    where
        S: Future<Output = ()>,
        V: FnMut(&DashboardView),
    {
        tokio::pin!(shutdown);
        let mut updates = self.watch();
        let view = DashboardView::from_state(&updates.borrow_and_update());
        on_view(&view);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = DashboardView::from_state(&updates.borrow_and_update());
                    on_view(&view);
                }
            }
        }
    }

    /// Stops the session and releases the connection.
    ///
    /// Returns `true` if a live link was closed by this call.
    pub async fn unmount(mut self) -> bool {
        self.cancel.cancel();
        let Some(driver) = self.driver.take() else {
            return false;
        };
        match driver.await {
            Ok(closed) => closed,
            Err(e) => {
                tracing::warn!(error = %e, "dashboard driver failed");
                false
            }
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SessionDriver {
    connection: Arc<BridgeConnection>,
    policy: ReconnectPolicy,
    state: watch::Sender<DashboardState>,
    cancel: CancellationToken,
    subscriptions: Vec<Subscription>,
    readings_tx: mpsc::UnboundedSender<ScalarReading>,
    readings_rx: mpsc::UnboundedReceiver<ScalarReading>,
}

impl SessionDriver {
    async fn run(mut self) -> bool {
        let mut events = self.connection.events();
        let mut retry: Option<Pin<Box<Sleep>>> = None;

        if self.dial().await {
            loop {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(ConnectionEvent::Open) => self.on_open().await,
                        Ok(ConnectionEvent::Closed) => {
                            if let Some(delay) = self.on_closed() {
                                retry = Some(Box::pin(tokio::time::sleep(delay)));
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "dashboard lagged behind connection events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    Some(reading) = self.readings_rx.recv() => self.on_reading(reading),
                    () = wait_retry(&mut retry) => {
                        retry = None;
                        if self.policy.on_timer_fired() {
                            let attempts = self.policy.attempts();
                            self.state.send_modify(|s| s.reconnect_attempts = attempts);
                            tracing::info!(attempt = attempts, "reconnecting to bridge");
                            if !self.dial().await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.teardown().await
    }

    /// Calls `connect`, racing it against cancellation.
    ///
    /// Returns `false` if the session was cancelled mid-handshake. A
    /// failed handshake is only logged; its `Closed` notification drives
    /// the policy.
    async fn dial(&mut self) -> bool {
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return false,
            result = self.connection.connect() => result,
        };
        if let Err(e) = result {
            if !e.is_transient() {
                tracing::error!(error = %e, code = e.error_code(), "connect rejected");
            } else if self.policy.is_retrying() {
                let e = e.into_reconnect_failure();
                tracing::warn!(error = %e, code = e.error_code(), "connection problem");
            } else {
                tracing::warn!(error = %e, code = e.error_code(), "bridge unreachable");
            }
        }
        true
    }

    async fn on_open(&mut self) {
        self.policy.on_open();
        self.state.send_modify(|s| s.connected = true);

        for topic in SensorTopic::ALL {
            let tx = self.readings_tx.clone();
            let subscribed = self
                .connection
                .subscribe(topic.topic_name(), FLOAT32_TYPE, move |value| {
                    let _ = tx.send(ScalarReading::now(topic, value));
                })
                .await;
            match subscribed {
                Ok(sub) => {
                    tracing::debug!(
                        topic = sub.topic(),
                        message_type = sub.message_type(),
                        "dashboard subscribed"
                    );
                    self.subscriptions.push(sub);
                }
                Err(e) => tracing::warn!(%topic, error = %e, "subscribe failed"),
            }
        }
    }

    fn on_closed(&mut self) -> Option<std::time::Duration> {
        // The link cleared its router; these handles are already dead.
        self.subscriptions.clear();
        self.state.send_modify(|s| s.connected = false);

        let delay = self.policy.on_closed();
        match delay {
            Some(delay) => {
                tracing::info!(delay = ?delay, "scheduling reconnect");
            }
            None => tracing::warn!("bridge disconnected; no further reconnect scheduled"),
        }
        delay
    }

    fn on_reading(&mut self, reading: ScalarReading) {
        tracing::trace!(topic = %reading.topic, value = reading.value, "reading");
        self.state.send_modify(|s| s.readings.apply(reading));
    }

    async fn teardown(&mut self) -> bool {
        for sub in self.subscriptions.drain(..) {
            let _ = sub.unsubscribe().await;
        }
        let closed = self.connection.close().await;
        self.state.send_modify(|s| s.connected = false);
        tracing::info!(closed, "dashboard unmounted");
        closed
    }
}

/// Resolves when the armed timer fires; pends forever when none is armed.
async fn wait_retry(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
