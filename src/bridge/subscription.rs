//! Topic subscription handles.
//!
//! A [`Subscription`] is returned by
//! [`BridgeConnection::subscribe`](super::BridgeConnection::subscribe) and
//! stays valid only while the link it was created on is up. It never
//! re-registers itself after a reconnect.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use super::protocol::BridgeOp;
use super::router::TopicRouter;

/// Unique identifier of one registered topic callback.
///
/// Wraps a UUID v4 so that two subscriptions on the same topic can be
/// told apart by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(uuid::Uuid);

impl SubscriptionId {
    /// Creates a new random `SubscriptionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interest in one topic on one live link.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    op_id: String,
    topic: String,
    message_type: String,
    router: Arc<Mutex<TopicRouter>>,
    outbound: mpsc::UnboundedSender<BridgeOp>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        op_id: String,
        topic: String,
        message_type: String,
        router: Arc<Mutex<TopicRouter>>,
        outbound: mpsc::UnboundedSender<BridgeOp>,
    ) -> Self {
        Self {
            id,
            op_id,
            topic,
            message_type,
            router,
            outbound,
        }
    }

    /// Returns the router key of this subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the message-type tag sent with the `subscribe` op.
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns `true` while the callback is still registered, i.e. the
    /// link has not closed and [`Subscription::unsubscribe`] was not called.
    pub async fn is_active(&self) -> bool {
        self.router.lock().await.contains(self.id)
    }

    /// Removes the callback and tells the bridge to stop sending.
    ///
    /// Returns `true` if the callback was still registered. After a link
    /// has closed this is a no-op: the router was already cleared and
    /// there is nobody left to notify.
    pub async fn unsubscribe(self) -> bool {
        let removed = self.router.lock().await.remove(self.id);
        if removed {
            let op = BridgeOp::Unsubscribe {
                id: Some(self.op_id.clone()),
                topic: self.topic.clone(),
            };
            if self.outbound.send(op).is_err() {
                tracing::debug!(topic = %self.topic, "link gone before unsubscribe was sent");
            } else {
                tracing::debug!(topic = %self.topic, "unsubscribed");
            }
        }
        removed
    }
}
