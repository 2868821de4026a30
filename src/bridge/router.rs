//! Per-connection topic router.
//!
//! Tracks which callbacks are registered for which topic and fans inbound
//! scalars out to them. The router is cleared whenever its link closes,
//! which is what makes a subscription valid only while connected.

use std::collections::HashMap;
use std::fmt;

use super::subscription::SubscriptionId;

/// Callback invoked with each decoded scalar of a topic.
pub type ScalarHandler = Box<dyn FnMut(f64) + Send + 'static>;

struct Route {
    id: SubscriptionId,
    handler: ScalarHandler,
}

/// Manages the set of topic callbacks for a single bridge connection.
#[derive(Default)]
pub struct TopicRouter {
    routes: HashMap<String, Vec<Route>>,
}

impl fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics: Vec<(&str, usize)> = self
            .routes
            .iter()
            .map(|(topic, routes)| (topic.as_str(), routes.len()))
            .collect();
        f.debug_struct("TopicRouter")
            .field("topics", &topics)
            .finish()
    }
}

impl TopicRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic` under `id`.
    pub fn insert(&mut self, topic: &str, id: SubscriptionId, handler: ScalarHandler) {
        self.routes
            .entry(topic.to_string())
            .or_default()
            .push(Route { id, handler });
    }

    /// Removes the route registered under `id`.
    ///
    /// Returns `true` if a route was removed.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.routes.retain(|_, routes| {
            let before = routes.len();
            routes.retain(|route| route.id != id);
            removed |= routes.len() != before;
            !routes.is_empty()
        });
        removed
    }

    /// Returns `true` if a route is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.routes
            .values()
            .any(|routes| routes.iter().any(|route| route.id == id))
    }

    /// Returns `true` if at least one callback listens on `topic`.
    #[must_use]
    pub fn has_topic(&self, topic: &str) -> bool {
        self.routes.contains_key(topic)
    }

    /// Delivers `value` to every callback of `topic`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&mut self, topic: &str, value: f64) -> usize {
        let Some(routes) = self.routes.get_mut(topic) else {
            return 0;
        };
        for route in routes.iter_mut() {
            (route.handler)(value);
        }
        routes.len()
    }

    /// Drops every route.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Returns the number of registered callbacks across all topics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }
}
