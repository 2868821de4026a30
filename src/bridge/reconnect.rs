//! Single-shot reconnect policy.
//!
//! [`ReconnectPolicy`] is a pure state machine: it never sleeps or dials
//! itself. The session feeds it connection notifications and timer
//! expiries and acts on the returned decisions.
//!
//! ```text
//!   Connecting ──Open──▶ Connected
//!       │                    │
//!       │ Closed             │ Closed
//!       ▼                    ▼
//!   AwaitingReconnect ◀──────┘   (timer armed for `delay`)
//!       │ timer fired
//!       ▼
//!   Connecting (retry) ──Closed──▶ Disconnected   (no new timer)
//! ```
//!
//! A failed retry is terminal until something else opens the link. The
//! policy deliberately has no backoff, jitter, or attempt ceiling.

use std::time::Duration;

/// Where the policy currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectState {
    /// A handshake is in flight.
    Connecting,
    /// The link is up.
    Connected,
    /// The link is down and no retry is pending.
    Disconnected,
    /// The link is down and the retry timer is armed.
    AwaitingReconnect,
}

/// Decides when the single reconnect attempt happens.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
    state: ReconnectState,
    retrying: bool,
    attempts: u64,
}

impl ReconnectPolicy {
    /// Creates a policy for a connection whose first handshake is about
    /// to start.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: ReconnectState::Connecting,
            retrying: false,
            attempts: 0,
        }
    }

    /// Returns the configured fixed delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ReconnectState {
        self.state
    }

    /// Returns how many reconnect attempts have been started in total.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Records a successful handshake.
    pub fn on_open(&mut self) {
        self.state = ReconnectState::Connected;
        self.retrying = false;
    }

    /// Records a `Closed` notification.
    ///
    /// Returns the delay after which the caller must fire the retry timer,
    /// or `None` when the close was the failure of the retry itself, or a
    /// timer is already armed.
    pub fn on_closed(&mut self) -> Option<Duration> {
        match self.state {
            ReconnectState::Connecting if self.retrying => {
                self.retrying = false;
                self.state = ReconnectState::Disconnected;
                None
            }
            ReconnectState::Connecting | ReconnectState::Connected => {
                self.state = ReconnectState::AwaitingReconnect;
                Some(self.delay)
            }
            ReconnectState::AwaitingReconnect | ReconnectState::Disconnected => None,
        }
    }

    /// Records that the retry timer fired.
    ///
    /// Returns `true` if the caller must now call `connect`.
    pub fn on_timer_fired(&mut self) -> bool {
        if self.state != ReconnectState::AwaitingReconnect {
            return false;
        }
        self.state = ReconnectState::Connecting;
        self.retrying = true;
        self.attempts += 1;
        true
    }

    /// Returns `true` if the handshake in flight is the scheduled retry.
    #[must_use]
    pub const fn is_retrying(&self) -> bool {
        self.retrying
    }
}
