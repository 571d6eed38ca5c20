//! Connection status reporting.
//!
//! `ConnectionStatus` is the only channel through which transport health is
//! observed. Statuses flow through a `tokio::sync::watch` channel so that any
//! number of listeners see the latest transition without queueing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Connection lifecycle of the active transport.
///
/// Transitions are monotonic within one connection attempt:
/// `Idle → Connecting → {Connected | Error}` and
/// `Connected → {Error | Closed}`. A new activation always restarts at
/// `Connecting` regardless of prior state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting { uri: String },
    Connected { uri: String },
    Error { cause: String },
    Closed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Idle => write!(f, "idle"),
            ConnectionStatus::Connecting { uri } => write!(f, "connecting to {uri}"),
            ConnectionStatus::Connected { uri } => write!(f, "connected to {uri}"),
            ConnectionStatus::Error { cause } => write!(f, "connection error: {cause}"),
            ConnectionStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Pseudo-URI published while a light-client transport bootstraps; there is no
/// socket endpoint to name.
pub const LIGHTCLIENT_URI: &str = "via lightclient";

/// Generation-guarded publisher handed to one activation attempt.
///
/// Each `activate` call gets a sender stamped with its own generation. Once a
/// newer activation bumps the shared counter, publishes from the superseded
/// sender are dropped, so a stale `Connected` can never clobber a newer
/// session's `Connecting`.
#[derive(Clone)]
pub struct StatusSender {
    tx: watch::Sender<ConnectionStatus>,
    latest: Arc<AtomicU64>,
    generation: u64,
}

impl StatusSender {
    pub(crate) fn new(
        tx: watch::Sender<ConnectionStatus>,
        latest: Arc<AtomicU64>,
        generation: u64,
    ) -> Self {
        Self {
            tx,
            latest,
            generation,
        }
    }

    /// True once a newer activation has been requested.
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    /// Publish a status transition unless this sender has been superseded.
    ///
    /// The channel always retains the latest status, receivers or not, so a
    /// listener subscribing after the transition still observes it.
    pub fn publish(&self, status: ConnectionStatus) {
        if self.is_superseded() {
            tracing::debug!(generation = self.generation, ?status, "suppressing stale status");
            return;
        }
        self.tx.send_replace(status);
    }
}
